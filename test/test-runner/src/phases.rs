use std::error::Error;
use std::fmt;

use moonc_lang_ast::{Ast, Token};
use moonc_lang_backend::{BackendError, Program};
use moonc_lang_elaborator::{Elaboration, SemanticError, elaborate};
use moonc_lang_parser::{LexicalError, ParseError, TeeExt, lex_with_errors, parse, parse_source, render_tokens};
use moonc_lang_printer::PrintToString;

use super::infallible::NoError;
use super::suites::{Case, Config};

pub trait Phase {
    type In;
    type Out: TestOutput;
    type Err: Error + 'static;

    fn new(name: &'static str) -> Self;
    fn name(&self) -> &'static str;
    fn run(input: Self::In) -> Result<Self::Out, Self::Err>;
}

/// A chain of phases, stopped by the first failure.
pub struct PartialRun<O> {
    result: Result<O, PhasesError>,
    report_phases: Vec<PhaseReport>,
}

pub struct Report {
    pub phases: Vec<PhaseReport>,
    pub result: Result<String, Failure>,
}

pub struct PhaseReport {
    pub name: &'static str,
    pub output: String,
}

pub trait TestOutput {
    fn test_output(&self) -> String;
}

impl<O> PartialRun<O>
where
    O: TestOutput,
{
    pub fn start(input: O) -> PartialRun<O> {
        PartialRun { result: Ok(input), report_phases: vec![] }
    }

    pub fn then<O2, E, P>(self, config: &Config, case: &Case, phase: P) -> PartialRun<O2>
    where
        O2: TestOutput,
        E: Error + 'static,
        P: Phase<In = O, Out = O2, Err = E>,
    {
        let expect_failure = config.fail.is_some_and(|fail| fail.name() == phase.name());
        let expected_output = if expect_failure { case.expected() } else { None };
        self.then_expect(Expect { success: !expect_failure, output: expected_output, phase })
    }

    fn then_expect<O2, E, P>(mut self, expect: Expect<P>) -> PartialRun<O2>
    where
        O2: TestOutput,
        E: Error + 'static,
        P: Phase<In = O, Out = O2, Err = E>,
    {
        let result = self.result.and_then(|out| match P::run(out) {
            Ok(out2) => {
                self.report_phases
                    .push(PhaseReport { name: expect.phase.name(), output: out2.test_output() });
                if !expect.success {
                    return Err(PhasesError::ExpectedFailure { phase: expect.phase.name() });
                }
                Ok(out2)
            }
            Err(err) => {
                self.report_phases
                    .push(PhaseReport { name: expect.phase.name(), output: err.to_string() });
                if expect.success {
                    return Err(PhasesError::ExpectedSuccess { got: Box::new(err) });
                }
                if let Some(expected) = expect.output {
                    let actual = err.to_string();
                    if actual.trim_end() != expected.trim_end() {
                        return Err(PhasesError::Mismatch { expected, actual });
                    }
                }
                Err(PhasesError::AsExpected { err: Box::new(err) })
            }
        });

        PartialRun { result, report_phases: self.report_phases }
    }

    pub fn report(self) -> Report {
        let result = match self.result {
            Ok(out) => Ok(out.test_output()),
            Err(PhasesError::AsExpected { err }) => Ok(err.to_string()),
            Err(PhasesError::Mismatch { expected, actual }) => {
                Err(Failure::Mismatch { expected, actual })
            }
            Err(PhasesError::ExpectedFailure { phase }) => Err(Failure::ExpectedFailure { phase }),
            Err(PhasesError::ExpectedSuccess { got }) => Err(Failure::ExpectedSuccess { got }),
        };

        Report { result, phases: self.report_phases }
    }
}

impl Report {
    pub fn print(&self) {
        for PhaseReport { name, output } in &self.phases {
            println!("phase {name}:");
            println!();
            println!("{output}");
            println!();
        }
    }
}

#[derive(Debug)]
pub enum Failure {
    Mismatch { expected: String, actual: String },
    ExpectedFailure { phase: &'static str },
    ExpectedSuccess { got: Box<dyn Error> },
}

impl Error for Failure {}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Mismatch { expected, actual } => {
                write!(f, "\n  Expected : {expected}\n  Got      : {actual}")
            }
            Failure::ExpectedFailure { phase } => write!(f, "Expected phase {phase} to fail, but it succeeded"),
            Failure::ExpectedSuccess { got } => write!(f, "Expected success, got {got}"),
        }
    }
}

enum PhasesError {
    AsExpected { err: Box<dyn Error> },
    Mismatch { expected: String, actual: String },
    ExpectedFailure { phase: &'static str },
    ExpectedSuccess { got: Box<dyn Error> },
}

struct Expect<P: Phase> {
    success: bool,
    output: Option<String>,
    phase: P,
}

/// Every error a phase reported, one per line.
#[derive(Debug)]
pub struct Errors<E>(pub Vec<E>);

impl<E: fmt::Display> fmt::Display for Errors<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl<E: fmt::Debug + fmt::Display> Error for Errors<E> {}

/// The tree after semantic analysis.
pub struct Checked {
    pub ast: Ast,
    pub elaboration: Elaboration,
}

pub struct Lex {
    name: &'static str,
}
pub struct Parse {
    name: &'static str,
}
pub struct Print {
    name: &'static str,
}
pub struct Reparse {
    name: &'static str,
}
pub struct Check {
    name: &'static str,
}
pub struct Build {
    name: &'static str,
}

impl Phase for Lex {
    type In = String;
    type Out = Vec<Token>;
    type Err = Errors<LexicalError>;

    fn new(name: &'static str) -> Self {
        Self { name }
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn run(input: Self::In) -> Result<Self::Out, Self::Err> {
        let (tokens, errors) = lex_with_errors(&input);
        if errors.is_empty() { Ok(tokens) } else { Err(Errors(errors)) }
    }
}

impl Phase for Parse {
    type In = Vec<Token>;
    type Out = Ast;
    type Err = Errors<ParseError>;

    fn new(name: &'static str) -> Self {
        Self { name }
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn run(input: Self::In) -> Result<Self::Out, Self::Err> {
        let outcome = parse(input.into_iter().without_comments(None));
        match outcome.ast {
            Some(ast) if outcome.errors.is_empty() => Ok(ast),
            _ => Err(Errors(outcome.errors)),
        }
    }
}

impl Phase for Print {
    type In = Ast;
    type Out = String;
    type Err = NoError;

    fn new(name: &'static str) -> Self {
        Self { name }
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn run(input: Self::In) -> Result<Self::Out, Self::Err> {
        Ok(input.print_to_string(None))
    }
}

/// Parses printed source again, so that printing must preserve the program.
impl Phase for Reparse {
    type In = String;
    type Out = Ast;
    type Err = Errors<ParseError>;

    fn new(name: &'static str) -> Self {
        Self { name }
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn run(input: Self::In) -> Result<Self::Out, Self::Err> {
        let outcome = parse_source(&input);
        match outcome.ast {
            Some(ast) if outcome.errors.is_empty() => Ok(ast),
            _ => Err(Errors(outcome.errors)),
        }
    }
}

impl Phase for Check {
    type In = Ast;
    type Out = Checked;
    type Err = Errors<SemanticError>;

    fn new(name: &'static str) -> Self {
        Self { name }
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn run(mut input: Self::In) -> Result<Self::Out, Self::Err> {
        let elaboration = elaborate(&mut input);
        if elaboration.has_errors() {
            let errors = elaboration.errors.into_iter().filter(|err| !err.is_warning()).collect();
            return Err(Errors(errors));
        }
        Ok(Checked { ast: input, elaboration })
    }
}

impl Phase for Build {
    type In = Checked;
    type Out = Program;
    type Err = BackendError;

    fn new(name: &'static str) -> Self {
        Self { name }
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn run(input: Self::In) -> Result<Self::Out, Self::Err> {
        moonc_lang_backend::generate(&input.ast, &input.elaboration.tables)
    }
}

impl TestOutput for String {
    fn test_output(&self) -> String {
        self.to_owned()
    }
}

impl TestOutput for Vec<Token> {
    fn test_output(&self) -> String {
        render_tokens(self)
    }
}

impl TestOutput for Ast {
    fn test_output(&self) -> String {
        self.dump().to_string()
    }
}

impl TestOutput for Checked {
    fn test_output(&self) -> String {
        self.elaboration.tables.render().to_string()
    }
}

impl TestOutput for Program {
    fn test_output(&self) -> String {
        self.to_string()
    }
}
