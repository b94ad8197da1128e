use std::io::Write;
use std::path::Path;

use log::debug;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use super::phases::*;
use super::suites::{self, Case, Suite};

pub struct Runner {
    suites: Vec<Suite>,
}

pub struct Config {
    /// Only cases whose `<suite>/<name>` contains this text are run.
    pub filter: Option<String>,
    /// Print the output of every phase of failing cases.
    pub debug: bool,
}

impl Runner {
    pub fn load<P: AsRef<Path>>(suites_path: P) -> Self {
        Self { suites: suites::load(suites_path.as_ref()) }
    }

    /// Run all testsuites
    pub fn run(&self, config: &Config) -> RunResult {
        let mut results: Vec<SuiteResult> = vec![];

        let mut cases_count = 0;
        let mut failure_count = 0;

        for suite in &self.suites {
            let result = self.run_suite(config, suite);

            let (cases, failed) = result.summary();
            cases_count += cases;
            failure_count += failed;

            results.push(result);
        }

        RunResult { results, cases_count, failure_count }
    }

    /// Run one individual testsuite
    pub fn run_suite(&self, config: &Config, suite: &Suite) -> SuiteResult {
        let mut results: Vec<CaseResult> = vec![];

        for case in &suite.cases {
            if config.filter.as_deref().is_some_and(|filter| !case.id().contains(filter)) {
                continue;
            }
            debug!("Running {}", case.id());

            let report = self.run_case(&suite.config, case);
            if config.debug && report.result.is_err() {
                report.print();
            }

            results.push(CaseResult { case: case.clone(), result: report.result });
        }
        SuiteResult { suite: suite.clone(), results }
    }

    /// Run one individual testcase within a testsuite
    pub fn run_case(&self, config: &suites::Config, case: &Case) -> Report {
        let input = match case.content() {
            Ok(input) => input,
            Err(err) => {
                return Report {
                    phases: vec![],
                    result: Err(Failure::ExpectedSuccess { got: Box::new(err) }),
                };
            }
        };

        PartialRun::start(input)
            .then(config, case, Lex::new("lex"))
            .then(config, case, Parse::new("parse"))
            .then(config, case, Print::new("print"))
            .then(config, case, Reparse::new("reparse"))
            .then(config, case, Check::new("check"))
            .then(config, case, Build::new("build"))
            .report()
    }
}

// Run Result
//
//

pub struct RunResult {
    results: Vec<SuiteResult>,
    failure_count: usize,
    cases_count: usize,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.failure_count == 0
    }

    pub fn update_expected(&self) -> std::io::Result<()> {
        for CaseResult { case, result } in self.case_results() {
            if let Err(Failure::Mismatch { actual, .. }) = result {
                case.set_expected(actual)?;
            }
        }
        Ok(())
    }

    fn case_results(&self) -> impl Iterator<Item = &CaseResult> {
        self.results.iter().flat_map(|suite_res| suite_res.results.iter())
    }

    pub fn print(&self) -> std::io::Result<()> {
        let mut stdout = StandardStream::stdout(ColorChoice::Auto);
        for suite in &self.results {
            suite.print(&mut stdout)?;
        }
        let color = if self.success() { Color::Green } else { Color::Red };
        stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(stdout, "In total: {}/{} successful", self.cases_count - self.failure_count, self.cases_count)?;
        stdout.reset()?;
        writeln!(stdout)
    }
}

// Suite Result
//
//

pub struct SuiteResult {
    suite: Suite,
    results: Vec<CaseResult>,
}

impl SuiteResult {
    pub fn print<W: WriteColor>(&self, out: &mut W) -> std::io::Result<()> {
        let SuiteResult { suite, results } = self;
        writeln!(out, "Suite \"{}\": {}", suite.name, suite.config.description)?;
        let mut success_count = 0;
        for CaseResult { case, result } in results {
            match result {
                Ok(_) => success_count += 1,
                Err(err) => {
                    out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                    write!(out, "{}", case.name)?;
                    out.reset()?;
                    writeln!(out, ": {err}")?;
                }
            }
        }
        writeln!(out, "{}/{} successful", success_count, results.len())?;
        writeln!(out)
    }

    /// Returns the number of total cases and the number of failures.
    pub fn summary(&self) -> (usize, usize) {
        let failures = self.results.iter().filter(|e| e.result.is_err()).count();
        (self.results.len(), failures)
    }
}

// Case Result
//
//

pub struct CaseResult {
    case: Case,
    result: Result<String, Failure>,
}
