use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use moonc_lang_ast::{Ast, Token};
use moonc_lang_backend::{BackendError, Program};
use moonc_lang_elaborator::{Elaboration, elaborate};
use moonc_lang_parser::{
    LexicalError, Lexer, ParseOutcome, TeeExt, TokenSink, lex_with_errors, parse, render_lex_errors,
    render_tokens,
};
use moonc_lang_printer::{PrintCfg, PrintToString};

use crate::artifacts::{Artifact, Phase};
use crate::cache::Cache;
use crate::fs::*;
use crate::result::{DriverError, MainError};

/// The token stream of a file together with its error tokens.
#[derive(Debug)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexicalError>,
}

#[derive(Debug)]
pub struct Parsed {
    pub outcome: ParseOutcome,
    /// Comments dropped on the way to the parser.
    pub comments: Vec<Token>,
}

/// A tree that passed semantic analysis, possibly with errors.
#[derive(Debug)]
pub struct Checked {
    pub ast: Ast,
    pub elaboration: Elaboration,
}

pub type Assembly = Result<Program, BackendError>;

/// A database tracking a set of source files
pub struct Database {
    /// The source provider of the files (file system or in-memory)
    pub source: Box<dyn FileSource>,
    /// The source code text of each file
    pub files: Cache<String>,
    pub lexed: Cache<Arc<Lexed>>,
    pub parsed: Cache<Arc<Parsed>>,
    /// `None` if syntax errors kept the file from semantic analysis
    pub checked: Cache<Option<Arc<Checked>>>,
    /// `None` if errors kept the file from code generation
    pub assembly: Cache<Option<Arc<Assembly>>>,
}

impl Database {
    // Every phase is computed on demand and cached per file. `xxx(path)` returns
    // the cached result unless it is stale and calls `recompute_xxx(path)` otherwise,
    // which asks for the results of the phases it depends on in the same way.

    // Core API: Source

    pub fn source(&mut self, path: &Path) -> Result<String, DriverError> {
        match self.files.get_unless_stale(path) {
            Some(source) => {
                debug!("Found source in cache: {}", path.display());
                Ok(source.clone())
            }
            None => self.recompute_source(path),
        }
    }

    fn recompute_source(&mut self, path: &Path) -> Result<String, DriverError> {
        debug!("Reading {}", path.display());
        let source = self.source.read_to_string(path)?;
        self.files.insert(path.to_path_buf(), source.clone());
        Ok(source)
    }

    // Core API: Tokens

    pub fn lexed(&mut self, path: &Path) -> Result<Arc<Lexed>, DriverError> {
        match self.lexed.get_unless_stale(path) {
            Some(lexed) => {
                debug!("Found tokens in cache: {}", path.display());
                Ok(lexed.clone())
            }
            None => self.recompute_lexed(path),
        }
    }

    fn recompute_lexed(&mut self, path: &Path) -> Result<Arc<Lexed>, DriverError> {
        debug!("Lexing {}", path.display());
        let source = self.source(path)?;
        let (tokens, errors) = lex_with_errors(&source);
        let lexed = Arc::new(Lexed { tokens, errors });
        self.lexed.insert(path.to_path_buf(), lexed.clone());
        Ok(lexed)
    }

    // Core API: Parse

    pub fn parsed(&mut self, path: &Path) -> Result<Arc<Parsed>, DriverError> {
        match self.parsed.get_unless_stale(path) {
            Some(parsed) => {
                debug!("Found parse in cache: {}", path.display());
                Ok(parsed.clone())
            }
            None => self.recompute_parsed(path),
        }
    }

    /// Lexes once: the tee hands every token to the token listing and the
    /// lexical errors before the parser sees the stream without comments.
    fn recompute_parsed(&mut self, path: &Path) -> Result<Arc<Parsed>, DriverError> {
        debug!("Parsing {}", path.display());
        let source = self.source(path)?;
        let mut tokens: Vec<Token> = Vec::new();
        let mut errors: Vec<LexicalError> = Vec::new();
        let mut comments = Vec::new();
        let outcome = parse(
            Lexer::new(&source)
                .tee(vec![&mut tokens as &mut dyn TokenSink, &mut errors])
                .without_comments(Some(&mut comments)),
        );
        self.lexed.insert(path.to_path_buf(), Arc::new(Lexed { tokens, errors }));
        let parsed = Arc::new(Parsed { outcome, comments });
        self.parsed.insert(path.to_path_buf(), parsed.clone());
        Ok(parsed)
    }

    // Core API: Semantic analysis

    pub fn checked(&mut self, path: &Path) -> Result<Option<Arc<Checked>>, DriverError> {
        match self.checked.get_unless_stale(path) {
            Some(checked) => {
                debug!("Found symbol tables in cache: {}", path.display());
                Ok(checked.clone())
            }
            None => self.recompute_checked(path),
        }
    }

    fn recompute_checked(&mut self, path: &Path) -> Result<Option<Arc<Checked>>, DriverError> {
        let parsed = self.parsed(path)?;
        let lexed = self.lexed(path)?;
        let checked = match &parsed.outcome.ast {
            Some(ast) if parsed.outcome.is_success() && lexed.errors.is_empty() => {
                debug!("Checking {}", path.display());
                let mut ast = ast.clone();
                let elaboration = elaborate(&mut ast);
                Some(Arc::new(Checked { ast, elaboration }))
            }
            _ => {
                debug!("Skipping semantic analysis of {}: syntax errors", path.display());
                None
            }
        };
        self.checked.insert(path.to_path_buf(), checked.clone());
        Ok(checked)
    }

    // Core API: Code generation

    pub fn assembly(&mut self, path: &Path) -> Result<Option<Arc<Assembly>>, DriverError> {
        match self.assembly.get_unless_stale(path) {
            Some(assembly) => {
                debug!("Found assembly in cache: {}", path.display());
                Ok(assembly.clone())
            }
            None => self.recompute_assembly(path),
        }
    }

    fn recompute_assembly(&mut self, path: &Path) -> Result<Option<Arc<Assembly>>, DriverError> {
        let assembly = match self.checked(path)? {
            Some(checked) if !checked.elaboration.has_errors() => {
                debug!("Generating code for {}", path.display());
                let assembly = moonc_lang_backend::generate(&checked.ast, &checked.elaboration.tables);
                Some(Arc::new(assembly))
            }
            Some(_) => {
                debug!("Skipping code generation for {}: semantic errors", path.display());
                None
            }
            None => None,
        };
        self.assembly.insert(path.to_path_buf(), assembly.clone());
        Ok(assembly)
    }

    // Errors

    /// Everything reported up to and including `phase`, in pipeline order.
    pub fn errors(&mut self, path: &Path, phase: Phase) -> Result<Vec<MainError>, DriverError> {
        if phase == Phase::Lex {
            let lexed = self.lexed(path)?;
            return Ok(lexed.errors.iter().cloned().map(MainError::from).collect());
        }
        let parsed = self.parsed(path)?;
        let lexed = self.lexed(path)?;
        let mut errors: Vec<MainError> = lexed.errors.iter().cloned().map(MainError::from).collect();
        errors.extend(parsed.outcome.errors.iter().cloned().map(MainError::from));
        if phase == Phase::Parse {
            return Ok(errors);
        }
        if let Some(checked) = self.checked(path)? {
            errors.extend(checked.elaboration.errors.iter().cloned().map(MainError::from));
        }
        if let Some(assembly) = self.assembly(path)? {
            if let Err(err) = assembly.as_ref() {
                errors.push(err.clone().into());
            }
        }
        Ok(errors)
    }

    pub fn pretty_error(&self, path: &Path, err: MainError) -> miette::Report {
        let miette_error: miette::Error = err.into();
        match self.files.get_even_if_stale(path) {
            Some(source) => miette_error
                .with_source_code(miette::NamedSource::new(path.display().to_string(), source.to_owned())),
            None => miette_error,
        }
    }

    pub fn pretty_errors(&self, path: &Path, errs: Vec<MainError>) -> Vec<miette::Report> {
        errs.into_iter().map(|err| self.pretty_error(path, err)).collect()
    }

    // Artifacts

    /// The contents of an artifact, or `None` if its phase was skipped.
    pub fn render(&mut self, path: &Path, artifact: Artifact) -> Result<Option<String>, DriverError> {
        let rendered = match artifact {
            Artifact::LexTokens => Some(render_tokens(&self.lexed(path)?.tokens)),
            Artifact::LexErrors => Some(render_lex_errors(&self.lexed(path)?.errors)),
            Artifact::Derivation => Some(lines(&self.parsed(path)?.outcome.derivation)),
            Artifact::SyntaxErrors => Some(lines(&self.parsed(path)?.outcome.errors)),
            Artifact::Ast => self.parsed(path)?.outcome.ast.as_ref().map(|ast| ast.dump().to_string()),
            Artifact::SymbolTables => {
                self.checked(path)?.map(|checked| checked.elaboration.tables.render().to_string())
            }
            Artifact::SemanticErrors => {
                self.checked(path)?.map(|checked| lines(&checked.elaboration.errors))
            }
            Artifact::Assembly => self.assembly(path)?.and_then(|assembly| match &*assembly {
                Ok(program) => Some(program.to_string()),
                Err(_) => None,
            }),
        };
        Ok(rendered)
    }

    /// Write the artifacts of `phase` for one input to `outdir` and return their paths.
    pub fn write_artifacts(
        &mut self,
        path: &Path,
        phase: Phase,
        debug: bool,
        target: &mut dyn FileSource,
        outdir: &Path,
    ) -> Result<Vec<PathBuf>, DriverError> {
        let name = artifact_name(path);
        let mut written = Vec::new();
        for artifact in phase.artifacts(debug) {
            let Some(contents) = self.render(path, artifact)? else {
                debug!("No {artifact} for {}", path.display());
                continue;
            };
            let out = artifact.path(outdir, &name);
            target.write_string(&out, &contents)?;
            info!("Wrote {}", out.display());
            written.push(out);
        }
        Ok(written)
    }

    /// The source printed back from its tree, or `None` if it does not parse.
    pub fn print_to_string(&mut self, path: &Path, cfg: &PrintCfg) -> Result<Option<String>, DriverError> {
        let parsed = self.parsed(path)?;
        Ok(parsed.outcome.ast.as_ref().map(|ast| ast.print_to_string(Some(cfg))))
    }

    // Creation and invalidation

    /// Create a new database that only keeps files in memory
    pub fn in_memory() -> Self {
        Self::from_source(InMemorySource::new())
    }

    /// Create a new database with the given source
    pub fn from_source(source: impl FileSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            files: Cache::default(),
            lexed: Cache::default(),
            parsed: Cache::default(),
            checked: Cache::default(),
            assembly: Cache::default(),
        }
    }

    /// Create a new database reading paths relative to `root`
    pub fn from_path<P: AsRef<Path>>(root: P) -> Self {
        Self::from_source(FileSystemSource::new(root))
    }

    pub fn invalidate(&mut self, path: &Path) {
        debug!("Invalidating {}", path.display());
        self.files.invalidate(path);
        self.lexed.invalidate(path);
        self.parsed.invalidate(path);
        self.checked.invalidate(path);
        self.assembly.invalidate(path);
    }

    pub fn write_source(&mut self, path: &Path, source: &str) -> Result<(), DriverError> {
        self.invalidate(path);
        self.source.write_string(path, source)
    }
}

/// The stem artifact files are named after: `foo` for `dir/foo.src`.
pub fn artifact_name(path: &Path) -> String {
    path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_else(|| "stdin".to_owned())
}

fn lines<T: ToString>(items: &[T]) -> String {
    items.iter().map(|item| format!("{}\n", item.to_string())).collect()
}
