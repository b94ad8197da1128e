use std::path::PathBuf;
use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

use moonc_lang_backend::BackendError;
use moonc_lang_elaborator::SemanticError;
use moonc_lang_parser::{LexicalError, ParseError};

pub type MainResult<T = ()> = Result<T, MainErrors>;

#[derive(Error, Diagnostic, Debug, Clone)]
#[error("Compilation failed with {} error(s)", .0.len())]
pub struct MainErrors(#[related] pub Vec<MainError>);

impl<T: Into<MainError>> From<T> for MainErrors {
    fn from(value: T) -> Self {
        let err: MainError = value.into();
        MainErrors(vec![err])
    }
}

#[derive(Error, Diagnostic, Debug, Clone)]
#[error(transparent)]
#[diagnostic(transparent)]
pub enum MainError {
    Lexical(#[from] LexicalError),
    Parser(#[from] ParseError),
    Semantic(#[from] SemanticError),
    Backend(#[from] BackendError),
    Driver(#[from] DriverError),
}

impl MainError {
    pub fn is_warning(&self) -> bool {
        matches!(self, MainError::Semantic(err) if err.is_warning())
    }
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum DriverError {
    #[error("File not found: {}", .0.display())]
    #[diagnostic(code("D-001"))]
    FileNotFound(PathBuf),
    #[error("Cannot open input file {}: {source}", path.display())]
    #[diagnostic(code("D-002"))]
    CannotOpenInput { path: PathBuf, source: Arc<std::io::Error> },
    #[error("Cannot create output file {}: {source}", path.display())]
    #[diagnostic(code("D-003"))]
    CannotCreateOutput { path: PathBuf, source: Arc<std::io::Error> },
    #[error("Impossible: {0}")]
    #[diagnostic(code("D-004"))]
    Impossible(String),
}

impl DriverError {
    /// Whether the error is about reading the input rather than producing output.
    pub fn is_input_error(&self) -> bool {
        matches!(self, DriverError::FileNotFound(_) | DriverError::CannotOpenInput { .. })
    }
}
