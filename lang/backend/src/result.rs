use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::registers::Register;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Code generation error: All registers are in use.")]
    #[diagnostic(code("B-001"))]
    RegistersExhausted,
    #[error("Code generation error: Register {0} was freed twice.")]
    #[diagnostic(code("B-002"))]
    RegisterDoubleFree(Register),
    #[error("Code generation error: Register {0} was freed but never claimed.")]
    #[diagnostic(code("B-003"))]
    RegisterNotClaimed(Register),
    #[error("Code generation error: Registers {0} are still claimed after code generation.")]
    #[diagnostic(code("B-004"))]
    RegistersLeaked(String),
    #[error("Code generation error: The program has no 'main' function.")]
    #[diagnostic(code("B-005"))]
    MissingMain,
    #[error("Code generation error: {what} is not supported: line {line}.")]
    #[diagnostic(code("B-006"))]
    Unsupported {
        what: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Impossible: {0}")]
    #[diagnostic(code("B-007"))]
    Impossible(String),
}

pub type BackendResult<T = ()> = Result<T, BackendError>;
