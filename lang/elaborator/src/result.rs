use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Notices that are reported alongside errors but do not fail compilation.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    #[error("Warning: '{name}' has been overloaded {count} times: {signatures}")]
    #[diagnostic(code("W-001"), severity(Warning))]
    OverloadNotice {
        /// `Struct::name` or `name`.
        name: String,
        count: usize,
        signatures: String,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Warning: '{structure}::{name}' shadows a member inherited from '{parent}': line {line}.")]
    #[diagnostic(code("W-002"), severity(Warning))]
    ShadowedInheritedMember {
        structure: String,
        name: String,
        parent: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
}

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("Semantic error: Multiply declared identifier '{name}': line {line} (first declared at line {first_line}).")]
    #[diagnostic(code("S-001"))]
    DuplicateIdentifier {
        name: String,
        first_line: u32,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Use of undeclared identifier '{name}': line {line}.")]
    #[diagnostic(code("S-002"))]
    UndeclaredIdentifier {
        name: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Type mismatch in {context}: '{left}' and '{right}': line {line}.")]
    #[diagnostic(code("S-003"))]
    TypeMismatch {
        context: String,
        left: String,
        right: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Too many subscripts for '{name}': declared {declared}, supplied {supplied}: line {line}.")]
    #[diagnostic(code("S-004"))]
    SubscriptArity {
        name: String,
        declared: usize,
        supplied: usize,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Subscript {position} of '{name}' has type '{ty}', expected 'integer': line {line}.")]
    #[diagnostic(code("S-005"))]
    NonIntegerIndex {
        name: String,
        position: usize,
        ty: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Function '{func}' returns '{actual}' but is declared to return '{expected}': line {line}.")]
    #[diagnostic(code("S-006"))]
    MismatchedReturnType {
        func: String,
        expected: String,
        actual: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Method '{structure}::{struct_sig}' is declared to return '{declared}' but implemented to return '{implemented}': line {line}.")]
    #[diagnostic(code("S-007"))]
    MethodMismatch {
        structure: String,
        struct_sig: String,
        declared: String,
        implemented: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Struct '{structure}' does not declare method '{sig}' defined in its impl: line {line}.")]
    #[diagnostic(code("S-008"))]
    StructMissingMethodFromImpl {
        structure: String,
        sig: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Impl of '{structure}' does not define declared method '{sig}': line {line}.")]
    #[diagnostic(code("S-009"))]
    ImplMissingMethodFromStruct {
        structure: String,
        sig: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Impl '{name}' may only contain function definitions: line {line}.")]
    #[diagnostic(code("S-010"))]
    ImplMayOnlyContainFuncDefs {
        name: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Struct '{name}' declares methods but has no impl: line {line}.")]
    #[diagnostic(code("S-011"))]
    StructMissingImpl {
        name: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Impl '{name}' has no matching struct declaration: line {line}.")]
    #[diagnostic(code("S-012"))]
    ImplMissingStruct {
        name: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Unknown type '{name}': line {line}.")]
    #[diagnostic(code("S-013"))]
    MalformedCustomType {
        name: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Struct '{name}' inherits from itself: line {line}.")]
    #[diagnostic(code("S-014"))]
    CyclicInheritance {
        name: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Private member '{structure}::{name}' is not accessible here: line {line}.")]
    #[diagnostic(code("S-015"))]
    PrivateMemberAccess {
        structure: String,
        name: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Member access '.{name}' on non-struct type '{ty}': line {line}.")]
    #[diagnostic(code("S-016"))]
    FieldAccessOnNonStruct {
        name: String,
        ty: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Struct '{name}' contains itself: line {line}.")]
    #[diagnostic(code("S-017"))]
    CyclicStructSize {
        name: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: No overload of '{name}' matches the call '{call}': line {line}.")]
    #[diagnostic(code("S-018"))]
    NoMatchingOverload {
        name: String,
        call: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: 'self' used outside of a method: line {line}.")]
    #[diagnostic(code("S-019"))]
    SelfOutsideMethod {
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: '{name}' is too large to fit in memory: line {line}.")]
    #[diagnostic(code("S-020"))]
    SizeOverflow {
        name: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Semantic error: Invalid array dimension '[{dim}]' in the declaration of '{name}': line {line}.")]
    #[diagnostic(code("S-021"))]
    InvalidDimension {
        name: String,
        dim: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error(transparent)]
    #[diagnostic(transparent)]
    Warning(#[from] Warning),
}

impl SemanticError {
    pub fn is_warning(&self) -> bool {
        matches!(self, SemanticError::Warning(_))
    }
}
