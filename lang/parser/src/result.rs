use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use moonc_lang_ast::{Token, TokenKind, UnknownTokenKind, escape};
use moonc_lang_miette_util::ToMiette;

/// An error token reported by the lexer.
///
/// The lexer never stops on these; they are also part of the token stream.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum LexicalError {
    #[error("Lexical error: Invalid character: \"{lexeme}\": line {line}.")]
    #[diagnostic(code("L-001"))]
    InvalidChar {
        lexeme: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Lexical error: Invalid number: \"{lexeme}\": line {line}.")]
    #[diagnostic(code("L-002"))]
    InvalidNumber {
        lexeme: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Lexical error: Invalid identifier: \"{lexeme}\": line {line}.")]
    #[diagnostic(code("L-003"))]
    InvalidIdentifier {
        lexeme: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Lexical error: Unterminated comment: \"{lexeme}\": line {line}.")]
    #[diagnostic(code("L-004"))]
    UnterminatedComment {
        lexeme: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
}

impl LexicalError {
    /// The error described by an error token, or `None` for regular tokens.
    pub fn from_token(token: &Token) -> Option<Self> {
        let lexeme = escape(&token.lexeme);
        let line = token.line;
        let span = Some(token.span).to_miette();
        let err = match token.kind {
            TokenKind::InvalidChar => LexicalError::InvalidChar { lexeme, line, span },
            TokenKind::InvalidNum => LexicalError::InvalidNumber { lexeme, line, span },
            TokenKind::InvalidId => LexicalError::InvalidIdentifier { lexeme, line, span },
            TokenKind::UnterminatedComment => {
                LexicalError::UnterminatedComment { lexeme, line, span }
            }
            _ => return None,
        };
        Some(err)
    }

    pub fn line(&self) -> u32 {
        match self {
            LexicalError::InvalidChar { line, .. }
            | LexicalError::InvalidNumber { line, .. }
            | LexicalError::InvalidIdentifier { line, .. }
            | LexicalError::UnterminatedComment { line, .. } => *line,
        }
    }
}

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(
        "Syntax error: Unexpected token {found} \"{lexeme}\" at line {line}, column {column}; expected {expected}."
    )]
    #[diagnostic(code("P-001"))]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
        lexeme: String,
        line: u32,
        column: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error(
        "Syntax error: No rule for {nonterminal} on {found} \"{lexeme}\" at line {line}, column {column}."
    )]
    #[diagnostic(code("P-002"))]
    NoRule {
        nonterminal: String,
        found: TokenKind,
        lexeme: String,
        line: u32,
        column: u32,
        #[label]
        span: Option<SourceSpan>,
    },
    #[error("Syntax error: Unterminated sentence at line {line}; expected one of: {expected}.")]
    #[diagnostic(code("P-003"))]
    UnterminatedSentence {
        expected: String,
        line: u32,
        #[label]
        span: Option<SourceSpan>,
    },
}

impl ParseError {
    pub fn unexpected(expected: TokenKind, found: &Token) -> Self {
        ParseError::UnexpectedToken {
            expected,
            found: found.kind,
            lexeme: escape(&found.lexeme),
            line: found.line,
            column: found.column,
            span: Some(found.span).to_miette(),
        }
    }

    pub fn no_rule(nonterminal: impl Into<String>, found: &Token) -> Self {
        ParseError::NoRule {
            nonterminal: nonterminal.into(),
            found: found.kind,
            lexeme: escape(&found.lexeme),
            line: found.line,
            column: found.column,
            span: Some(found.span).to_miette(),
        }
    }

    pub fn unterminated(expected: impl IntoIterator<Item = TokenKind>, at: &Token) -> Self {
        let expected: Vec<&str> = expected.into_iter().map(TokenKind::name).collect();
        ParseError::UnterminatedSentence {
            expected: expected.join(", "),
            line: at.line,
            span: Some(at.span).to_miette(),
        }
    }
}

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum TokenFileError {
    #[error("Malformed token listing at line {line}: {text}")]
    #[diagnostic(code("L-005"))]
    Malformed { line: usize, text: String },
    #[error(transparent)]
    #[diagnostic(code("L-006"))]
    UnknownKind(#[from] UnknownTokenKind),
}
