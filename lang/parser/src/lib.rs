//! Front end of the compiler: characters to tokens to AST.

pub mod grammar;
pub mod lexer;
mod parser;
mod result;
pub mod scanner;
pub mod source;

pub use lexer::token_file::{read_token_file, render_lex_errors, render_tokens};
pub use lexer::{Lexer, lex};
pub use parser::{ParseOutcome, Parser, parse};
pub use result::*;
pub use scanner::{CommentlessScanner, Tee, TeeExt, TokenSink};
pub use source::CharSource;

use moonc_lang_ast::Token;

/// Lex and parse `text` in one go, discarding comments.
pub fn parse_source(text: &str) -> ParseOutcome {
    parse(Lexer::new(text).without_comments(None))
}

/// The tokens and lexical errors of a text, as written to the token listings.
pub fn lex_with_errors(text: &str) -> (Vec<Token>, Vec<LexicalError>) {
    let tokens = lex(text);
    let errors = tokens.iter().filter_map(LexicalError::from_token).collect();
    (tokens, errors)
}
