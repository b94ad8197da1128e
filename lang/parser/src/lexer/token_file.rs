//! The line-oriented token and lexical error listings.

use std::fmt::Write;

use moonc_lang_ast::{Token, TokenKind, unescape};

use crate::result::{LexicalError, TokenFileError};

/// One line per source line that produced tokens, each token as `[kind, lexeme, line]`.
pub fn render_tokens<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> String {
    let mut out = String::new();
    let mut current = None;
    for token in tokens {
        match current {
            Some(line) if line == token.line => out.push(' '),
            Some(_) => out.push('\n'),
            None => {}
        }
        current = Some(token.line);
        let _ = write!(out, "{token}");
    }
    if current.is_some() {
        out.push('\n');
    }
    out
}

pub fn render_lex_errors<'a>(errors: impl IntoIterator<Item = &'a LexicalError>) -> String {
    errors.into_iter().map(|err| format!("{err}\n")).collect()
}

/// Read a token listing produced by [`render_tokens`] back into tokens.
///
/// Columns and spans are not part of the listing and are left at their defaults.
pub fn read_token_file(text: &str) -> Result<Vec<Token>, TokenFileError> {
    let mut tokens = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let mut rest = line.trim_end();
        while !rest.is_empty() {
            let (token, tail) =
                read_token(rest).ok_or_else(|| TokenFileError::Malformed { line: idx + 1, text: rest.to_owned() })?;
            tokens.push(token?);
            rest = tail.strip_prefix(' ').unwrap_or(tail);
        }
    }
    Ok(tokens)
}

fn read_token(text: &str) -> Option<(Result<Token, TokenFileError>, &str)> {
    let body = text.strip_prefix('[')?;
    let (kind, body) = body.split_once(", ")?;
    let (lexeme, line, tail) = split_lexeme(body)?;
    let token = kind
        .parse::<TokenKind>()
        .map(|kind| Token::new(kind, unescape(lexeme), line, 0))
        .map_err(TokenFileError::from);
    Some((token, tail))
}

/// Split `lexeme, <line>]<tail>` at the first `, <digits>]` that ends the
/// line or is followed by another token.
fn split_lexeme(body: &str) -> Option<(&str, u32, &str)> {
    body.match_indices(", ").find_map(|(at, _)| {
        let after = &body[at + 2..];
        let close = after.find(']')?;
        let line = after[..close].parse::<u32>().ok()?;
        let tail = &after[close + 1..];
        (tail.is_empty() || tail.starts_with(" [")).then_some((&body[..at], line, tail))
    })
}
