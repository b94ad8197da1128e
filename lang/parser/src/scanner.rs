//! Adapters between the lexer and the parser.
//!
//! The lexer runs once; a [`Tee`] hands every token to a set of sinks
//! (token listing, lexical errors) before the [`CommentlessScanner`] removes
//! comments on the way to the parser.

use moonc_lang_ast::Token;

use crate::result::LexicalError;

/// Something that observes tokens as they stream past.
pub trait TokenSink {
    fn accept(&mut self, token: &Token);
}

impl TokenSink for Vec<Token> {
    fn accept(&mut self, token: &Token) {
        self.push(token.clone());
    }
}

impl TokenSink for Vec<LexicalError> {
    fn accept(&mut self, token: &Token) {
        if let Some(err) = LexicalError::from_token(token) {
            self.push(err);
        }
    }
}

/// Forwards every item of `inner` to each sink, in order, then yields it.
pub struct Tee<'s, I> {
    inner: I,
    sinks: Vec<&'s mut dyn TokenSink>,
}

impl<I: Iterator<Item = Token>> Iterator for Tee<'_, I> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = self.inner.next()?;
        for sink in self.sinks.iter_mut() {
            sink.accept(&token);
        }
        Some(token)
    }
}

pub trait TeeExt: Iterator<Item = Token> + Sized {
    fn tee<'s>(self, sinks: Vec<&'s mut dyn TokenSink>) -> Tee<'s, Self> {
        Tee { inner: self, sinks }
    }

    fn without_comments<'s>(self, comments: Option<&'s mut Vec<Token>>) -> CommentlessScanner<'s, Self> {
        CommentlessScanner { inner: self, comments }
    }
}

impl<I: Iterator<Item = Token>> TeeExt for I {}

/// Drops comment tokens, optionally collecting them on the side.
pub struct CommentlessScanner<'s, I> {
    inner: I,
    comments: Option<&'s mut Vec<Token>>,
}

impl<I: Iterator<Item = Token>> Iterator for CommentlessScanner<'_, I> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let token = self.inner.next()?;
            if !token.kind.is_comment() {
                return Some(token);
            }
            if let Some(comments) = self.comments.as_deref_mut() {
                comments.push(token);
            }
        }
    }
}
