//! Panic-mode error recovery.
//!
//! Every step either consumes a token or pops the symbol stack, so recovery
//! always terminates.

use log::trace;

use moonc_lang_ast::{Token, TokenKind};

use super::Parser;
use crate::grammar::{NonTerminal, Symbol};
use crate::result::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    Resume,
    Abort,
}

impl<I: Iterator<Item = Token>> Parser<'_, I> {
    pub(super) fn recover_terminal(&mut self, expected: TokenKind) -> Recovery {
        if self.lookahead.kind == TokenKind::Eof {
            self.errors.push(ParseError::unterminated([expected], &self.lookahead));
            return Recovery::Abort;
        }
        self.errors.push(ParseError::unexpected(expected, &self.lookahead));
        if self.pop_to_closer() {
            return Recovery::Resume;
        }
        trace!("recovery: assume missing {expected}");
        self.stack.pop();
        Recovery::Resume
    }

    pub(super) fn recover_nonterminal(&mut self, nt: NonTerminal) -> Recovery {
        let expected = self.table.expected(nt);
        if self.lookahead.kind == TokenKind::Eof {
            self.errors.push(ParseError::unterminated(expected, &self.lookahead));
            return Recovery::Abort;
        }
        let name = format!("<{}>", self.table.grammar().name(nt));
        self.errors.push(ParseError::no_rule(name, &self.lookahead));
        if self.pop_to_closer() {
            return Recovery::Resume;
        }

        let nullable = self.table.is_nullable(nt);
        loop {
            trace!("recovery: skip {}", self.lookahead);
            self.advance();
            let kind = self.lookahead.kind;
            if self.table.first(nt).contains(&kind) {
                return Recovery::Resume;
            }
            if nullable && self.table.follow(nt).contains(&kind) {
                self.stack.pop();
                return Recovery::Resume;
            }
            if kind == TokenKind::Eof {
                self.errors.push(ParseError::unterminated(expected, &self.lookahead));
                return Recovery::Abort;
            }
            if self.pop_to_closer() {
                return Recovery::Resume;
            }
        }
    }

    /// If the lookahead closes a statement or block that is still open on the
    /// stack, drop everything above that closer.
    ///
    /// A `semi` is only searched for up to the enclosing block's `closecubr`.
    fn pop_to_closer(&mut self) -> bool {
        let closer = self.lookahead.kind;
        if !matches!(closer, TokenKind::Semi | TokenKind::CloseCubr) {
            return false;
        }
        let found = self.stack.iter().rposition(|sym| match sym {
            Symbol::Terminal(t) => *t == closer || (closer == TokenKind::Semi && *t == TokenKind::CloseCubr),
            _ => false,
        });
        match found {
            Some(pos) if self.stack[pos] == Symbol::Terminal(closer) => {
                trace!("recovery: resume at {closer}");
                self.stack.truncate(pos + 1);
                true
            }
            _ => false,
        }
    }
}
