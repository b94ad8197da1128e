use moonc_lang_ast::TokenKind;

use crate::source::CharSource;

/// An open comment on the comment stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Inline,
    Block,
}

#[derive(Debug, Clone, Copy)]
enum Effect {
    Push(Marker),
    /// Pop the top marker. Closers that belong to the next token are left in the source.
    Pop { consume: bool },
}

/// Transitions consulted while the comment stack is non-empty, keyed by the marker on top.
const STACK_TRANSITIONS: &[(Marker, &str, Effect)] = &[
    (Marker::Inline, "\r\n", Effect::Pop { consume: false }),
    (Marker::Inline, "\n", Effect::Pop { consume: false }),
    (Marker::Block, "/*", Effect::Push(Marker::Block)),
    (Marker::Block, "*/", Effect::Pop { consume: true }),
];

#[derive(Debug, Default)]
pub struct CommentStack {
    markers: Vec<Marker>,
}

impl CommentStack {
    /// Read the rest of a comment whose opener is already in `lexeme`.
    ///
    /// Returns the kind of the finished token: a comment once the stack
    /// empties, or `unterminatedcomment` if the input ends first.
    pub fn read(&mut self, opener: Marker, source: &mut CharSource, lexeme: &mut String) -> TokenKind {
        self.markers.push(opener);
        while let Some(&top) = self.markers.last() {
            if source.is_eof() {
                return self.close_at_eof();
            }
            let transition = STACK_TRANSITIONS
                .iter()
                .find(|(marker, pattern, _)| *marker == top && source.lookahead_is(pattern));
            match transition {
                Some((_, pattern, Effect::Push(marker))) => {
                    consume(source, lexeme, pattern.chars().count());
                    self.markers.push(*marker);
                }
                Some((_, pattern, Effect::Pop { consume: true })) => {
                    consume(source, lexeme, pattern.chars().count());
                    self.markers.pop();
                }
                Some((_, _, Effect::Pop { consume: false })) => {
                    self.markers.pop();
                }
                None => consume(source, lexeme, 1),
            }
        }
        match opener {
            Marker::Inline => TokenKind::InlineCmt,
            Marker::Block => TokenKind::BlockCmt,
        }
    }

    fn close_at_eof(&mut self) -> TokenKind {
        let kind = if self.markers == [Marker::Inline] {
            TokenKind::InlineCmt
        } else {
            TokenKind::UnterminatedComment
        };
        self.markers.clear();
        kind
    }
}

fn consume(source: &mut CharSource, lexeme: &mut String, n: usize) {
    for _ in 0..n {
        if let Some(c) = source.next_char() {
            lexeme.push(c);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(opener: Marker, rest: &str) -> (TokenKind, String, Option<char>) {
        let mut source = CharSource::new(rest);
        let mut lexeme = String::from(if opener == Marker::Inline { "//" } else { "/*" });
        let kind = CommentStack::default().read(opener, &mut source, &mut lexeme);
        (kind, lexeme, source.peek())
    }

    #[test]
    fn inline_stops_before_newline() {
        assert_eq!(read(Marker::Inline, " x /* y\nz"), (TokenKind::InlineCmt, "// x /* y".into(), Some('\n')));
        assert_eq!(read(Marker::Inline, " at end"), (TokenKind::InlineCmt, "// at end".into(), None));
    }

    #[test]
    fn block_comments_nest() {
        let (kind, lexeme, next) = read(Marker::Block, " a /* b */ c // d\n */x");
        assert_eq!(kind, TokenKind::BlockCmt);
        assert_eq!(lexeme, "/* a /* b */ c // d\n */");
        assert_eq!(next, Some('x'));
    }

    #[test]
    fn open_block_at_eof() {
        let (kind, lexeme, _) = read(Marker::Block, " a /* b */ c\n");
        assert_eq!(kind, TokenKind::UnterminatedComment);
        assert_eq!(lexeme, "/* a /* b */ c\n");
    }
}
