//! Table-driven lexer.
//!
//! Tokens are recognised by the automaton in [`dfa`]. When the automaton
//! accepts a comment opener, the [`comments::CommentStack`] takes over until
//! the comment is balanced.

mod comments;
pub mod dfa;
pub mod token_file;
mod validate;

use log::trace;

use moonc_lang_ast::{Token, TokenKind};
use moonc_lang_miette_util::codespan::Span;

use crate::source::CharSource;

use comments::{CommentStack, Marker};
use dfa::{DFA, State};

/// Iterator over all tokens of a source text, including comments and error tokens.
///
/// The lexer is total: any input yields a token stream.
pub struct Lexer {
    source: CharSource,
    comments: CommentStack,
}

impl Lexer {
    pub fn new(text: &str) -> Self {
        Lexer { source: CharSource::new(text), comments: CommentStack::default() }
    }

    pub fn from_source(source: CharSource) -> Self {
        Lexer { source, comments: CommentStack::default() }
    }

    fn skip_whitespace(&mut self) {
        while self.source.peek().is_some_and(char::is_whitespace) {
            self.source.next_char();
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();
        if self.source.is_eof() {
            return None;
        }
        let start = self.source.position();
        let mut lexeme = String::new();
        let mut state = State::Start;

        loop {
            let c = self.source.next_char();
            state = DFA.step(state, c).unwrap_or_else(|| {
                panic!("lexer table has no transition from {state:?} on {c:?}")
            });
            if let Some(c) = c {
                lexeme.push(c);
            }
            if let Some(backup) = state.backup() {
                // End of input is seen as ANY but was never consumed.
                let pending = if c.is_none() { backup.saturating_sub(1) } else { backup };
                for _ in 0..pending {
                    lexeme.pop();
                    self.source.backup_char();
                }
                break;
            }
        }

        let kind = match state {
            State::InlineOpen => self.comments.read(Marker::Inline, &mut self.source, &mut lexeme),
            State::BlockOpen => self.comments.read(Marker::Block, &mut self.source, &mut lexeme),
            _ => classify(state, &lexeme),
        };
        let end = self.source.position();
        trace!("{kind} {lexeme:?} at {}:{}", start.line, start.column);
        let span = Span::new(start.offset, end.offset);
        Some(Token::new(kind, lexeme, start.line, start.column).with_span(span))
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

/// Lex a whole text.
pub fn lex(text: &str) -> Vec<Token> {
    Lexer::new(text).collect()
}

/// The token kind produced by a final state of the automaton.
fn classify(state: State, lexeme: &str) -> TokenKind {
    use State::*;
    use TokenKind as K;

    let number = |valid: bool, kind: TokenKind| if valid { kind } else { K::InvalidNum };

    match state {
        IdentEnd => K::reserved(lexeme).unwrap_or(K::Id),
        InvalidIdentEnd => K::InvalidId,
        IntegerEnd | DotEnd => number(validate::integer(lexeme), K::IntNum),
        FractionEnd | ExponentEnd | ExponentDigitsEnd => number(validate::float(lexeme), K::FloatNum),
        ExponentSignEnd => K::InvalidNum,
        EqEnd => K::Eq,
        AssignEnd => K::Assign,
        NotEqEnd => K::NotEq,
        LeqEnd => K::Leq,
        LtEnd => K::Lt,
        GeqEnd => K::Geq,
        GtEnd => K::Gt,
        ArrowEnd => K::Arrow,
        MinusEnd => K::Minus,
        ColonColonEnd => K::ColonColon,
        ColonEnd => K::Colon,
        DivEnd => K::Div,
        PlusEnd => K::Plus,
        MultEnd => K::Mult,
        OrEnd => K::Or,
        AndEnd => K::And,
        NotEnd => K::Not,
        OpenParEnd => K::OpenPar,
        CloseParEnd => K::ClosePar,
        OpenCubrEnd => K::OpenCubr,
        CloseCubrEnd => K::CloseCubr,
        OpenSqbrEnd => K::OpenSqbr,
        CloseSqbrEnd => K::CloseSqbr,
        SemiEnd => K::Semi,
        CommaEnd => K::Comma,
        DotOpEnd => K::Dot,
        InvalidCharEnd => K::InvalidChar,
        _ => unreachable!("{state:?} is not a token-producing state"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(TokenKind, String)> {
        lex(text).into_iter().map(|t| (t.kind, t.lexeme)).collect()
    }

    fn pairs(expected: &[(TokenKind, &str)]) -> Vec<(TokenKind, String)> {
        expected.iter().map(|(k, l)| (*k, l.to_string())).collect()
    }

    #[test]
    fn operators_and_punctuation() {
        use TokenKind::*;
        assert_eq!(
            kinds("== + | ( ; if <> - & ) , then < * ! { . else > / [ : integer <= = ] :: float >= } -> void"),
            pairs(&[
                (Eq, "=="), (Plus, "+"), (Or, "|"), (OpenPar, "("), (Semi, ";"), (If, "if"),
                (NotEq, "<>"), (Minus, "-"), (And, "&"), (ClosePar, ")"), (Comma, ","), (Then, "then"),
                (Lt, "<"), (Mult, "*"), (Not, "!"), (OpenCubr, "{"), (Dot, "."), (Else, "else"),
                (Gt, ">"), (Div, "/"), (OpenSqbr, "["), (Colon, ":"), (Integer, "integer"),
                (Leq, "<="), (Assign, "="), (CloseSqbr, "]"), (ColonColon, "::"), (Float, "float"),
                (Geq, ">="), (CloseCubr, "}"), (Arrow, "->"), (Void, "void"),
            ])
        );
    }

    #[test]
    fn adjacent_tokens_need_no_whitespace() {
        use TokenKind::*;
        assert_eq!(
            kinds("x=a[1]<>-2;"),
            pairs(&[
                (Id, "x"), (Assign, "="), (Id, "a"), (OpenSqbr, "["), (IntNum, "1"),
                (CloseSqbr, "]"), (NotEq, "<>"), (Minus, "-"), (IntNum, "2"), (Semi, ";"),
            ])
        );
    }

    #[test]
    fn numbers() {
        use TokenKind::*;
        assert_eq!(
            kinds("0 1 10 1.23 12.34 120.34e10 12345.6789e-123 0.0 1.0"),
            pairs(&[
                (IntNum, "0"), (IntNum, "1"), (IntNum, "10"), (FloatNum, "1.23"),
                (FloatNum, "12.34"), (FloatNum, "120.34e10"), (FloatNum, "12345.6789e-123"),
                (FloatNum, "0.0"), (FloatNum, "1.0"),
            ])
        );
    }

    #[test]
    fn invalid_numbers() {
        use TokenKind::*;
        assert_eq!(
            kinds("00 01 010 0010 01.23 12.340 012.34 12.34e01 12.34e010"),
            pairs(&[
                (InvalidNum, "00"), (InvalidNum, "01"), (InvalidNum, "010"), (InvalidNum, "0010"),
                (InvalidNum, "01.23"), (InvalidNum, "12.340"), (InvalidNum, "012.34"),
                (InvalidNum, "12.34e01"), (InvalidNum, "12.34e010"),
            ])
        );
    }

    #[test]
    fn double_backup() {
        use TokenKind::*;
        assert_eq!(kinds("12.x"), pairs(&[(IntNum, "12"), (Dot, "."), (Id, "x")]));
        assert_eq!(kinds("12."), pairs(&[(IntNum, "12"), (Dot, ".")]));
        assert_eq!(kinds("1.5ex"), pairs(&[(FloatNum, "1.5"), (Id, "ex")]));
        assert_eq!(kinds("1.5e"), pairs(&[(FloatNum, "1.5"), (Id, "e")]));
        assert_eq!(kinds("1.5e+;"), pairs(&[(InvalidNum, "1.5e+"), (Semi, ";")]));
    }

    #[test]
    fn identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("abc abc1 a_1 _abc 1abc _1abc self selfie"),
            pairs(&[
                (Id, "abc"), (Id, "abc1"), (Id, "a_1"), (InvalidId, "_abc"), (InvalidId, "1abc"),
                (InvalidId, "_1abc"), (SelfKw, "self"), (Id, "selfie"),
            ])
        );
    }

    #[test]
    fn invalid_characters() {
        use TokenKind::*;
        assert_eq!(
            kinds("@ # $ ' \\ ~"),
            pairs(&[
                (InvalidChar, "@"), (InvalidChar, "#"), (InvalidChar, "$"), (InvalidChar, "'"),
                (InvalidChar, "\\"), (InvalidChar, "~"),
            ])
        );
    }

    #[test]
    fn comments() {
        use TokenKind::*;
        assert_eq!(
            kinds("a // note\n/* x /* y */ z */ b"),
            pairs(&[
                (Id, "a"), (InlineCmt, "// note"), (BlockCmt, "/* x /* y */ z */"), (Id, "b"),
            ])
        );
    }

    #[test]
    fn unterminated_comment_reports_its_start() {
        let tokens = lex("x\n\n/* this is a single line block comment\n");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].kind, TokenKind::UnterminatedComment);
        assert_eq!(tokens[1].lexeme, "/* this is a single line block comment\n");
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn positions() {
        let tokens = lex("let x\n  : integer;");
        let pos: Vec<(u32, u32)> = tokens.iter().map(|t| (t.line, t.column)).collect();
        assert_eq!(pos, vec![(1, 1), (1, 5), (2, 3), (2, 5), (2, 12)]);
    }

    #[test]
    fn every_byte_is_accounted_for() {
        let text = "struct A { public let x: integer[2]; }; // c\n 1.5e 0a @ /* o */ 12.";
        let mut rebuilt = String::new();
        let mut cursor = 0;
        for token in lex(text) {
            let start = token.span.start().to_usize();
            assert!(text[cursor..start].chars().all(char::is_whitespace));
            rebuilt.push_str(&text[cursor..start]);
            assert_eq!(&text[start..token.span.end().to_usize()], token.lexeme);
            rebuilt.push_str(&token.lexeme);
            cursor = token.span.end().to_usize();
        }
        rebuilt.push_str(&text[cursor..]);
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn empty_input() {
        assert!(lex("").is_empty());
        assert!(lex(" \n\t ").is_empty());
    }
}
