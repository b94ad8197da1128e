use std::fmt;
use std::str::FromStr;

use derivative::Derivative;
use moonc_lang_miette_util::codespan::Span;

macro_rules! token_kinds {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// The lexical category of a token.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum TokenKind {
            $($variant),*
        }

        impl TokenKind {
            pub const ALL: &'static [TokenKind] = &[$(TokenKind::$variant),*];

            /// The name under which the kind appears in token files and grammar files.
            pub fn name(self) -> &'static str {
                match self {
                    $(TokenKind::$variant => $name),*
                }
            }
        }
    };
}

token_kinds! {
    Eq => "eq",
    NotEq => "noteq",
    Lt => "lt",
    Gt => "gt",
    Leq => "leq",
    Geq => "geq",
    Plus => "plus",
    Minus => "minus",
    Mult => "mult",
    Div => "div",
    Assign => "assign",
    Or => "or",
    And => "and",
    Not => "not",
    OpenPar => "openpar",
    ClosePar => "closepar",
    OpenCubr => "opencubr",
    CloseCubr => "closecubr",
    OpenSqbr => "opensqbr",
    CloseSqbr => "closesqbr",
    Semi => "semi",
    Comma => "comma",
    Dot => "dot",
    Colon => "colon",
    ColonColon => "coloncolon",
    Arrow => "arrow",
    Id => "id",
    IntNum => "intnum",
    FloatNum => "floatnum",
    InlineCmt => "inlinecmt",
    BlockCmt => "blockcmt",
    If => "if",
    Then => "then",
    Else => "else",
    Integer => "integer",
    Float => "float",
    Void => "void",
    Public => "public",
    Private => "private",
    Func => "func",
    Var => "var",
    Struct => "struct",
    While => "while",
    Read => "read",
    Write => "write",
    Return => "return",
    SelfKw => "self",
    Inherits => "inherits",
    Let => "let",
    Impl => "impl",
    InvalidChar => "invalidchar",
    InvalidNum => "invalidnum",
    InvalidId => "invalidid",
    UnterminatedComment => "unterminatedcomment",
    Eof => "$",
}

const RESERVED: &[TokenKind] = &[
    TokenKind::If,
    TokenKind::Then,
    TokenKind::Else,
    TokenKind::Integer,
    TokenKind::Float,
    TokenKind::Void,
    TokenKind::Public,
    TokenKind::Private,
    TokenKind::Func,
    TokenKind::Var,
    TokenKind::Struct,
    TokenKind::While,
    TokenKind::Read,
    TokenKind::Write,
    TokenKind::Return,
    TokenKind::SelfKw,
    TokenKind::Inherits,
    TokenKind::Let,
    TokenKind::Impl,
];

impl TokenKind {
    /// The reserved word spelled `lexeme`, if there is one.
    pub fn reserved(lexeme: &str) -> Option<TokenKind> {
        RESERVED.iter().copied().find(|kind| kind.name() == lexeme)
    }

    pub fn is_reserved(self) -> bool {
        RESERVED.contains(&self)
    }

    pub fn is_error(self) -> bool {
        matches!(
            self,
            TokenKind::InvalidChar
                | TokenKind::InvalidNum
                | TokenKind::InvalidId
                | TokenKind::UnterminatedComment
        )
    }

    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::InlineCmt | TokenKind::BlockCmt)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTokenKind(pub String);

impl fmt::Display for UnknownTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown token kind `{}`", self.0)
    }
}

impl std::error::Error for UnknownTokenKind {}

impl FromStr for TokenKind {
    type Err = UnknownTokenKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownTokenKind(s.to_owned()))
    }
}

/// A lexeme together with its category and the position of its first character.
///
/// Equality only considers the kind, the lexeme and the line, so that
/// tokens read back from a token file compare equal to freshly lexed ones.
#[derive(Debug, Clone, Derivative)]
#[derivative(PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
    #[derivative(PartialEq = "ignore", Hash = "ignore")]
    pub column: u32,
    #[derivative(PartialEq = "ignore", Hash = "ignore")]
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32, column: u32) -> Self {
        Token { kind, lexeme: lexeme.into(), line, column, span: Span::initial() }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The end-of-input marker placed after the last token.
    pub fn eof(line: u32, column: u32, offset: u32) -> Self {
        Token::new(TokenKind::Eof, "", line, column).with_span(Span::new(offset, offset))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.kind, escape(&self.lexeme), self.line)
    }
}

/// Escape line breaks so that a lexeme fits on a single output line.
pub fn escape(lexeme: &str) -> String {
    let mut out = String::with_capacity(lexeme.len());
    for c in lexeme.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape`].
pub fn unescape(lexeme: &str) -> String {
    lexeme.replace("\\n", "\n").replace("\\r", "\r")
}
