use std::sync::LazyLock;

use moonc_lang_ast::HashMap;

/// States of the lexer automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Start,
    // identifiers
    Ident,
    IdentEnd,
    InvalidIdent,
    InvalidIdentEnd,
    // numbers
    Integer,
    IntegerEnd,
    FractionStart,
    DotEnd,
    Fraction,
    FractionEnd,
    Exponent,
    ExponentEnd,
    ExponentSign,
    ExponentSignEnd,
    ExponentDigits,
    ExponentDigitsEnd,
    // operators with lookahead
    Equal,
    EqEnd,
    AssignEnd,
    Less,
    NotEqEnd,
    LeqEnd,
    LtEnd,
    Greater,
    GeqEnd,
    GtEnd,
    Minus,
    ArrowEnd,
    MinusEnd,
    Colon,
    ColonColonEnd,
    ColonEnd,
    Slash,
    InlineOpen,
    BlockOpen,
    DivEnd,
    // single character tokens
    PlusEnd,
    MultEnd,
    OrEnd,
    AndEnd,
    NotEnd,
    OpenParEnd,
    CloseParEnd,
    OpenCubrEnd,
    CloseCubrEnd,
    OpenSqbrEnd,
    CloseSqbrEnd,
    SemiEnd,
    CommaEnd,
    DotOpEnd,
    InvalidCharEnd,
}

impl State {
    /// For final states, how many characters must be given back to the source.
    pub fn backup(self) -> Option<usize> {
        use State::*;
        match self {
            DotEnd | ExponentEnd => Some(2),
            IdentEnd | InvalidIdentEnd | IntegerEnd | FractionEnd | ExponentSignEnd
            | ExponentDigitsEnd | AssignEnd | LtEnd | GtEnd | MinusEnd | ColonEnd | DivEnd => {
                Some(1)
            }
            EqEnd | NotEqEnd | LeqEnd | GeqEnd | ArrowEnd | ColonColonEnd | InlineOpen
            | BlockOpen | PlusEnd | MultEnd | OrEnd | AndEnd | NotEnd | OpenParEnd
            | CloseParEnd | OpenCubrEnd | CloseCubrEnd | OpenSqbrEnd | CloseSqbrEnd | SemiEnd
            | CommaEnd | DotOpEnd | InvalidCharEnd => Some(0),
            Start | Ident | InvalidIdent | Integer | FractionStart | Fraction | Exponent
            | ExponentSign | ExponentDigits | Equal | Less | Greater | Minus | Colon | Slash => {
                None
            }
        }
    }

    pub fn is_final(self) -> bool {
        self.backup().is_some()
    }
}

/// What a transition is keyed on besides the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    Char(char),
    /// `[A-Za-z]`
    Letter,
    /// Anything not matched otherwise, including end of input.
    Any,
}

pub struct Dfa {
    transitions: HashMap<(State, Input), State>,
}

impl Dfa {
    /// Follow the transition for `c`. Literal characters take precedence over
    /// `LETTER`, which takes precedence over `ANY`.
    pub fn step(&self, state: State, c: Option<char>) -> Option<State> {
        let literal = c.and_then(|c| self.transitions.get(&(state, Input::Char(c))));
        let letter = c
            .filter(char::is_ascii_alphabetic)
            .and_then(|_| self.transitions.get(&(state, Input::Letter)));
        literal.or(letter).or_else(|| self.transitions.get(&(state, Input::Any))).copied()
    }
}

pub static DFA: LazyLock<Dfa> = LazyLock::new(build);

const DIGITS: &str = "0123456789";

fn build() -> Dfa {
    use Input::*;
    use State::*;

    let mut t: HashMap<(State, Input), State> = HashMap::default();

    // identifiers
    t.insert((Start, Letter), Ident);
    t.insert((Ident, Letter), Ident);
    digits(&mut t, Ident, Ident);
    t.insert((Ident, Char('_')), Ident);
    t.insert((Ident, Any), IdentEnd);

    t.insert((Start, Char('_')), InvalidIdent);
    t.insert((InvalidIdent, Letter), InvalidIdent);
    digits(&mut t, InvalidIdent, InvalidIdent);
    t.insert((InvalidIdent, Char('_')), InvalidIdent);
    t.insert((InvalidIdent, Any), InvalidIdentEnd);

    // numbers
    digits(&mut t, Start, Integer);
    digits(&mut t, Integer, Integer);
    t.insert((Integer, Char('.')), FractionStart);
    t.insert((Integer, Letter), InvalidIdent);
    t.insert((Integer, Char('_')), InvalidIdent);
    t.insert((Integer, Any), IntegerEnd);

    digits(&mut t, FractionStart, Fraction);
    t.insert((FractionStart, Any), DotEnd);

    digits(&mut t, Fraction, Fraction);
    t.insert((Fraction, Char('e')), Exponent);
    t.insert((Fraction, Any), FractionEnd);

    digits(&mut t, Exponent, ExponentDigits);
    t.insert((Exponent, Char('+')), ExponentSign);
    t.insert((Exponent, Char('-')), ExponentSign);
    t.insert((Exponent, Any), ExponentEnd);

    digits(&mut t, ExponentSign, ExponentDigits);
    t.insert((ExponentSign, Any), ExponentSignEnd);

    digits(&mut t, ExponentDigits, ExponentDigits);
    t.insert((ExponentDigits, Any), ExponentDigitsEnd);

    // operators that need a second character
    t.insert((Start, Char('=')), Equal);
    t.insert((Equal, Char('=')), EqEnd);
    t.insert((Equal, Any), AssignEnd);

    t.insert((Start, Char('<')), Less);
    t.insert((Less, Char('>')), NotEqEnd);
    t.insert((Less, Char('=')), LeqEnd);
    t.insert((Less, Any), LtEnd);

    t.insert((Start, Char('>')), Greater);
    t.insert((Greater, Char('=')), GeqEnd);
    t.insert((Greater, Any), GtEnd);

    t.insert((Start, Char('-')), Minus);
    t.insert((Minus, Char('>')), ArrowEnd);
    t.insert((Minus, Any), MinusEnd);

    t.insert((Start, Char(':')), Colon);
    t.insert((Colon, Char(':')), ColonColonEnd);
    t.insert((Colon, Any), ColonEnd);

    t.insert((Start, Char('/')), Slash);
    t.insert((Slash, Char('/')), InlineOpen);
    t.insert((Slash, Char('*')), BlockOpen);
    t.insert((Slash, Any), DivEnd);

    // single characters
    for (c, end) in [
        ('+', PlusEnd),
        ('*', MultEnd),
        ('|', OrEnd),
        ('&', AndEnd),
        ('!', NotEnd),
        ('(', OpenParEnd),
        (')', CloseParEnd),
        ('{', OpenCubrEnd),
        ('}', CloseCubrEnd),
        ('[', OpenSqbrEnd),
        (']', CloseSqbrEnd),
        (';', SemiEnd),
        (',', CommaEnd),
        ('.', DotOpEnd),
    ] {
        t.insert((Start, Char(c)), end);
    }
    t.insert((Start, Any), InvalidCharEnd);

    Dfa { transitions: t }
}

fn digits(t: &mut HashMap<(State, Input), State>, from: State, to: State) {
    for d in DIGITS.chars() {
        t.insert((from, Input::Char(d)), to);
    }
}
