//! Checks applied to numeric lexemes once the automaton has accepted them.

/// `nonzero digit* | 0`
pub fn integer(digits: &str) -> bool {
    !(digits.len() > 1 && digits.starts_with('0'))
}

/// `digit* nonzero | 0`, without the leading dot.
pub fn fraction(digits: &str) -> bool {
    !(digits.len() > 1 && digits.ends_with('0'))
}

/// `[1-9][0-9]*`
pub fn exponent(digits: &str) -> bool {
    digits.starts_with(|c: char| ('1'..='9').contains(&c))
        && digits.chars().all(|c| c.is_ascii_digit())
}

/// Validate a lexeme of the shape `int . frac [e [+|-] exp]`.
pub fn float(lexeme: &str) -> bool {
    let Some((int, rest)) = lexeme.split_once('.') else {
        return false;
    };
    let (frac, exp) = match rest.split_once('e') {
        Some((frac, exp)) => (frac, Some(exp.trim_start_matches(['+', '-']))),
        None => (rest, None),
    };
    integer(int) && fraction(frac) && exp.is_none_or(exponent)
}
