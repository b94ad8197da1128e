//! This module contains the symbols and keywords of the source language.
//! These constants are used when we prettyprint source code.

// Symbols
//
//

/// The symbol `->`
pub const ARROW: &str = "->";

/// The symbol `,`
pub const COMMA: &str = ",";

/// The symbol `:`
pub const COLON: &str = ":";

/// The symbol `;`
pub const SEMI: &str = ";";

/// The symbol `.`
pub const DOT: &str = ".";

/// The symbol `=`
pub const ASSIGN: &str = "=";

/// The symbol `!`
pub const NOT: &str = "!";

// Keywords
//
//

pub const STRUCT: &str = "struct";

pub const IMPL: &str = "impl";

pub const INHERITS: &str = "inherits";

pub const FUNC: &str = "func";

pub const LET: &str = "let";

pub const IF: &str = "if";

pub const THEN: &str = "then";

pub const ELSE: &str = "else";

pub const WHILE: &str = "while";

pub const READ: &str = "read";

pub const WRITE: &str = "write";

pub const RETURN: &str = "return";
