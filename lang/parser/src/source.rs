use moonc_lang_miette_util::codespan::ByteIndex;

/// A line/column pair together with the byte offset it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: ByteIndex,
}

/// Random-access character buffer with a cursor.
///
/// Positions of all characters are computed up front, so backing up is O(1)
/// and line/column stay exact across line breaks.
pub struct CharSource {
    chars: Vec<char>,
    positions: Vec<Position>,
    cursor: usize,
}

impl CharSource {
    pub fn new(text: &str) -> Self {
        let mut chars = Vec::with_capacity(text.len());
        let mut positions = Vec::with_capacity(text.len() + 1);
        let (mut line, mut column) = (1, 1);
        for (offset, c) in text.char_indices() {
            chars.push(c);
            positions.push(Position { line, column, offset: ByteIndex(offset as u32) });
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        positions.push(Position { line, column, offset: ByteIndex(text.len() as u32) });
        CharSource { chars, positions, cursor: 0 }
    }

    /// Decode raw bytes, replacing invalid UTF-8 sequences.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        CharSource::new(&String::from_utf8_lossy(bytes))
    }

    pub fn next_char(&mut self) -> Option<char> {
        let c = self.chars.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(c)
    }

    /// Step back over the most recently returned character and return it.
    pub fn backup_char(&mut self) -> Option<char> {
        self.cursor = self.cursor.checked_sub(1)?;
        Some(self.chars[self.cursor])
    }

    pub fn peek(&self) -> Option<char> {
        self.peek_nth(0)
    }

    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.get(self.cursor + n).copied()
    }

    /// The most recently returned character.
    pub fn peek_back(&self) -> Option<char> {
        self.cursor.checked_sub(1).map(|idx| self.chars[idx])
    }

    /// Whether the upcoming characters spell `pattern`.
    pub fn lookahead_is(&self, pattern: &str) -> bool {
        pattern.chars().enumerate().all(|(n, c)| self.peek_nth(n) == Some(c))
    }

    /// Line of the most recently returned character.
    pub fn line(&self) -> u32 {
        self.last_position().line
    }

    /// Column of the most recently returned character.
    pub fn column(&self) -> u32 {
        self.last_position().column
    }

    fn last_position(&self) -> Position {
        match self.cursor.checked_sub(1) {
            Some(idx) => self.positions[idx],
            None => Position { line: 1, column: 0, offset: ByteIndex(0) },
        }
    }

    /// Position of the next character to be read, or of the end of input.
    pub fn position(&self) -> Position {
        self.positions[self.cursor]
    }

    pub fn is_eof(&self) -> bool {
        self.cursor >= self.chars.len()
    }
}
