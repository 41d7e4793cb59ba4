use std::sync::Arc;

/// A saved cursor position.
///
/// Positions are cheap to copy and are what checkpoints, token starts and
/// recorded function-body locations store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourcePos {
    /// Byte offset from start of source.
    pub offset: u32,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub column: u32,
}

impl SourcePos {
    /// The start of a source file.
    pub const START: SourcePos = SourcePos {
        offset: 0,
        line: 1,
        column: 1,
    };
}

/// A cursor over shared source text that tracks position.
///
/// Provides low-level character access with peek/advance semantics and can
/// jump to any previously saved [`SourcePos`].
#[derive(Debug, Clone)]
pub struct Cursor {
    source: Arc<str>,
    pos: SourcePos,
}

impl Cursor {
    /// Create a new cursor at the start of the source.
    pub fn new(source: Arc<str>) -> Self {
        Self {
            source,
            pos: SourcePos::START,
        }
    }

    /// Get the full source text.
    #[inline]
    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    /// Current position.
    #[inline]
    pub fn pos(&self) -> SourcePos {
        self.pos
    }

    /// Jump to a saved position.
    #[inline]
    pub fn seek(&mut self, pos: SourcePos) {
        debug_assert!(self.source.is_char_boundary(pos.offset as usize));
        self.pos = pos;
    }

    /// Current line number (1-indexed).
    #[inline]
    pub fn line(&self) -> u32 {
        self.pos.line
    }

    #[inline]
    fn rest(&self) -> &str {
        &self.source[self.pos.offset as usize..]
    }

    /// Peek at the current character without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        let bytes = self.rest().as_bytes();
        let first = *bytes.first()?;
        if first < 128 {
            Some(first as char)
        } else {
            self.rest().chars().next()
        }
    }

    /// Peek at the nth character ahead (0 = current).
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Check if the current character satisfies a predicate.
    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    /// Check if the upcoming text matches the given string.
    #[inline]
    pub fn check_str(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// Consume the current character and advance.
    ///
    /// Returns the consumed character, or `None` if at EOF.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        let len = ch.len_utf8() as u32;
        self.pos.offset += len;
        if ch == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += len;
        }
        Some(ch)
    }

    /// Consume if the current character matches.
    #[inline]
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate matches, returning the text.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &str {
        let start = self.pos.offset;
        while self.check(&f) {
            self.advance();
        }
        &self.source[start as usize..self.pos.offset as usize]
    }

    /// Get the text between a starting offset and the current position.
    #[inline]
    pub fn slice_from(&self, start: u32) -> &str {
        &self.source[start as usize..self.pos.offset as usize]
    }

    /// Get the text between two offsets.
    #[inline]
    pub fn slice(&self, start: u32, end: u32) -> &str {
        &self.source[start as usize..end as usize]
    }
}

/// Check if a character can start an identifier.
#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier.
#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(text: &str) -> Cursor {
        Cursor::new(Arc::from(text))
    }

    #[test]
    fn cursor_basics() {
        let mut c = cursor("hello");
        assert_eq!(c.peek(), Some('h'));
        assert_eq!(c.advance(), Some('h'));
        assert_eq!(c.peek(), Some('e'));
        assert_eq!(c.pos().offset, 1);
        assert_eq!(c.pos().column, 2);
    }

    #[test]
    fn cursor_tracks_lines() {
        let mut c = cursor("a\nb");
        c.advance();
        c.advance();
        assert_eq!(c.line(), 2);
        assert_eq!(c.pos().column, 1);
    }

    #[test]
    fn cursor_seek_restores_position() {
        let mut c = cursor("one two");
        let saved = c.pos();
        c.eat_while(is_ident_continue);
        assert_eq!(c.slice_from(saved.offset), "one");
        c.seek(saved);
        assert_eq!(c.peek(), Some('o'));
    }
}
