//! Token types produced by the lexer.

use std::fmt;

use unrealscript_core::{ConstValue, Span};

use super::cursor::SourcePos;

/// The class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// End of input.
    Eof,
    /// An identifier or keyword. Keywords are not distinguished.
    Identifier,
    /// Punctuation or an operator, possibly a digraph such as `+=`.
    Symbol,
    /// A literal constant; the value is in [`Token::value`].
    Const,
}

/// A single lexical unit with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What class of token this is.
    pub kind: TokenKind,
    /// Source text of identifiers and symbols, or the raw literal text.
    pub text: String,
    /// Value of constant tokens.
    pub value: Option<ConstValue>,
    /// Where the token began.
    pub span: Span,
    /// Cursor position before the token, for rewinding.
    pub start: SourcePos,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, text: impl Into<String>, span: Span, start: SourcePos) -> Self {
        Self {
            kind,
            text: text.into(),
            value: None,
            span,
            start,
        }
    }

    pub(crate) fn constant(value: ConstValue, text: impl Into<String>, span: Span, start: SourcePos) -> Self {
        Self {
            kind: TokenKind::Const,
            text: text.into(),
            value: Some(value),
            span,
            start,
        }
    }

    /// Whether this is the end-of-input token.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Whether this is an identifier.
    #[inline]
    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    /// Whether this is a symbol.
    #[inline]
    pub fn is_symbol(&self) -> bool {
        self.kind == TokenKind::Symbol
    }

    /// Whether this is a constant.
    #[inline]
    pub fn is_const(&self) -> bool {
        self.kind == TokenKind::Const
    }

    /// Case-insensitive identifier match.
    pub fn matches_identifier(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text.eq_ignore_ascii_case(name)
    }

    /// Exact symbol match.
    pub fn matches_symbol(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == symbol
    }

    /// Match either an identifier (case-insensitively) or a symbol.
    pub fn matches(&self, text: &str) -> bool {
        match self.kind {
            TokenKind::Identifier => self.text.eq_ignore_ascii_case(text),
            TokenKind::Symbol => self.text == text,
            _ => false,
        }
    }

    /// The integer value of an int or byte constant.
    pub fn int_value(&self) -> Option<i32> {
        match self.value {
            Some(ConstValue::Int(v)) => Some(v),
            Some(ConstValue::Byte(v)) => Some(v as i32),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of file"),
            _ => f.write_str(&self.text),
        }
    }
}

/// Two- and three-character symbols recognized as a single token.
pub const DIGRAPHS: &[&str] = &[
    "<<", ">>", "!=", "<=", ">=", "++", "--", "+=", "-=", "*=", "/=", "&&", "||", "^^", "==",
    "**", "~=", "@=", "$=",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_matches_ignore_case() {
        let token = Token::new(
            TokenKind::Identifier,
            "Function",
            Span::new(1, 1, 8),
            SourcePos::START,
        );
        assert!(token.matches_identifier("function"));
        assert!(token.matches("FUNCTION"));
        assert!(!token.matches_symbol("function"));
    }

    #[test]
    fn symbols_match_exactly() {
        let token = Token::new(TokenKind::Symbol, "+=", Span::new(1, 1, 2), SourcePos::START);
        assert!(token.matches("+="));
        assert!(!token.matches("+"));
    }
}
