//! Main lexer implementation for UnrealScript.
//!
//! The compiler drives the [`Lexer`] one token at a time and leans on
//! rewinding instead of lookahead: a token remembers where it started, so an
//! interpretation that does not pan out is undone with
//! [`unget_token`](Lexer::unget_token) or a [`LexCheckpoint`].

use std::sync::Arc;

use ordered_float::OrderedFloat;
use unrealscript_core::limits::{MAX_IDENTIFIER_LENGTH, MAX_NAME_LENGTH, MAX_STRING_CONST_LENGTH};
use unrealscript_core::{ConstValue, LexError, Name, ObjectRef, Span};

use super::cursor::{Cursor, SourcePos, is_ident_continue, is_ident_start};
use super::token::{DIGRAPHS, Token, TokenKind};

/// Characters that may not appear in a name literal.
const INVALID_NAME_CHARS: &[char] = &['"', '\'', ' ', ',', '\n', '\r', '\t'];

/// An opaque saved lexer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexCheckpoint {
    pos: SourcePos,
}

impl LexCheckpoint {
    /// The saved source position.
    pub fn pos(&self) -> SourcePos {
        self.pos
    }
}

/// Tokenizer over one UnrealScript source file.
#[derive(Debug, Clone)]
pub struct Lexer {
    cursor: Cursor,
    /// Most recent `/** */` comment, pending use as a tooltip.
    prev_comment: Option<String>,
}

impl Lexer {
    /// Create a lexer over the given source text.
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self {
            cursor: Cursor::new(source.into()),
            prev_comment: None,
        }
    }

    /// The full source text.
    pub fn source(&self) -> &Arc<str> {
        self.cursor.source()
    }

    /// Current position.
    pub fn position(&self) -> SourcePos {
        self.cursor.pos()
    }

    /// Jump to a recorded position.
    pub fn seek(&mut self, pos: SourcePos) {
        self.cursor.seek(pos);
    }

    /// Current line number.
    pub fn line(&self) -> u32 {
        self.cursor.line()
    }

    /// A span at the current position.
    pub fn here(&self) -> Span {
        let pos = self.cursor.pos();
        Span::point(pos.line, pos.column)
    }

    /// Text between two recorded positions.
    pub fn text_between(&self, start: SourcePos, end: SourcePos) -> &str {
        self.cursor.slice(start.offset, end.offset)
    }

    /// Save the current state.
    pub fn checkpoint(&self) -> LexCheckpoint {
        LexCheckpoint {
            pos: self.cursor.pos(),
        }
    }

    /// Rewind to a saved state.
    pub fn restore(&mut self, checkpoint: LexCheckpoint) {
        self.cursor.seek(checkpoint.pos);
    }

    /// Push a token back so the next read returns it again.
    pub fn unget_token(&mut self, token: &Token) {
        self.cursor.seek(token.start);
    }

    // =========================================
    // Comments
    // =========================================

    /// Take the pending doc comment, leaving none.
    pub fn take_comment(&mut self) -> Option<String> {
        self.prev_comment.take()
    }

    /// Drop the pending doc comment.
    pub fn clear_comment(&mut self) {
        self.prev_comment = None;
    }

    /// Consume a `//` comment that follows on the current line, if any.
    pub fn trailing_comment(&mut self) -> Option<String> {
        let saved = self.cursor.pos();
        while self.cursor.check(|c| c == ' ' || c == '\t' || c == '\r') {
            self.cursor.advance();
        }
        if !self.cursor.check_str("//") {
            self.cursor.seek(saved);
            return None;
        }
        self.cursor.advance();
        self.cursor.advance();
        let text = self.cursor.eat_while(|c| c != '\n').trim().to_string();
        if text.is_empty() { None } else { Some(text) }
    }

    /// Skip whitespace and comments, recording doc comments.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        if self.cursor.check_str("\u{FEFF}") {
            self.cursor.advance();
        }
        loop {
            match self.cursor.peek() {
                Some(c) if c.is_whitespace() => {
                    self.cursor.advance();
                }
                Some('/') if self.cursor.check_str("//") => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                Some('/') if self.cursor.check_str("/*") => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.cursor.pos();
        let is_doc = self.cursor.check_str("/**") && !self.cursor.check_str("/**/");
        self.cursor.advance();
        self.cursor.advance();
        let body_start = self.cursor.pos().offset;
        loop {
            if self.cursor.check_str("*/") {
                let body_end = self.cursor.pos().offset;
                self.cursor.advance();
                self.cursor.advance();
                if is_doc {
                    let body = self.cursor.slice(body_start + 1, body_end);
                    self.prev_comment = Some(clean_doc_comment(body));
                }
                return Ok(());
            }
            if self.cursor.advance().is_none() {
                return Err(LexError::UnterminatedComment {
                    span: Span::point(start.line, start.column),
                });
            }
        }
    }

    // =========================================
    // Token scanning
    // =========================================

    /// Read the next token.
    ///
    /// With `no_consts` unset, `true`, `false`, `None`, `vect(...)` and
    /// `rot(...)` are returned as constants rather than identifiers.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn get_token(&mut self, no_consts: bool) -> Result<Token, LexError> {
        self.skip_trivia()?;
        let start = self.cursor.pos();
        let Some(c) = self.cursor.peek() else {
            return Ok(Token::new(
                TokenKind::Eof,
                "",
                Span::point(start.line, start.column),
                start,
            ));
        };
        match c {
            '"' => self.scan_string(start),
            '\'' => self.scan_name(start),
            c if c.is_ascii_digit() => self.scan_number(start),
            '.' if self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.scan_number(start)
            }
            c if is_ident_start(c) => self.scan_identifier(start, no_consts),
            _ => Ok(self.scan_symbol(start)),
        }
    }

    /// Read the next token without consuming it.
    pub fn peek_token(&mut self) -> Result<Token, LexError> {
        let saved = self.cursor.pos();
        let token = self.get_token(true);
        self.cursor.seek(saved);
        token
    }

    /// Whether the next token is the given symbol, without consuming it.
    pub fn peek_symbol(&mut self, symbol: &str) -> Result<bool, LexError> {
        Ok(self.peek_token()?.matches_symbol(symbol))
    }

    /// Whether the next token is the given identifier, without consuming it.
    pub fn peek_identifier(&mut self, name: &str) -> Result<bool, LexError> {
        Ok(self.peek_token()?.matches_identifier(name))
    }

    /// Consume the next token if it is the given symbol.
    pub fn match_symbol(&mut self, symbol: &str) -> Result<bool, LexError> {
        let saved = self.cursor.pos();
        let token = self.get_token(true)?;
        if token.matches_symbol(symbol) {
            Ok(true)
        } else {
            self.cursor.seek(saved);
            Ok(false)
        }
    }

    /// Consume the next token if it is the given identifier (any case).
    pub fn match_identifier(&mut self, name: &str) -> Result<bool, LexError> {
        let saved = self.cursor.pos();
        let token = self.get_token(true)?;
        if token.matches_identifier(name) {
            Ok(true)
        } else {
            self.cursor.seek(saved);
            Ok(false)
        }
    }

    /// Consume a single `>` closing a type argument list, even when it is the
    /// first character of `>>` or `>>>`.
    pub fn match_closing_angle(&mut self) -> Result<bool, LexError> {
        self.skip_trivia()?;
        Ok(self.cursor.eat('>'))
    }

    fn scan_identifier(&mut self, start: SourcePos, no_consts: bool) -> Result<Token, LexError> {
        let text = self.cursor.eat_while(is_ident_continue).to_string();
        let span = Span::new(start.line, start.column, text.len() as u32);
        if text.len() > MAX_IDENTIFIER_LENGTH {
            return Err(LexError::IdentifierTooLong {
                span,
                max: MAX_IDENTIFIER_LENGTH,
            });
        }
        if !no_consts {
            let lower = text.to_ascii_lowercase();
            match lower.as_str() {
                "true" => return Ok(Token::constant(ConstValue::Bool(true), text, span, start)),
                "false" => return Ok(Token::constant(ConstValue::Bool(false), text, span, start)),
                "none" => {
                    return Ok(Token::constant(
                        ConstValue::Object(ObjectRef::NONE),
                        text,
                        span,
                        start,
                    ));
                }
                "vect" | "rot" => {
                    if let Some(value) = self.scan_struct_literal(&lower, start)? {
                        let raw = self.cursor.slice_from(start.offset).to_string();
                        return Ok(Token::constant(value, raw, span, start));
                    }
                }
                _ => {}
            }
        }
        Ok(Token::new(TokenKind::Identifier, text, span, start))
    }

    /// Scan the `(a,b,c)` part of `vect(...)` or `rot(...)`.
    ///
    /// Returns `None`, consuming nothing, when no `(` follows.
    fn scan_struct_literal(&mut self, which: &str, start: SourcePos) -> Result<Option<ConstValue>, LexError> {
        let after_ident = self.cursor.pos();
        self.skip_trivia()?;
        if !self.cursor.eat('(') {
            self.cursor.seek(after_ident);
            return Ok(None);
        }
        let mut parts = [0.0f64; 3];
        for (i, part) in parts.iter_mut().enumerate() {
            if i > 0 {
                self.skip_trivia()?;
                if !self.cursor.eat(',') {
                    return Err(self.bad_struct_literal(start));
                }
            }
            self.skip_trivia()?;
            *part = self.scan_signed_number(start)?;
        }
        self.skip_trivia()?;
        if !self.cursor.eat(')') {
            return Err(self.bad_struct_literal(start));
        }
        let value = if which == "vect" {
            ConstValue::Vector(parts.map(|v| OrderedFloat(v as f32)))
        } else {
            ConstValue::Rotator(parts.map(|v| v as i32))
        };
        Ok(Some(value))
    }

    fn scan_signed_number(&mut self, start: SourcePos) -> Result<f64, LexError> {
        let negative = if self.cursor.eat('-') {
            true
        } else {
            self.cursor.eat('+');
            false
        };
        let pos = self.cursor.pos();
        if !self.cursor.check(|c| c.is_ascii_digit() || c == '.') {
            return Err(self.bad_struct_literal(start));
        }
        let value = match self.scan_number(pos)?.value {
            Some(ConstValue::Int(v)) => v as f64,
            Some(ConstValue::Float(v)) => v.into_inner() as f64,
            _ => return Err(self.bad_struct_literal(start)),
        };
        Ok(if negative { -value } else { value })
    }

    fn bad_struct_literal(&self, start: SourcePos) -> LexError {
        LexError::InvalidNumber {
            span: Span::point(start.line, start.column),
            text: self.cursor.slice_from(start.offset).to_string(),
        }
    }

    fn scan_number(&mut self, start: SourcePos) -> Result<Token, LexError> {
        if self.cursor.check_str("0x") || self.cursor.check_str("0X") {
            self.cursor.advance();
            self.cursor.advance();
            let digits = self.cursor.eat_while(|c| c.is_ascii_hexdigit()).to_string();
            let text = self.cursor.slice_from(start.offset).to_string();
            let span = Span::new(start.line, start.column, text.len() as u32);
            return match u32::from_str_radix(&digits, 16) {
                Ok(v) => Ok(Token::constant(ConstValue::Int(v as i32), text, span, start)),
                Err(_) => Err(LexError::InvalidNumber { span, text }),
            };
        }

        let mut is_float = false;
        self.cursor.eat_while(|c| c.is_ascii_digit());
        if self.cursor.peek() == Some('.')
            && !self.cursor.peek_nth(1).is_some_and(|c| is_ident_start(c) || c == '.')
        {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
            is_float = true;
        }
        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            let has_exponent = match self.cursor.peek_nth(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => self.cursor.peek_nth(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if has_exponent {
                self.cursor.advance();
                if !self.cursor.eat('+') {
                    self.cursor.eat('-');
                }
                self.cursor.eat_while(|c| c.is_ascii_digit());
                is_float = true;
            }
        }
        let digits_end = self.cursor.pos().offset;
        if matches!(self.cursor.peek(), Some('f' | 'F'))
            && !self.cursor.peek_nth(1).is_some_and(is_ident_continue)
        {
            self.cursor.advance();
            is_float = true;
        }

        let literal = self.cursor.slice(start.offset, digits_end).to_string();
        let text = self.cursor.slice_from(start.offset).to_string();
        let span = Span::new(start.line, start.column, text.len() as u32);
        if is_float {
            let value = literal
                .parse::<f32>()
                .map_err(|_| LexError::InvalidNumber { span, text: text.clone() })?;
            Ok(Token::constant(ConstValue::Float(OrderedFloat(value)), text, span, start))
        } else {
            let value = literal
                .parse::<u64>()
                .ok()
                .filter(|v| *v <= u32::MAX as u64)
                .ok_or_else(|| LexError::InvalidNumber { span, text: text.clone() })?;
            Ok(Token::constant(ConstValue::Int(value as u32 as i32), text, span, start))
        }
    }

    fn scan_string(&mut self, start: SourcePos) -> Result<Token, LexError> {
        self.cursor.advance();
        let span = Span::point(start.line, start.column);
        let mut value = String::new();
        loop {
            match self.cursor.advance() {
                None | Some('\n') | Some('\r') => {
                    return Err(LexError::UnterminatedString { span });
                }
                Some('"') => break,
                Some('\\') => match self.cursor.advance() {
                    None | Some('\n') => return Err(LexError::UnterminatedString { span }),
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some(c) => value.push(c),
                },
                Some(c) => value.push(c),
            }
            if value.len() > MAX_STRING_CONST_LENGTH {
                return Err(LexError::StringTooLong {
                    span,
                    max: MAX_STRING_CONST_LENGTH,
                });
            }
        }
        let text = self.cursor.slice_from(start.offset).to_string();
        let span = Span::new(start.line, start.column, text.len() as u32);
        Ok(Token::constant(ConstValue::String(value), text, span, start))
    }

    fn scan_name(&mut self, start: SourcePos) -> Result<Token, LexError> {
        self.cursor.advance();
        let span = Span::point(start.line, start.column);
        let mut value = String::new();
        loop {
            match self.cursor.advance() {
                None | Some('\n') | Some('\r') => {
                    return Err(LexError::UnterminatedName { span });
                }
                Some('\'') => break,
                Some('\\') => match self.cursor.advance() {
                    None | Some('\n') => return Err(LexError::UnterminatedName { span }),
                    Some(c) => value.push(c),
                },
                Some(c) => value.push(c),
            }
            if value.len() > MAX_NAME_LENGTH {
                return Err(LexError::NameTooLong {
                    span,
                    max: MAX_NAME_LENGTH,
                });
            }
        }
        if value.contains(INVALID_NAME_CHARS) {
            return Err(LexError::InvalidName { span, text: value });
        }
        let name = if value.is_empty() {
            Name::none()
        } else {
            Name::new(&value)
        };
        let text = self.cursor.slice_from(start.offset).to_string();
        let span = Span::new(start.line, start.column, text.len() as u32);
        Ok(Token::constant(ConstValue::Name(name), text, span, start))
    }

    fn scan_symbol(&mut self, start: SourcePos) -> Token {
        let symbol = if self.cursor.check_str(">>>") {
            ">>>"
        } else if let Some(digraph) = DIGRAPHS.iter().find(|d| self.cursor.check_str(d)) {
            *digraph
        } else {
            ""
        };
        let text = if symbol.is_empty() {
            self.cursor.advance().map(String::from).unwrap_or_default()
        } else {
            for _ in 0..symbol.len() {
                self.cursor.advance();
            }
            symbol.to_string()
        };
        let span = Span::new(start.line, start.column, text.len() as u32);
        Token::new(TokenKind::Symbol, text, span, start)
    }

    // =========================================
    // Raw text capture
    // =========================================

    /// Skip a brace-delimited block whose `{` was already consumed, returning
    /// the text between the braces. The closing `}` is consumed.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn skip_braces(&mut self) -> Result<String, LexError> {
        let start = self.cursor.pos();
        let mut depth = 1u32;
        loop {
            let here = self.cursor.pos();
            match self.cursor.peek() {
                None => {
                    return Err(LexError::UnexpectedEof {
                        span: Span::point(start.line, start.column),
                        context: "braced block",
                    });
                }
                Some('"') | Some('\'') => self.skip_quoted()?,
                Some('/') if self.cursor.check_str("//") => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                Some('/') if self.cursor.check_str("/*") => {
                    let pending = self.prev_comment.take();
                    self.skip_block_comment()?;
                    self.prev_comment = pending;
                }
                Some('{') => {
                    depth += 1;
                    self.cursor.advance();
                }
                Some('}') => {
                    depth -= 1;
                    self.cursor.advance();
                    if depth == 0 {
                        return Ok(self.cursor.slice(start.offset, here.offset).to_string());
                    }
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    /// Read raw text up to (not including) the first of `stops` that is not
    /// nested inside brackets or quotes. Leading and trailing whitespace is
    /// trimmed from the result.
    pub fn read_raw_until(&mut self, stops: &[char]) -> Result<String, LexError> {
        self.skip_trivia()?;
        let start = self.cursor.pos();
        let mut depth = 0u32;
        loop {
            match self.cursor.peek() {
                None => {
                    return Err(LexError::UnexpectedEof {
                        span: Span::point(start.line, start.column),
                        context: "expression",
                    });
                }
                Some(c) if depth == 0 && stops.contains(&c) => {
                    return Ok(self.cursor.slice_from(start.offset).trim().to_string());
                }
                Some('"') | Some('\'') => self.skip_quoted()?,
                Some('(' | '[' | '{') => {
                    depth += 1;
                    self.cursor.advance();
                }
                Some(')' | ']' | '}') => {
                    depth = depth.saturating_sub(1);
                    self.cursor.advance();
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn skip_quoted(&mut self) -> Result<(), LexError> {
        let start = self.cursor.pos();
        let Some(quote) = self.cursor.advance() else {
            return Ok(());
        };
        loop {
            match self.cursor.advance() {
                None | Some('\n') => {
                    let span = Span::point(start.line, start.column);
                    return Err(if quote == '"' {
                        LexError::UnterminatedString { span }
                    } else {
                        LexError::UnterminatedName { span }
                    });
                }
                Some('\\') => {
                    self.cursor.advance();
                }
                Some(c) if c == quote => return Ok(()),
                Some(_) => {}
            }
        }
    }
}

/// Strip the decoration from the body of a `/** */` comment.
fn clean_doc_comment(body: &str) -> String {
    body.lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let token = lexer.get_token(false).unwrap();
            if token.is_eof() {
                break;
            }
            out.push(token);
        }
        out
    }

    fn value(source: &str) -> ConstValue {
        Lexer::new(source).get_token(false).unwrap().value.unwrap()
    }

    #[test]
    fn identifiers_and_symbols() {
        let toks = tokens("Count += 1;");
        assert!(toks[0].matches_identifier("count"));
        assert!(toks[1].matches_symbol("+="));
        assert_eq!(toks[2].int_value(), Some(1));
        assert!(toks[3].matches_symbol(";"));
    }

    #[test]
    fn triple_shift_is_one_symbol() {
        let toks = tokens("a >>> b >> c > d");
        assert!(toks[1].matches_symbol(">>>"));
        assert!(toks[3].matches_symbol(">>"));
        assert!(toks[5].matches_symbol(">"));
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(value("42"), ConstValue::Int(42));
        assert_eq!(value("0x1F"), ConstValue::Int(31));
        assert_eq!(value("0xFFFFFFFF"), ConstValue::Int(-1));
        assert_eq!(value("1.5"), ConstValue::Float(OrderedFloat(1.5)));
        assert_eq!(value(".25"), ConstValue::Float(OrderedFloat(0.25)));
        assert_eq!(value("2.0f"), ConstValue::Float(OrderedFloat(2.0)));
        assert_eq!(value("1e3"), ConstValue::Float(OrderedFloat(1000.0)));
    }

    #[test]
    fn integer_overflow_is_an_error() {
        let err = Lexer::new("99999999999").get_token(false).unwrap_err();
        assert!(matches!(err, LexError::InvalidNumber { .. }));
    }

    #[test]
    fn string_escapes() {
        assert_eq!(value(r#""a\nb""#), ConstValue::String("a\nb".into()));
        assert_eq!(value(r#""say \"hi\"""#), ConstValue::String("say \"hi\"".into()));
    }

    #[test]
    fn unterminated_string() {
        let err = Lexer::new("\"abc\nxyz\"").get_token(false).unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    #[test]
    fn name_literals() {
        assert_eq!(value("'Idle'"), ConstValue::Name(Name::new("Idle")));
        assert_eq!(value("''"), ConstValue::Name(Name::none()));
        let err = Lexer::new("'bad name'").get_token(false).unwrap_err();
        assert!(matches!(err, LexError::InvalidName { .. }));
    }

    #[test]
    fn struct_literals() {
        assert_eq!(
            value("vect(1, -2.5, 3)"),
            ConstValue::Vector([OrderedFloat(1.0), OrderedFloat(-2.5), OrderedFloat(3.0)])
        );
        assert_eq!(value("rot(0,16384,0)"), ConstValue::Rotator([0, 16384, 0]));
    }

    #[test]
    fn keyword_constants_respect_no_consts() {
        assert_eq!(value("True"), ConstValue::Bool(true));
        assert_eq!(value("none"), ConstValue::Object(ObjectRef::NONE));
        let token = Lexer::new("True").get_token(true).unwrap();
        assert!(token.is_identifier());
    }

    #[test]
    fn identifier_too_long() {
        let long = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        let err = Lexer::new(long.as_str()).get_token(true).unwrap_err();
        assert!(matches!(err, LexError::IdentifierTooLong { .. }));
    }

    #[test]
    fn unget_rewinds_to_token_start() {
        let mut lexer = Lexer::new("first second");
        let first = lexer.get_token(true).unwrap();
        let second = lexer.get_token(true).unwrap();
        lexer.unget_token(&second);
        assert_eq!(lexer.get_token(true).unwrap().text, "second");
        lexer.unget_token(&first);
        assert_eq!(lexer.get_token(true).unwrap().text, "first");
    }

    #[test]
    fn checkpoint_and_restore() {
        let mut lexer = Lexer::new("a b c");
        lexer.get_token(true).unwrap();
        let cp = lexer.checkpoint();
        lexer.get_token(true).unwrap();
        lexer.get_token(true).unwrap();
        lexer.restore(cp);
        assert_eq!(lexer.get_token(true).unwrap().text, "b");
    }

    #[test]
    fn doc_comments_are_captured() {
        let mut lexer = Lexer::new("/** The player's health.\n * Clamped to 100. */ var int Health;");
        lexer.get_token(true).unwrap();
        assert_eq!(
            lexer.take_comment().as_deref(),
            Some("The player's health.\nClamped to 100.")
        );
        assert_eq!(lexer.take_comment(), None);
    }

    #[test]
    fn plain_comments_are_skipped() {
        let toks = tokens("/* block */ a // line\n b");
        assert_eq!(toks.len(), 2);
    }

    #[test]
    fn unterminated_comment() {
        let err = Lexer::new("/* never closed").get_token(true).unwrap_err();
        assert!(matches!(err, LexError::UnterminatedComment { .. }));
    }

    #[test]
    fn trailing_comment_on_same_line() {
        let mut lexer = Lexer::new("var int X; // how many\nvar int Y;");
        for _ in 0..4 {
            lexer.get_token(true).unwrap();
        }
        assert_eq!(lexer.trailing_comment().as_deref(), Some("how many"));
        let mut lexer = Lexer::new("X;\n// next line");
        lexer.get_token(true).unwrap();
        lexer.get_token(true).unwrap();
        assert_eq!(lexer.trailing_comment(), None);
    }

    #[test]
    fn skip_braces_returns_inner_text() {
        let mut lexer = Lexer::new("{ a { b } \"}\" c } tail");
        assert!(lexer.match_symbol("{").unwrap());
        let body = lexer.skip_braces().unwrap();
        assert_eq!(body.trim(), "a { b } \"}\" c");
        assert_eq!(lexer.get_token(true).unwrap().text, "tail");
    }

    #[test]
    fn read_raw_until_respects_nesting() {
        let mut lexer = Lexer::new(" Foo(1, 2) + 3, next)");
        let text = lexer.read_raw_until(&[',', ')']).unwrap();
        assert_eq!(text, "Foo(1, 2) + 3");
        assert!(lexer.match_symbol(",").unwrap());
    }

    #[test]
    fn closing_angle_splits_shift() {
        let mut lexer = Lexer::new(">> x");
        assert!(lexer.match_closing_angle().unwrap());
        assert!(lexer.match_closing_angle().unwrap());
        assert!(!lexer.match_closing_angle().unwrap());
    }

    #[test]
    fn rendered_constants_tokenize_back() {
        let values = [
            ConstValue::Int(-7),
            ConstValue::Float(OrderedFloat(3.25)),
            ConstValue::String("quote \" and \\ slash".into()),
            ConstValue::Name(Name::new("Walking")),
            ConstValue::Vector([OrderedFloat(1.0), OrderedFloat(2.5), OrderedFloat(-3.0)]),
            ConstValue::Rotator([1, -2, 3]),
            ConstValue::Bool(false),
            ConstValue::Float(OrderedFloat(1e-7)),
            ConstValue::Float(OrderedFloat(3.1415927)),
            ConstValue::Float(OrderedFloat(-0.0)),
            ConstValue::Float(OrderedFloat(100.0)),
            ConstValue::String("a\nb".into()),
            ConstValue::String("line\r\nbreak\ttab".into()),
            ConstValue::Vector([OrderedFloat(1e-7), OrderedFloat(3.1415927), OrderedFloat(0.1)]),
        ];
        for original in values {
            let text = original.export_text();
            let mut lexer = Lexer::new(text.as_str());
            let mut token = lexer.get_token(false).unwrap();
            if token.matches_symbol("-") {
                let magnitude = lexer.get_token(false).unwrap();
                token = magnitude;
                token.value = match token.value {
                    Some(ConstValue::Int(v)) => Some(ConstValue::Int(-v)),
                    Some(ConstValue::Float(v)) => Some(ConstValue::Float(-v)),
                    other => other,
                };
            }
            if let (Some(ConstValue::Float(read)), ConstValue::Float(written)) = (&token.value, &original) {
                assert_eq!(read.is_sign_negative(), written.is_sign_negative(), "sign of {text}");
            }
            assert_eq!(token.value, Some(original), "round trip of {text}");
        }
    }
}
