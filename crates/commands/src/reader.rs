//! Cursor based scanner over a command line.
//!
//! Every parser in the engine bottoms out here. The reader never owns any
//! parse state besides its cursor, so callers backtrack by saving
//! [`StringReader::cursor`] and restoring it with [`StringReader::set_cursor`].
//! Cursor positions are byte offsets into the input and always sit on a
//! character boundary.

use crate::error::{ErrorKind, SyntaxResult};
use std::sync::Arc;

const SYNTAX_ESCAPE: char = '\\';
const SYNTAX_DOUBLE_QUOTE: char = '"';
const SYNTAX_SINGLE_QUOTE: char = '\'';

#[derive(Debug, Clone)]
pub struct StringReader {
    string: Arc<str>,
    cursor: usize,
}

impl StringReader {
    pub fn new(string: impl Into<Arc<str>>) -> Self {
        Self {
            string: string.into(),
            cursor: 0,
        }
    }

    pub fn string(&self) -> &str {
        &self.string
    }

    pub(crate) fn shared_string(&self) -> Arc<str> {
        self.string.clone()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        debug_assert!(self.string.is_char_boundary(cursor));
        self.cursor = cursor;
    }

    pub fn total_length(&self) -> usize {
        self.string.len()
    }

    pub fn remaining_length(&self) -> usize {
        self.string.len() - self.cursor
    }

    pub fn read_so_far(&self) -> &str {
        &self.string[..self.cursor]
    }

    pub fn remaining(&self) -> &str {
        &self.string[self.cursor..]
    }

    pub fn can_read(&self) -> bool {
        self.cursor < self.string.len()
    }

    /// Whether at least `len` more characters are available.
    pub fn can_read_n(&self, len: usize) -> bool {
        len == 0 || self.remaining().chars().nth(len - 1).is_some()
    }

    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    pub fn read(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    pub fn skip(&mut self) {
        self.read();
    }

    pub fn expect(&mut self, c: char) -> SyntaxResult<()> {
        if self.peek() != Some(c) {
            return Err(ErrorKind::ExpectedSymbol(c).create_with_context(self));
        }
        self.skip();
        Ok(())
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.skip();
        }
    }

    /// Advances while `predicate` holds and returns the consumed slice.
    pub fn read_while(&mut self, mut predicate: impl FnMut(&Self, char) -> bool) -> &str {
        let start = self.cursor;
        while let Some(c) = self.peek() {
            if !predicate(self, c) {
                break;
            }
            self.skip();
        }
        &self.string[start..self.cursor]
    }

    /// Scans a numeric literal: digits, `-`, and when `allow_decimal` is set a
    /// single `.` that is not immediately followed by another `.`. A `..` is
    /// always left in place for range syntax.
    pub fn read_number_token(&mut self, allow_decimal: bool) -> String {
        let mut seen_dot = false;
        self.read_while(|reader, c| match c {
            '0'..='9' | '-' => true,
            '.' if allow_decimal && !seen_dot && reader.peek_at(1) != Some('.') => {
                seen_dot = true;
                true
            }
            _ => false,
        })
        .to_string()
    }

    pub fn read_int(&mut self) -> SyntaxResult<i32> {
        self.read_number(ErrorKind::ExpectedInt, ErrorKind::InvalidInt)
    }

    pub fn read_long(&mut self) -> SyntaxResult<i64> {
        self.read_number(ErrorKind::ExpectedLong, ErrorKind::InvalidLong)
    }

    pub fn read_float(&mut self) -> SyntaxResult<f32> {
        self.read_number(ErrorKind::ExpectedFloat, ErrorKind::InvalidFloat)
    }

    pub fn read_double(&mut self) -> SyntaxResult<f64> {
        self.read_number(ErrorKind::ExpectedDouble, ErrorKind::InvalidDouble)
    }

    fn read_number<T: std::str::FromStr>(
        &mut self,
        expected: ErrorKind,
        invalid: fn(String) -> ErrorKind,
    ) -> SyntaxResult<T> {
        let start = self.cursor;
        let number = self.read_number_token(true);
        if number.is_empty() {
            return Err(expected.create_with_context(self));
        }
        number.parse().map_err(|_| {
            self.cursor = start;
            invalid(number).create_with_context(self)
        })
    }

    pub fn is_allowed_in_unquoted_string(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+')
    }

    pub fn is_quoted_string_start(c: char) -> bool {
        c == SYNTAX_DOUBLE_QUOTE || c == SYNTAX_SINGLE_QUOTE
    }

    pub fn read_unquoted_string(&mut self) -> String {
        self.read_while(|_, c| Self::is_allowed_in_unquoted_string(c))
            .to_string()
    }

    pub fn read_quoted_string(&mut self) -> SyntaxResult<String> {
        match self.peek() {
            None => Ok(String::new()),
            Some(quote) if Self::is_quoted_string_start(quote) => {
                self.skip();
                self.read_string_until(quote)
            }
            Some(_) => Err(ErrorKind::ExpectedStartOfQuote.create_with_context(self)),
        }
    }

    /// Reads up to an unescaped `terminator`, consuming it. Only the
    /// terminator and the escape character itself may be escaped.
    pub fn read_string_until(&mut self, terminator: char) -> SyntaxResult<String> {
        let mut result = String::new();
        let mut escaped = false;
        while let Some(c) = self.read() {
            if escaped {
                if c == terminator || c == SYNTAX_ESCAPE {
                    result.push(c);
                    escaped = false;
                } else {
                    self.cursor -= c.len_utf8();
                    return Err(ErrorKind::InvalidEscape(c).create_with_context(self));
                }
            } else if c == SYNTAX_ESCAPE {
                escaped = true;
            } else if c == terminator {
                return Ok(result);
            } else {
                result.push(c);
            }
        }
        Err(ErrorKind::ExpectedEndOfQuote.create_with_context(self))
    }

    pub fn read_string(&mut self) -> SyntaxResult<String> {
        match self.peek() {
            None => Ok(String::new()),
            Some(c) if Self::is_quoted_string_start(c) => {
                self.skip();
                self.read_string_until(c)
            }
            Some(_) => Ok(self.read_unquoted_string()),
        }
    }

    pub fn read_boolean(&mut self) -> SyntaxResult<bool> {
        let start = self.cursor;
        let value = self.read_string()?;
        match value.as_str() {
            "" => Err(ErrorKind::ExpectedBool.create_with_context(self)),
            "true" => Ok(true),
            "false" => Ok(false),
            _ => {
                self.cursor = start;
                Err(ErrorKind::InvalidBool(value).create_with_context(self))
            }
        }
    }

    /// The next whitespace delimited token, without moving the cursor.
    pub fn peek_token(&self) -> &str {
        let remaining = self.remaining();
        let end = remaining
            .find(char::is_whitespace)
            .unwrap_or(remaining.len());
        &remaining[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_read_and_peek() {
        let mut reader = StringReader::new("abc");
        assert!(reader.can_read());
        assert!(reader.can_read_n(3));
        assert!(!reader.can_read_n(4));
        assert_eq!(reader.peek(), Some('a'));
        assert_eq!(reader.peek_at(2), Some('c'));
        reader.skip();
        assert_eq!(reader.read_so_far(), "a");
        assert_eq!(reader.remaining(), "bc");
        reader.set_cursor(3);
        assert!(!reader.can_read());
        assert_eq!(reader.peek(), None);
    }

    #[test]
    fn expect_fails_without_consuming() {
        let mut reader = StringReader::new("abc");
        reader.expect('a').unwrap();
        let err = reader.expect('x').unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ExpectedSymbol('x'));
        assert_eq!(err.cursor(), Some(1));
        assert_eq!(reader.cursor(), 1);
    }

    #[test]
    fn skip_whitespace_stops_at_token() {
        let mut reader = StringReader::new(" \t hello");
        reader.skip_whitespace();
        assert_eq!(reader.remaining(), "hello");
    }

    #[test]
    fn unquoted_string_stops_at_disallowed_char() {
        let mut reader = StringReader::new("hello_world-1.2+x world");
        assert_eq!(reader.read_unquoted_string(), "hello_world-1.2+x");
        assert_eq!(reader.remaining(), " world");
    }

    #[test]
    fn quoted_string_handles_escapes() {
        let mut reader = StringReader::new(r#""hello \"world\"" rest"#);
        assert_eq!(reader.read_quoted_string().unwrap(), r#"hello "world""#);
        assert_eq!(reader.remaining(), " rest");

        let mut reader = StringReader::new("'it\\'s'");
        assert_eq!(reader.read_string().unwrap(), "it's");
    }

    #[test]
    fn quoted_string_errors() {
        let mut reader = StringReader::new("\"never closed");
        let err = reader.read_quoted_string().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ExpectedEndOfQuote);

        let mut reader = StringReader::new("\"bad \\x\"");
        let err = reader.read_quoted_string().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidEscape('x'));
        assert_eq!(err.cursor(), Some(6));

        let mut reader = StringReader::new("plain");
        let err = reader.read_quoted_string().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ExpectedStartOfQuote);
    }

    #[test]
    fn read_int_and_double() {
        let mut reader = StringReader::new("-42 3.5");
        assert_eq!(reader.read_int().unwrap(), -42);
        reader.skip();
        assert_eq!(reader.read_double().unwrap(), 3.5);
        assert!(!reader.can_read());
    }

    #[test]
    fn read_int_reports_invalid_token_at_start() {
        let mut reader = StringReader::new("12.5");
        let err = reader.read_int().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidInt("12.5".to_string()));
        assert_eq!(err.cursor(), Some(0));

        let mut reader = StringReader::new("abc");
        let err = reader.read_int().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ExpectedInt);
    }

    #[test]
    fn number_token_leaves_range_separator() {
        let mut reader = StringReader::new("5..10");
        assert_eq!(reader.read_number_token(true), "5");
        assert_eq!(reader.remaining(), "..10");

        let mut reader = StringReader::new("1.5..2");
        assert_eq!(reader.read_double().unwrap(), 1.5);
        assert_eq!(reader.remaining(), "..2");

        let mut reader = StringReader::new("1.2.3");
        assert_eq!(reader.read_number_token(true), "1.2");
    }

    #[test]
    fn read_boolean() {
        let mut reader = StringReader::new("true false maybe");
        assert!(reader.read_boolean().unwrap());
        reader.skip();
        assert!(!reader.read_boolean().unwrap());
        reader.skip();
        let err = reader.read_boolean().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidBool("maybe".to_string()));
        assert_eq!(err.cursor(), Some(11));
    }

    #[test]
    fn peek_token_does_not_move() {
        let reader = StringReader::new("ban Steve");
        assert_eq!(reader.peek_token(), "ban");
        assert_eq!(reader.cursor(), 0);
    }
}
