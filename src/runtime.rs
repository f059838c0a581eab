//! Shared primitives every emitted routine is built from.
//!
//! Write routines append into one caller-owned `String`; read routines advance a
//! single [`Cursor`] over one immutable input. Nothing here is shared between
//! calls, so routines can run on many threads at once.

use std::fmt;
use thiserror::Error;

// ————————————————————————————————————————————————————————————————————————————
// WRITE
// ————————————————————————————————————————————————————————————————————————————

pub const NULL_LITERAL: &str = "null";

/// Deepest chain of nested routine calls a single read or write may make. Each
/// call is one object or list level.
pub const MAX_DEPTH: usize = 128;

/// Plain base-10, no separators.
pub fn write_int(out: &mut String, value: i64) {
    out.push_str(&value.to_string());
}

/// Strings are written verbatim between quotes. Content is NOT escaped: a `"`
/// inside the value ends the string early for any reader.
pub fn write_str(out: &mut String, value: Option<&str>) {
    match value {
        None => out.push_str(NULL_LITERAL),
        Some(s) => {
            out.reserve(s.len() + 2);
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// READ ERRORS
// ————————————————————————————————————————————————————————————————————————————

/// What the cursor wanted to see when it gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// A specific structural character (`{`, `:`, `"` ...).
    Char(char),
    /// Object or list content, or the closing bracket.
    ContentOr(char),
    Digits,
    IntegerInRange,
    /// Any JSON value (used when skipping unknown properties).
    Value,
    /// Input nested deeper than [`MAX_DEPTH`].
    DepthLimit,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Char(c) => write!(f, "'{c}'"),
            Expected::ContentOr(c) => write!(f, "content or '{c}'"),
            Expected::Digits => f.write_str("digits"),
            Expected::IntegerInRange => f.write_str("an integer within 64-bit range"),
            Expected::Value => f.write_str("a JSON value"),
            Expected::DepthLimit => write!(f, "nesting no deeper than {MAX_DEPTH} levels"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid JSON at position {offset}: expected {expected}")]
pub struct ParseError {
    /// Bytes consumed before the failure.
    pub offset: usize,
    pub expected: Expected,
}

// ————————————————————————————————————————————————————————————————————————————
// CURSOR
// ————————————————————————————————————————————————————————————————————————————

/// Monotonic read position over one input. Offsets are byte offsets; the cursor
/// only ever steps over ASCII, so every offset is a char boundary.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    pub fn error(&self, expected: Expected) -> ParseError {
        ParseError { offset: self.pos, expected }
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\r' | b'\n') = self.peek() {
            self.pos += 1;
        }
    }

    /// Consumes a leading `null` literal if present.
    pub fn eat_null(&mut self) -> bool {
        self.eat_word(NULL_LITERAL)
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.rest().starts_with(word) {
            self.pos += word.len();
            true
        } else {
            false
        }
    }

    /// Consumes `byte` if it is next.
    pub fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// `c` must be ASCII.
    pub fn expect(&mut self, c: char) -> Result<(), ParseError> {
        if self.eat(c as u8) {
            Ok(())
        } else {
            Err(self.error(Expected::Char(c)))
        }
    }

    /// Reads `"..."` and returns the raw content. No escape processing.
    pub fn read_string(&mut self) -> Result<&'a str, ParseError> {
        self.expect('"')?;
        self.read_until_quote()
    }

    /// Reads up to the next `"` (exclusive) and steps past it.
    pub fn read_until_quote(&mut self) -> Result<&'a str, ParseError> {
        let rest = self.rest();
        match rest.find('"') {
            Some(end) => {
                let content = &rest[..end];
                self.pos += end + 1;
                Ok(content)
            }
            None => Err(ParseError {
                offset: self.input.len(),
                expected: Expected::Char('"'),
            }),
        }
    }

    /// Optional `-`, then one or more ASCII digits.
    pub fn read_int(&mut self) -> Result<i64, ParseError> {
        let start = self.pos;
        let negative = self.eat(b'-');
        let digits_start = self.pos;
        let mut value: i64 = 0;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            let digit = i64::from(b - b'0');
            let next = value.checked_mul(10).and_then(|v| {
                if negative { v.checked_sub(digit) } else { v.checked_add(digit) }
            });
            value = match next {
                Some(v) => v,
                None => {
                    return Err(ParseError {
                        offset: start,
                        expected: Expected::IntegerInRange,
                    });
                }
            };
            self.pos += 1;
        }
        if self.pos == digits_start {
            return Err(self.error(Expected::Digits));
        }
        Ok(value)
    }

    /// Steps over one value of any JSON kind. Used for properties a routine
    /// does not know; the content is scanned, not validated.
    pub fn skip_value(&mut self) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'"') => self.read_string().map(|_| ()),
            Some(b'{' | b'[') => self.skip_nested(),
            Some(b'-' | b'0'..=b'9') => {
                let start = self.pos;
                while let Some(b'-' | b'+' | b'.' | b'e' | b'E' | b'0'..=b'9') = self.peek() {
                    self.pos += 1;
                }
                if self.input[start..self.pos].bytes().any(|b| b.is_ascii_digit()) {
                    Ok(())
                } else {
                    Err(ParseError { offset: start, expected: Expected::Digits })
                }
            }
            _ => {
                if self.eat_word("null") || self.eat_word("true") || self.eat_word("false") {
                    Ok(())
                } else {
                    Err(self.error(Expected::Value))
                }
            }
        }
    }

    fn skip_nested(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            match b {
                b'"' => {
                    self.read_string()?;
                    continue;
                }
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        Err(self.error(Expected::Value))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_ints_and_strings() {
        let mut out = String::new();
        write_int(&mut out, -120);
        out.push(' ');
        write_str(&mut out, Some("Hello!"));
        out.push(' ');
        write_str(&mut out, None);
        assert_eq!(out, "-120 \"Hello!\" null");
    }

    #[test]
    fn strings_are_not_escaped() {
        let mut out = String::new();
        write_str(&mut out, Some("a\"b"));
        assert_eq!(out, "\"a\"b\"");
    }

    #[test]
    fn reads_int_runs() {
        let mut c = Cursor::new("1234,");
        assert_eq!(c.read_int(), Ok(1234));
        assert_eq!(c.offset(), 4);

        let mut c = Cursor::new("-9223372036854775808");
        assert_eq!(c.read_int(), Ok(i64::MIN));
    }

    #[test]
    fn int_without_digits_is_an_error() {
        let mut c = Cursor::new("x");
        assert_eq!(c.read_int(), Err(ParseError { offset: 0, expected: Expected::Digits }));

        let mut c = Cursor::new("-");
        assert_eq!(c.read_int(), Err(ParseError { offset: 1, expected: Expected::Digits }));
    }

    #[test]
    fn int_overflow_is_an_error() {
        let mut c = Cursor::new("99999999999999999999");
        assert_eq!(c.read_int().unwrap_err().expected, Expected::IntegerInRange);
    }

    #[test]
    fn reads_raw_strings() {
        let mut c = Cursor::new("\"héllo\" rest");
        assert_eq!(c.read_string(), Ok("héllo"));
        assert_eq!(c.rest(), " rest");
    }

    #[test]
    fn unterminated_string_reports_end_of_input() {
        let mut c = Cursor::new("\"abc");
        assert_eq!(
            c.read_string(),
            Err(ParseError { offset: 4, expected: Expected::Char('"') })
        );
    }

    #[test]
    fn null_and_whitespace() {
        let mut c = Cursor::new(" \n\t null]");
        c.skip_whitespace();
        assert!(c.eat_null());
        assert_eq!(c.peek(), Some(b']'));
        assert!(!c.eat_null());
    }

    #[test]
    fn skips_values_of_every_kind() {
        let input = r#"{"a": [1, "x]", {"b": null}], "c": true} -1.5e3 false "s" 7"#;
        let mut c = Cursor::new(input);
        for _ in 0..4 {
            c.skip_value().unwrap();
        }
        c.skip_whitespace();
        assert_eq!(c.rest(), "7");
    }

    #[test]
    fn skipping_garbage_fails() {
        let mut c = Cursor::new("  ?");
        assert_eq!(c.skip_value(), Err(ParseError { offset: 2, expected: Expected::Value }));

        let mut c = Cursor::new("[1, 2");
        assert!(c.skip_value().is_err());
    }
}
