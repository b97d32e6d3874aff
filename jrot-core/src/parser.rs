//! Recursive-descent JSON parser
//!
//! Converts text into a [`Value`] tree. Two entry points matter:
//!
//! - [`parse`] consumes one document and ignores whatever follows it.
//! - [`parse_stream`] consumes one document and reports the byte offset
//!   immediately past it, so a buffer holding several back-to-back documents
//!   can be parsed one at a time without scanning past the first. This is
//!   what request pipelining on a connection is built on.
//!
//! [`parse_buffer`] layers the incomplete/malformed distinction on top for
//! callers that accumulate raw socket bytes (see below).
//!
//! # Failure positions
//!
//! A [`ParseError`] carries the cursor position at the point of failure.
//! Input that is merely truncated - an open container, an unterminated
//! string, a literal cut short - always fails **at the end of the input**,
//! while genuinely malformed input fails strictly before it. Connection
//! handling relies on this to tell "wait for more bytes" apart from "the
//! peer sent garbage", so the distinction is part of this module's contract
//! and is pinned down by tests.
//!
//! # Examples
//!
//! ```rust
//! use jrot_core::{parse, parse_stream};
//!
//! let doc = parse(" {\"a\": [1, 2]} ").unwrap();
//! assert_eq!(doc.member("a").map(|v| v.len()), Some(2));
//!
//! // Streaming: the cursor stops exactly at the second document.
//! let (first, end) = parse_stream("{\"a\":1}{\"b\":2}").unwrap();
//! assert_eq!(first.member("a").and_then(|v| v.as_i64()), Some(1));
//! assert_eq!(end, 7);
//! ```

use crate::value::{Member, Value};
use thiserror::Error;

/// Parse failure at a byte offset.
///
/// The offset is the cursor position where parsing could not continue; see
/// the [module documentation](self) for how end-of-input failures are
/// distinguished from mid-input ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid JSON at byte {offset}")]
pub struct ParseError {
    /// Cursor position at the point of failure.
    pub offset: usize,
}

/// Parse exactly one JSON document, ignoring trailing bytes.
pub fn parse(text: &str) -> Result<Value, ParseError> {
    parse_stream(text).map(|(value, _)| value)
}

/// Parse exactly one JSON document and report where it ended.
///
/// Returns the value and the byte offset immediately past the consumed
/// document. Leading whitespace is skipped; trailing bytes are left alone.
pub fn parse_stream(text: &str) -> Result<(Value, usize), ParseError> {
    let mut parser = Parser::new(text);
    parser.skip_ws();
    let value = parser.parse_value()?;
    Ok((value, parser.pos))
}

/// Try to extract one complete document from an accumulating byte buffer.
///
/// - `Ok(Some((value, consumed)))` - a full document was parsed; the caller
///   should discard `consumed` bytes from the front of the buffer.
/// - `Ok(None)` - the buffer holds only a prefix of a document (including a
///   partial UTF-8 sequence at its very end); wait for more bytes.
/// - `Err(_)` - the buffer is malformed before its end; no amount of further
///   input can repair it.
pub fn parse_buffer(buf: &[u8]) -> Result<Option<(Value, usize)>, ParseError> {
    let (text, hard_tail) = match std::str::from_utf8(buf) {
        Ok(text) => (text, false),
        Err(e) => {
            let valid = e.valid_up_to();
            let text = std::str::from_utf8(&buf[..valid])
                .map_err(|_| ParseError { offset: valid })?;
            // error_len() is None only when the buffer ends inside what could
            // still become a valid multi-byte sequence.
            (text, e.error_len().is_some())
        }
    };
    match parse_stream(text) {
        Ok((value, consumed)) => Ok(Some((value, consumed))),
        Err(e) if e.offset == text.len() && !hard_tail => Ok(None),
        Err(e) => Err(e),
    }
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Parser<'a> {
        Parser {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self
            .peek()
            .map(|b| b.is_ascii_whitespace())
            .unwrap_or(false)
        {
            self.pos += 1;
        }
    }

    fn fail<T>(&self, offset: usize) -> Result<T, ParseError> {
        Err(ParseError { offset })
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        match self.peek() {
            Some(b'n') => self.literal("null", Value::Null),
            Some(b't') => self.literal("true", Value::Bool(true)),
            Some(b'f') => self.literal("false", Value::Bool(false)),
            Some(b'"') => self.parse_string().map(Value::String),
            Some(b'-') | Some(b'0'..=b'9') => Ok(self.parse_number()),
            Some(b'[') => self.parse_array(),
            Some(b'{') => self.parse_object(),
            _ => self.fail(self.pos),
        }
    }

    /// Match a keyword, advancing past the common prefix. A truncated
    /// keyword at end of input therefore fails at the end of input.
    fn literal(&mut self, keyword: &str, value: Value) -> Result<Value, ParseError> {
        let rest = &self.bytes[self.pos..];
        let matched = keyword
            .as_bytes()
            .iter()
            .zip(rest)
            .take_while(|(a, b)| a == b)
            .count();
        self.pos += matched;
        if matched == keyword.len() {
            Ok(value)
        } else {
            self.fail(self.pos)
        }
    }

    /// Accumulate a number: integer digits, fractional digits (each dropping
    /// the power-of-ten scale by one), then an optional signed exponent.
    /// Never fails - the surrounding grammar catches any stray tail.
    fn parse_number(&mut self) -> Value {
        let mut sign = 1.0;
        if self.peek() == Some(b'-') {
            sign = -1.0;
            self.pos += 1;
        }
        if self.peek() == Some(b'0') {
            self.pos += 1;
        }
        let mut mantissa = 0.0;
        while let Some(d @ b'0'..=b'9') = self.peek() {
            mantissa = mantissa * 10.0 + f64::from(d - b'0');
            self.pos += 1;
        }
        let mut scale: i32 = 0;
        if self.peek() == Some(b'.')
            && matches!(self.bytes.get(self.pos + 1), Some(b'0'..=b'9'))
        {
            self.pos += 1;
            while let Some(d @ b'0'..=b'9') = self.peek() {
                mantissa = mantissa * 10.0 + f64::from(d - b'0');
                scale = scale.saturating_sub(1);
                self.pos += 1;
            }
        }
        let mut exponent: i32 = 0;
        let mut exponent_sign = 1;
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            self.pos += 1;
            match self.peek() {
                Some(b'+') => self.pos += 1,
                Some(b'-') => {
                    exponent_sign = -1;
                    self.pos += 1;
                }
                _ => {}
            }
            while let Some(d @ b'0'..=b'9') = self.peek() {
                exponent = exponent
                    .saturating_mul(10)
                    .saturating_add(i32::from(d - b'0'));
                self.pos += 1;
            }
        }
        let power = scale.saturating_add(exponent_sign * exponent);
        Value::Number(sign * mantissa * 10f64.powi(power))
    }

    /// Two passes: size the output by scanning to the closing quote, then
    /// re-scan translating escapes. An unterminated string fails at end of
    /// input so that buffered partial requests read as incomplete.
    fn parse_string(&mut self) -> Result<String, ParseError> {
        let n = self.bytes.len();
        if self.peek() != Some(b'"') {
            return self.fail(self.pos);
        }

        // Pass 1: find the closing quote, counting content length.
        let mut close = self.pos + 1;
        let mut len = 0;
        while close < n && self.bytes[close] != b'"' {
            if self.bytes[close] == b'\\' {
                close += 2;
            } else {
                close += 1;
            }
            len += 1;
        }
        if close >= n {
            return self.fail(n);
        }

        // Pass 2: copy verbatim runs, translate escapes.
        let mut out = String::with_capacity(len);
        let mut j = self.pos + 1;
        while j < close {
            if self.bytes[j] != b'\\' {
                let start = j;
                while j < close && self.bytes[j] != b'\\' {
                    j += 1;
                }
                out.push_str(&self.text[start..j]);
                continue;
            }
            match self.bytes[j + 1] {
                b'b' => out.push('\u{8}'),
                b'f' => out.push('\u{c}'),
                b'n' => out.push('\n'),
                b'r' => out.push('\r'),
                b't' => out.push('\t'),
                b'u' => {
                    j = self.unescape_unicode(j, close, &mut out)?;
                    continue;
                }
                _ => {
                    // Unknown escapes copy the escaped character verbatim.
                    if let Some(ch) = self.text[j + 1..].chars().next() {
                        out.push(ch);
                        j += 1 + ch.len_utf8();
                        continue;
                    }
                }
            }
            j += 2;
        }
        self.pos = close + 1;
        Ok(out)
    }

    /// Translate a `\uXXXX` escape starting at `j` (the backslash), bounded
    /// by the closing quote at `close`. Returns the offset past the escape.
    ///
    /// Code point 0 and unpaired/invalid surrogates emit nothing. A high
    /// surrogate combines with an immediately following low surrogate into
    /// one code point above U+FFFF.
    fn unescape_unicode(
        &self,
        j: usize,
        close: usize,
        out: &mut String,
    ) -> Result<usize, ParseError> {
        let hi = self.read_hex4(j + 2, close)?;
        let mut end = j + 6;

        if hi == 0 || (0xDC00..=0xDFFF).contains(&hi) {
            return Ok(end);
        }

        let mut code_point = hi;
        if (0xD800..=0xDBFF).contains(&hi) {
            if end + 1 >= close || self.bytes[end] != b'\\' || self.bytes[end + 1] != b'u' {
                return Ok(end); // missing second half of surrogate
            }
            let lo = self.read_hex4(end + 2, close)?;
            end += 6;
            if !(0xDC00..=0xDFFF).contains(&lo) {
                return Ok(end); // invalid second half of surrogate
            }
            code_point = 0x10000 | ((hi & 0x3FF) << 10) | (lo & 0x3FF);
        }

        if let Some(ch) = char::from_u32(code_point) {
            out.push(ch);
        }
        Ok(end)
    }

    /// Read exactly four hex digits starting at `start`, staying below
    /// `bound`. Fails at the first byte that breaks the rule.
    fn read_hex4(&self, start: usize, bound: usize) -> Result<u32, ParseError> {
        let mut acc = 0u32;
        for k in start..start + 4 {
            let digit = match self.bytes.get(k) {
                Some(b) if k < bound => (*b as char).to_digit(16),
                _ => None,
            };
            match digit {
                Some(d) => acc = acc << 4 | d,
                None => return self.fail(k.min(bound)),
            }
        }
        Ok(acc)
    }

    fn parse_array(&mut self) -> Result<Value, ParseError> {
        self.pos += 1; // past '['
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Value::array());
        }
        let mut items = Vec::new();
        loop {
            let value = self.parse_value()?;
            items.push(value);
            self.skip_ws();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_ws();
                    // A trailing comma before the bracket is tolerated.
                    if self.peek() == Some(b']') {
                        self.pos += 1;
                        break;
                    }
                }
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                _ => return self.fail(self.pos),
            }
        }
        Ok(Value::Array(items))
    }

    fn parse_object(&mut self) -> Result<Value, ParseError> {
        self.pos += 1; // past '{'
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Value::object());
        }
        let mut members = Vec::new();
        loop {
            let key = self.parse_string()?;
            self.skip_ws();
            if self.peek() != Some(b':') {
                return self.fail(self.pos);
            }
            self.pos += 1;
            self.skip_ws();
            let value = self.parse_value()?;
            members.push(Member { key, value });
            self.skip_ws();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.peek() == Some(b'}') {
                        self.pos += 1;
                        break;
                    }
                }
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                _ => return self.fail(self.pos),
            }
        }
        Ok(Value::Object(members))
    }
}
