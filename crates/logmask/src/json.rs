//! Streaming JSON masking encoder.
//!
//! The tokenizer walks the input buffer one token at a time and the
//! encoder re-serializes it immediately, routing every string value
//! through the rule for its nearest-enclosing field name. No parse tree
//! is built and memory stays proportional to nesting depth. On
//! malformed or truncated input the caller gets everything emitted
//! before the offending byte together with the error, so a best-effort
//! fragment can still be logged.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::error::{MaskError, Result};
use crate::rule::Converter;

/// Result of masking one JSON payload: everything emitted up to the
/// first decode error, plus the error itself when the input was
/// malformed or truncated.
#[derive(Debug)]
pub struct MaskedJson {
    /// Re-serialized (possibly partial) masked document.
    pub text: String,
    /// The decode error, when the input did not parse to the end.
    pub error: Option<MaskError>,
}

impl MaskedJson {
    /// Returns whether the whole input was consumed without error.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Masks a JSON payload with the process-wide converter.
///
/// The active converter is snapshotted once per call; with none
/// installed the document is re-serialized with no values altered.
pub fn mask_json(body: &[u8]) -> MaskedJson {
    let converter = crate::redactor::active_converter();
    mask_json_with(body, converter.as_deref())
}

/// Masks a JSON payload with an explicit converter.
///
/// Every string value is routed through the rule registered for its
/// nearest-enclosing field name; field names, numbers, booleans and
/// null are re-emitted untouched. Output is compact regardless of input
/// whitespace.
pub fn mask_json_with(body: &[u8], converter: Option<&Converter>) -> MaskedJson {
    let mut tokenizer = Tokenizer::new(body);
    let mut encoder = Encoder::new(converter);
    loop {
        match tokenizer.next_token() {
            Ok(Some(token)) => encoder.write(token),
            Ok(None) => {
                return MaskedJson {
                    text: encoder.finish(),
                    error: None,
                };
            }
            Err(error) => {
                return MaskedJson {
                    text: encoder.finish(),
                    error: Some(error),
                };
            }
        }
    }
}

/// Lexical token handed from the tokenizer to the encoder.
#[derive(Debug)]
enum Token<'a> {
    ObjectOpen,
    ObjectClose,
    ArrayOpen,
    ArrayClose,
    /// Object key. The trailing `:` is already consumed, so a key is
    /// never yielded without a value position behind it.
    Name(Cow<'a, str>),
    /// String value.
    Str(Cow<'a, str>),
    /// Raw text of a grammar-checked number.
    Number(&'a str),
    Bool(bool),
    Null,
}

/// Container kind for input-side nesting validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    Object,
    Array,
}

/// What the grammar allows at the current input position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// A value: top level, after `:`, or after `,` in an array.
    Value,
    /// A value or `]`, right after `[`.
    ValueOrClose,
    /// An object key, after `,` in an object.
    Name,
    /// An object key or `}`, right after `{`.
    NameOrClose,
    /// `,` or the matching close, after a value inside a container.
    CommaOrClose,
    /// Nothing: the top-level value is complete.
    Done,
}

/// Validating tokenizer over a raw byte buffer.
struct Tokenizer<'a> {
    input: &'a [u8],
    pos: usize,
    ctx: Vec<Ctx>,
    expect: Expect,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            input,
            pos: 0,
            ctx: Vec::new(),
            expect: Expect::Value,
        }
    }

    /// Next token, or `Ok(None)` at clean end of input. Running out of
    /// bytes anywhere inside the document is an error, not an end.
    fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        loop {
            self.skip_whitespace();
            let Some(b) = self.peek() else {
                return match self.expect {
                    Expect::Done => Ok(None),
                    _ => Err(self.eof()),
                };
            };
            match self.expect {
                Expect::Done => {
                    return Err(MaskError::decode(
                        "trailing characters after document",
                        self.pos,
                    ));
                }
                Expect::Value => return self.value(b).map(Some),
                Expect::ValueOrClose => {
                    if b == b']' {
                        self.pos += 1;
                        return Ok(Some(self.close(Ctx::Array)));
                    }
                    return self.value(b).map(Some);
                }
                Expect::Name | Expect::NameOrClose => {
                    if b == b'}' && self.expect == Expect::NameOrClose {
                        self.pos += 1;
                        return Ok(Some(self.close(Ctx::Object)));
                    }
                    if b != b'"' {
                        return Err(MaskError::decode("expected object key", self.pos));
                    }
                    return self.name().map(Some);
                }
                Expect::CommaOrClose => match b {
                    b',' => {
                        self.pos += 1;
                        self.expect = match self.ctx.last() {
                            Some(Ctx::Object) => Expect::Name,
                            _ => Expect::Value,
                        };
                    }
                    b'}' if self.ctx.last() == Some(&Ctx::Object) => {
                        self.pos += 1;
                        return Ok(Some(self.close(Ctx::Object)));
                    }
                    b']' if self.ctx.last() == Some(&Ctx::Array) => {
                        self.pos += 1;
                        return Ok(Some(self.close(Ctx::Array)));
                    }
                    _ => {
                        return Err(MaskError::decode(
                            "expected `,` or closing bracket",
                            self.pos,
                        ));
                    }
                },
            }
        }
    }

    /// Leaves a container. The expect machine guarantees the closing
    /// byte matched the innermost context.
    fn close(&mut self, kind: Ctx) -> Token<'a> {
        self.ctx.pop();
        self.after_value();
        match kind {
            Ctx::Object => Token::ObjectClose,
            Ctx::Array => Token::ArrayClose,
        }
    }

    fn after_value(&mut self) {
        self.expect = if self.ctx.is_empty() {
            Expect::Done
        } else {
            Expect::CommaOrClose
        };
    }

    /// Reads an object key together with its trailing `:`. Consuming
    /// the colon here means a key at end of input is never yielded as a
    /// dangling name.
    fn name(&mut self) -> Result<Token<'a>> {
        let s = self.read_string()?;
        self.skip_whitespace();
        match self.peek() {
            Some(b':') => {
                self.pos += 1;
                self.expect = Expect::Value;
                Ok(Token::Name(s))
            }
            Some(_) => Err(MaskError::decode("expected `:` after object key", self.pos)),
            None => Err(self.eof()),
        }
    }

    fn value(&mut self, b: u8) -> Result<Token<'a>> {
        match b {
            b'{' => {
                self.pos += 1;
                self.ctx.push(Ctx::Object);
                self.expect = Expect::NameOrClose;
                Ok(Token::ObjectOpen)
            }
            b'[' => {
                self.pos += 1;
                self.ctx.push(Ctx::Array);
                self.expect = Expect::ValueOrClose;
                Ok(Token::ArrayOpen)
            }
            b'"' => {
                let s = self.read_string()?;
                self.after_value();
                Ok(Token::Str(s))
            }
            b't' => {
                self.literal(b"true")?;
                self.after_value();
                Ok(Token::Bool(true))
            }
            b'f' => {
                self.literal(b"false")?;
                self.after_value();
                Ok(Token::Bool(false))
            }
            b'n' => {
                self.literal(b"null")?;
                self.after_value();
                Ok(Token::Null)
            }
            b'-' | b'0'..=b'9' => {
                let raw = self.read_number()?;
                self.after_value();
                Ok(Token::Number(raw))
            }
            _ => Err(MaskError::decode("unexpected character", self.pos)),
        }
    }

    fn literal(&mut self, word: &'static [u8]) -> Result<()> {
        let end = self.pos + word.len();
        if self.input.len() < end {
            return Err(self.eof());
        }
        if &self.input[self.pos..end] != word {
            return Err(MaskError::decode("invalid literal", self.pos));
        }
        self.pos = end;
        Ok(())
    }

    fn read_number(&mut self) -> Result<&'a str> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b) if b.is_ascii_digit() => self.digits(),
            _ => return Err(MaskError::decode("invalid number", self.pos)),
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            self.required_digits()?;
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            self.required_digits()?;
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| MaskError::decode("invalid number", start))
    }

    fn digits(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn required_digits(&mut self) -> Result<()> {
        if !matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            return Err(MaskError::decode("invalid number", self.pos));
        }
        self.digits();
        Ok(())
    }

    /// Reads a string body, borrowing the input when no escapes occur.
    fn read_string(&mut self) -> Result<Cow<'a, str>> {
        // opening quote was peeked by the caller
        self.pos += 1;
        let mut segment = self.pos;
        let mut owned: Option<String> = None;
        loop {
            let Some(b) = self.peek() else {
                return Err(MaskError::decode("unterminated string", self.pos));
            };
            match b {
                b'"' => {
                    let tail = self.segment_str(segment)?;
                    self.pos += 1;
                    return Ok(match owned {
                        None => Cow::Borrowed(tail),
                        Some(mut s) => {
                            s.push_str(tail);
                            Cow::Owned(s)
                        }
                    });
                }
                b'\\' => {
                    let tail = self.segment_str(segment)?;
                    let buf = owned.get_or_insert_with(String::new);
                    buf.push_str(tail);
                    self.pos += 1;
                    self.escape(buf)?;
                    segment = self.pos;
                }
                0x00..=0x1F => {
                    return Err(MaskError::decode("control character in string", self.pos));
                }
                _ => self.pos += 1,
            }
        }
    }

    fn segment_str(&self, start: usize) -> Result<&'a str> {
        std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| MaskError::decode("invalid utf-8 in string", start))
    }

    fn escape(&mut self, buf: &mut String) -> Result<()> {
        let Some(b) = self.peek() else {
            return Err(self.eof());
        };
        self.pos += 1;
        match b {
            b'"' => buf.push('"'),
            b'\\' => buf.push('\\'),
            b'/' => buf.push('/'),
            b'b' => buf.push('\u{0008}'),
            b'f' => buf.push('\u{000C}'),
            b'n' => buf.push('\n'),
            b'r' => buf.push('\r'),
            b't' => buf.push('\t'),
            b'u' => {
                let code = self.read_hex4()?;
                buf.push(self.unescape_unicode(code));
            }
            _ => return Err(MaskError::decode("invalid escape", self.pos - 1)),
        }
        Ok(())
    }

    /// Decodes a `\uXXXX` code unit, pairing surrogates. An unpaired
    /// surrogate decodes to U+FFFD with only the first escape consumed,
    /// matching lenient JSON decoders.
    fn unescape_unicode(&mut self, code: u16) -> char {
        if !(0xD800..=0xDFFF).contains(&code) {
            return char::from_u32(u32::from(code)).unwrap_or(char::REPLACEMENT_CHARACTER);
        }
        if code < 0xDC00
            && self.input.get(self.pos) == Some(&b'\\')
            && self.input.get(self.pos + 1) == Some(&b'u')
        {
            if let Some(low) = self.peek_hex4(self.pos + 2) {
                if (0xDC00..=0xDFFF).contains(&low) {
                    self.pos += 6;
                    let c = 0x10000 + ((u32::from(code) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
                    return char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER);
                }
            }
        }
        char::REPLACEMENT_CHARACTER
    }

    fn read_hex4(&mut self) -> Result<u16> {
        match self.peek_hex4(self.pos) {
            Some(code) => {
                self.pos += 4;
                Ok(code)
            }
            None => Err(MaskError::decode("invalid unicode escape", self.pos)),
        }
    }

    fn peek_hex4(&self, at: usize) -> Option<u16> {
        let bytes = self.input.get(at..at + 4)?;
        let mut code = 0u16;
        for &b in bytes {
            let digit = (b as char).to_digit(16)?;
            code = code * 16 + digit as u16;
        }
        Some(code)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn eof(&self) -> MaskError {
        MaskError::decode("unexpected end of input", self.pos)
    }
}

/// Output-side parse state. The `End` values are transition triggers
/// fed to [`Encoder::set_state`] by the matching close delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unknown,
    Object,
    ObjectEnd,
    FieldName,
    FieldValue,
    Array,
    ArrayValue,
    ArrayEnd,
}

/// Stack entry: the state to restore after a container closes, plus the
/// field name that governed masking outside it.
#[derive(Debug)]
struct Frame {
    state: State,
    field: String,
}

/// Re-serializing encoder driven by the token stream.
struct Encoder<'c> {
    converter: Option<&'c Converter>,
    out: String,
    state: State,
    stack: Vec<Frame>,
    field: String,
}

impl<'c> Encoder<'c> {
    fn new(converter: Option<&'c Converter>) -> Self {
        Encoder {
            converter,
            out: String::new(),
            state: State::Unknown,
            stack: Vec::new(),
            field: String::new(),
        }
    }

    fn write(&mut self, token: Token<'_>) {
        match token {
            Token::ObjectOpen => self.set_state(State::Object),
            Token::ObjectClose => self.set_state(State::ObjectEnd),
            Token::ArrayOpen => self.set_state(State::Array),
            Token::ArrayClose => self.set_state(State::ArrayEnd),
            Token::Name(name) => {
                self.before_value();
                // field names are never masked
                push_json_string(&mut self.out, &name);
                self.field = name.into_owned();
            }
            Token::Str(value) => {
                self.before_value();
                let key = match self.state {
                    State::FieldValue | State::ArrayValue => self.field.as_str(),
                    _ => "",
                };
                let masked = self.hide(key, &value);
                push_json_string(&mut self.out, &masked);
            }
            Token::Number(raw) => {
                self.before_value();
                self.out.push_str(raw);
            }
            Token::Bool(true) => {
                self.before_value();
                self.out.push_str("true");
            }
            Token::Bool(false) => {
                self.before_value();
                self.out.push_str("false");
            }
            Token::Null => {
                self.before_value();
                self.out.push_str("null");
            }
        }
    }

    /// Single source of truth for container punctuation and nesting.
    fn set_state(&mut self, next: State) {
        match next {
            State::Object => {
                self.before_value();
                self.out.push('{');
                self.push_frame();
                self.state = State::Object;
            }
            State::ObjectEnd => {
                self.out.push('}');
                self.pop_frame();
            }
            State::Array => {
                self.before_value();
                self.out.push('[');
                self.push_frame();
                self.state = State::Array;
            }
            State::ArrayEnd => {
                self.out.push(']');
                self.pop_frame();
            }
            _ => {}
        }
    }

    /// Emits the separator owed before the next token and advances the
    /// name/value expectation.
    fn before_value(&mut self) {
        match self.state {
            State::FieldValue => {
                self.out.push(',');
                self.state = State::FieldName;
            }
            State::FieldName => {
                self.out.push(':');
                self.state = State::FieldValue;
            }
            State::ArrayValue => self.out.push(','),
            State::Array => self.state = State::ArrayValue,
            State::Object => self.state = State::FieldName,
            _ => {}
        }
    }

    /// Saves the enclosing context before entering a container,
    /// collapsed to the value-position kind the close will resume at.
    /// Restoring the field on pop keeps array elements masking under
    /// the nearest enclosing field name.
    fn push_frame(&mut self) {
        let state = match self.state {
            State::Object | State::FieldValue => State::FieldValue,
            State::Array | State::ArrayValue => State::ArrayValue,
            _ => State::Unknown,
        };
        self.stack.push(Frame {
            state,
            field: self.field.clone(),
        });
    }

    fn pop_frame(&mut self) {
        match self.stack.pop() {
            Some(frame) => {
                self.state = frame.state;
                self.field = frame.field;
            }
            None => self.state = State::Unknown,
        }
    }

    fn hide<'v>(&self, key: &str, value: &'v str) -> Cow<'v, str> {
        match self.converter {
            Some(converter) => converter.hide(key, value),
            None => Cow::Borrowed(value),
        }
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Writes `value` as a JSON string literal, escaping quotes,
/// backslashes and control characters only (serde_json conventions).
fn push_json_string(out: &mut String, value: &str) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
