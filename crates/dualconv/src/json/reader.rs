use std::{cell::Cell, io::Read, marker::PhantomData};

use bytes::Bytes;
use tracing::debug;

use crate::{
    codec::{ArrayLength, Reader},
    digits::{DigitClass, classify, push_digit},
    error::{ConvertError, ErrorSource, FormatError, Result},
    escape_buffer::UnicodeEscapeBuffer,
    field::{Field, FieldCursor},
    options::ReaderOptions,
    store::{ArraySource, ByteSource, ChunkSource, Recycle, StreamSource},
    utf8,
};

/// Lenient JSON scanner.
///
/// Accepts strict JSON plus single-quoted strings, unquoted scalar tokens,
/// quoted numbers, a case-insensitive `null`, and a missing comma before
/// the first element. Input bytes are decoded as UTF-8 one character at a
/// time, so multi-byte sequences may straddle chunk boundaries.
///
/// The reader holds one character of lookahead and a field cursor, which
/// makes it single-pass and not `Sync`.
#[derive(Debug)]
pub struct JsonReader<S = ArraySource> {
    source: S,
    position: i64,
    backup: Option<char>,
    cursor: FieldCursor,
    escapes: UnicodeEscapeBuffer,
    max_depth: usize,
    _not_sync: PhantomData<Cell<()>>,
}

impl JsonReader {
    pub fn new(text: impl Into<Bytes>) -> Self {
        Self::with_options(text, ReaderOptions::default())
    }

    pub fn with_options(text: impl Into<Bytes>, options: ReaderOptions) -> Self {
        Self::from_source(ArraySource::new(text), options)
    }

    /// Rebinds the reader to `text` and rewinds it.
    pub fn set_text(&mut self, text: impl Into<Bytes>) {
        self.source = ArraySource::new(text);
        self.rewind();
    }
}

impl Default for JsonReader {
    fn default() -> Self {
        Self::new(Bytes::new())
    }
}

impl JsonReader<ChunkSource> {
    pub fn from_chunks(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        Self::from_source(ChunkSource::new(chunks), ReaderOptions::default())
    }
}

impl<R: Read> JsonReader<StreamSource<R>> {
    pub fn from_stream(inner: R) -> Self {
        Self::from_source(StreamSource::new(inner), ReaderOptions::default())
    }

    pub fn into_inner(self) -> Option<R> {
        self.source.into_inner()
    }
}

impl<S: ByteSource> JsonReader<S> {
    pub fn from_source(source: S, options: ReaderOptions) -> Self {
        Self {
            source,
            position: -1,
            backup: None,
            cursor: FieldCursor::default(),
            escapes: UnicodeEscapeBuffer::new(),
            max_depth: options.max_depth,
            _not_sync: PhantomData,
        }
    }

    /// Fast-forwards to the value of the dotted `path`, skipping every
    /// sibling on the way. The reader must sit right before the opening
    /// `{` of the outermost object.
    ///
    /// Returns `false` if some segment of the path is missing, or names a
    /// value that is not an object while more segments follow. The reader
    /// is then left somewhere inside the object and should be discarded.
    ///
    /// ```
    /// use dualconv::{JsonReader, Reader};
    ///
    /// let mut reader = JsonReader::new(r#"{"a": [1, {"x": 0}], "b": {"c": 42}}"#);
    /// assert!(reader.seek("b.c")?);
    /// assert_eq!(reader.read_int()?, 42);
    /// # Ok::<(), dualconv::ConvertError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Fails on malformed input met while skipping.
    pub fn seek(&mut self, path: &str) -> Result<bool> {
        if path.is_empty() {
            return Ok(true);
        }
        for segment in path.split('.') {
            match self.next_good_char()? {
                Some('{') => {}
                Some(c) => {
                    self.back(c);
                    return Ok(false);
                }
                None => return Ok(false),
            }
            loop {
                if !self.has_next()? {
                    return Ok(false);
                }
                let key = self.read_text(true)?.unwrap_or_default();
                self.read_blank()?;
                if key == segment {
                    break;
                }
                self.skip_nested(0)?;
            }
        }
        Ok(true)
    }

    fn rewind(&mut self) {
        self.position = -1;
        self.backup = None;
        self.cursor.reset();
        self.escapes.reset();
    }

    fn err(&self, source: impl Into<ErrorSource>) -> ConvertError {
        ConvertError::new(source, self.position)
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        self.source.next_byte().map_err(|e| self.err(e))
    }

    /// The next character, decoding UTF-8 across buffer boundaries.
    fn next_char(&mut self) -> Result<Option<char>> {
        if let Some(c) = self.backup.take() {
            self.position += 1;
            return Ok(Some(c));
        }
        let Some(first) = self.next_byte()? else {
            return Ok(None);
        };
        let c = if first.is_ascii() {
            char::from(first)
        } else {
            self.decode_multibyte(first)?
        };
        self.position += 1;
        Ok(Some(c))
    }

    fn decode_multibyte(&mut self, first: u8) -> Result<char> {
        let width = utf8::sequence_len(first)
            .ok_or_else(|| self.err(FormatError::InvalidUtf8(vec![first])))?;
        let mut seq = [first, 0, 0, 0];
        for i in 1..width {
            match self.next_byte()? {
                Some(b) => seq[i] = b,
                None => return Err(self.err(FormatError::InvalidUtf8(seq[..i].to_vec()))),
            }
        }
        utf8::decode_scalar(&seq[..width]).map_err(|e| self.err(e))
    }

    /// Pushes `c` back; the next read returns it again.
    fn back(&mut self, c: char) {
        self.backup = Some(c);
        self.position -= 1;
    }

    /// The next character above `' '`.
    fn next_good_char(&mut self) -> Result<Option<char>> {
        while let Some(c) = self.next_char()? {
            if c > ' ' {
                return Ok(Some(c));
            }
        }
        Ok(None)
    }

    fn require_good_char(&mut self) -> Result<char> {
        self.next_good_char()?
            .ok_or_else(|| self.err(FormatError::UnexpectedEnd))
    }

    fn string_char(&mut self) -> Result<char> {
        self.next_char()?
            .ok_or_else(|| self.err(FormatError::UnterminatedString))
    }

    /// Reads the three characters after a leading `n`.
    fn expect_null_tail(&mut self, first: char) -> Result<()> {
        let mut literal = String::from(first);
        for _ in 0..3 {
            match self.next_char()? {
                Some(c) => literal.push(c),
                None => break,
            }
        }
        if literal.eq_ignore_ascii_case("null") {
            Ok(())
        } else {
            Err(self.err(FormatError::InvalidLiteral(literal)))
        }
    }

    /// A quoted or bare string; `null_ignore_case` widens the null literal
    /// to any capitalization.
    fn read_text(&mut self, null_ignore_case: bool) -> Result<Option<String>> {
        let c = self.require_good_char()?;
        if matches!(c, '"' | '\'') {
            return self.read_quoted(c).map(Some);
        }
        let token = self.read_bare(c)?;
        let is_null = if null_ignore_case {
            token.eq_ignore_ascii_case("null")
        } else {
            token == "null"
        };
        Ok((!is_null).then_some(token))
    }

    fn read_quoted(&mut self, quote: char) -> Result<String> {
        let mut out = String::new();
        self.escapes.reset();
        loop {
            let c = self.string_char()?;
            if c == '\\' {
                let escaped = self.string_char()?;
                if escaped == 'u' {
                    self.read_unicode_escape(&mut out)?;
                    continue;
                }
                self.escapes.flush(&mut out);
                out.push(match escaped {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    'b' => '\u{8}',
                    'f' => '\u{c}',
                    '"' | '\'' | '\\' | '/' => escaped,
                    other => return Err(self.err(FormatError::IllegalEscape(other))),
                });
                continue;
            }
            self.escapes.flush(&mut out);
            if c == quote {
                return Ok(out);
            }
            out.push(c);
        }
    }

    fn read_unicode_escape(&mut self, out: &mut String) -> Result<()> {
        for _ in 0..4 {
            let digit = self.string_char()?;
            let unit = self.escapes.feed(digit).map_err(|e| self.err(e))?;
            if let Some(unit) = unit {
                self.escapes.push_unit(unit, out);
            }
        }
        Ok(())
    }

    /// An unquoted token starting with `first`, up to the next structural
    /// character or whitespace, which is left unread.
    fn read_bare(&mut self, first: char) -> Result<String> {
        if is_terminator(first) {
            return Err(self.err(FormatError::EmptyToken(first)));
        }
        let mut token = String::from(first);
        while let Some(c) = self.next_char()? {
            if is_terminator(c) || c <= ' ' {
                self.back(c);
                break;
            }
            token.push(c);
        }
        Ok(token)
    }

    /// A null literal in any case reads as zero, like the decimal readers.
    fn read_integer(&mut self) -> Result<i64> {
        let first = self.require_good_char()?;
        if matches!(first, 'n' | 'N') {
            self.expect_null_tail(first)?;
            return Ok(0);
        }
        let mut c = first;
        let mut value = 0i64;
        let mut digits = 0usize;
        let mut negative = false;
        let mut quoted = false;
        loop {
            match classify(c) {
                DigitClass::Digit => {
                    value = push_digit(value, c.to_digit(10).unwrap_or(0));
                    digits += 1;
                }
                DigitClass::Quote => quoted = true,
                DigitClass::Stop => {
                    self.back(c);
                    break;
                }
                DigitClass::Illegal if c == '-' && digits == 0 && !negative => negative = true,
                DigitClass::Illegal => return Err(self.err(FormatError::IllegalChar(c))),
            }
            match self.next_char()? {
                Some(next) => c = next,
                None => break,
            }
        }
        if digits == 0 && !quoted {
            return Err(self.err(FormatError::EmptyToken(first)));
        }
        Ok(if negative { value.wrapping_neg() } else { value })
    }

    fn read_narrow<T: TryFrom<i64>>(&mut self) -> Result<T> {
        let value = self.read_integer()?;
        T::try_from(value).map_err(|_| self.err(FormatError::InvalidNumber(value.to_string())))
    }

    fn read_decimal<T: std::str::FromStr + Default>(&mut self) -> Result<T> {
        match self.read_text(true)? {
            None => Ok(T::default()),
            Some(token) if token.is_empty() => Ok(T::default()),
            Some(token) => token
                .trim()
                .parse()
                .map_err(|_| self.err(FormatError::InvalidNumber(token))),
        }
    }

    fn open_container(&mut self, expected: &'static str) -> Result<ArrayLength> {
        match self.require_good_char()? {
            '[' | '{' => Ok(ArrayLength::Unsized),
            c @ ('n' | 'N') => {
                self.expect_null_tail(c)?;
                Ok(ArrayLength::Null)
            }
            found => Err(self.err(FormatError::Unexpected { expected, found })),
        }
    }

    fn skip_nested(&mut self, depth: usize) -> Result<()> {
        if depth >= self.max_depth {
            return Err(self.err(FormatError::TooDeep(self.max_depth)));
        }
        match self.require_good_char()? {
            quote @ ('"' | '\'') => {
                self.read_quoted(quote)?;
            }
            '{' => {
                while self.has_next()? {
                    self.read_text(true)?;
                    self.read_blank()?;
                    self.skip_nested(depth + 1)?;
                }
            }
            '[' => {
                while self.has_next()? {
                    self.skip_nested(depth + 1)?;
                }
            }
            c => {
                self.read_bare(c)?;
            }
        }
        Ok(())
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, ',' | ']' | '}' | ':')
}

impl<S: ByteSource> Reader for JsonReader<S> {
    fn position(&self) -> i64 {
        self.position
    }

    fn read_bool(&mut self) -> Result<bool> {
        match self.read_text(true)? {
            None => Ok(false),
            Some(token) if token.eq_ignore_ascii_case("true") => Ok(true),
            Some(token) if token.eq_ignore_ascii_case("false") => Ok(false),
            Some(token) => Err(self.err(FormatError::InvalidLiteral(token))),
        }
    }

    fn read_byte(&mut self) -> Result<i8> {
        self.read_narrow()
    }

    fn read_short(&mut self) -> Result<i16> {
        self.read_narrow()
    }

    /// Chars travel as their numeric code.
    fn read_char(&mut self) -> Result<char> {
        let code: u32 = self.read_narrow()?;
        char::from_u32(code).ok_or_else(|| self.err(FormatError::InvalidChar(code)))
    }

    fn read_int(&mut self) -> Result<i32> {
        self.read_narrow()
    }

    fn read_long(&mut self) -> Result<i64> {
        self.read_integer()
    }

    fn read_float(&mut self) -> Result<f32> {
        self.read_decimal()
    }

    fn read_double(&mut self) -> Result<f64> {
        self.read_decimal()
    }

    fn read_string(&mut self) -> Result<Option<String>> {
        self.read_text(false)
    }

    fn read_small_string(&mut self) -> Result<Option<String>> {
        self.read_text(true)
    }

    fn read_array_begin(&mut self) -> Result<ArrayLength> {
        self.open_container("'[' or null")
    }

    fn read_array_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_map_begin(&mut self) -> Result<ArrayLength> {
        self.open_container("'{' or null")
    }

    fn read_map_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_blank(&mut self) -> Result<()> {
        match self.require_good_char()? {
            ':' => Ok(()),
            found => Err(self.err(FormatError::Unexpected {
                expected: "':'",
                found,
            })),
        }
    }

    fn read_object_begin(&mut self) -> Result<Option<String>> {
        self.cursor.reset();
        match self.require_good_char()? {
            '{' => Ok(Some(String::new())),
            c @ ('n' | 'N') => {
                self.expect_null_tail(c)?;
                Ok(None)
            }
            found => Err(self.err(FormatError::Unexpected {
                expected: "'{' or null",
                found,
            })),
        }
    }

    fn read_object_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        match self.next_good_char()? {
            Some(',') => Ok(true),
            Some('}' | ']') | None => Ok(false),
            Some(c) => {
                self.back(c);
                Ok(true)
            }
        }
    }

    fn read_field_index(&mut self, fields: &[Field]) -> Result<Option<usize>> {
        let alias = self.read_text(true)?.unwrap_or_default();
        let found = self.cursor.find(fields, &alias);
        if found.is_none() {
            debug!(field = %alias, "skipping unmatched field");
        }
        Ok(found)
    }

    fn skip_value(&mut self) -> Result<()> {
        self.skip_nested(0)
    }
}

impl<S: Recycle> Recycle for JsonReader<S> {
    fn recycle(&mut self) -> bool {
        self.position = -1;
        self.backup = None;
        self.cursor.reset();
        self.escapes.reset();
        self.source.recycle()
    }
}
