use std::{fmt, io::Write};

use bytes::{Bytes, BytesMut};

use crate::{
    codec::Writer,
    digits::{self, I64_TEXT_LEN},
    error::{ConvertError, Result},
    field::Field,
    options::WriterOptions,
    store::{ByteSink, ChunkSink, Recycle, StreamSink, VecSink},
    utf8,
};

/// Encoder producing JSON text.
///
/// Output is strict JSON: double-quoted strings and field names with every
/// control character escaped, and no type metadata. NaN and the infinities
/// have no JSON spelling and are written as `null`. Field separators are
/// tracked per open object so nested objects can be written without the
/// caller managing commas.
#[derive(Debug)]
pub struct JsonWriter<S = VecSink> {
    sink: S,
    comma: bool,
    enclosing: Vec<bool>,
    scratch: Vec<u8>,
}

impl JsonWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(WriterOptions::default())
    }

    #[must_use]
    pub fn with_options(options: WriterOptions) -> Self {
        Self::from_sink(VecSink::new(&options))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.sink.as_slice()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.sink.to_vec()
    }

    /// The text written so far.
    #[must_use]
    pub fn into_string(self) -> String {
        match String::from_utf8(self.sink.into_vec()) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JsonWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.sink.as_slice()))
    }
}

impl JsonWriter<ChunkSink> {
    pub fn with_chunks(supplier: impl FnMut() -> BytesMut + 'static) -> Self {
        Self::from_sink(ChunkSink::new(supplier))
    }

    #[must_use]
    pub fn into_buffers(self) -> Vec<Bytes> {
        self.sink.into_buffers()
    }
}

impl<W: Write> JsonWriter<StreamSink<W>> {
    pub fn to_stream(inner: W) -> Self {
        Self::from_sink(StreamSink::new(inner))
    }

    /// # Errors
    ///
    /// Wraps the stream's flush error.
    pub fn flush(&mut self) -> Result<()> {
        let position = self.position();
        self.sink
            .flush()
            .map_err(|e| ConvertError::new(e, position))
    }

    pub fn into_inner(self) -> Option<W> {
        self.sink.into_inner()
    }
}

impl<S: ByteSink> JsonWriter<S> {
    pub fn from_sink(sink: S) -> Self {
        Self {
            sink,
            comma: false,
            enclosing: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Bytes written so far.
    pub fn count(&self) -> usize {
        self.sink.written()
    }

    /// Index of the last byte written; `-1` before the first.
    pub fn position(&self) -> i64 {
        i64::try_from(self.sink.written()).unwrap_or(i64::MAX) - 1
    }

    fn raw(&mut self, bytes: &[u8]) -> Result<()> {
        let position = self.position();
        self.sink
            .write_bytes(bytes)
            .map_err(|e| ConvertError::new(e, position))
    }

    fn write_integer(&mut self, value: i64) -> Result<()> {
        let mut buf = [0u8; I64_TEXT_LEN];
        self.raw(digits::format_i64(value, &mut buf))
    }

    fn write_quoted(&mut self, value: &str) -> Result<()> {
        if !utf8::needs_escape(value) {
            self.raw(b"\"")?;
            self.raw(value.as_bytes())?;
            return self.raw(b"\"");
        }
        let mut escaped = std::mem::take(&mut self.scratch);
        escaped.clear();
        escaped.push(b'"');
        utf8::escape_into(value, &mut escaped);
        escaped.push(b'"');
        let written = self.raw(&escaped);
        self.scratch = escaped;
        written
    }
}

impl<S: ByteSink> Writer for JsonWriter<S> {
    fn needs_class_name(&self) -> bool {
        false
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        let literal: &[u8] = if value { b"true" } else { b"false" };
        self.raw(literal)
    }

    fn write_byte(&mut self, value: i8) -> Result<()> {
        self.write_integer(i64::from(value))
    }

    fn write_short(&mut self, value: i16) -> Result<()> {
        self.write_integer(i64::from(value))
    }

    /// Chars are written as their numeric code.
    fn write_char(&mut self, value: char) -> Result<()> {
        self.write_integer(i64::from(u32::from(value)))
    }

    fn write_int(&mut self, value: i32) -> Result<()> {
        let mut buf = [0u8; I64_TEXT_LEN];
        self.raw(digits::format_i32(value, &mut buf))
    }

    fn write_long(&mut self, value: i64) -> Result<()> {
        self.write_integer(value)
    }

    fn write_float(&mut self, value: f32) -> Result<()> {
        if !value.is_finite() {
            return self.write_null();
        }
        self.raw(value.to_string().as_bytes())
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return self.write_null();
        }
        self.raw(value.to_string().as_bytes())
    }

    fn write_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            Some(s) => self.write_quoted(s),
            None => self.write_null(),
        }
    }

    fn write_small_string(&mut self, value: &str) -> Result<()> {
        self.write_quoted(value)
    }

    fn write_null(&mut self) -> Result<()> {
        self.raw(b"null")
    }

    fn write_array_begin(&mut self, _len: usize) -> Result<()> {
        self.raw(b"[")
    }

    fn write_array_mark(&mut self) -> Result<()> {
        self.raw(b",")
    }

    fn write_array_end(&mut self) -> Result<()> {
        self.raw(b"]")
    }

    fn write_map_begin(&mut self, _len: usize) -> Result<()> {
        self.raw(b"{")
    }

    fn write_map_mark(&mut self) -> Result<()> {
        self.raw(b":")
    }

    fn write_map_end(&mut self) -> Result<()> {
        self.raw(b"}")
    }

    fn write_object_begin(&mut self) -> Result<()> {
        self.enclosing.push(self.comma);
        self.comma = false;
        self.raw(b"{")
    }

    fn write_object_null(&mut self) -> Result<()> {
        self.write_null()
    }

    fn write_object_end(&mut self) -> Result<()> {
        self.comma = self.enclosing.pop().unwrap_or(false);
        self.raw(b"}")
    }

    fn write_field_name(&mut self, field: &Field) -> Result<()> {
        if self.comma {
            self.raw(b",")?;
        }
        self.comma = true;
        self.write_quoted(field.alias())?;
        self.raw(b":")
    }
}

impl<S: Recycle> Recycle for JsonWriter<S> {
    fn recycle(&mut self) -> bool {
        self.comma = false;
        self.enclosing.clear();
        self.scratch.clear();
        self.sink.recycle()
    }
}
