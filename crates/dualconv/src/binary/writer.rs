use std::io::Write;

use byteorder::{BigEndian, ByteOrder};
use bytes::{Bytes, BytesMut};

use crate::{
    codec::Writer,
    error::{ConvertError, FormatError, Result},
    field::Field,
    options::WriterOptions,
    store::{ByteSink, ChunkSink, Recycle, StreamSink, VecSink},
    wire::{
        SIGN_HAS_NEXT, SIGN_NO_NEXT, SIGN_NULL, SIGN_OBJECT_BEGIN, SIGN_OBJECT_END, STRING_NULL,
    },
};

/// Encoder for the tagged binary format.
///
/// All multi-byte values are big-endian. The sink decides where the bytes
/// go: a growable buffer (the default), a list of chunks, or a stream.
#[derive(Debug)]
pub struct BinaryWriter<S = VecSink> {
    sink: S,
}

impl BinaryWriter {
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

    /// A right-sized copy of the output.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.sink.to_vec()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.sink.into_vec()
    }
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryWriter<ChunkSink> {
    /// Writes into chunks handed out by `supplier`.
    pub fn with_chunks(supplier: impl FnMut() -> BytesMut + 'static) -> Self {
        Self::from_sink(ChunkSink::new(supplier))
    }

    /// The written chunks, ready to hand to an I/O layer.
    #[must_use]
    pub fn into_buffers(self) -> Vec<Bytes> {
        self.sink.into_buffers()
    }
}

impl<W: Write> BinaryWriter<StreamSink<W>> {
    /// Writes straight to `inner`.
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

impl<S: ByteSink> BinaryWriter<S> {
    pub fn from_sink(sink: S) -> Self {
        Self { sink }
    }

    /// Bytes written so far.
    pub fn count(&self) -> usize {
        self.sink.written()
    }

    /// Index of the last byte written; `-1` before the first.
    pub fn position(&self) -> i64 {
        i64::try_from(self.sink.written()).unwrap_or(i64::MAX) - 1
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Opens an object and records `class_name` in its class slot, for
    /// readers that dispatch on the concrete type.
    ///
    /// # Errors
    ///
    /// Fails if `class_name` is not a valid small string.
    pub fn write_typed_object_begin(&mut self, class_name: &str) -> Result<()> {
        self.write_small_string(class_name)?;
        self.write_i16(SIGN_OBJECT_BEGIN)
    }

    fn raw(&mut self, bytes: &[u8]) -> Result<()> {
        let position = self.position();
        self.sink
            .write_bytes(bytes)
            .map_err(|e| ConvertError::new(e, position))
    }

    fn fail(&self, error: FormatError) -> ConvertError {
        ConvertError::new(error, self.position())
    }

    fn write_i16(&mut self, value: i16) -> Result<()> {
        let mut buf = [0; 2];
        BigEndian::write_i16(&mut buf, value);
        self.raw(&buf)
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        let mut buf = [0; 4];
        BigEndian::write_i32(&mut buf, value);
        self.raw(&buf)
    }

    /// Length prefix of a small string, checked before anything is written.
    fn small_len(&self, value: &str) -> Result<u8> {
        if let Some(c) = value.chars().find(|c| !c.is_ascii()) {
            return Err(self.fail(FormatError::NonAsciiSmallString(c)));
        }
        u8::try_from(value.len())
            .map_err(|_| self.fail(FormatError::SmallStringTooLong(value.len())))
    }

    fn write_length(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len).map_err(|_| self.fail(FormatError::LengthOverflow(len)))?;
        self.write_i32(len)
    }
}

impl<S: ByteSink> Writer for BinaryWriter<S> {
    fn needs_class_name(&self) -> bool {
        true
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.raw(&[u8::from(value)])
    }

    fn write_byte(&mut self, value: i8) -> Result<()> {
        self.raw(&value.to_be_bytes())
    }

    fn write_short(&mut self, value: i16) -> Result<()> {
        self.write_i16(value)
    }

    fn write_char(&mut self, value: char) -> Result<()> {
        let unit = u16::try_from(u32::from(value))
            .map_err(|_| self.fail(FormatError::WideChar(value)))?;
        let mut buf = [0; 2];
        BigEndian::write_u16(&mut buf, unit);
        self.raw(&buf)
    }

    fn write_int(&mut self, value: i32) -> Result<()> {
        self.write_i32(value)
    }

    fn write_long(&mut self, value: i64) -> Result<()> {
        let mut buf = [0; 8];
        BigEndian::write_i64(&mut buf, value);
        self.raw(&buf)
    }

    fn write_float(&mut self, value: f32) -> Result<()> {
        let mut buf = [0; 4];
        BigEndian::write_f32(&mut buf, value);
        self.raw(&buf)
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        let mut buf = [0; 8];
        BigEndian::write_f64(&mut buf, value);
        self.raw(&buf)
    }

    fn write_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            None => self.write_i32(STRING_NULL),
            Some(s) => {
                self.write_length(s.len())?;
                self.raw(s.as_bytes())
            }
        }
    }

    fn write_small_string(&mut self, value: &str) -> Result<()> {
        let len = self.small_len(value)?;
        self.raw(&[len])?;
        self.raw(value.as_bytes())
    }

    fn write_null(&mut self) -> Result<()> {
        self.write_i16(SIGN_NULL)
    }

    fn write_array_begin(&mut self, len: usize) -> Result<()> {
        self.write_length(len)
    }

    fn write_array_mark(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_array_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_map_begin(&mut self, len: usize) -> Result<()> {
        self.write_length(len)
    }

    fn write_map_mark(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_map_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_object_begin(&mut self) -> Result<()> {
        self.write_typed_object_begin("")
    }

    fn write_object_null(&mut self) -> Result<()> {
        self.write_small_string("")?;
        self.write_i16(SIGN_NULL)
    }

    fn write_object_end(&mut self) -> Result<()> {
        self.raw(&[SIGN_NO_NEXT])?;
        self.write_i16(SIGN_OBJECT_END)
    }

    fn write_field_name(&mut self, field: &Field) -> Result<()> {
        let alias = field.alias();
        let len = self.small_len(alias)?;
        self.raw(&[SIGN_HAS_NEXT, len])?;
        self.raw(alias.as_bytes())?;
        self.raw(&[field.tag().as_u8()])
    }
}

impl<S: Recycle> Recycle for BinaryWriter<S> {
    fn recycle(&mut self) -> bool {
        self.sink.recycle()
    }
}
