use std::io::{Read, Write};

use bytes::{Bytes, BytesMut};

use super::{JsonReader, JsonWriter};
use crate::{
    codec::{Decode, Encode},
    error::Result,
    options::ConvertOptions,
    pool::Pool,
    store::{ChunkSource, StreamSource},
};

/// Entry point for encoding and decoding whole values as JSON.
///
/// ```
/// use dualconv::JsonConvert;
///
/// let convert = JsonConvert::new();
/// let text = convert.convert_to(&vec![Some("a".to_string()), None])?;
/// assert_eq!(text, r#"["a",null]"#);
/// let back: Vec<Option<String>> = convert.convert_from("['a', null]")?;
/// assert_eq!(back, [Some("a".to_string()), None]);
/// # Ok::<(), dualconv::ConvertError>(())
/// ```
#[derive(Debug)]
pub struct JsonConvert {
    writers: Pool<JsonWriter>,
    readers: Pool<JsonReader>,
    options: ConvertOptions,
}

impl JsonConvert {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ConvertOptions::default())
    }

    #[must_use]
    pub fn with_options(options: ConvertOptions) -> Self {
        let ConvertOptions {
            writer,
            reader,
            pool,
        } = options;
        Self {
            writers: Pool::new(move || JsonWriter::with_options(writer), pool),
            readers: Pool::new(move || JsonReader::with_options(Bytes::new(), reader), pool),
            options,
        }
    }

    /// # Errors
    ///
    /// Propagates the value's encoding error.
    pub fn convert_to<T: Encode + ?Sized>(&self, value: &T) -> Result<String> {
        let mut writer = self.writers.acquire();
        value.encode(&mut *writer)?;
        Ok(writer.to_string())
    }

    /// Encodes into chunks drawn from `supplier`. A multi-byte character
    /// may be split between two chunks.
    ///
    /// # Errors
    ///
    /// Propagates the value's encoding error, or a supplier handing out a
    /// chunk with no spare capacity.
    pub fn convert_to_buffers<T: Encode + ?Sized>(
        &self,
        value: &T,
        supplier: impl FnMut() -> BytesMut + 'static,
    ) -> Result<Vec<Bytes>> {
        let mut writer = JsonWriter::with_chunks(supplier);
        value.encode(&mut writer)?;
        Ok(writer.into_buffers())
    }

    /// Encodes straight into `out` and flushes it.
    ///
    /// # Errors
    ///
    /// Stream failures come back as I/O errors.
    pub fn convert_to_stream<T: Encode + ?Sized, W: Write>(&self, value: &T, out: W) -> Result<()> {
        let mut writer = JsonWriter::to_stream(out);
        value.encode(&mut writer)?;
        writer.flush()
    }

    /// # Errors
    ///
    /// Fails on malformed input.
    pub fn convert_from<T: Decode>(&self, text: impl Into<Bytes>) -> Result<T> {
        let mut reader = self.readers.acquire();
        reader.set_text(text);
        T::decode(&mut *reader)
    }

    /// # Errors
    ///
    /// Fails on malformed input.
    pub fn convert_from_buffers<T: Decode>(
        &self,
        chunks: impl IntoIterator<Item = Bytes>,
    ) -> Result<T> {
        let mut reader = JsonReader::from_source(ChunkSource::new(chunks), self.options.reader);
        T::decode(&mut reader)
    }

    /// # Errors
    ///
    /// Fails on malformed input or a stream failure.
    pub fn convert_from_stream<T: Decode, R: Read>(&self, input: R) -> Result<T> {
        let mut reader = JsonReader::from_source(StreamSource::new(input), self.options.reader);
        T::decode(&mut reader)
    }

    #[must_use]
    pub fn writers(&self) -> &Pool<JsonWriter> {
        &self.writers
    }

    #[must_use]
    pub fn readers(&self) -> &Pool<JsonReader> {
        &self.readers
    }
}

impl Default for JsonConvert {
    fn default() -> Self {
        Self::new()
    }
}
