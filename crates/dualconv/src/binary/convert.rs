use std::io::{Read, Write};

use bytes::{Bytes, BytesMut};

use super::{BinaryReader, BinaryWriter};
use crate::{
    codec::{Decode, Encode},
    error::Result,
    options::ConvertOptions,
    pool::Pool,
    store::{ChunkSource, StreamSource},
};

/// Entry point for encoding and decoding whole values in the binary format.
///
/// Array-backed writers and readers are drawn from pools owned by the
/// facade; chunk and stream conversions build a fresh instance each time,
/// since those instances cannot be recycled.
///
/// ```
/// use dualconv::BinaryConvert;
///
/// let convert = BinaryConvert::new();
/// let bytes = convert.convert_to(&vec![1i32, 2, 3])?;
/// let back: Vec<i32> = convert.convert_from(bytes)?;
/// assert_eq!(back, [1, 2, 3]);
/// # Ok::<(), dualconv::ConvertError>(())
/// ```
#[derive(Debug)]
pub struct BinaryConvert {
    writers: Pool<BinaryWriter>,
    readers: Pool<BinaryReader>,
    options: ConvertOptions,
}

impl BinaryConvert {
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
            writers: Pool::new(move || BinaryWriter::with_options(writer), pool),
            readers: Pool::new(
                move || BinaryReader::with_options(Bytes::new(), reader),
                pool,
            ),
            options,
        }
    }

    /// # Errors
    ///
    /// Propagates the value's encoding error.
    pub fn convert_to<T: Encode + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        let mut writer = self.writers.acquire();
        value.encode(&mut *writer)?;
        Ok(writer.to_vec())
    }

    /// Encodes into chunks drawn from `supplier`.
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
        let mut writer = BinaryWriter::with_chunks(supplier);
        value.encode(&mut writer)?;
        Ok(writer.into_buffers())
    }

    /// Encodes straight into `out` and flushes it.
    ///
    /// # Errors
    ///
    /// Stream failures come back as I/O errors.
    pub fn convert_to_stream<T: Encode + ?Sized, W: Write>(&self, value: &T, out: W) -> Result<()> {
        let mut writer = BinaryWriter::to_stream(out);
        value.encode(&mut writer)?;
        writer.flush()
    }

    /// # Errors
    ///
    /// Fails on malformed or truncated input.
    pub fn convert_from<T: Decode>(&self, data: impl Into<Bytes>) -> Result<T> {
        let mut reader = self.readers.acquire();
        reader.set_bytes(data);
        T::decode(&mut *reader)
    }

    /// Decodes the concatenation of `chunks`.
    ///
    /// # Errors
    ///
    /// Fails on malformed or truncated input.
    pub fn convert_from_buffers<T: Decode>(
        &self,
        chunks: impl IntoIterator<Item = Bytes>,
    ) -> Result<T> {
        let mut reader = BinaryReader::from_source(ChunkSource::new(chunks), self.options.reader);
        T::decode(&mut reader)
    }

    /// # Errors
    ///
    /// Fails on malformed input or a stream failure.
    pub fn convert_from_stream<T: Decode, R: Read>(&self, input: R) -> Result<T> {
        let mut reader = BinaryReader::from_source(StreamSource::new(input), self.options.reader);
        T::decode(&mut reader)
    }

    #[must_use]
    pub fn writers(&self) -> &Pool<BinaryWriter> {
        &self.writers
    }

    #[must_use]
    pub fn readers(&self) -> &Pool<BinaryReader> {
        &self.readers
    }
}

impl Default for BinaryConvert {
    fn default() -> Self {
        Self::new()
    }
}
