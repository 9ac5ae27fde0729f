use std::{cell::Cell, io::Read, marker::PhantomData};

use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use tracing::debug;

use crate::{
    codec::{ArrayLength, Reader},
    error::{ConvertError, ErrorSource, FormatError, Result},
    field::{Field, FieldCursor},
    options::ReaderOptions,
    store::{ArraySource, ByteSource, ChunkSource, Recycle, StreamSource},
    utf8,
    wire::{
        SIGN_HAS_NEXT, SIGN_NO_NEXT, SIGN_NULL, SIGN_OBJECT_BEGIN, SIGN_OBJECT_END, STRING_NULL,
        WireTag,
    },
};

/// Scratch size for strings read from sources that cannot lend a slice.
const COPY_CHUNK: usize = 512;

/// Decoder for the tagged binary format.
///
/// The reader is single-pass and keeps per-object state (the field cursor
/// and the tag of the last field read), so it is deliberately not `Sync`.
#[derive(Debug)]
pub struct BinaryReader<S = ArraySource> {
    source: S,
    position: i64,
    cursor: FieldCursor,
    tag: Option<WireTag>,
    max_depth: usize,
    _not_sync: PhantomData<Cell<()>>,
}

impl BinaryReader {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self::with_options(data, ReaderOptions::default())
    }

    pub fn with_options(data: impl Into<Bytes>, options: ReaderOptions) -> Self {
        Self::from_source(ArraySource::new(data), options)
    }

    /// Rebinds the reader to `data` and rewinds it.
    pub fn set_bytes(&mut self, data: impl Into<Bytes>) {
        self.source = ArraySource::new(data);
        self.rewind();
    }
}

impl Default for BinaryReader {
    fn default() -> Self {
        Self::new(Bytes::new())
    }
}

impl BinaryReader<ChunkSource> {
    /// Reads the concatenation of `chunks`.
    pub fn from_chunks(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        Self::from_source(ChunkSource::new(chunks), ReaderOptions::default())
    }
}

impl<R: Read> BinaryReader<StreamSource<R>> {
    pub fn from_stream(inner: R) -> Self {
        Self::from_source(StreamSource::new(inner), ReaderOptions::default())
    }

    pub fn into_inner(self) -> Option<R> {
        self.source.into_inner()
    }
}

impl<S: ByteSource> BinaryReader<S> {
    pub fn from_source(source: S, options: ReaderOptions) -> Self {
        Self {
            source,
            position: -1,
            cursor: FieldCursor::default(),
            tag: None,
            max_depth: options.max_depth,
            _not_sync: PhantomData,
        }
    }

    /// Skips one value encoded with `tag`.
    ///
    /// # Errors
    ///
    /// Fails on truncated input, on malformed nested objects, and on
    /// objects nested deeper than the configured `max_depth`.
    pub fn skip_as(&mut self, tag: WireTag) -> Result<()> {
        self.skip_tagged(tag, 0)
    }

    fn rewind(&mut self) {
        self.position = -1;
        self.cursor.reset();
        self.tag = None;
    }

    fn err(&self, source: impl Into<ErrorSource>) -> ConvertError {
        ConvertError::new(source, self.position)
    }

    fn advance(&mut self, n: usize) {
        self.position = self
            .position
            .saturating_add(i64::try_from(n).unwrap_or(i64::MAX));
    }

    fn fill<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        if let Some(bytes) = self.source.take_contiguous(N) {
            buf.copy_from_slice(bytes);
        } else {
            let got = self.source.read_bulk(&mut buf).map_err(|e| self.err(e))?;
            if got < N {
                self.advance(got);
                return Err(self.err(FormatError::UnexpectedEnd));
            }
        }
        self.advance(N);
        Ok(buf)
    }

    fn read_u8(&mut self) -> Result<u8> {
        let [b] = self.fill::<1>()?;
        Ok(b)
    }

    fn read_i16(&mut self) -> Result<i16> {
        Ok(BigEndian::read_i16(&self.fill::<2>()?))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(BigEndian::read_i32(&self.fill::<4>()?))
    }

    /// Fails early when the source knows it cannot hold `len` more bytes.
    fn ensure_available(&self, len: usize) -> Result<()> {
        match self.source.remaining_hint() {
            Some(remaining) if remaining < len => Err(self.err(FormatError::UnexpectedEnd)),
            _ => Ok(()),
        }
    }

    fn read_utf8(&mut self, len: usize) -> Result<String> {
        self.ensure_available(len)?;
        if let Some(bytes) = self.source.take_contiguous(len) {
            let decoded = utf8::decode(bytes);
            self.advance(len);
            return decoded.map_err(|e| self.err(e));
        }
        let mut out = Vec::with_capacity(len.min(COPY_CHUNK * 16));
        let mut scratch = [0u8; COPY_CHUNK];
        while out.len() < len {
            let want = (len - out.len()).min(COPY_CHUNK);
            let got = self
                .source
                .read_bulk(&mut scratch[..want])
                .map_err(|e| self.err(e))?;
            self.advance(got);
            out.extend_from_slice(&scratch[..got]);
            if got < want {
                return Err(self.err(FormatError::UnexpectedEnd));
            }
        }
        utf8::decode(&out).map_err(|e| self.err(e))
    }

    fn skip_exact(&mut self, n: usize) -> Result<()> {
        self.ensure_available(n)?;
        let skipped = self.source.skip_bulk(n).map_err(|e| self.err(e))?;
        self.advance(skipped);
        if skipped < n {
            return Err(self.err(FormatError::UnexpectedEnd));
        }
        Ok(())
    }

    fn read_length(&mut self) -> Result<Option<usize>> {
        match self.read_i32()? {
            STRING_NULL => Ok(None),
            len => usize::try_from(len)
                .map(Some)
                .map_err(|_| self.err(FormatError::NegativeLength(len))),
        }
    }

    fn read_count(&mut self) -> Result<ArrayLength> {
        let high = self.read_i16()?;
        if high == SIGN_NULL {
            return Ok(ArrayLength::Null);
        }
        let low = BigEndian::read_u16(&self.fill::<2>()?);
        let count = (i32::from(high) << 16) | i32::from(low);
        usize::try_from(count)
            .map(ArrayLength::Sized)
            .map_err(|_| self.err(FormatError::NegativeLength(count)))
    }

    fn expect_sentinel(&mut self, expected: i16) -> Result<()> {
        let found = self.read_i16()?;
        if found != expected {
            return Err(self.err(FormatError::SentinelMismatch { expected, found }));
        }
        Ok(())
    }

    fn skip_small_string(&mut self) -> Result<()> {
        let len = self.read_u8()?;
        self.skip_exact(usize::from(len))
    }

    fn skip_string(&mut self) -> Result<()> {
        match self.read_length()? {
            Some(len) => self.skip_exact(len),
            None => Ok(()),
        }
    }

    fn read_tag(&mut self) -> Result<WireTag> {
        let b = self.read_u8()?;
        WireTag::try_from(b).map_err(|e| self.err(e))
    }

    fn skip_tagged(&mut self, tag: WireTag, depth: usize) -> Result<()> {
        if let Some(width) = tag.fixed_width() {
            return self.skip_exact(width);
        }
        if let Some(width) = tag.element().and_then(WireTag::fixed_width) {
            if let ArrayLength::Sized(n) = self.read_count()? {
                let total = n
                    .checked_mul(width)
                    .ok_or_else(|| self.err(FormatError::LengthOverflow(n)))?;
                self.skip_exact(total)?;
            }
            return Ok(());
        }
        match tag {
            WireTag::String => self.skip_string(),
            WireTag::StringArray => {
                if let ArrayLength::Sized(n) = self.read_count()? {
                    for _ in 0..n {
                        self.skip_string()?;
                    }
                }
                Ok(())
            }
            _ => self.skip_object(depth),
        }
    }

    /// Consumes a nested object without knowing its type.
    fn skip_object(&mut self, depth: usize) -> Result<()> {
        if depth >= self.max_depth {
            return Err(self.err(FormatError::TooDeep(self.max_depth)));
        }
        self.skip_small_string()?;
        match self.read_i16()? {
            SIGN_NULL => return Ok(()),
            SIGN_OBJECT_BEGIN => {}
            found => {
                return Err(self.err(FormatError::SentinelMismatch {
                    expected: SIGN_OBJECT_BEGIN,
                    found,
                }));
            }
        }
        while self.has_next()? {
            self.skip_small_string()?;
            let tag = self.read_tag()?;
            self.skip_tagged(tag, depth + 1)?;
        }
        self.expect_sentinel(SIGN_OBJECT_END)
    }
}

impl<S: ByteSource> Reader for BinaryReader<S> {
    fn position(&self) -> i64 {
        self.position
    }

    fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    fn read_byte(&mut self) -> Result<i8> {
        Ok(i8::from_be_bytes(self.fill::<1>()?))
    }

    fn read_short(&mut self) -> Result<i16> {
        self.read_i16()
    }

    fn read_char(&mut self) -> Result<char> {
        let unit = u32::from(BigEndian::read_u16(&self.fill::<2>()?));
        char::from_u32(unit).ok_or_else(|| self.err(FormatError::InvalidChar(unit)))
    }

    fn read_int(&mut self) -> Result<i32> {
        self.read_i32()
    }

    fn read_long(&mut self) -> Result<i64> {
        Ok(BigEndian::read_i64(&self.fill::<8>()?))
    }

    fn read_float(&mut self) -> Result<f32> {
        Ok(BigEndian::read_f32(&self.fill::<4>()?))
    }

    fn read_double(&mut self) -> Result<f64> {
        Ok(BigEndian::read_f64(&self.fill::<8>()?))
    }

    fn read_string(&mut self) -> Result<Option<String>> {
        match self.read_length()? {
            None => Ok(None),
            Some(0) => Ok(Some(String::new())),
            Some(len) => self.read_utf8(len).map(Some),
        }
    }

    fn read_small_string(&mut self) -> Result<Option<String>> {
        let len = self.read_u8()?;
        self.read_utf8(usize::from(len)).map(Some)
    }

    fn read_array_begin(&mut self) -> Result<ArrayLength> {
        self.read_count()
    }

    fn read_array_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_map_begin(&mut self) -> Result<ArrayLength> {
        self.read_count()
    }

    fn read_map_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_blank(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_object_begin(&mut self) -> Result<Option<String>> {
        self.cursor.reset();
        let len = self.read_u8()?;
        let class_name = self.read_utf8(usize::from(len))?;
        match self.read_i16()? {
            SIGN_NULL => Ok(None),
            SIGN_OBJECT_BEGIN => Ok(Some(class_name)),
            found => Err(self.err(FormatError::SentinelMismatch {
                expected: SIGN_OBJECT_BEGIN,
                found,
            })),
        }
    }

    fn read_object_end(&mut self) -> Result<()> {
        self.expect_sentinel(SIGN_OBJECT_END)
    }

    fn has_next(&mut self) -> Result<bool> {
        match self.read_u8()? {
            SIGN_HAS_NEXT => Ok(true),
            SIGN_NO_NEXT => Ok(false),
            other => Err(self.err(FormatError::IllegalHasNext(other))),
        }
    }

    fn read_field_index(&mut self, fields: &[Field]) -> Result<Option<usize>> {
        let len = self.read_u8()?;
        let alias = self.read_utf8(usize::from(len))?;
        let tag = self.read_tag()?;
        self.tag = Some(tag);
        let found = self.cursor.find(fields, &alias);
        if found.is_none() {
            debug!(field = %alias, ?tag, "skipping unmatched field");
        }
        Ok(found)
    }

    fn skip_value(&mut self) -> Result<()> {
        let tag = self
            .tag
            .ok_or_else(|| self.err(FormatError::UnknownTag(0)))?;
        self.skip_tagged(tag, 0)
    }
}

impl<S: Recycle> Recycle for BinaryReader<S> {
    fn recycle(&mut self) -> bool {
        self.position = -1;
        self.cursor.reset();
        self.tag = None;
        self.source.recycle()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn reader(bytes: &[u8]) -> BinaryReader {
        BinaryReader::new(bytes.to_vec())
    }

    #[test]
    fn reads_a_single_field_object() {
        let mut r = reader(&[0, 0x00, 0xBB, 1, 1, b'a', 5, 0, 0, 0, 1, 0, 0x00, 0xEE]);
        let fields = [Field::new("a", WireTag::Int)];
        assert_eq!(r.read_object_begin().unwrap(), Some(String::new()));
        assert!(r.has_next().unwrap());
        assert_eq!(r.read_field_index(&fields).unwrap(), Some(0));
        assert_eq!(r.read_int().unwrap(), 1);
        assert!(!r.has_next().unwrap());
        r.read_object_end().unwrap();
        assert_eq!(r.position(), 13);
    }

    #[test]
    fn field_name_lookup() {
        let fields = [Field::new("a", WireTag::Long), Field::new("b", WireTag::Int)];
        let mut r = reader(&[
            0, 0x00, 0xBB, 1, 1, b'b', 5, 0, 0, 0, 1, 1, 2, b'z', b'z', 5, 0, 0, 0, 2, 0, 0x00,
            0xEE,
        ]);
        assert_eq!(r.read_object_begin().unwrap(), Some(String::new()));
        assert!(r.has_next().unwrap());
        assert_eq!(r.read_field_name(&fields).unwrap(), Some(&fields[1]));
        r.read_blank().unwrap();
        assert_eq!(r.read_int().unwrap(), 1);
        assert!(r.has_next().unwrap());
        assert_eq!(r.read_field_name(&fields).unwrap(), None);
        r.skip_value().unwrap();
        assert!(!r.has_next().unwrap());
        r.read_object_end().unwrap();
    }

    #[test]
    fn null_object_and_array() {
        let mut r = reader(&[0, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(r.read_object_begin().unwrap(), None);
        assert_eq!(r.read_array_begin().unwrap(), ArrayLength::Null);
    }

    #[test]
    fn sentinel_mismatch_reports_position() {
        let mut r = reader(&[0, 0x12, 0x34]);
        let err = r.read_object_begin().unwrap_err();
        assert_eq!(
            err.format_error(),
            Some(&FormatError::SentinelMismatch {
                expected: SIGN_OBJECT_BEGIN,
                found: 0x1234,
            })
        );
        assert_eq!(err.position(), 2);
    }

    #[test]
    fn illegal_has_next_flag() {
        let err = reader(&[7]).has_next().unwrap_err();
        assert_eq!(err.format_error(), Some(&FormatError::IllegalHasNext(7)));
    }

    #[test]
    fn unknown_tag_is_fatal() {
        let err = reader(&[1, b'x', 42])
            .read_field_index(&[])
            .unwrap_err();
        assert_eq!(err.format_error(), Some(&FormatError::UnknownTag(42)));
    }

    #[test]
    fn truncated_long() {
        let err = reader(&[0, 0, 0]).read_long().unwrap_err();
        assert_eq!(err.format_error(), Some(&FormatError::UnexpectedEnd));
        assert_eq!(err.position(), 2);
    }

    #[test]
    fn string_lengths() {
        let mut r = reader(&[0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0, 0, 0, 0, 2, b'h', b'i']);
        assert_eq!(r.read_string().unwrap(), None);
        assert_eq!(r.read_string().unwrap().as_deref(), Some(""));
        assert_eq!(r.read_string().unwrap().as_deref(), Some("hi"));

        let err = reader(&[0xFF, 0xFF, 0xFF, 0xFE]).read_string().unwrap_err();
        assert_eq!(err.format_error(), Some(&FormatError::NegativeLength(-2)));

        let err = reader(&[0, 0, 0x10, 0, b'a']).read_string().unwrap_err();
        assert_eq!(err.format_error(), Some(&FormatError::UnexpectedEnd));
    }

    #[test]
    fn surrogate_char_is_rejected() {
        let err = reader(&[0xD8, 0x00]).read_char().unwrap_err();
        assert_eq!(err.format_error(), Some(&FormatError::InvalidChar(0xD800)));
    }

    #[test]
    fn skip_primitive_arrays_in_bulk() {
        let mut r = reader(&[0, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0, 2, 9]);
        r.skip_as(WireTag::IntArray).unwrap();
        assert_eq!(r.read_byte().unwrap(), 9);
    }

    #[test]
    fn skip_nested_opaque_object() {
        let bytes = [
            0, 0x00, 0xBB, // begin
            1, 1, b'n', 9, 0, 0, 0, 1, b'z', // n: "z"
            1, 1, b'o', 127, 0, 0x00, 0xBB, 0, 0x00, 0xEE, // o: {}
            0, 0x00, 0xEE, // end
            0x2A,
        ];
        let mut r = reader(&bytes);
        r.skip_as(WireTag::Object).unwrap();
        assert_eq!(r.read_byte().unwrap(), 0x2A);
    }

    #[test]
    fn skip_depth_is_bounded() {
        let mut bytes = Vec::new();
        for _ in 0..3 {
            bytes.extend_from_slice(&[0, 0x00, 0xBB, 1, 1, b'o', 127]);
        }
        let mut r = BinaryReader::with_options(bytes, ReaderOptions { max_depth: 2 });
        let err = r.skip_as(WireTag::Object).unwrap_err();
        assert_eq!(err.format_error(), Some(&FormatError::TooDeep(2)));
    }

    #[test]
    fn stream_reader_matches_array_reader() {
        let bytes = [0, 0, 0, 3, b'a', b'b', b'c', 0x7F];
        let mut r = BinaryReader::from_stream(Cursor::new(bytes.to_vec()));
        assert_eq!(r.read_string().unwrap().as_deref(), Some("abc"));
        assert_eq!(r.read_byte().unwrap(), 0x7F);
        assert_eq!(r.position(), 7);
    }

    #[test]
    fn recycle_rewinds() {
        let mut r = reader(&[1, 2]);
        r.read_short().unwrap();
        assert!(r.recycle());
        assert_eq!(r.position(), -1);
        r.set_bytes(vec![0, 5]);
        assert_eq!(r.read_short().unwrap(), 5);

        let mut chunked = BinaryReader::from_chunks([Bytes::from_static(&[1])]);
        assert!(!chunked.recycle());
    }
}
