use bytes::Bytes;
use tracing::trace;

use super::{ByteSink, ByteSource, Recycle};
use crate::{error::ErrorSource, options::WriterOptions};

/// Reads from one contiguous buffer.
#[derive(Debug, Clone, Default)]
pub struct ArraySource {
    data: Bytes,
    offset: usize,
}

impl ArraySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            offset: 0,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }
}

impl ByteSource for ArraySource {
    #[inline]
    fn next_byte(&mut self) -> Result<Option<u8>, ErrorSource> {
        let b = self.data.get(self.offset).copied();
        if b.is_some() {
            self.offset += 1;
        }
        Ok(b)
    }

    #[inline]
    fn take_contiguous(&mut self, n: usize) -> Option<&[u8]> {
        if self.remaining() < n {
            return None;
        }
        let start = self.offset;
        self.offset += n;
        Some(&self.data[start..start + n])
    }

    fn read_bulk(&mut self, dst: &mut [u8]) -> Result<usize, ErrorSource> {
        let n = dst.len().min(self.remaining());
        dst[..n].copy_from_slice(&self.data[self.offset..self.offset + n]);
        self.offset += n;
        Ok(n)
    }

    fn skip_bulk(&mut self, n: usize) -> Result<usize, ErrorSource> {
        let n = n.min(self.remaining());
        self.offset += n;
        Ok(n)
    }

    fn remaining_hint(&self) -> Option<usize> {
        Some(self.remaining())
    }
}

impl Recycle for ArraySource {
    fn recycle(&mut self) -> bool {
        self.data = Bytes::new();
        self.offset = 0;
        true
    }
}

/// Writes into a growable in-memory buffer.
#[derive(Debug)]
pub struct VecSink {
    buf: Vec<u8>,
    initial: usize,
}

impl VecSink {
    #[must_use]
    pub fn new(options: &WriterOptions) -> Self {
        Self {
            buf: Vec::with_capacity(options.initial_capacity),
            initial: options.initial_capacity,
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// A right-sized copy of everything written.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.buf.clone()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    fn grow(&mut self, additional: usize) {
        let needed = self.buf.len() + additional;
        let capacity = self.buf.capacity();
        if needed <= capacity {
            return;
        }
        let target = needed.max(capacity + capacity / 2);
        trace!(from = capacity, to = target, "growing write buffer");
        self.buf.reserve_exact(target - self.buf.len());
    }
}

impl Default for VecSink {
    fn default() -> Self {
        Self::new(&WriterOptions::default())
    }
}

impl ByteSink for VecSink {
    #[inline]
    fn write_bytes(&mut self, src: &[u8]) -> Result<(), ErrorSource> {
        self.grow(src.len());
        self.buf.extend_from_slice(src);
        Ok(())
    }

    fn written(&self) -> usize {
        self.buf.len()
    }
}

impl Recycle for VecSink {
    fn recycle(&mut self) -> bool {
        self.buf.clear();
        if self.buf.capacity() > self.initial.saturating_mul(100) {
            self.buf = Vec::with_capacity(self.initial);
        }
        true
    }
}
