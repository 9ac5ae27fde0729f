use std::{fmt, io};

use bytes::{Bytes, BytesMut};
use tracing::trace;

use super::{ByteSink, ByteSource, Recycle};
use crate::error::ErrorSource;

/// Hands out empty chunks to a [`ChunkSink`]. Each chunk's spare capacity
/// is how much of the output it will hold.
pub type ChunkSupplier = Box<dyn FnMut() -> BytesMut>;

/// A supplier of fixed-size chunks.
#[must_use]
pub fn fixed_chunks(capacity: usize) -> ChunkSupplier {
    Box::new(move || BytesMut::with_capacity(capacity))
}

/// Reads from an ordered list of buffers as if they were one.
#[derive(Debug, Clone, Default)]
pub struct ChunkSource {
    chunks: Vec<Bytes>,
    index: usize,
    offset: usize,
}

impl ChunkSource {
    pub fn new(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
            index: 0,
            offset: 0,
        }
    }

    /// Moves past exhausted chunks; `false` once nothing is left.
    fn settle(&mut self) -> bool {
        while let Some(chunk) = self.chunks.get(self.index) {
            if self.offset < chunk.len() {
                return true;
            }
            self.index += 1;
            self.offset = 0;
        }
        false
    }
}

impl ByteSource for ChunkSource {
    fn next_byte(&mut self) -> Result<Option<u8>, ErrorSource> {
        if !self.settle() {
            return Ok(None);
        }
        let b = self.chunks[self.index][self.offset];
        self.offset += 1;
        Ok(Some(b))
    }

    fn take_contiguous(&mut self, n: usize) -> Option<&[u8]> {
        if !self.settle() {
            return None;
        }
        let chunk = &self.chunks[self.index];
        if chunk.len() - self.offset < n {
            return None;
        }
        let start = self.offset;
        self.offset += n;
        Some(&chunk[start..start + n])
    }

    fn read_bulk(&mut self, dst: &mut [u8]) -> Result<usize, ErrorSource> {
        let mut filled = 0;
        while filled < dst.len() && self.settle() {
            let chunk = &self.chunks[self.index];
            let n = (chunk.len() - self.offset).min(dst.len() - filled);
            dst[filled..filled + n].copy_from_slice(&chunk[self.offset..self.offset + n]);
            self.offset += n;
            filled += n;
        }
        Ok(filled)
    }

    fn skip_bulk(&mut self, n: usize) -> Result<usize, ErrorSource> {
        let mut skipped = 0;
        while skipped < n && self.settle() {
            let step = (self.chunks[self.index].len() - self.offset).min(n - skipped);
            self.offset += step;
            skipped += step;
        }
        Ok(skipped)
    }

    fn remaining_hint(&self) -> Option<usize> {
        let tail: usize = self.chunks.iter().skip(self.index).map(Bytes::len).sum();
        Some(tail.saturating_sub(self.offset))
    }
}

impl Recycle for ChunkSource {
    fn recycle(&mut self) -> bool {
        self.chunks.clear();
        self.index = 0;
        self.offset = 0;
        false
    }
}

/// Writes across chunks drawn from a supplier.
///
/// Before every write the sink makes sure the chunks it holds have enough
/// spare room for the whole value, asking the supplier for as many chunks as
/// that takes, and then fills them in order. A value may therefore straddle
/// any number of chunk boundaries.
pub struct ChunkSink {
    chunks: Vec<BytesMut>,
    index: usize,
    supplier: ChunkSupplier,
    written: usize,
}

impl ChunkSink {
    pub fn new(supplier: impl FnMut() -> BytesMut + 'static) -> Self {
        Self {
            chunks: Vec::new(),
            index: 0,
            supplier: Box::new(supplier),
            written: 0,
        }
    }

    /// The filled chunks, in order. Chunks that received nothing are dropped.
    #[must_use]
    pub fn into_buffers(self) -> Vec<Bytes> {
        self.chunks
            .into_iter()
            .filter(|chunk| !chunk.is_empty())
            .map(BytesMut::freeze)
            .collect()
    }

    /// Everything written, concatenated.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.written);
        for chunk in &self.chunks {
            out.extend_from_slice(chunk);
        }
        out
    }

    fn reserve(&mut self, n: usize) -> Result<(), ErrorSource> {
        let mut available: usize = self.chunks[self.index..].iter().map(spare).sum();
        while available < n {
            let chunk = (self.supplier)();
            let room = spare(&chunk);
            if room == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "chunk supplier returned a buffer with no spare capacity",
                )
                .into());
            }
            trace!(capacity = room, chunks = self.chunks.len() + 1, "appending chunk");
            available += room;
            self.chunks.push(chunk);
        }
        Ok(())
    }
}

fn spare(chunk: &BytesMut) -> usize {
    chunk.capacity() - chunk.len()
}

impl ByteSink for ChunkSink {
    fn write_bytes(&mut self, src: &[u8]) -> Result<(), ErrorSource> {
        self.reserve(src.len())?;
        let mut rest = src;
        while !rest.is_empty() {
            let chunk = &mut self.chunks[self.index];
            let room = spare(chunk);
            if room == 0 {
                self.index += 1;
                continue;
            }
            let n = room.min(rest.len());
            chunk.extend_from_slice(&rest[..n]);
            rest = &rest[n..];
        }
        self.written += src.len();
        Ok(())
    }

    fn written(&self) -> usize {
        self.written
    }
}

impl Recycle for ChunkSink {
    fn recycle(&mut self) -> bool {
        self.chunks.clear();
        self.index = 0;
        self.written = 0;
        false
    }
}

impl fmt::Debug for ChunkSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkSink")
            .field("chunks", &self.chunks.len())
            .field("index", &self.index)
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}
