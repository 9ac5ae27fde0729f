//! Backing stores the readers and writers run over.
//!
//! A reader is generic over a [`ByteSource`] and a writer over a
//! [`ByteSink`]; the three adapters (single array, chunk list, blocking
//! stream) behave identically from the codec's point of view. Only the
//! stream adapters can fail, and their I/O errors come back as
//! [`ErrorSource::Io`].

mod array;
mod chunked;
mod stream;

pub use array::{ArraySource, VecSink};
pub use chunked::{ChunkSink, ChunkSource, ChunkSupplier, fixed_chunks};
pub use stream::{StreamSink, StreamSource};

use crate::error::ErrorSource;

/// Where a reader pulls bytes from.
pub trait ByteSource {
    /// The next byte, or `None` once the input is exhausted.
    ///
    /// # Errors
    ///
    /// Stream-backed sources surface read failures.
    fn next_byte(&mut self) -> Result<Option<u8>, ErrorSource>;

    /// Consumes and borrows the next `n` bytes if they sit contiguously in
    /// the current buffer. `None` leaves the source untouched and the caller
    /// falls back to [`ByteSource::read_bulk`].
    fn take_contiguous(&mut self, n: usize) -> Option<&[u8]> {
        let _ = n;
        None
    }

    /// Fills as much of `dst` as the input allows and returns the count;
    /// anything short of `dst.len()` means the input ended.
    ///
    /// # Errors
    ///
    /// Stream-backed sources surface read failures.
    fn read_bulk(&mut self, dst: &mut [u8]) -> Result<usize, ErrorSource> {
        for (i, slot) in dst.iter_mut().enumerate() {
            match self.next_byte()? {
                Some(b) => *slot = b,
                None => return Ok(i),
            }
        }
        Ok(dst.len())
    }

    /// Discards up to `n` bytes and returns how many were discarded.
    ///
    /// # Errors
    ///
    /// Stream-backed sources surface read failures.
    fn skip_bulk(&mut self, n: usize) -> Result<usize, ErrorSource> {
        for i in 0..n {
            if self.next_byte()?.is_none() {
                return Ok(i);
            }
        }
        Ok(n)
    }

    /// Bytes left, when the source knows.
    fn remaining_hint(&self) -> Option<usize> {
        None
    }
}

/// Where a writer pushes bytes to.
pub trait ByteSink {
    /// Appends `src` in full.
    ///
    /// # Errors
    ///
    /// Stream-backed sinks surface write failures; the chunked sink fails
    /// if its supplier hands out a buffer with no room.
    fn write_bytes(&mut self, src: &[u8]) -> Result<(), ErrorSource>;

    /// Appends one byte.
    ///
    /// # Errors
    ///
    /// See [`ByteSink::write_bytes`].
    fn write_byte(&mut self, b: u8) -> Result<(), ErrorSource> {
        self.write_bytes(&[b])
    }

    /// Bytes written so far.
    fn written(&self) -> usize;
}

/// Resets an instance so a pool can hand it out again.
pub trait Recycle {
    /// Drops every reference to the backing store and rewinds the cursor.
    ///
    /// Returns whether the instance may be reused. Instances bound to
    /// externally owned chunks or streams return `false` and are discarded.
    fn recycle(&mut self) -> bool;
}
