use std::io::{self, Read, Write};

use super::{ByteSink, ByteSource, Recycle};
use crate::error::ErrorSource;

/// Reads from a blocking [`Read`].
///
/// No read-ahead is performed beyond what a single value needs, so the
/// stream is left positioned right after the last decoded byte. Wrap the
/// stream in a [`std::io::BufReader`] when the underlying reads are costly.
#[derive(Debug)]
pub struct StreamSource<R> {
    inner: Option<R>,
}

impl<R: Read> StreamSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner: Some(inner) }
    }

    /// Gives the stream back; `None` once recycled.
    pub fn into_inner(self) -> Option<R> {
        self.inner
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    fn next_byte(&mut self) -> Result<Option<u8>, ErrorSource> {
        let mut byte = [0u8];
        Ok((self.read_bulk(&mut byte)? == 1).then_some(byte[0]))
    }

    fn read_bulk(&mut self, dst: &mut [u8]) -> Result<usize, ErrorSource> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(0);
        };
        let mut filled = 0;
        while filled < dst.len() {
            match inner.read(&mut dst[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    fn skip_bulk(&mut self, n: usize) -> Result<usize, ErrorSource> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(0);
        };
        let limit = u64::try_from(n).unwrap_or(u64::MAX);
        let skipped = io::copy(&mut inner.by_ref().take(limit), &mut io::sink())?;
        Ok(usize::try_from(skipped).unwrap_or(n))
    }
}

impl<R> Recycle for StreamSource<R> {
    fn recycle(&mut self) -> bool {
        self.inner = None;
        false
    }
}

/// Writes to a blocking [`Write`].
#[derive(Debug)]
pub struct StreamSink<W> {
    inner: Option<W>,
    written: usize,
}

impl<W: Write> StreamSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Some(inner),
            written: 0,
        }
    }

    /// Flushes the underlying stream.
    ///
    /// # Errors
    ///
    /// Propagates the stream's error.
    pub fn flush(&mut self) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }

    pub fn into_inner(self) -> Option<W> {
        self.inner
    }
}

impl<W: Write> ByteSink for StreamSink<W> {
    fn write_bytes(&mut self, src: &[u8]) -> Result<(), ErrorSource> {
        let inner = self.inner.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "stream already released")
        })?;
        inner.write_all(src)?;
        self.written += src.len();
        Ok(())
    }

    fn written(&self) -> usize {
        self.written
    }
}

impl<W> Recycle for StreamSink<W> {
    fn recycle(&mut self) -> bool {
        self.inner = None;
        self.written = 0;
        false
    }
}
