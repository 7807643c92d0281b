//! The read end of a pipe.

use std::error::Error;
use std::fmt;
use std::io::{self, Read, Write};

use tracing::warn;

use super::closer::PipeCloser;
use super::shared::{Cause, Core, Side};
use crate::error::PipeError;
use crate::sync::Arc;

/// The read end of a pipe.
///
/// Reads block until the writer supplies data or closes its end. After a
/// clean close by the writer every buffered byte is still delivered before
/// reads report end-of-stream (`Ok(0)`); after a close with an error, that
/// error follows the last buffered byte.
///
/// # Example
///
/// ```
/// use std::thread;
///
/// let (mut reader, mut writer) = ringpipe::pipe();
/// let producer = thread::spawn(move || {
///     writer.write(b"hello pipe")?;
///     writer.close()
/// });
///
/// let mut out: Vec<u8> = Vec::new();
/// reader.write_to(&mut out)?;
/// assert_eq!(out, b"hello pipe");
/// producer.join().unwrap()?;
/// # Ok::<(), ringpipe::PipeError>(())
/// ```
pub struct PipeReader {
    core: Arc<Core>,
    generation: u64,
}

impl PipeReader {
    pub(crate) fn new(core: Arc<Core>, generation: u64) -> Self {
        Self { core, generation }
    }

    /// Reads up to `buf.len()` bytes, blocking while the pipe is empty.
    ///
    /// Returns `Ok(0)` for a non-empty `buf` once the writer has closed
    /// cleanly and everything buffered has been read.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, PipeError> {
        let generation = self.generation;
        self.core
            .read_with(generation, buf.len(), |ring| ring.pop(generation, &mut *buf))
    }

    /// Same contract as [`read`](Self::read), copying the buffered region
    /// as two whole contiguous spans.
    pub fn read_direct(&mut self, buf: &mut [u8]) -> Result<usize, PipeError> {
        let generation = self.generation;
        self.core
            .read_with(generation, buf.len(), |ring| ring.pop_spans(generation, &mut *buf))
    }

    /// Reads a single byte. `Ok(None)` is end-of-stream.
    pub fn read_byte(&mut self) -> Result<Option<u8>, PipeError> {
        let generation = self.generation;
        let mut byte = None;
        self.core.read_with(generation, 1, |ring| {
            byte = ring.pop_byte(generation)?;
            Ok(usize::from(byte.is_some()))
        })?;
        Ok(byte)
    }

    /// Moves everything the writer sends into `sink` until end-of-stream,
    /// handing buffered spans to `sink` directly instead of staging them
    /// through an intermediate buffer.
    ///
    /// Returns the number of bytes transferred. The pipe lock is not held
    /// while `sink` runs, so either end can still be closed meanwhile; the
    /// writer waits until `sink` returns.
    ///
    /// If the pipe closes after some bytes were transferred, returns that
    /// count and the next call reports the close.
    ///
    /// # Errors
    ///
    /// Stops at the first error: the writer's close error, an I/O error from
    /// `sink`, or [`PipeError::ShortWrite`] if `sink` reports a count other
    /// than what it was offered. Bytes accepted by `sink` before the error
    /// are consumed.
    pub fn write_to<W: Write + ?Sized>(&mut self, sink: &mut W) -> Result<u64, PipeError> {
        let mut total = 0u64;
        loop {
            match self.core.drain_into(self.generation, &mut *sink) {
                Ok(0) => return Ok(total),
                Ok(n) => total += n as u64,
                Err(e) if e.is_closed() && total > 0 => return Ok(total),
                Err(e) => {
                    if let PipeError::ShortWrite { offered, accepted } = &e {
                        warn!(offered, accepted, total, "sink accepted a short write");
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Closes the read end. Later writes fail with `err`.
    ///
    /// Never overwrites a cause already recorded for this end; see
    /// [`close`](Self::close) for the possible results.
    pub fn close_with_error<E>(&self, err: E) -> Result<(), PipeError>
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        self.core.close(Side::Reader, Cause::from_error(err))
    }

    /// Closes the read end. Later writes fail with [`PipeError::ClosedPipe`].
    ///
    /// # Errors
    ///
    /// - [`PipeError::ClosingBusyBuffer`] if unread bytes remained. The close
    ///   still took effect.
    /// - [`PipeError::AlreadyClosed`] if this end already recorded a cause.
    pub fn close(&self) -> Result<(), PipeError> {
        self.core.close(Side::Reader, Cause::Closed)
    }

    /// Returns a handle that can close the read end from another thread.
    pub fn closer(&self) -> PipeCloser {
        PipeCloser::new(Arc::clone(&self.core), Side::Reader)
    }

    /// Closes the pipe if still open and returns the ring storage to its
    /// buffer source. Every later operation on the writer fails with
    /// [`PipeError::BufferReleased`].
    pub fn recycle(self) {
        self.core.release();
    }

    /// Returns the ring capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Returns the number of bytes waiting to be read.
    pub fn buffered(&self) -> usize {
        self.core.buffered()
    }

    /// Returns `true` once either end has closed.
    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        PipeReader::read(self, buf).map_err(io::Error::from)
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        self.core.close_if_open(Side::Reader, Cause::Closed);
    }
}

impl fmt::Debug for PipeReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeReader")
            .field("generation", &self.generation)
            .field("closed", &self.core.is_closed())
            .finish_non_exhaustive()
    }
}
