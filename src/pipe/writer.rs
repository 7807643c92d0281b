//! The write end of a pipe.

use std::error::Error;
use std::fmt;
use std::io::{self, Write};

use super::closer::PipeCloser;
use super::shared::{Cause, Core, Side};
use crate::error::PipeError;
use crate::sync::Arc;

/// The write end of a pipe.
///
/// Writes block while the ring is full, so a slow reader bounds how far
/// the writer can run ahead.
pub struct PipeWriter {
    core: Arc<Core>,
    generation: u64,
}

impl PipeWriter {
    pub(crate) fn new(core: Arc<Core>, generation: u64) -> Self {
        Self { core, generation }
    }

    /// Writes all of `data`, blocking whenever the ring is full.
    ///
    /// Returns `data.len()` unless the pipe closes part way through, in
    /// which case it returns the bytes accepted before the close and the
    /// next call reports the close error.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, PipeError> {
        let generation = self.generation;
        self.core
            .write_with(generation, data, |ring, rest| ring.push(generation, rest))
    }

    /// Same contract as [`write`](Self::write), filling the free region as
    /// two whole contiguous spans.
    pub fn write_direct(&mut self, data: &[u8]) -> Result<usize, PipeError> {
        let generation = self.generation;
        self.core
            .write_with(generation, data, |ring, rest| ring.push_spans(generation, rest))
    }

    /// Blocks until the reader has consumed every buffered byte.
    pub fn flush(&mut self) -> Result<(), PipeError> {
        self.core.flush(self.generation)
    }

    /// Closes the write end. Once the buffer drains, reads fail with `err`.
    ///
    /// # Errors
    ///
    /// [`PipeError::AlreadyClosed`] if this end already recorded a cause.
    pub fn close_with_error<E>(&self, err: E) -> Result<(), PipeError>
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        self.core.close(Side::Writer, Cause::from_error(err))
    }

    /// Closes the write end. Once the buffer drains, reads report
    /// end-of-stream.
    pub fn close(&self) -> Result<(), PipeError> {
        self.core.close(Side::Writer, Cause::Finished)
    }

    /// Returns a handle that can close the write end from another thread.
    pub fn closer(&self) -> PipeCloser {
        PipeCloser::new(Arc::clone(&self.core), Side::Writer)
    }

    /// Returns the ring capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Returns the number of bytes not yet read.
    pub fn buffered(&self) -> usize {
        self.core.buffered()
    }

    /// Returns `true` once either end has closed.
    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        PipeWriter::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        PipeWriter::flush(self).map_err(io::Error::from)
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        self.core.close_if_open(Side::Writer, Cause::Finished);
    }
}

impl fmt::Debug for PipeWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeWriter")
            .field("generation", &self.generation)
            .field("closed", &self.core.is_closed())
            .finish_non_exhaustive()
    }
}
