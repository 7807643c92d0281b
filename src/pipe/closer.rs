//! Remote close handles.

use std::error::Error;
use std::fmt;

use super::shared::{Cause, Core, Side};
use crate::error::PipeError;
use crate::sync::Arc;

/// Closes one end of a pipe from any thread.
///
/// Closing is the only way to cancel a blocked read or write: a watchdog
/// holding a `PipeCloser` can release a stuck peer without owning the
/// handle that is blocked.
///
/// # Example
///
/// ```
/// use std::thread;
///
/// let (mut reader, writer) = ringpipe::pipe();
/// let closer = writer.closer();
///
/// let watchdog = thread::spawn(move || closer.close_with_error("deadline exceeded"));
///
/// let mut buf = [0u8; 16];
/// let err = reader.read(&mut buf).unwrap_err();
/// assert!(err.to_string().contains("deadline exceeded"));
/// watchdog.join().unwrap()?;
/// # drop(writer);
/// # Ok::<(), ringpipe::PipeError>(())
/// ```
#[derive(Clone)]
pub struct PipeCloser {
    core: Arc<Core>,
    side: Side,
}

impl PipeCloser {
    pub(crate) fn new(core: Arc<Core>, side: Side) -> Self {
        Self { core, side }
    }

    /// Closes this end as its own `close()` would.
    pub fn close(&self) -> Result<(), PipeError> {
        let cause = match self.side {
            Side::Reader => Cause::Closed,
            Side::Writer => Cause::Finished,
        };
        self.core.close(self.side, cause)
    }

    /// Closes this end with `err`.
    pub fn close_with_error<E>(&self, err: E) -> Result<(), PipeError>
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        self.core.close(self.side, Cause::from_error(err))
    }
}

impl fmt::Debug for PipeCloser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeCloser")
            .field("side", &self.side)
            .finish_non_exhaustive()
    }
}
