//! Error types for ringpipe.

use std::fmt;
use std::io;
use std::sync::Arc;

/// Errors that can occur while using a pipe.
#[derive(Debug)]
pub enum PipeError {
    /// The pipe was closed without a more specific cause.
    ClosedPipe,

    /// The ring storage was returned to its buffer source.
    BufferReleased,

    /// A sink accepted a different number of bytes than it was offered
    /// without reporting an error.
    ShortWrite {
        /// Bytes handed to the sink.
        offered: usize,
        /// Bytes the sink reported as written.
        accepted: usize,
    },

    /// The reader closed while unread bytes remained.
    ///
    /// The close still took effect; this only reports the discarded bytes.
    ClosingBusyBuffer {
        /// Bytes left in the ring at the moment of closing.
        unread: usize,
    },

    /// The end was already closed with an error.
    AlreadyClosed,

    /// The pipe was closed with a caller-supplied error.
    ClosedWith(Arc<dyn std::error::Error + Send + Sync>),

    /// An I/O error from a sink or source outside the pipe.
    Io(io::Error),

    /// Invalid configuration parameter.
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },
}

impl PipeError {
    /// Returns `true` if the error only reports a condition and the
    /// operation that produced it still completed.
    pub fn is_informational(&self) -> bool {
        matches!(self, PipeError::ClosingBusyBuffer { .. })
    }

    /// Returns `true` if the error stems from a closed or released pipe.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            PipeError::ClosedPipe | PipeError::BufferReleased | PipeError::ClosedWith(_)
        )
    }
}

impl fmt::Display for PipeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipeError::ClosedPipe => write!(f, "read/write on closed pipe"),
            PipeError::BufferReleased => write!(f, "pipe buffer has been released"),
            PipeError::ShortWrite { offered, accepted } => {
                write!(f, "short write: sink accepted {} of {} bytes", accepted, offered)
            }
            PipeError::ClosingBusyBuffer { unread } => {
                write!(f, "closing busy buffer: {} bytes unread", unread)
            }
            PipeError::AlreadyClosed => write!(f, "use of closed pipe"),
            PipeError::ClosedWith(e) => write!(f, "pipe closed: {}", e),
            PipeError::Io(e) => write!(f, "io error: {}", e),
            PipeError::InvalidConfig { message } => {
                write!(f, "invalid config: {}", message)
            }
        }
    }
}

impl std::error::Error for PipeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipeError::Io(e) => Some(e),
            PipeError::ClosedWith(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for PipeError {
    fn from(e: io::Error) -> Self {
        PipeError::Io(e)
    }
}

impl From<PipeError> for io::Error {
    fn from(e: PipeError) -> Self {
        let kind = match e {
            PipeError::Io(inner) => return inner,
            PipeError::ClosedPipe | PipeError::ClosedWith(_) => io::ErrorKind::BrokenPipe,
            PipeError::ShortWrite { .. } => io::ErrorKind::WriteZero,
            PipeError::InvalidConfig { .. } => io::ErrorKind::InvalidInput,
            PipeError::BufferReleased
            | PipeError::ClosingBusyBuffer { .. }
            | PipeError::AlreadyClosed => io::ErrorKind::Other,
        };
        io::Error::new(kind, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "test");
        let err: PipeError = io_err.into();
        assert!(matches!(err, PipeError::Io(_)));
    }

    #[test]
    fn test_into_io_error_kinds() {
        let err: io::Error = PipeError::ClosedPipe.into();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let err: io::Error = PipeError::ShortWrite {
            offered: 8,
            accepted: 3,
        }
        .into();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);

        let err: io::Error = PipeError::Io(io::Error::new(io::ErrorKind::TimedOut, "slow")).into();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert_eq!(err.to_string(), "slow");
    }

    #[test]
    fn test_closed_with_keeps_source() {
        let cause: Arc<dyn std::error::Error + Send + Sync> =
            Arc::from(Box::<dyn std::error::Error + Send + Sync>::from("upstream failed"));
        let err = PipeError::ClosedWith(cause);
        assert!(err.to_string().contains("upstream failed"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.is_closed());
    }

    #[test]
    fn test_display() {
        let err = PipeError::ClosingBusyBuffer { unread: 12 };
        assert!(err.to_string().contains("closing busy buffer"));
        assert!(err.is_informational());
        assert!(!PipeError::AlreadyClosed.is_informational());
    }
}
