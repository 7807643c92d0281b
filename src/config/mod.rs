//! Configuration for pipe construction.
//!
//! - [`PipeConfig`] - Ring capacity
//!
//! # Example
//!
//! ```
//! use ringpipe::PipeConfig;
//!
//! let config = PipeConfig::new(16 * 1024)?;
//! assert_eq!(config.capacity(), 16 * 1024);
//! # Ok::<(), ringpipe::PipeError>(())
//! ```

use crate::error::PipeError;

/// Default ring capacity (4 KiB).
pub const DEFAULT_CAPACITY: usize = 4 * 1024;

/// Configuration for a pipe.
///
/// The capacity is fixed for the lifetime of the pipe. Throughput is best
/// when individual reads and writes stay below a quarter of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipeConfig {
    capacity: usize,
}

impl PipeConfig {
    /// Creates a new configuration.
    ///
    /// Returns error if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, PipeError> {
        if capacity == 0 {
            return Err(PipeError::InvalidConfig {
                message: "capacity must be non-zero",
            });
        }

        Ok(Self { capacity })
    }

    /// Sets the ring capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Returns the ring capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<(), PipeError> {
        Self::new(self.capacity).map(|_| ())
    }
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}
