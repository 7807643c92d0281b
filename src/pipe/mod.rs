//! Half-duplex byte pipe over a fixed-capacity ring.
//!
//! - [`PipeReader`] - Read end: `read`, `read_byte`, `write_to`, `recycle`
//! - [`PipeWriter`] - Write end: `write`, `flush`
//! - [`PipeCloser`] - Closes either end from another thread
//!
//! ```text
//!   PipeWriter ──▶ [ring, capacity C] ──▶ PipeReader
//!                  ├── writer blocks while full
//!                  ├── reader blocks while empty
//!                  ├── writer close → reader drains, then EOF / error
//!                  └── reader close → writer fails at once
//! ```

mod closer;
mod reader;
mod ring;
mod shared;
mod writer;

use std::sync::Arc;

pub use closer::PipeCloser;
pub use reader::PipeReader;
pub use writer::PipeWriter;

use self::shared::Core;
use crate::sync::Arc as CoreArc;
use crate::buffer::{BufferSource, HeapSource};
use crate::config::{DEFAULT_CAPACITY, PipeConfig};
use crate::error::PipeError;

/// Creates a pipe with the default capacity, backed by a fresh heap buffer.
///
/// # Example
///
/// ```
/// let (mut reader, mut writer) = ringpipe::pipe();
/// writer.write(b"abc")?;
/// writer.close()?;
///
/// let mut buf = [0u8; 8];
/// assert_eq!(reader.read(&mut buf)?, 3);
/// assert_eq!(reader.read(&mut buf)?, 0);
/// # Ok::<(), ringpipe::PipeError>(())
/// ```
pub fn pipe() -> (PipeReader, PipeWriter) {
    new_pair(DEFAULT_CAPACITY, Arc::new(HeapSource))
}

/// Creates a pipe holding at most `capacity` bytes.
///
/// Returns error if `capacity` is zero.
pub fn pipe_with_capacity(capacity: usize) -> Result<(PipeReader, PipeWriter), PipeError> {
    let config = PipeConfig::new(capacity)?;
    Ok(new_pair(config.capacity(), Arc::new(HeapSource)))
}

/// Creates a pipe from `config`, leasing its storage from `source`.
///
/// The storage goes back to `source` when the reader is recycled, or when
/// both ends have been dropped.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use ringpipe::{BufferPool, PipeConfig};
///
/// let pool = Arc::new(BufferPool::default());
/// let (reader, writer) = ringpipe::pipe_with_config(PipeConfig::new(1024)?, pool.clone())?;
/// drop(writer);
/// reader.recycle();
/// assert_eq!(pool.pooled(), 1);
/// # Ok::<(), ringpipe::PipeError>(())
/// ```
pub fn pipe_with_config(
    config: PipeConfig,
    source: Arc<dyn BufferSource>,
) -> Result<(PipeReader, PipeWriter), PipeError> {
    config.validate()?;
    Ok(new_pair(config.capacity(), source))
}

fn new_pair(capacity: usize, source: Arc<dyn BufferSource>) -> (PipeReader, PipeWriter) {
    let (core, generation) = Core::new(capacity, source);
    let core = CoreArc::new(core);
    (
        PipeReader::new(CoreArc::clone(&core), generation),
        PipeWriter::new(core, generation),
    )
}
