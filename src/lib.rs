//! ringpipe
//!
//! Blocking in-process byte pipe over a fixed-capacity ring buffer.
//!
//! A pipe connects one producer thread to one consumer thread. The writer
//! blocks while the ring is full and the reader blocks while it is empty,
//! so memory stays bounded by the capacity no matter how far apart the two
//! sides run.
//!
//! The crate intentionally:
//! - does NOT support async readers or writers
//! - does NOT support more than one reader or one writer at a time
//! - does NOT grow the ring past its capacity
//!
//! Closing is how either side says it is done, and how a blocked operation
//! gets cancelled:
//!
//! - writer closes cleanly: reader drains the buffer, then sees end-of-stream
//! - writer closes with an error: reader drains the buffer, then gets the error
//! - reader closes: writer fails on its next operation, and so does the reader
//!
//! # Example
//!
//! ```
//! use std::thread;
//! use ringpipe::PipeError;
//!
//! fn main() -> Result<(), PipeError> {
//!     let (mut reader, mut writer) = ringpipe::pipe_with_capacity(64)?;
//!
//!     let producer = thread::spawn(move || -> Result<(), PipeError> {
//!         for i in 0..100u32 {
//!             writer.write(&i.to_le_bytes())?;
//!         }
//!         writer.close()
//!     });
//!
//!     let mut out: Vec<u8> = Vec::new();
//!     reader.write_to(&mut out)?;
//!     producer.join().unwrap()?;
//!
//!     assert_eq!(out.len(), 400);
//!     Ok(())
//! }
//! ```
//!
//! # Pooled storage
//!
//! ```
//! use std::sync::Arc;
//! use ringpipe::{BufferPool, PipeConfig};
//!
//! let pool = Arc::new(BufferPool::default());
//! for _ in 0..3 {
//!     let (reader, writer) = ringpipe::pipe_with_config(PipeConfig::default(), pool.clone())?;
//!     drop(writer);
//!     reader.recycle();
//! }
//! assert_eq!(pool.pooled(), 1);
//! # Ok::<(), ringpipe::PipeError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod config;
mod copy;
mod error;
mod pipe;
mod sync;

#[cfg(all(test, feature = "loom"))]
mod loom;

//
// Public surface
//

pub use buffer::{BufferPool, BufferSource, DEFAULT_MAX_BUFFER_SIZE, DEFAULT_MAX_POOLED, HeapSource};
pub use config::{DEFAULT_CAPACITY, PipeConfig};
pub use copy::{COPY_BUFFER_SIZE, copy_buffer, copy_n, copy_pooled, read_all};
pub use error::PipeError;
pub use pipe::{PipeCloser, PipeReader, PipeWriter, pipe, pipe_with_capacity, pipe_with_config};
