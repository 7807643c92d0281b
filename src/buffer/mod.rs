//! Buffer sources backing pipe storage.
//!
//! A pipe acquires its ring storage from a [`BufferSource`] once, at
//! construction, and hands it back exactly once when it is recycled or the
//! last handle goes away.
//!
//! - [`HeapSource`] - Fresh zeroed allocation per pipe
//! - [`BufferPool`] - Bounded free list shared between pipes

mod pool;

use std::fmt;

use bytes::BytesMut;

pub use pool::{BufferPool, DEFAULT_MAX_BUFFER_SIZE, DEFAULT_MAX_POOLED};

/// Supplies and reclaims fixed-size byte buffers.
///
/// `acquire(size)` must return a buffer whose length is at least `size`.
/// Callers pass the same buffer back to `release` once they are done with it.
pub trait BufferSource: Send + Sync + fmt::Debug {
    /// Returns a buffer of at least `size` initialized bytes.
    fn acquire(&self, size: usize) -> BytesMut;

    /// Takes back a buffer previously returned by [`acquire`](Self::acquire).
    fn release(&self, buf: BytesMut);
}

/// A source that allocates a new zeroed buffer every time and drops
/// released buffers.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapSource;

impl BufferSource for HeapSource {
    fn acquire(&self, size: usize) -> BytesMut {
        BytesMut::zeroed(size)
    }

    fn release(&self, _buf: BytesMut) {}
}
