//! Shared buffer pool for memory reuse across pipes.

use std::sync::{Mutex, PoisonError};

use bytes::BytesMut;

use super::BufferSource;

/// Default largest buffer capacity the pool keeps (128 KiB).
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 128 * 1024;

/// Default number of buffers to keep.
pub const DEFAULT_MAX_POOLED: usize = 4;

/// A bounded pool of reusable byte buffers.
///
/// Unlike a thread-local cache, a pipe's buffer is acquired on one thread and
/// often released on another, so the free list is shared behind a mutex.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<BytesMut>>,
    max_pooled: usize,
    max_buffer_size: usize,
}

impl BufferPool {
    /// Creates a pool keeping at most `max_pooled` buffers, each with a
    /// capacity of at most `max_buffer_size` bytes.
    pub fn new(max_pooled: usize, max_buffer_size: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_pooled)),
            max_pooled,
            max_buffer_size,
        }
    }

    /// Returns the number of buffers currently pooled.
    pub fn pooled(&self) -> usize {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl BufferSource for BufferPool {
    fn acquire(&self, size: usize) -> BytesMut {
        let reused = {
            let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
            free.iter()
                .position(|buf| buf.capacity() >= size)
                .map(|i| free.swap_remove(i))
        };

        match reused {
            Some(mut buf) => {
                buf.clear();
                buf.resize(size, 0);
                buf
            }
            None => BytesMut::zeroed(size),
        }
    }

    fn release(&self, mut buf: BytesMut) {
        // Oversized buffers go back to the allocator
        if buf.capacity() > self.max_buffer_size {
            return;
        }

        buf.clear();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.max_pooled {
            free.push(buf);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POOLED, DEFAULT_MAX_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_acquire_fresh() {
        let pool = BufferPool::default();
        let buf = pool.acquire(1024);
        assert_eq!(buf.len(), 1024);
        assert_eq!(pool.pooled(), 0);
    }

    #[test]
    fn test_pool_reuse() {
        let pool = BufferPool::default();
        {
            let mut buf = pool.acquire(4096);
            buf[0] = 0xFF;
            pool.release(buf);
        }
        assert_eq!(pool.pooled(), 1);

        // A smaller request fits in the pooled buffer
        let buf = pool.acquire(1024);
        assert_eq!(buf.len(), 1024);
        assert!(buf.capacity() >= 4096);
        assert_eq!(buf[0], 0, "reused buffer must be re-zeroed");
        assert_eq!(pool.pooled(), 0);
    }

    #[test]
    fn test_pool_skips_too_small() {
        let pool = BufferPool::default();
        pool.release(BytesMut::zeroed(64));

        let buf = pool.acquire(1024);
        assert_eq!(buf.len(), 1024);
        assert_eq!(pool.pooled(), 1, "small buffer stays pooled");
    }

    #[test]
    fn test_pool_bounds() {
        let pool = BufferPool::new(2, 1024);
        pool.release(BytesMut::zeroed(2048));
        assert_eq!(pool.pooled(), 0, "oversized buffers are dropped");

        for _ in 0..3 {
            pool.release(BytesMut::zeroed(512));
        }
        assert_eq!(pool.pooled(), 2);
    }
}
