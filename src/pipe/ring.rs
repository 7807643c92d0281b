//! Fixed-capacity circular byte storage.
//!
//! [`Ring`] owns the storage leased from a buffer source together with the
//! read and write cursors. It does no locking or signalling of its own; the
//! pipe core keeps it behind a mutex.
//!
//! Every accessor takes the generation the caller was bound to. Releasing
//! the storage bumps the generation, so a stale caller gets
//! [`PipeError::BufferReleased`] instead of a view into storage the ring no
//! longer owns.
//!
//! For bulk drains the storage can be lent out as a [`Lent`], so the caller
//! can write it to a sink without holding the pipe lock. While lent, the
//! cursors stay put and writers must wait for [`Ring::restore`].

use std::io::{self, Write};

use bytes::BytesMut;

use crate::error::PipeError;

pub(crate) struct Ring {
    storage: Option<BytesMut>,
    generation: u64,
    capacity: usize,
    /// Read cursor, in `[0, capacity)`.
    head: usize,
    /// Write cursor, in `[0, capacity)`.
    tail: usize,
    len: usize,
    /// Storage is out on loan to a drain.
    lent: bool,
    released: bool,
}

impl Ring {
    /// Wraps `storage`, sized to exactly `capacity` bytes.
    pub(crate) fn new(mut storage: BytesMut, capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        storage.resize(capacity, 0);
        Self {
            storage: Some(storage),
            generation: 0,
            capacity,
            head: 0,
            tail: 0,
            len: 0,
            lent: false,
            released: false,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn free(&self) -> usize {
        self.capacity - self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    pub(crate) fn is_lent(&self) -> bool {
        self.lent
    }

    /// Fails with [`PipeError::BufferReleased`] unless the storage is still
    /// held under `generation`.
    pub(crate) fn check(&self, generation: u64) -> Result<(), PipeError> {
        if !self.released && self.generation == generation {
            Ok(())
        } else {
            Err(PipeError::BufferReleased)
        }
    }

    fn slab(&mut self, generation: u64) -> Result<&mut [u8], PipeError> {
        match self.storage.as_mut() {
            Some(buf) if self.generation == generation => Ok(&mut buf[..]),
            _ => Err(PipeError::BufferReleased),
        }
    }

    /// Copies as much of `data` as fits, wrapping past the end of storage.
    pub(crate) fn push(&mut self, generation: u64, data: &[u8]) -> Result<usize, PipeError> {
        let n = data.len().min(self.free());
        let (capacity, tail) = (self.capacity, self.tail);
        let buf = self.slab(generation)?;

        let first = n.min(capacity - tail);
        buf[tail..tail + first].copy_from_slice(&data[..first]);
        buf[..n - first].copy_from_slice(&data[first..n]);

        self.advance_tail(n);
        Ok(n)
    }

    /// Copies up to `out.len()` buffered bytes into `out`.
    pub(crate) fn pop(&mut self, generation: u64, out: &mut [u8]) -> Result<usize, PipeError> {
        let n = out.len().min(self.len);
        let (capacity, head) = (self.capacity, self.head);
        let buf = self.slab(generation)?;

        let first = n.min(capacity - head);
        out[..first].copy_from_slice(&buf[head..head + first]);
        out[first..n].copy_from_slice(&buf[..n - first]);

        self.advance_head(n);
        Ok(n)
    }

    /// Like [`push`](Self::push), but fills the two free spans as whole
    /// slices.
    pub(crate) fn push_spans(&mut self, generation: u64, data: &[u8]) -> Result<usize, PipeError> {
        let (first, second) = self.writable(generation)?;

        let a = first.len().min(data.len());
        first[..a].copy_from_slice(&data[..a]);
        let b = second.len().min(data.len() - a);
        second[..b].copy_from_slice(&data[a..a + b]);

        self.advance_tail(a + b);
        Ok(a + b)
    }

    /// Like [`pop`](Self::pop), but drains the two buffered spans as whole
    /// slices.
    pub(crate) fn pop_spans(&mut self, generation: u64, out: &mut [u8]) -> Result<usize, PipeError> {
        let (first, second) = self.readable(generation)?;

        let a = first.len().min(out.len());
        out[..a].copy_from_slice(&first[..a]);
        let b = second.len().min(out.len() - a);
        out[a..a + b].copy_from_slice(&second[..b]);

        self.advance_head(a + b);
        Ok(a + b)
    }

    pub(crate) fn pop_byte(&mut self, generation: u64) -> Result<Option<u8>, PipeError> {
        let (head, len) = (self.head, self.len);
        let buf = self.slab(generation)?;
        if len == 0 {
            return Ok(None);
        }

        let byte = buf[head];
        self.advance_head(1);
        Ok(Some(byte))
    }

    /// Takes the storage out together with the buffered region, leaving
    /// the cursors untouched until [`restore`](Self::restore).
    pub(crate) fn lend(&mut self, generation: u64) -> Result<Lent, PipeError> {
        self.check(generation)?;
        let storage = self.storage.take().ok_or(PipeError::BufferReleased)?;
        self.lent = true;
        Ok(Lent {
            storage,
            head: self.head,
            len: self.len,
        })
    }

    /// Puts lent storage back and consumes `consumed` bytes.
    ///
    /// Returns the storage instead if the ring was released during the loan;
    /// the caller owes it to the buffer source.
    pub(crate) fn restore(&mut self, generation: u64, lent: Lent, consumed: usize) -> Option<BytesMut> {
        self.lent = false;
        if self.released || self.generation != generation {
            return Some(lent.storage);
        }

        debug_assert!(consumed <= self.len);
        self.storage = Some(lent.storage);
        self.advance_head(consumed);
        None
    }

    /// Returns the buffered bytes as two contiguous spans, oldest first.
    fn readable(&mut self, generation: u64) -> Result<(&[u8], &[u8]), PipeError> {
        let (capacity, head, len) = (self.capacity, self.head, self.len);
        let buf: &[u8] = self.slab(generation)?;

        if head + len <= capacity {
            Ok((&buf[head..head + len], Default::default()))
        } else {
            let (front, back) = buf.split_at(head);
            Ok((back, &front[..head + len - capacity]))
        }
    }

    /// Returns the free region as two contiguous spans, in write order.
    fn writable(&mut self, generation: u64) -> Result<(&mut [u8], &mut [u8]), PipeError> {
        let (capacity, tail, free) = (self.capacity, self.tail, self.free());
        let buf = self.slab(generation)?;

        if tail + free <= capacity {
            Ok((&mut buf[tail..tail + free], Default::default()))
        } else {
            let (front, back) = buf.split_at_mut(tail);
            Ok((back, &mut front[..tail + free - capacity]))
        }
    }

    fn advance_tail(&mut self, n: usize) {
        self.tail = (self.tail + n) % self.capacity;
        self.len += n;
    }

    fn advance_head(&mut self, n: usize) {
        self.head = (self.head + n) % self.capacity;
        self.len -= n;
        if self.len == 0 {
            // Rewind so the next write starts contiguous
            self.head = 0;
            self.tail = 0;
        }
    }

    /// Gives up the storage. Later accesses under any earlier generation
    /// fail with [`PipeError::BufferReleased`].
    ///
    /// Storage that is out on loan comes back through
    /// [`restore`](Self::restore) instead.
    pub(crate) fn release(&mut self) -> Option<BytesMut> {
        if self.released {
            return None;
        }
        self.released = true;
        self.generation += 1;
        self.head = 0;
        self.tail = 0;
        self.len = 0;
        self.storage.take()
    }
}

/// Ring storage on loan to a bulk drain.
pub(crate) struct Lent {
    storage: BytesMut,
    head: usize,
    len: usize,
}

impl Lent {
    /// The lent buffered bytes as two contiguous spans, oldest first.
    fn spans(&self) -> (&[u8], &[u8]) {
        let capacity = self.storage.len();
        if self.head + self.len <= capacity {
            (&self.storage[self.head..self.head + self.len], &[][..])
        } else {
            let (front, back) = self.storage.split_at(self.head);
            (back, &front[..self.head + self.len - capacity])
        }
    }

    /// Hands the lent spans straight to `sink`.
    ///
    /// Returns how many bytes the sink took, plus the error that stopped the
    /// drain early, if any. A sink that reports a count other than the span
    /// length without an error stops it with [`PipeError::ShortWrite`].
    pub(crate) fn drain_into<W: Write + ?Sized>(&self, sink: &mut W) -> (usize, Result<(), PipeError>) {
        let (first, second) = self.spans();
        let mut consumed = 0;

        for span in [first, second] {
            if span.is_empty() {
                continue;
            }
            let offered = span.len();
            loop {
                match sink.write(span) {
                    Ok(accepted) if accepted == offered => {
                        consumed += accepted;
                        break;
                    }
                    Ok(accepted) => {
                        if accepted < offered {
                            consumed += accepted;
                        }
                        return (consumed, Err(PipeError::ShortWrite { offered, accepted }));
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return (consumed, Err(PipeError::Io(e))),
                }
            }
        }
        (consumed, Ok(()))
    }
}
