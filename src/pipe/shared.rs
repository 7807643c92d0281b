//! Shared state behind a reader/writer pair.
//!
//! One mutex guards the [`Ring`]. Each end parks on its own condition
//! variable and re-checks the shared predicate after every wakeup, so
//! coalesced or spurious notifications are harmless. The first close flips
//! `closed` exactly once and wakes both ends.
//!
//! Lock order is ring before close slots. Closing takes the slots alone and
//! only touches the ring after letting go of them. No user code runs under
//! the ring lock: bulk drains borrow the storage and hand it back.

use std::error::Error;
use std::io::Write;
use std::sync::Arc;

use tracing::{debug, trace};

use super::ring::Ring;
use crate::buffer::BufferSource;
use crate::error::PipeError;
use crate::sync::{self, AtomicBool, Condvar, Mutex, Ordering};

/// Which end of the pipe an operation or close belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Reader,
    Writer,
}

impl Side {
    fn as_str(self) -> &'static str {
        match self {
            Side::Reader => "reader",
            Side::Writer => "writer",
        }
    }
}

/// Recorded reason for a close.
#[derive(Debug, Clone)]
pub(crate) enum Cause {
    /// The writer finished cleanly. Readers see end-of-stream after the drain.
    Finished,
    Closed,
    Released,
    Error(Arc<dyn Error + Send + Sync>),
}

impl Cause {
    pub(crate) fn from_error<E>(err: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let boxed: Box<dyn Error + Send + Sync> = err.into();
        Cause::Error(Arc::from(boxed))
    }

    /// The error an operation reports for this cause. The clean-finish
    /// sentinel never leaks: writers see it as a closed pipe and readers
    /// turn it into end-of-stream before calling this.
    fn into_error(self) -> PipeError {
        match self {
            Cause::Finished | Cause::Closed => PipeError::ClosedPipe,
            Cause::Released => PipeError::BufferReleased,
            Cause::Error(e) => PipeError::ClosedWith(e),
        }
    }
}

/// What a reader may do with the ring right now.
enum ReadState {
    Ready,
    EndOfStream,
    Empty,
}

#[derive(Default)]
struct CloseSlots {
    reader: Option<Cause>,
    writer: Option<Cause>,
}

impl CloseSlots {
    fn slot_mut(&mut self, side: Side) -> &mut Option<Cause> {
        match side {
            Side::Reader => &mut self.reader,
            Side::Writer => &mut self.writer,
        }
    }
}

pub(crate) struct Core {
    ring: Mutex<Ring>,
    /// Signalled when bytes arrive or the pipe closes.
    readable: Condvar,
    /// Signalled when space frees up, the ring drains, or the pipe closes.
    writable: Condvar,
    /// Flipped once, under `slots`.
    closed: AtomicBool,
    slots: Mutex<CloseSlots>,
    source: Arc<dyn BufferSource>,
}

impl Core {
    /// Leases `capacity` bytes from `source`. Returns the core and the
    /// generation both handles are bound to.
    pub(crate) fn new(capacity: usize, source: Arc<dyn BufferSource>) -> (Self, u64) {
        let ring = Ring::new(source.acquire(capacity), capacity);
        let generation = ring.generation();
        trace!(capacity, "pipe created");

        let core = Self {
            ring: Mutex::new(ring),
            readable: Condvar::new(),
            writable: Condvar::new(),
            closed: AtomicBool::new(false),
            slots: Mutex::new(CloseSlots::default()),
            source,
        };
        (core, generation)
    }

    pub(crate) fn capacity(&self) -> usize {
        sync::lock(&self.ring).capacity()
    }

    pub(crate) fn buffered(&self) -> usize {
        sync::lock(&self.ring).len()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// The reader's cause wins over the writer's.
    fn close_cause(&self) -> (Side, Cause) {
        let slots = sync::lock(&self.slots);
        match (&slots.reader, &slots.writer) {
            (Some(cause), _) => (Side::Reader, cause.clone()),
            (None, Some(cause)) => (Side::Writer, cause.clone()),
            (None, None) => (Side::Reader, Cause::Closed),
        }
    }

    /// A writer-side close surfaces only after the ring drains; a
    /// reader-side close surfaces at once.
    fn read_state(&self, ring: &Ring, generation: u64) -> Result<ReadState, PipeError> {
        ring.check(generation)?;

        if self.is_closed() {
            let (side, cause) = self.close_cause();
            if side == Side::Reader {
                return Err(cause.into_error());
            }
            if ring.is_empty() {
                return match cause {
                    Cause::Finished => Ok(ReadState::EndOfStream),
                    other => Err(other.into_error()),
                };
            }
        }

        Ok(if ring.is_empty() {
            ReadState::Empty
        } else {
            ReadState::Ready
        })
    }

    /// Runs `op` on the ring once bytes are buffered, blocking while the
    /// pipe is open and empty.
    ///
    /// Returns `Ok(0)` for end-of-stream, or immediately when `want` is zero.
    pub(crate) fn read_with<F>(&self, generation: u64, want: usize, mut op: F) -> Result<usize, PipeError>
    where
        F: FnMut(&mut Ring) -> Result<usize, PipeError>,
    {
        let mut ring = sync::lock(&self.ring);
        loop {
            let state = self.read_state(&ring, generation)?;
            if want == 0 {
                return Ok(0);
            }

            match state {
                ReadState::EndOfStream => return Ok(0),
                ReadState::Ready => {
                    let was_full = ring.is_full();
                    let result = op(&mut *ring);
                    if was_full || ring.is_empty() {
                        self.writable.notify_one();
                    }
                    return result;
                }
                ReadState::Empty => {
                    trace!("reader parked on empty pipe");
                    ring = sync::wait(&self.readable, ring);
                }
            }
        }
    }

    /// Writes the buffered bytes to `sink` once any are available, blocking
    /// like [`read_with`](Self::read_with).
    ///
    /// The ring lock is not held while `sink` runs, so closes from either
    /// end go through promptly. The writer waits until the storage is back.
    /// Returns the bytes `sink` took, `Ok(0)` meaning end-of-stream.
    pub(crate) fn drain_into<W: Write + ?Sized>(&self, generation: u64, sink: &mut W) -> Result<usize, PipeError> {
        let lent = {
            let mut ring = sync::lock(&self.ring);
            loop {
                match self.read_state(&ring, generation)? {
                    ReadState::EndOfStream => return Ok(0),
                    ReadState::Ready => break ring.lend(generation)?,
                    ReadState::Empty => {
                        trace!("reader parked on empty pipe");
                        ring = sync::wait(&self.readable, ring);
                    }
                }
            }
        };

        let (consumed, result) = lent.drain_into(sink);

        let orphaned = {
            let mut ring = sync::lock(&self.ring);
            let orphaned = ring.restore(generation, lent, consumed);
            self.writable.notify_one();
            orphaned
        };
        if let Some(storage) = orphaned {
            debug!(capacity = storage.len(), "pipe buffer released");
            self.source.release(storage);
        }

        result.map(|()| consumed)
    }

    /// Feeds all of `data` through `op`, blocking while the ring is full.
    ///
    /// If the pipe closes after some bytes were accepted, returns that
    /// count; the next call reports the close.
    pub(crate) fn write_with<F>(&self, generation: u64, data: &[u8], mut op: F) -> Result<usize, PipeError>
    where
        F: FnMut(&mut Ring, &[u8]) -> Result<usize, PipeError>,
    {
        let mut written = 0;
        let mut ring = sync::lock(&self.ring);
        loop {
            if let Err(e) = self.writer_gate(&ring, generation) {
                return if written > 0 { Ok(written) } else { Err(e) };
            }
            if written == data.len() {
                return Ok(written);
            }

            if !ring.is_full() && !ring.is_lent() {
                let was_empty = ring.is_empty();
                written += op(&mut *ring, &data[written..])?;
                if was_empty {
                    self.readable.notify_one();
                }
                continue;
            }

            trace!(pending = data.len() - written, "writer parked on full or lent pipe");
            ring = sync::wait(&self.writable, ring);
        }
    }

    /// Blocks until every buffered byte has been read.
    pub(crate) fn flush(&self, generation: u64) -> Result<(), PipeError> {
        let mut ring = sync::lock(&self.ring);
        loop {
            self.writer_gate(&ring, generation)?;
            if ring.is_empty() {
                return Ok(());
            }
            ring = sync::wait(&self.writable, ring);
        }
    }

    fn writer_gate(&self, ring: &Ring, generation: u64) -> Result<(), PipeError> {
        ring.check(generation)?;
        if self.is_closed() {
            return Err(self.close_cause().1.into_error());
        }
        Ok(())
    }

    /// Records `cause` for `side`.
    ///
    /// The first close from either end closes the pipe and wakes both ends.
    /// Later, an end that has no cause yet may still record one; an end that
    /// already has one gets [`PipeError::AlreadyClosed`]. A reader closing
    /// over unread bytes gets [`PipeError::ClosingBusyBuffer`] after the
    /// close has taken effect.
    pub(crate) fn close(&self, side: Side, cause: Cause) -> Result<(), PipeError> {
        self.close_inner(side, cause, true)
    }

    /// Closes only if nobody has yet. Used when a handle is dropped.
    pub(crate) fn close_if_open(&self, side: Side, cause: Cause) {
        let _ = self.close_inner(side, cause, false);
    }

    fn close_inner(&self, side: Side, cause: Cause, bind_late: bool) -> Result<(), PipeError> {
        {
            let mut slots = sync::lock(&self.slots);
            let slot = slots.slot_mut(side);
            if self.closed.load(Ordering::Acquire) {
                if !bind_late {
                    return Ok(());
                }
                if slot.is_some() {
                    return Err(PipeError::AlreadyClosed);
                }
                *slot = Some(cause);
                return Ok(());
            }
            *slot = Some(cause);
            self.closed.store(true, Ordering::Release);
        }

        let unread = {
            let ring = sync::lock(&self.ring);
            self.readable.notify_all();
            self.writable.notify_all();
            ring.len()
        };
        debug!(side = side.as_str(), unread, "pipe closed");

        if side == Side::Reader && unread > 0 {
            return Err(PipeError::ClosingBusyBuffer { unread });
        }
        Ok(())
    }

    /// Force-closes from the reader side and hands the storage back to the
    /// source.
    pub(crate) fn release(&self) {
        let _ = self.close(Side::Reader, Cause::Released);

        let storage = {
            let mut ring = sync::lock(&self.ring);
            let storage = ring.release();
            self.readable.notify_all();
            self.writable.notify_all();
            storage
        };

        if let Some(storage) = storage {
            debug!(capacity = storage.len(), "pipe buffer released");
            self.source.release(storage);
        }
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        if let Some(storage) = sync::lock(&self.ring).release() {
            self.source.release(storage);
        }
    }
}
