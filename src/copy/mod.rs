//! Stream copy helpers staged through leased buffers.
//!
//! - [`copy_buffer`] - Copy through a caller-supplied buffer
//! - [`copy_pooled`] - Copy through a buffer leased from a [`BufferSource`]
//! - [`copy_n`] - Copy exactly `n` bytes
//! - [`read_all`] - Read to end-of-stream into a leased buffer
//!
//! To move bytes out of a [`PipeReader`](crate::PipeReader), prefer
//! [`PipeReader::write_to`](crate::PipeReader::write_to), which skips the
//! staging buffer entirely.

use std::io::{self, Read, Write};

use bytes::BytesMut;

use crate::buffer::BufferSource;
use crate::error::PipeError;

/// Staging buffer size for [`copy_pooled`] (32 KiB).
pub const COPY_BUFFER_SIZE: usize = 32 * 1024;

/// Initial buffer size for [`read_all`].
const READ_ALL_INITIAL_SIZE: usize = 512;

/// Copies from `src` to `dst` until `src` reports end-of-stream, staging
/// through `buf`.
///
/// Returns the number of bytes written to `dst`.
///
/// # Errors
///
/// - [`PipeError::InvalidConfig`] if `buf` is empty
/// - [`PipeError::ShortWrite`] if `dst` reports a count other than what it
///   was offered without an error
/// - [`PipeError::Io`] for any other I/O error on either side
pub fn copy_buffer<W, R>(dst: &mut W, src: &mut R, buf: &mut [u8]) -> Result<u64, PipeError>
where
    W: Write + ?Sized,
    R: Read + ?Sized,
{
    if buf.is_empty() {
        return Err(PipeError::InvalidConfig {
            message: "copy buffer must be non-empty",
        });
    }

    let mut written = 0u64;
    loop {
        let nr = match src.read(buf) {
            Ok(0) => return Ok(written),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PipeError::Io(e)),
        };

        let nw = loop {
            match dst.write(&buf[..nr]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(PipeError::Io(e)),
            }
        };

        if nw != nr {
            return Err(PipeError::ShortWrite {
                offered: nr,
                accepted: nw,
            });
        }
        written += nw as u64;
    }
}

/// Copies from `src` to `dst` until end-of-stream through a buffer leased
/// from `source`.
///
/// The buffer goes back to `source` whether or not the copy succeeds.
pub fn copy_pooled<W, R>(dst: &mut W, src: &mut R, source: &dyn BufferSource) -> Result<u64, PipeError>
where
    W: Write + ?Sized,
    R: Read + ?Sized,
{
    let mut buf = source.acquire(COPY_BUFFER_SIZE);
    let result = copy_buffer(dst, src, &mut buf[..COPY_BUFFER_SIZE]);
    source.release(buf);
    result
}

/// Copies exactly `n` bytes from `src` to `dst`.
///
/// # Errors
///
/// Fails with an [`io::ErrorKind::UnexpectedEof`] I/O error if `src` ends
/// before `n` bytes were copied, plus everything [`copy_buffer`] reports.
pub fn copy_n<W, R>(dst: &mut W, src: &mut R, n: u64, source: &dyn BufferSource) -> Result<u64, PipeError>
where
    W: Write + ?Sized,
    R: Read,
{
    let written = copy_pooled(dst, &mut src.take(n), source)?;
    if written < n {
        return Err(PipeError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("source ended after {} of {} bytes", written, n),
        )));
    }
    Ok(written)
}

/// Reads `src` to end-of-stream into a buffer leased from `source`.
///
/// The returned buffer holds exactly the bytes read; hand it back to
/// `source` with [`BufferSource::release`] once done. Buffers outgrown while
/// reading are released along the way.
pub fn read_all<R>(src: &mut R, source: &dyn BufferSource) -> Result<BytesMut, PipeError>
where
    R: Read + ?Sized,
{
    let mut buf = source.acquire(READ_ALL_INITIAL_SIZE);
    let mut len = 0;
    loop {
        if len == buf.len() {
            // Grow by half, like a Vec would
            let mut grown = source.acquire(buf.len() + buf.len() / 2 + 1);
            grown[..len].copy_from_slice(&buf[..len]);
            source.release(std::mem::replace(&mut buf, grown));
        }

        match src.read(&mut buf[len..]) {
            Ok(0) => {
                buf.truncate(len);
                return Ok(buf);
            }
            Ok(n) => len += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                source.release(buf);
                return Err(PipeError::Io(e));
            }
        }
    }
}
