// SPDX-License-Identifier: MIT

use crate::{HostIO, HostIOError, HostIOResult, HostIOSetLen};

/// In-memory implementation of `HostIO`.
///
/// Models a host data buffer: `logical_len` is what the command says the
/// host provided, which may be shorter than the backing slice.
#[derive(Debug)]
pub struct MemHostIO<'a> {
    buffer: &'a mut [u8],
    logical_len: usize,
}

impl<'a> MemHostIO<'a> {
    #[inline]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        let logical_len = buffer.len();
        Self {
            buffer,
            logical_len,
        }
    }

    /// Exposes only the first `len` bytes of `buffer` (clamped to its size).
    #[inline]
    pub fn with_len(buffer: &'a mut [u8], len: usize) -> Self {
        let logical_len = len.min(buffer.len());
        Self {
            buffer,
            logical_len,
        }
    }

    #[inline]
    fn check_bounds(&self, off: u64, len: usize) -> HostIOResult {
        let end = off
            .checked_add(len as u64)
            .ok_or(HostIOError::OutOfBounds)?;
        if end > self.logical_len as u64 {
            return Err(HostIOError::OutOfBounds);
        }
        Ok(())
    }
}

impl<'a> HostIO for MemHostIO<'a> {
    #[inline(always)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> HostIOResult {
        self.check_bounds(offset, data.len())?;
        let start = offset as usize;
        self.buffer[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> HostIOResult {
        self.check_bounds(offset, buf.len())?;
        let start = offset as usize;
        buf.copy_from_slice(&self.buffer[start..start + buf.len()]);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> HostIOResult {
        Ok(())
    }

    #[inline]
    fn capacity(&self) -> u64 {
        self.logical_len as u64
    }
}

impl<'a> HostIOSetLen for MemHostIO<'a> {
    fn set_len(&mut self, new_len: u64) -> HostIOResult {
        if new_len > self.buffer.len() as u64 {
            return Err(HostIOError::OutOfBounds);
        }
        self.logical_len = new_len as usize;
        Ok(())
    }
}
