// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
#[macro_use]
mod macros;
pub mod errors;
pub mod stats;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod file;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::HostIO;
    pub use super::HostIOExt;
    pub use super::HostIOSetLen;
    pub use super::errors::*;
    pub use super::stats::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemHostIO;

    #[cfg(feature = "std")]
    pub use super::file::StdHostIO;
}

use errors::*;

/// Host memory a command transfers into or out of.
///
/// Offsets are relative to the start of the host buffer. `capacity` is the
/// number of bytes the host made available for the transfer; a backend must
/// reject any access past it.
pub trait HostIO {
    /// Writes `data` at `offset`.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> HostIOResult;

    /// Reads `buf.len()` bytes into `buf` from `offset`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> HostIOResult;

    /// Flushes any buffered data (may be a no-op).
    fn flush(&mut self) -> HostIOResult;

    /// Bytes available to the transfer.
    fn capacity(&self) -> u64;
}

/// Extension helpers for HostIO.
pub trait HostIOExt: HostIO {
    /// Copies the first `min(requested, payload.len())` bytes of `payload` to
    /// the start of the host buffer and returns how many bytes moved.
    ///
    /// Nothing past the returned length is touched.
    #[inline]
    fn transfer(&mut self, payload: &[u8], requested: u64) -> HostIOResult<usize> {
        let len = (payload.len() as u64).min(requested) as usize;
        if len as u64 > self.capacity() {
            return Err(HostIOError::OutOfBounds);
        }
        self.write_at(0, &payload[..len])?;
        Ok(len)
    }

    // Little-endian helpers for u16, u32, u64
    hostio_impl_primitive_rw!(u16, u32, u64);
}

impl<T: HostIO + ?Sized> HostIOExt for T {}

/// Trait for changing how many bytes a HostIO exposes.
pub trait HostIOSetLen: HostIO {
    fn set_len(&mut self, len: u64) -> HostIOResult;
}
