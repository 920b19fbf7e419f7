// SPDX-License-Identifier: MIT

use crate::{HostIO, HostIOResult};

/// Simple transfer counters, no_std friendly.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct TransferStats {
    pub reads: u64,
    pub read_bytes: u64,
    pub writes: u64,
    pub write_bytes: u64,
    pub flushes: u64,

    // Largest single transfer, to spot oversized pages
    pub max_write: u64,
}

/// Transparent instrumentation wrapper.
pub struct TransferCounter<'a, IO: HostIO + ?Sized> {
    inner: &'a mut IO,
    pub stats: TransferStats,
}

impl<'a, IO: HostIO + ?Sized> TransferCounter<'a, IO> {
    #[inline]
    pub fn new(inner: &'a mut IO) -> Self {
        Self {
            inner,
            stats: TransferStats::default(),
        }
    }

    #[inline]
    pub fn snapshot(&self) -> TransferStats {
        self.stats
    }
}

impl<'a, IO: HostIO + ?Sized> HostIO for TransferCounter<'a, IO> {
    #[inline]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> HostIOResult {
        self.inner.write_at(offset, data)?;
        self.stats.writes += 1;
        self.stats.write_bytes += data.len() as u64;
        self.stats.max_write = self.stats.max_write.max(data.len() as u64);
        Ok(())
    }

    #[inline]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> HostIOResult {
        self.inner.read_at(offset, buf)?;
        self.stats.reads += 1;
        self.stats.read_bytes += buf.len() as u64;
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> HostIOResult {
        self.stats.flushes += 1;
        self.inner.flush()
    }

    #[inline]
    fn capacity(&self) -> u64 {
        self.inner.capacity()
    }
}
