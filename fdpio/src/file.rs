// SPDX-License-Identifier: MIT

use std::io::{Read, Seek, SeekFrom, Write};

use crate::{HostIO, HostIOResult, HostIOSetLen};

/// File-backed host buffer, used to dump log pages to disk.
#[derive(Debug)]
pub struct StdHostIO<'a, T: Read + Write + Seek> {
    io: &'a mut T,
}

impl<'a, T: Read + Write + Seek> StdHostIO<'a, T> {
    #[inline]
    pub fn new(io: &'a mut T) -> Self {
        Self { io }
    }
}

impl<'a, T: Read + Write + Seek> HostIO for StdHostIO<'a, T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> HostIOResult {
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> HostIOResult {
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> HostIOResult {
        self.io.flush()?;
        Ok(())
    }

    /// Files grow on demand.
    #[inline]
    fn capacity(&self) -> u64 {
        u64::MAX
    }
}

impl<'a> HostIOSetLen for StdHostIO<'a, std::fs::File> {
    fn set_len(&mut self, len: u64) -> HostIOResult {
        self.io.set_len(len)?;
        self.flush()?;
        self.io.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}
