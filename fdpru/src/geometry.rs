// SPDX-License-Identifier: MIT

use crate::constants::*;
use crate::errors::*;

/// Physical shape of the emulated device as seen by the placement layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Bytes per flash page.
    pub page_size: u32,
    /// Pages per line (one superblock striped over all dies).
    pub pages_per_line: u32,
    pub lines: u32,
    /// Logical block size used to convert NLB into bytes.
    pub lba_size: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            pages_per_line: DEFAULT_PAGES_PER_LINE,
            lines: DEFAULT_LINES,
            lba_size: DEFAULT_LBA_SIZE,
        }
    }
}

impl Geometry {
    pub fn new(page_size: u32, pages_per_line: u32, lines: u32) -> Self {
        Self {
            page_size,
            pages_per_line,
            lines,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> FdpResult {
        if self.page_size == 0 || self.pages_per_line == 0 || self.lines == 0 {
            return Err(FdpError::InvalidParams("geometry fields must be non-zero"));
        }
        if self.lba_size == 0 || self.page_size % self.lba_size != 0 {
            return Err(FdpError::InvalidParams(
                "page size must be a multiple of the LBA size",
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn line_bytes(&self) -> u64 {
        self.page_size as u64 * self.pages_per_line as u64
    }

    #[inline]
    pub fn capacity_bytes(&self) -> u64 {
        self.line_bytes() * self.lines as u64
    }

    #[inline]
    pub fn total_lbas(&self) -> u64 {
        self.capacity_bytes() / self.lba_size as u64
    }

    #[inline]
    pub fn total_pages(&self) -> u64 {
        self.pages_per_line as u64 * self.lines as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity() {
        let g = Geometry::default();
        assert_eq!(g.line_bytes(), 1024 * 1024);
        assert_eq!(g.capacity_bytes(), 64 * 1024 * 1024);
        assert_eq!(g.total_lbas(), 64 * 2048);
        g.validate().unwrap();
    }

    #[test]
    fn rejects_zero_and_misaligned() {
        assert!(Geometry::new(4096, 0, 8).validate().is_err());
        let g = Geometry {
            lba_size: 3000,
            ..Geometry::default()
        };
        assert!(g.validate().is_err());
    }
}
