// SPDX-License-Identifier: MIT

use crate::errors::*;
use crate::pool::LinePool;
use crate::router::WriteReport;
use crate::ru::WritePointer;

/// RU-agnostic write pointer over the global free list.
///
/// Serves writes without a placement directive and every write while FDP
/// is disabled.
#[derive(Debug, Clone, Default)]
pub struct DefaultWritePath {
    wp: WritePointer,
    host_bytes_written: u64,
    host_write_cmds: u64,
}

impl DefaultWritePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_pointer(&self) -> WritePointer {
        self.wp
    }
    pub fn host_bytes_written(&self) -> u64 {
        self.host_bytes_written
    }
    pub fn host_write_cmds(&self) -> u64 {
        self.host_write_cmds
    }

    pub fn available_pages(&self, pool: &LinePool) -> u64 {
        let ppl = pool.pages_per_line() as u64;
        let current = self.wp.line.map_or(0, |_| ppl - self.wp.page as u64);
        current + pool.global_free() as u64 * ppl
    }

    pub fn write(
        &mut self,
        pool: &mut LinePool,
        page_size: u32,
        slba: u64,
        byte_len: u64,
    ) -> FdpResult<WriteReport> {
        if byte_len == 0 || byte_len % page_size as u64 != 0 {
            return Err(FdpError::InvalidLength(byte_len));
        }
        let pages = byte_len / page_size as u64;
        if pages > self.available_pages(pool) {
            return Err(FdpError::GlobalExhausted);
        }

        let ppl = pool.pages_per_line();
        let mut report = WriteReport {
            ru: None,
            slba,
            pages: pages as u32,
            ..WriteReport::default()
        };
        let mut remaining = pages as u32;
        while remaining > 0 {
            let line = match self.wp.line {
                Some(line) => line,
                None => {
                    let line = pool.take(None).ok_or(FdpError::GlobalExhausted)?;
                    self.wp = WritePointer::at(line);
                    line
                }
            };
            let n = remaining.min(ppl - self.wp.page);
            pool.program(line, n);
            self.wp.page += n;
            remaining -= n;
            report.lines.push(line);

            if self.wp.page == ppl {
                pool.retire(line);
                report.retired.push(line);
                self.wp = WritePointer::closed();
            }
        }

        self.host_bytes_written += byte_len;
        self.host_write_cmds += 1;
        Ok(report)
    }

    /// Gives up the current line: back to the free list if untouched,
    /// otherwise to the collector.
    pub(crate) fn close(&mut self, pool: &mut LinePool) -> FdpResult {
        if let Some(line) = self.wp.line.take() {
            if self.wp.page == 0 {
                pool.release(line)?;
            } else {
                pool.retire(line);
            }
        }
        self.wp = WritePointer::closed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::LineState;

    #[test]
    fn writes_through_global_pool() {
        let mut pool = LinePool::new(3, 2);
        let mut dp = DefaultWritePath::new();
        let rep = dp.write(&mut pool, 4096, 0, 3 * 4096).unwrap();
        assert_eq!(rep.ru, None);
        assert_eq!(rep.lines.len(), 2);
        assert_eq!(rep.retired.len(), 1);
        assert_eq!(pool.global_free(), 1);
        assert!(rep.lines.iter().all(|l| pool.line(*l).unwrap().owner().is_none()));
        assert_eq!(dp.available_pages(&pool), 1 + 2);
        assert_eq!(
            dp.write(&mut pool, 4096, 0, 4 * 4096),
            Err(FdpError::GlobalExhausted)
        );
    }

    #[test]
    fn close_releases_or_retires() {
        let mut pool = LinePool::new(2, 2);
        let mut dp = DefaultWritePath::new();
        dp.write(&mut pool, 4096, 0, 4096).unwrap();
        let line = dp.write_pointer().line.unwrap();
        dp.close(&mut pool).unwrap();
        assert_eq!(pool.line(line).unwrap().state(), LineState::Full);
        assert_eq!(dp.write_pointer(), WritePointer::closed());
        dp.close(&mut pool).unwrap();
        assert_eq!(pool.global_free(), 1);
    }
}
