// SPDX-License-Identifier: MIT

use alloc::vec::Vec;

use crate::config::{FdpConfig, Placement};
use crate::errors::*;
use crate::pool::{LineId, LinePool, LineState};
use crate::ru::{RuId, RuState, WritePointer};

/// Where a write landed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WriteReport {
    /// Target RU, `None` for the default path.
    pub ru: Option<RuId>,
    pub slba: u64,
    pub pages: u32,
    /// Lines that received data, in write order.
    pub lines: Vec<LineId>,
    /// Lines that filled up during the write.
    pub retired: Vec<LineId>,
}

impl FdpConfig {
    /// Pages `ru` can still absorb without a reclaim.
    pub fn available_pages(&self, pool: &LinePool, ru: RuId) -> u64 {
        let Some(unit) = self.ru(ru) else { return 0 };
        let ppl = pool.pages_per_line() as u64;
        let current = match unit.wp.line {
            Some(_) => ppl - unit.wp.page as u64,
            None => 0,
        };
        current + pool.free_count(Some(ru)) as u64 * ppl
    }

    /// Pages a same-RU reclaim would hand back to `ru`.
    pub fn reclaimable_pages(&self, pool: &LinePool, ru: RuId) -> u64 {
        let full = pool
            .lines()
            .iter()
            .filter(|l| l.owner() == Some(ru) && l.state() == LineState::Full)
            .count();
        full as u64 * pool.pages_per_line() as u64
    }

    /// Writes `byte_len` bytes into the RU that `placement` resolves to.
    ///
    /// The write either fits entirely in the RU's current line plus its free
    /// lines or is rejected with [`FdpError::RuExhausted`] before anything
    /// changes. Data never lands in a line the RU does not own. A `Full` RU
    /// that got lines back is reopened and stamped with `now`.
    pub fn route_write(
        &mut self,
        pool: &mut LinePool,
        placement: Placement,
        slba: u64,
        byte_len: u64,
        now: u64,
    ) -> FdpResult<WriteReport> {
        if !self.enabled {
            return Err(FdpError::Disabled);
        }
        let page_size = self.page_size as u64;
        if byte_len == 0 || byte_len % page_size != 0 {
            return Err(FdpError::InvalidLength(byte_len));
        }
        let ruid = self.resolve(placement)?;
        let pages = byte_len / page_size;
        if pages > self.available_pages(pool, ruid) {
            log::warn!("[fdp] {ruid} exhausted: {pages} page(s) requested");
            return Err(FdpError::RuExhausted(ruid));
        }

        let ppl = pool.pages_per_line();
        let ru = &mut self.rus[ruid.index()];
        let mut report = WriteReport {
            ru: Some(ruid),
            slba,
            pages: pages as u32,
            ..WriteReport::default()
        };

        let mut remaining = pages as u32;
        while remaining > 0 {
            let line = match ru.wp.line {
                Some(line) => line,
                None => {
                    let line = pool.take(Some(ruid)).ok_or(FdpError::RuExhausted(ruid))?;
                    ru.open(line, now);
                    line
                }
            };

            let n = remaining.min(ppl - ru.wp.page);
            pool.program(line, n);
            ru.wp.page += n;
            remaining -= n;
            report.lines.push(line);

            if ru.wp.page == ppl {
                pool.retire(line);
                ru.lines_consumed += 1;
                report.retired.push(line);
                match pool.take(Some(ruid)) {
                    Some(next) => ru.wp = WritePointer::at(next),
                    None => {
                        ru.wp = WritePointer::closed();
                        ru.state = RuState::Full;
                        log::debug!("[fdp] {ruid} full");
                    }
                }
            }
        }

        ru.host_bytes_written += byte_len;
        ru.media_bytes_written += byte_len;
        ru.host_write_cmds += 1;

        self.totals.host_bytes_written += byte_len;
        self.totals.media_bytes_written += byte_len;
        self.totals.host_write_cmds += 1;
        if self.last_ru.is_some_and(|last| last != ruid) {
            self.totals.ru_switches += 1;
        }
        self.last_ru = Some(ruid);

        Ok(report)
    }

    /// Reopens a `Full` RU on a line the collector just returned to it.
    pub(crate) fn rearm(&mut self, pool: &mut LinePool, ruid: RuId, now: u64) -> bool {
        let Some(ru) = self.rus.get_mut(ruid.index()) else {
            return false;
        };
        if ru.state != RuState::Full {
            return false;
        }
        match pool.take(Some(ruid)) {
            Some(line) => {
                ru.open(line, now);
                log::debug!("[fdp] {ruid} reopened on {line}");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::FdpParams;
    use crate::geometry::Geometry;
    use crate::reclaim::ReclaimHook;

    const PAGE: u64 = 4096;

    fn setup(lines: u32, ppl: u32) -> (FdpConfig, LinePool) {
        let g = Geometry::new(PAGE as u32, ppl, lines);
        let mut cfg = FdpConfig::initialize(&g, FdpParams::default()).unwrap();
        let mut pool = LinePool::new(lines, ppl);
        cfg.enable(&mut pool, &ManualClock::default()).unwrap();
        (cfg, pool)
    }

    #[test]
    fn rejects_when_disabled_or_bad_length() {
        let g = Geometry::new(4096, 4, 8);
        let mut cfg = FdpConfig::initialize(&g, FdpParams::default()).unwrap();
        let mut pool = LinePool::new(8, 4);
        assert_eq!(
            cfg.route_write(&mut pool, Placement::handle(0), 0, PAGE, 1),
            Err(FdpError::Disabled)
        );
        cfg.enable(&mut pool, &ManualClock::default()).unwrap();
        assert_eq!(
            cfg.route_write(&mut pool, Placement::handle(0), 0, 0, 1),
            Err(FdpError::InvalidLength(0))
        );
        assert_eq!(
            cfg.route_write(&mut pool, Placement::handle(0), 0, 100, 1),
            Err(FdpError::InvalidLength(100))
        );
        assert_eq!(
            cfg.route_write(&mut pool, Placement::handle(200), 0, PAGE, 1),
            Err(FdpError::InvalidPlacement(200))
        );
    }

    #[test]
    fn rolls_over_within_the_ru() {
        let (mut cfg, mut pool) = setup(8, 4);
        // RU 1 owns two lines; write six pages
        let rep = cfg
            .route_write(&mut pool, Placement::handle(1), 0, 6 * PAGE, 1)
            .unwrap();
        assert_eq!(rep.lines.len(), 2);
        assert_eq!(rep.retired.len(), 1);
        for line in &rep.lines {
            assert_eq!(pool.line(*line).unwrap().owner(), Some(RuId(1)));
        }
        let ru = cfg.ru(RuId(1)).unwrap();
        assert_eq!(ru.write_pointer().page, 2);
        assert_eq!(ru.lines_consumed(), 1);
        assert_eq!(ru.host_bytes_written(), 6 * PAGE);
        assert_eq!(cfg.available_pages(&pool, RuId(1)), 2);
    }

    #[test]
    fn exhaustion_is_all_or_nothing() {
        let (mut cfg, mut pool) = setup(8, 4);
        cfg.route_write(&mut pool, Placement::handle(2), 0, 5 * PAGE, 1)
            .unwrap();
        let before = cfg.ru(RuId(2)).unwrap().clone();
        let free_before = pool.free_count(Some(RuId(2)));

        assert_eq!(
            cfg.route_write(&mut pool, Placement::handle(2), 0, 4 * PAGE, 1),
            Err(FdpError::RuExhausted(RuId(2)))
        );
        let after = cfg.ru(RuId(2)).unwrap();
        assert_eq!(after.write_pointer(), before.write_pointer());
        assert_eq!(after.host_bytes_written(), before.host_bytes_written());
        assert_eq!(pool.free_count(Some(RuId(2))), free_before);

        // fill exactly, RU goes full
        cfg.route_write(&mut pool, Placement::handle(2), 0, 3 * PAGE, 1)
            .unwrap();
        assert_eq!(cfg.ru(RuId(2)).unwrap().state(), RuState::Full);
        assert_eq!(cfg.available_pages(&pool, RuId(2)), 0);
    }

    #[test]
    fn full_ru_reopens_after_reclaim() {
        let (mut cfg, mut pool) = setup(4, 2);
        let rep = cfg
            .route_write(&mut pool, Placement::handle(0), 0, 2 * PAGE, 1)
            .unwrap();
        assert_eq!(cfg.ru(RuId(0)).unwrap().state(), RuState::Full);

        let line = rep.retired[0];
        assert_eq!(pool.line(line).unwrap().state(), LineState::Full);
        assert_eq!(pool.on_line_reclaimed(line), Ok(Some(RuId(0))));
        assert!(cfg.rearm(&mut pool, RuId(0), 9));
        assert_eq!(cfg.ru(RuId(0)).unwrap().state(), RuState::Open);
        assert_eq!(cfg.ru(RuId(0)).unwrap().write_pointer().line, Some(line));
        assert!(!cfg.rearm(&mut pool, RuId(0), 9));
    }

    #[test]
    fn reopen_on_write_stamps_open_time() {
        let (mut cfg, mut pool) = setup(4, 2);
        let rep = cfg
            .route_write(&mut pool, Placement::handle(0), 0, 2 * PAGE, 1)
            .unwrap();
        assert_eq!(cfg.ru(RuId(0)).unwrap().state(), RuState::Full);
        pool.on_line_reclaimed(rep.retired[0]).unwrap();

        cfg.route_write(&mut pool, Placement::handle(0), 0, PAGE, 50)
            .unwrap();
        let ru = cfg.ru(RuId(0)).unwrap();
        assert_eq!(ru.state(), RuState::Open);
        assert_eq!(ru.opened_at(), Some(50));
        assert_eq!(ru.write_pointer().page, 1);
    }

    #[test]
    fn reclaimable_counts_only_full_lines() {
        let (mut cfg, mut pool) = setup(8, 4);
        cfg.route_write(&mut pool, Placement::handle(1), 0, 5 * PAGE, 1)
            .unwrap();
        assert_eq!(cfg.reclaimable_pages(&pool, RuId(1)), 4);
        assert_eq!(cfg.reclaimable_pages(&pool, RuId(0)), 0);
    }

    #[test]
    fn counts_ru_switches() {
        let (mut cfg, mut pool) = setup(8, 4);
        for ph in [0, 0, 1, 1, 0, 3] {
            cfg.route_write(&mut pool, Placement::handle(ph), 0, PAGE, 1)
                .unwrap();
        }
        let t = cfg.totals();
        assert_eq!(t.ru_switches, 3);
        assert_eq!(t.host_write_cmds, 6);
        assert_eq!(t.host_bytes_written, 6 * PAGE);
        assert_eq!(t.media_bytes_written, t.host_bytes_written);
    }
}
