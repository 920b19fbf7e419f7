// SPDX-License-Identifier: MIT

mod types;

pub use types::{Finding, Severity, VerifyOptions, VerifyPhases, VerifyReport};

use alloc::format;
use alloc::vec;

use crate::device::FdpDevice;
use crate::pool::{LineId, LineState};
use crate::ru::{RuId, RuState};

/// Consistency checks over a live device, grouped in phases.
pub trait DeviceChecker {
    fn check_with(&self, opt: &VerifyOptions) -> VerifyReport {
        let mut rep = VerifyReport::default();
        for phase in [
            VerifyPhases::PARTITION,
            VerifyPhases::OWNERSHIP,
            VerifyPhases::WRITE_POINTERS,
            VerifyPhases::COUNTERS,
        ] {
            if !opt.phases.contains(phase) {
                continue;
            }
            self.run_phase(phase, &mut rep);
            if opt.fail_fast && rep.has_error() {
                break;
            }
        }
        rep
    }

    fn run_phase(&self, phase: VerifyPhases, rep: &mut VerifyReport) {
        if phase == VerifyPhases::PARTITION {
            self.check_partition(rep);
        } else if phase == VerifyPhases::OWNERSHIP {
            self.check_ownership(rep);
        } else if phase == VerifyPhases::WRITE_POINTERS {
            self.check_write_pointers(rep);
        } else if phase == VerifyPhases::COUNTERS {
            self.check_counters(rep);
        }
    }

    fn check_all(&self) -> VerifyReport {
        self.check_with(&VerifyOptions::default())
    }

    fn check_partition(&self, _rep: &mut VerifyReport) {}
    fn check_ownership(&self, _rep: &mut VerifyReport) {}
    fn check_write_pointers(&self, _rep: &mut VerifyReport) {}
    fn check_counters(&self, _rep: &mut VerifyReport) {}
}

impl DeviceChecker for FdpDevice {
    fn check_partition(&self, rep: &mut VerifyReport) {
        let pool = self.pool();
        let total = pool.total_lines();
        let mut seen = vec![false; total];
        let mut listed = 0usize;

        let owners = core::iter::once(None)
            .chain((0..pool.domain_count()).map(|i| Some(RuId(i as u16))));
        for owner in owners {
            for id in pool.free_lines(owner) {
                listed += 1;
                match seen.get_mut(id.index()) {
                    Some(s) if *s => rep.push(Finding::err(
                        "PART_DUP",
                        format!("{id} appears in more than one free list"),
                    )),
                    Some(s) => *s = true,
                    None => rep.push(Finding::err("PART_RANGE", format!("{id} out of range"))),
                }
                if pool.line(id).is_some_and(|l| l.state() != LineState::Free) {
                    rep.push(Finding::err("PART_STATE", format!("{id} listed free but in use")));
                }
            }
        }

        let free = pool.count_state(LineState::Free);
        let open = pool.count_state(LineState::Open);
        let full = pool.count_state(LineState::Full);
        if free != listed {
            rep.push(Finding::err(
                "PART_LOST",
                format!("{free} free line(s) but {listed} listed"),
            ));
        }
        if listed + open + full != total {
            rep.push(Finding::err(
                "PART_SUM",
                format!("free {listed} + open {open} + full {full} != {total}"),
            ));
        }

        let mut writers = self
            .fdp()
            .rus()
            .iter()
            .filter_map(|ru| ru.write_pointer().line)
            .count();
        writers += usize::from(self.default_path().write_pointer().line.is_some());
        if writers != open {
            rep.push(Finding::err(
                "PART_OPEN",
                format!("{open} open line(s) but {writers} write pointer(s)"),
            ));
        }
    }

    fn check_ownership(&self, rep: &mut VerifyReport) {
        let pool = self.pool();
        let fdp = self.fdp();

        for id in pool.free_lines(None) {
            if let Some(owner) = pool.line(id).and_then(|l| l.owner()) {
                rep.push(Finding::err(
                    "OWN_GLOBAL",
                    format!("{id} in global list owned by {owner}"),
                ));
            }
        }
        for i in 0..pool.domain_count() {
            let ru = RuId(i as u16);
            for id in pool.free_lines(Some(ru)) {
                let owner = pool.line(id).and_then(|l| l.owner());
                if owner != Some(ru) {
                    rep.push(Finding::err(
                        "OWN_FOREIGN",
                        format!("{id} in {ru} list but owned by {owner:?}"),
                    ));
                }
            }
        }

        if !fdp.is_enabled() {
            if let Some(l) = pool.lines().iter().find(|l| l.owner().is_some()) {
                rep.push(Finding::err(
                    "OWN_DISABLED",
                    format!("{} still owned while FDP is off", l.id()),
                ));
            }
        }

        for ru in fdp.rus() {
            if let Some(line) = ru.write_pointer().line {
                let owner = pool.line(line).and_then(|l| l.owner());
                if owner != Some(ru.id()) {
                    rep.push(Finding::err(
                        "OWN_WP",
                        format!("{} writes into {line} owned by {owner:?}", ru.id()),
                    ));
                }
            }
        }
    }

    fn check_write_pointers(&self, rep: &mut VerifyReport) {
        let pool = self.pool();
        let ppl = pool.pages_per_line();
        for ru in self.fdp().rus() {
            let wp = ru.write_pointer();
            match (ru.state(), wp.line) {
                (RuState::Open, Some(line)) => check_line(rep, ru.id(), line, wp.page, ppl, self),
                (RuState::Open, None) => rep.push(Finding::err(
                    "WP_MISSING",
                    format!("{} open without a current line", ru.id()),
                )),
                (RuState::Full | RuState::Unused, Some(line)) => rep.push(Finding::err(
                    "WP_STALE",
                    format!("{} is {} but still points at {line}", ru.id(), ru.state()),
                )),
                (RuState::Full, None) => {
                    if pool.free_count(Some(ru.id())) > 0 {
                        rep.push(Finding::warn(
                            "WP_FULL_FREE",
                            format!("{} full with free lines pending", ru.id()),
                        ));
                    }
                }
                (RuState::Unused, None) => {
                    if self.fdp().is_enabled() {
                        rep.push(Finding::err(
                            "WP_UNUSED",
                            format!("{} unused while FDP is on", ru.id()),
                        ));
                    }
                }
            }
        }
    }

    fn check_counters(&self, rep: &mut VerifyReport) {
        let fdp = self.fdp();
        let line_pages = self.pool().pages_per_line() as u64;
        let page = self.geometry().page_size as u64;
        let mut sum = 0u64;

        for ru in fdp.rus() {
            sum += ru.host_bytes_written();
            if ru.media_bytes_written() != ru.host_bytes_written() {
                rep.push(Finding::err(
                    "CNT_MEDIA",
                    format!("{} media bytes differ from host bytes", ru.id()),
                ));
            }
            let pages = ru.lines_consumed() as u64 * line_pages + ru.write_pointer().page as u64;
            if pages * page != ru.host_bytes_written() {
                rep.push(Finding::err(
                    "CNT_PAGES",
                    format!(
                        "{}: {} byte(s) written but {pages} page(s) programmed",
                        ru.id(),
                        ru.host_bytes_written()
                    ),
                ));
            }
        }
        if sum > fdp.totals().host_bytes_written {
            rep.push(Finding::err(
                "CNT_TOTAL",
                format!("RU bytes {sum} exceed device total {}", fdp.totals().host_bytes_written),
            ));
        }
        rep.push(Finding::info(
            "CNT_SWITCHES",
            format!("{} RU switch(es)", fdp.totals().ru_switches),
        ));
    }
}

fn check_line(rep: &mut VerifyReport, ru: RuId, line: LineId, page: u32, ppl: u32, dev: &FdpDevice) {
    let Some(rec) = dev.pool().line(line) else {
        rep.push(Finding::err("WP_RANGE", format!("{ru} points at missing {line}")));
        return;
    };
    if rec.state() != LineState::Open {
        rep.push(Finding::err(
            "WP_STATE",
            format!("{ru} current {line} is not open"),
        ));
    }
    if page >= ppl || page != rec.written_pages() {
        rep.push(Finding::err(
            "WP_OFFSET",
            format!("{ru} at page {page}, {line} holds {} page(s)", rec.written_pages()),
        ));
    }
}
