// SPDX-License-Identifier: MIT

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::errors::*;
use crate::pool::{Line, LineId};
use crate::ru::RuId;

/// Called by the collector for every line it has erased.
///
/// The implementor decides where the line goes; the collector never names a
/// destination and never sees reclaim units.
pub trait ReclaimHook {
    /// Returns the line to the free list of its owner and reports that owner
    /// (`None` for the global pool). Fails without side effects when the line
    /// is not waiting for reclaim.
    fn on_line_reclaimed(&mut self, line: LineId) -> FdpResult<Option<RuId>>;
}

/// Exposes written lines to the collector.
pub trait VictimSource {
    fn full_lines(&self) -> Vec<&Line>;
}

/// Orders written lines by how soon they should be erased.
pub trait VictimPolicy {
    fn name(&self) -> &'static str;
    /// Sorts `candidates` so the first entry is the next victim.
    fn order(&self, candidates: &mut [&Line]);
}

/// Erases the line that filled up first.
#[derive(Debug, Default, Clone, Copy)]
pub struct OldestFirst;

impl VictimPolicy for OldestFirst {
    fn name(&self) -> &'static str {
        "oldest-first"
    }

    fn order(&self, candidates: &mut [&Line]) {
        candidates.sort_unstable_by_key(|l| (l.retired_seq(), l.id()));
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GcStats {
    pub passes: u64,
    pub lines_reclaimed: u64,
    /// Lines that went back to a reclaim unit rather than the global pool.
    pub lines_to_ru: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reclaimed {
    pub line: LineId,
    pub owner: Option<RuId>,
}

/// Generic garbage collector front end.
pub struct Collector {
    policy: Box<dyn VictimPolicy>,
    stats: GcStats,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new(Box::new(OldestFirst))
    }
}

impl core::fmt::Debug for Collector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collector")
            .field("policy", &self.policy.name())
            .field("stats", &self.stats)
            .finish()
    }
}

impl Collector {
    pub fn new(policy: Box<dyn VictimPolicy>) -> Self {
        Self {
            policy,
            stats: GcStats::default(),
        }
    }

    pub fn stats(&self) -> GcStats {
        self.stats
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Erases up to `budget` written lines accepted by `filter`, handing
    /// each one to the hook. Candidates are gathered and ordered once per
    /// pass.
    pub fn collect<S, F>(&mut self, pool: &mut S, budget: usize, filter: F) -> FdpResult<Vec<Reclaimed>>
    where
        S: ReclaimHook + VictimSource + ?Sized,
        F: Fn(&Line) -> bool,
    {
        self.stats.passes += 1;

        let victims: Vec<LineId> = {
            let mut candidates: Vec<&Line> =
                pool.full_lines().into_iter().filter(|l| filter(l)).collect();
            self.policy.order(&mut candidates);
            candidates.iter().take(budget).map(|l| l.id()).collect()
        };

        let mut out = Vec::with_capacity(victims.len());
        for line in victims {
            let owner = pool.on_line_reclaimed(line)?;
            self.stats.lines_reclaimed += 1;
            if owner.is_some() {
                self.stats.lines_to_ru += 1;
            }
            out.push(Reclaimed { line, owner });
        }

        log::debug!(
            "[fdp] gc pass {}: {} line(s) reclaimed ({})",
            self.stats.passes,
            out.len(),
            self.policy.name()
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{LinePool, LineState};

    fn written_pool() -> LinePool {
        let mut p = LinePool::new(6, 2);
        p.open_domains(2);
        p.assign(RuId(0), 3).unwrap();
        p.assign(RuId(1), 3).unwrap();
        // retire in order: RU1 line, RU0 line, RU1 line
        for owner in [RuId(1), RuId(0), RuId(1)] {
            let id = p.take(Some(owner)).unwrap();
            p.program(id, 2);
            p.retire(id);
        }
        p
    }

    #[test]
    fn oldest_first_order() {
        let mut p = written_pool();
        let mut gc = Collector::default();
        let got = gc.collect(&mut p, 2, |_| true).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].owner, Some(RuId(1)));
        assert_eq!(got[1].owner, Some(RuId(0)));
        assert_eq!(gc.stats().lines_reclaimed, 2);
        assert_eq!(p.count_state(LineState::Full), 1);
    }

    #[test]
    fn filter_restricts_victims() {
        let mut p = written_pool();
        let mut gc = Collector::default();
        let got = gc
            .collect(&mut p, usize::MAX, |l| l.owner() == Some(RuId(0)))
            .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(p.free_count(Some(RuId(0))), 3);
        assert_eq!(p.free_count(Some(RuId(1))), 1);
    }

    struct ScanCounter {
        pool: LinePool,
        scans: core::cell::Cell<u32>,
    }

    impl ReclaimHook for ScanCounter {
        fn on_line_reclaimed(&mut self, line: LineId) -> FdpResult<Option<RuId>> {
            self.pool.on_line_reclaimed(line)
        }
    }

    impl VictimSource for ScanCounter {
        fn full_lines(&self) -> Vec<&Line> {
            self.scans.set(self.scans.get() + 1);
            self.pool.full_lines()
        }
    }

    #[test]
    fn one_scan_per_pass() {
        let mut src = ScanCounter {
            pool: written_pool(),
            scans: core::cell::Cell::new(0),
        };
        let mut gc = Collector::default();
        let got = gc.collect(&mut src, usize::MAX, |_| true).unwrap();
        assert_eq!(got.len(), 3);
        assert_eq!(src.scans.get(), 1);
        assert_eq!(src.pool.count_state(LineState::Full), 0);
    }

    #[test]
    fn empty_pass() {
        let mut p = LinePool::new(4, 2);
        let mut gc = Collector::default();
        assert!(gc.collect(&mut p, 4, |_| true).unwrap().is_empty());
        assert_eq!(gc.stats().passes, 1);
        assert_eq!(gc.policy_name(), "oldest-first");
    }
}
