// SPDX-License-Identifier: MIT

use alloc::vec::Vec;

use crate::config::FdpConfig;
use crate::errors::*;
use crate::pool::{LineId, LinePool};
use crate::ru::RuId;

/// Lines per RU for `free` lines over `rus` units.
///
/// Every unit gets `free / rus`; the first `free % rus` units get one more.
pub fn plan(free: usize, rus: usize) -> Vec<usize> {
    if rus == 0 {
        return Vec::new();
    }
    let base = free / rus;
    let extra = free % rus;
    (0..rus).map(|i| base + usize::from(i < extra)).collect()
}

/// Outcome of one enable-time distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    /// Lines handed to each RU, current line included.
    pub per_ru: Vec<usize>,
    /// Current line chosen for each RU.
    pub current: Vec<LineId>,
}

impl Distribution {
    pub fn lines_distributed(&self) -> usize {
        self.per_ru.iter().sum()
    }
}

impl FdpConfig {
    /// Moves every global free line into the RU lists and opens each RU on
    /// its first line. Nothing is moved if some RU would get no line.
    pub(crate) fn distribute(&mut self, pool: &mut LinePool, now: u64) -> FdpResult<Distribution> {
        let counts = plan(pool.global_free(), self.rus.len());
        if let Some(starved) = counts.iter().position(|&n| n == 0) {
            log::warn!(
                "[fdp] distribution failed: {} free line(s) for {} RU(s)",
                pool.global_free(),
                self.rus.len()
            );
            return Err(FdpError::DistributionFailed(RuId(starved as u16)));
        }

        pool.open_domains(self.rus.len());
        for (i, &n) in counts.iter().enumerate() {
            pool.assign(RuId(i as u16), n)?;
        }

        let mut current = Vec::with_capacity(self.rus.len());
        for ru in self.rus.iter_mut() {
            let line = pool
                .take(Some(ru.id()))
                .ok_or(FdpError::DistributionFailed(ru.id()))?;
            ru.open(line, now);
            log::debug!("[fdp] {} opened on {line}", ru.id());
            current.push(line);
        }

        Ok(Distribution {
            per_ru: counts,
            current,
        })
    }
}
