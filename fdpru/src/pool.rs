// SPDX-License-Identifier: MIT

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;

use crate::errors::*;
use crate::reclaim::{ReclaimHook, VictimSource};
use crate::ru::RuId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineId(pub u32);

impl LineId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    /// Erased, sitting in exactly one free list.
    Free,
    /// Current write target of an RU or of the default path.
    Open,
    /// Written and waiting for the collector.
    Full,
}

/// Physical erase unit record.
#[derive(Debug, Clone)]
pub struct Line {
    id: LineId,
    owner: Option<RuId>,
    state: LineState,
    erase_count: u32,
    written_pages: u32,
    retired_seq: u64,
}

impl Line {
    fn new(id: LineId) -> Self {
        Self {
            id,
            owner: None,
            state: LineState::Free,
            erase_count: 0,
            written_pages: 0,
            retired_seq: 0,
        }
    }

    pub fn id(&self) -> LineId {
        self.id
    }
    /// RU the line belongs to, `None` while it is in the global pool.
    pub fn owner(&self) -> Option<RuId> {
        self.owner
    }
    pub fn state(&self) -> LineState {
        self.state
    }
    pub fn erase_count(&self) -> u32 {
        self.erase_count
    }
    pub fn written_pages(&self) -> u32 {
        self.written_pages
    }
    /// Order in which the line became `Full` (older lines have smaller values).
    pub fn retired_seq(&self) -> u64 {
        self.retired_seq
    }
}

/// Arena of every line plus the free lists that index into it.
///
/// There is one global free list and one list per reclaim unit. Membership
/// is by [`LineId`]; the arena stays the single owner of line records.
/// Lines only ever enter a list through [`ReclaimHook::on_line_reclaimed`]
/// or a bulk move performed at enable/disable time, and the destination is
/// always derived from the line's own `owner` field.
#[derive(Debug, Clone)]
pub struct LinePool {
    lines: Vec<Line>,
    pages_per_line: u32,
    global: VecDeque<LineId>,
    domains: Vec<VecDeque<LineId>>,
    retire_seq: u64,
}

impl LinePool {
    /// All lines start erased in the global list, in index order.
    pub fn new(total: u32, pages_per_line: u32) -> Self {
        let lines: Vec<Line> = (0..total).map(|i| Line::new(LineId(i))).collect();
        let global = lines.iter().map(|l| l.id).collect();
        Self {
            lines,
            pages_per_line,
            global,
            domains: Vec::new(),
            retire_seq: 0,
        }
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn pages_per_line(&self) -> u32 {
        self.pages_per_line
    }

    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(id.index())
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn global_free(&self) -> usize {
        self.global.len()
    }

    /// Free lines held by `owner` (`None` is the global pool).
    pub fn free_count(&self, owner: Option<RuId>) -> usize {
        match owner {
            None => self.global.len(),
            Some(ru) => self.domains.get(ru.index()).map_or(0, |d| d.len()),
        }
    }

    /// Free line ids of `owner`, in pop order.
    pub fn free_lines(&self, owner: Option<RuId>) -> impl Iterator<Item = LineId> + '_ {
        let list = match owner {
            None => Some(&self.global),
            Some(ru) => self.domains.get(ru.index()),
        };
        list.into_iter().flat_map(|l| l.iter().copied())
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    pub fn count_state(&self, state: LineState) -> usize {
        self.lines.iter().filter(|l| l.state == state).count()
    }

    /// Sum of the erase counts of lines owned by `ru`.
    pub fn wear_of(&self, ru: RuId) -> u64 {
        self.lines
            .iter()
            .filter(|l| l.owner == Some(ru))
            .map(|l| l.erase_count as u64)
            .sum()
    }

    /// Creates `n` empty per-RU lists.
    pub(crate) fn open_domains(&mut self, n: usize) {
        self.domains = (0..n).map(|_| VecDeque::new()).collect();
    }

    /// Moves `count` lines from the head of the global list to `ru`.
    pub(crate) fn assign(&mut self, ru: RuId, count: usize) -> FdpResult {
        if ru.index() >= self.domains.len() {
            return Err(FdpError::Other("assign: reclaim unit has no free list"));
        }
        if count > self.global.len() {
            return Err(FdpError::GlobalExhausted);
        }
        for _ in 0..count {
            let Some(id) = self.global.pop_front() else {
                return Err(FdpError::GlobalExhausted);
            };
            self.lines[id.index()].owner = Some(ru);
            self.domains[ru.index()].push_back(id);
        }
        Ok(())
    }

    /// Pops the next free line of `owner` and marks it `Open`.
    pub(crate) fn take(&mut self, owner: Option<RuId>) -> Option<LineId> {
        let id = self.list_for(owner).ok()?.pop_front()?;
        let line = &mut self.lines[id.index()];
        line.state = LineState::Open;
        line.written_pages = 0;
        Some(id)
    }

    pub(crate) fn program(&mut self, id: LineId, pages: u32) {
        if let Some(line) = self.lines.get_mut(id.index()) {
            line.written_pages = (line.written_pages + pages).min(self.pages_per_line);
        }
    }

    /// `Open` -> `Full`; the line becomes a collector candidate.
    pub(crate) fn retire(&mut self, id: LineId) {
        if let Some(line) = self.lines.get_mut(id.index()) {
            if line.state == LineState::Open {
                self.retire_seq += 1;
                line.state = LineState::Full;
                line.retired_seq = self.retire_seq;
            }
        }
    }

    /// Puts back an `Open` line that never received data.
    pub(crate) fn release(&mut self, id: LineId) -> FdpResult {
        let line = self.lines.get(id.index()).ok_or(FdpError::NotReclaimable(id))?;
        if line.state != LineState::Open || line.written_pages != 0 {
            return Err(FdpError::NotReclaimable(id));
        }
        let owner = line.owner;
        self.list_for(owner)?.push_front(id);
        self.lines[id.index()].state = LineState::Free;
        Ok(())
    }

    /// Returns every RU-owned line to the global pool.
    ///
    /// Free lines move to the global list (RU order, then list order).
    /// Written lines are disowned so their reclaim lands in the global list.
    /// An open line with no data goes straight back to the global list; one
    /// with data is retired.
    pub(crate) fn close_domains(&mut self) {
        let domains = core::mem::take(&mut self.domains);
        for list in domains {
            for id in list {
                self.lines[id.index()].owner = None;
                self.global.push_back(id);
            }
        }
        for i in 0..self.lines.len() {
            if self.lines[i].owner.take().is_none() {
                continue;
            }
            if self.lines[i].state == LineState::Open {
                if self.lines[i].written_pages == 0 {
                    self.lines[i].state = LineState::Free;
                    self.global.push_back(self.lines[i].id);
                } else {
                    self.retire(LineId(i as u32));
                }
            }
        }
    }

    fn list_for(&mut self, owner: Option<RuId>) -> FdpResult<&mut VecDeque<LineId>> {
        match owner {
            None => Ok(&mut self.global),
            Some(ru) => self
                .domains
                .get_mut(ru.index())
                .ok_or(FdpError::Other("owner has no free list")),
        }
    }
}

impl ReclaimHook for LinePool {
    fn on_line_reclaimed(&mut self, id: LineId) -> FdpResult<Option<RuId>> {
        let line = self.lines.get(id.index()).ok_or(FdpError::NotReclaimable(id))?;
        if line.state != LineState::Full {
            return Err(FdpError::NotReclaimable(id));
        }
        let owner = line.owner;
        self.list_for(owner)?.push_back(id);

        let line = &mut self.lines[id.index()];
        line.state = LineState::Free;
        line.written_pages = 0;
        line.erase_count += 1;
        log::trace!("[fdp] {id} reclaimed (owner: {owner:?})");
        Ok(owner)
    }
}

impl VictimSource for LinePool {
    fn full_lines(&self) -> Vec<&Line> {
        self.lines.iter().filter(|l| l.state == LineState::Full).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_with_domains(total: u32, ppl: u32, n: usize) -> LinePool {
        let mut p = LinePool::new(total, ppl);
        p.open_domains(n);
        p
    }

    #[test]
    fn starts_all_global() {
        let p = LinePool::new(8, 4);
        assert_eq!(p.global_free(), 8);
        assert_eq!(p.count_state(LineState::Free), 8);
        assert_eq!(p.free_lines(None).next(), Some(LineId(0)));
    }

    #[test]
    fn assign_sets_owner() {
        let mut p = pool_with_domains(8, 4, 2);
        p.assign(RuId(1), 3).unwrap();
        assert_eq!(p.global_free(), 5);
        assert_eq!(p.free_count(Some(RuId(1))), 3);
        for id in p.free_lines(Some(RuId(1))) {
            assert_eq!(p.line(id).unwrap().owner(), Some(RuId(1)));
        }
        assert_eq!(p.assign(RuId(0), 6), Err(FdpError::GlobalExhausted));
        assert!(p.assign(RuId(5), 1).is_err());
    }

    #[test]
    fn reclaim_returns_to_owner() {
        let mut p = pool_with_domains(8, 4, 2);
        p.assign(RuId(0), 2).unwrap();
        p.assign(RuId(1), 2).unwrap();

        let id = p.take(Some(RuId(1))).unwrap();
        p.program(id, 4);
        p.retire(id);
        assert_eq!(p.line(id).unwrap().state(), LineState::Full);

        assert_eq!(p.on_line_reclaimed(id), Ok(Some(RuId(1))));
        assert_eq!(p.free_count(Some(RuId(1))), 2);
        assert_eq!(p.free_count(Some(RuId(0))), 2);
        assert_eq!(p.global_free(), 4);
        assert_eq!(p.line(id).unwrap().erase_count(), 1);
        assert_eq!(p.wear_of(RuId(1)), 1);
    }

    #[test]
    fn reclaim_rejects_non_full() {
        let mut p = pool_with_domains(4, 4, 1);
        assert_eq!(
            p.on_line_reclaimed(LineId(0)),
            Err(FdpError::NotReclaimable(LineId(0)))
        );
        let id = p.take(None).unwrap();
        assert!(p.on_line_reclaimed(id).is_err());
        p.retire(id);
        p.on_line_reclaimed(id).unwrap();
        // second reclaim of the same line
        assert!(p.on_line_reclaimed(id).is_err());
        assert_eq!(p.global_free(), 4);
        assert!(p.on_line_reclaimed(LineId(99)).is_err());
    }

    #[test]
    fn close_domains_disowns_everything() {
        let mut p = pool_with_domains(8, 4, 2);
        p.assign(RuId(0), 4).unwrap();
        p.assign(RuId(1), 4).unwrap();
        let empty = p.take(Some(RuId(0))).unwrap();
        let written = p.take(Some(RuId(1))).unwrap();
        p.program(written, 1);

        p.close_domains();
        assert_eq!(p.domain_count(), 0);
        assert_eq!(p.global_free(), 7);
        assert_eq!(p.line(empty).unwrap().state(), LineState::Free);
        assert_eq!(p.line(written).unwrap().state(), LineState::Full);
        assert!(p.lines().iter().all(|l| l.owner().is_none()));

        assert_eq!(p.on_line_reclaimed(written), Ok(None));
        assert_eq!(p.global_free(), 8);
    }
}
