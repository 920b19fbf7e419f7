// SPDX-License-Identifier: MIT

use core::fmt;

use crate::pool::LineId;

/// Dense reclaim unit index, unique across all reclaim groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuId(pub u16);

impl RuId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RU {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuState {
    /// No lines assigned; FDP is off.
    Unused,
    /// Has a current line to write into.
    Open,
    /// Current line filled and no free line left.
    Full,
}

impl fmt::Display for RuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuState::Unused => "unused",
            RuState::Open => "open",
            RuState::Full => "full",
        })
    }
}

/// Next page to program inside the RU's current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WritePointer {
    pub line: Option<LineId>,
    pub page: u32,
}

impl WritePointer {
    pub fn at(line: LineId) -> Self {
        Self {
            line: Some(line),
            page: 0,
        }
    }

    pub fn closed() -> Self {
        Self::default()
    }
}

/// One isolated placement domain.
///
/// The RU never holds its free lines itself: those sit in the pool's list
/// keyed by [`RuId`], so the only way a line reaches this RU is through the
/// pool reading the line's owner.
#[derive(Debug, Clone)]
pub struct ReclaimUnit {
    pub(crate) ruid: RuId,
    pub(crate) rgid: u16,
    pub(crate) ruhid: u16,
    pub(crate) state: RuState,
    pub(crate) wp: WritePointer,
    pub(crate) capacity: u64,
    pub(crate) host_bytes_written: u64,
    pub(crate) media_bytes_written: u64,
    pub(crate) host_write_cmds: u64,
    pub(crate) lines_consumed: u32,
    pub(crate) opened_at: Option<u64>,
}

impl ReclaimUnit {
    pub fn new(ruid: RuId, rgid: u16, ruhid: u16, capacity: u64) -> Self {
        Self {
            ruid,
            rgid,
            ruhid,
            state: RuState::Unused,
            wp: WritePointer::closed(),
            capacity,
            host_bytes_written: 0,
            media_bytes_written: 0,
            host_write_cmds: 0,
            lines_consumed: 0,
            opened_at: None,
        }
    }

    pub fn id(&self) -> RuId {
        self.ruid
    }
    pub fn rgid(&self) -> u16 {
        self.rgid
    }
    pub fn ruhid(&self) -> u16 {
        self.ruhid
    }
    pub fn state(&self) -> RuState {
        self.state
    }
    pub fn write_pointer(&self) -> WritePointer {
        self.wp
    }
    pub fn capacity(&self) -> u64 {
        self.capacity
    }
    pub fn host_bytes_written(&self) -> u64 {
        self.host_bytes_written
    }
    pub fn media_bytes_written(&self) -> u64 {
        self.media_bytes_written
    }
    pub fn host_write_cmds(&self) -> u64 {
        self.host_write_cmds
    }
    pub fn lines_consumed(&self) -> u32 {
        self.lines_consumed
    }
    pub fn opened_at(&self) -> Option<u64> {
        self.opened_at
    }

    /// Bytes the host may still write before reaching the RU capacity.
    pub fn remaining_bytes(&self) -> u64 {
        self.capacity.saturating_sub(self.host_bytes_written)
    }

    pub(crate) fn open(&mut self, line: LineId, now: u64) {
        self.wp = WritePointer::at(line);
        self.state = RuState::Open;
        self.opened_at = Some(now);
    }

    /// Drops the RU back to `Unused` and clears its statistics.
    pub(crate) fn reset(&mut self) {
        let (ruid, rgid, ruhid, capacity) = (self.ruid, self.rgid, self.ruhid, self.capacity);
        *self = Self::new(ruid, rgid, ruhid, capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_then_reset() {
        let mut ru = ReclaimUnit::new(RuId(1), 0, 1, 1 << 20);
        assert_eq!(ru.state(), RuState::Unused);
        ru.open(LineId(7), 42);
        assert_eq!(ru.state(), RuState::Open);
        assert_eq!(ru.write_pointer(), WritePointer::at(LineId(7)));
        assert_eq!(ru.opened_at(), Some(42));

        ru.host_bytes_written = 4096;
        assert_eq!(ru.remaining_bytes(), (1 << 20) - 4096);

        ru.reset();
        assert_eq!(ru.state(), RuState::Unused);
        assert_eq!(ru.host_bytes_written(), 0);
        assert_eq!(ru.write_pointer(), WritePointer::closed());
        assert_eq!(ru.ruhid(), 1);
    }

    #[test]
    fn remaining_saturates() {
        let mut ru = ReclaimUnit::new(RuId(0), 0, 0, 100);
        ru.host_bytes_written = 4096;
        assert_eq!(ru.remaining_bytes(), 0);
    }
}
