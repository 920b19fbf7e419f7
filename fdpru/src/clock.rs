// SPDX-License-Identifier: MIT

use core::cell::Cell;

/// Source of RU open timestamps, in nanoseconds.
pub trait Clock {
    fn now_ns(&self) -> u64;
}

/// Wall clock backed by the `time` crate.
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now_ns(&self) -> u64 {
        let ns = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
        u64::try_from(ns).unwrap_or(0)
    }
}

/// Clock that only moves when told to. Each read advances it by `step`.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
    step: u64,
}

impl ManualClock {
    pub fn new(start: u64, step: u64) -> Self {
        Self {
            now: Cell::new(start),
            step,
        }
    }

    pub fn set(&self, ns: u64) {
        self.now.set(ns);
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> u64 {
        let t = self.now.get();
        self.now.set(t.wrapping_add(self.step));
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_steps() {
        let c = ManualClock::new(100, 10);
        assert_eq!(c.now_ns(), 100);
        assert_eq!(c.now_ns(), 110);
        c.set(5);
        assert_eq!(c.now_ns(), 5);
    }

    #[cfg(feature = "std")]
    #[test]
    fn system_clock_is_after_epoch() {
        assert!(SystemClock.now_ns() > 0);
    }
}
