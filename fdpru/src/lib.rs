// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

//! Flexible Data Placement reclaim unit manager.
//!
//! Partitions the lines of an emulated SSD among isolated reclaim units,
//! routes tagged writes to them, returns reclaimed lines to the unit that
//! owned them and serves the FDP log pages.

extern crate alloc;

#[macro_use]
mod macros;

pub mod checker;
pub mod clock;
pub mod commands;
pub mod config;
pub mod constants;
pub mod default_path;
pub mod device;
pub mod distribute;
pub mod errors;
pub mod geometry;
pub mod pool;
pub mod reclaim;
pub mod router;
pub mod ru;
pub mod telemetry;

pub mod prelude {
    pub use crate::checker::{
        DeviceChecker, Finding, Severity, VerifyOptions, VerifyPhases, VerifyReport,
    };
    #[cfg(feature = "std")]
    pub use crate::clock::SystemClock;
    pub use crate::clock::{Clock, ManualClock};
    pub use crate::commands::{
        FlipCode, LID_FDP_CONFIGS, LID_FDP_EVENTS, LID_FDP_STATS, LogId, LogRequest, MgmtRequest,
        WriteCmd,
    };
    pub use crate::config::{FdpAttributes, FdpConfig, FdpParams, Placement, ReclaimGroup};
    pub use crate::constants::*;
    pub use crate::device::{Accounting, Completion, FdpDevice, Features, Oacs, Oncs};
    pub use crate::distribute::Distribution;
    pub use crate::errors::*;
    pub use crate::geometry::Geometry;
    pub use crate::pool::{Line, LineId, LinePool, LineState};
    pub use crate::reclaim::{
        Collector, GcStats, OldestFirst, ReclaimHook, Reclaimed, VictimPolicy, VictimSource,
    };
    pub use crate::router::WriteReport;
    pub use crate::ru::{ReclaimUnit, RuId, RuState, WritePointer};
}
