// SPDX-License-Identifier: MIT

use serde::Deserialize;

use crate::scenario::Size;

fn one() -> u32 {
    1
}

/// One action of a scenario, tagged by `op` in the TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Write `size` bytes `count` times. Without `ph` the write carries no
    /// placement directive and takes the default path.
    Write {
        #[serde(default)]
        rg: u16,
        ph: Option<u16>,
        size: Size,
        #[serde(default = "one")]
        count: u32,
        #[serde(default)]
        slba: u64,
    },
    Read {
        #[serde(default)]
        slba: u64,
        size: Size,
    },
    Enable,
    Disable,
    /// Background collection; no budget means every written line.
    Gc { budget: Option<usize> },
    /// Reclaim every written line of one reclaim unit.
    Reclaim { ru: u16 },
    /// Raw admin toggle code.
    Flip { code: u64 },
    ResetAcct,
    Check,
    Report,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Write { ph: Some(_), .. } => "write",
            Step::Write { ph: None, .. } => "plain write",
            Step::Read { .. } => "read",
            Step::Enable => "enable",
            Step::Disable => "disable",
            Step::Gc { .. } => "gc",
            Step::Reclaim { .. } => "reclaim",
            Step::Flip { .. } => "flip",
            Step::ResetAcct => "reset_acct",
            Step::Check => "check",
            Step::Report => "report",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Write {
                rg,
                ph: Some(ph),
                size,
                count,
                ..
            } => write!(f, "write {size} x{count} to rg {rg} ph {ph}"),
            Step::Write {
                ph: None,
                size,
                count,
                ..
            } => write!(f, "plain write {size} x{count}"),
            Step::Read { size, .. } => write!(f, "read {size}"),
            Step::Gc { budget: Some(n) } => write!(f, "gc (budget {n})"),
            Step::Reclaim { ru } => write!(f, "reclaim RU {ru}"),
            Step::Flip { code } => write!(f, "flip {code}"),
            other => f.write_str(other.name()),
        }
    }
}
