// SPDX-License-Identifier: MIT

use core::fmt;

pub use fdpio::errors::*;

use crate::pool::LineId;
use crate::ru::RuId;

/// NVMe completion status (status code type + status code, DNR in bit 14).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub u16);

impl Status {
    pub const SUCCESS: Status = Status(0x0000);
    pub const INVALID_OPCODE: Status = Status(0x0001);
    pub const INVALID_FIELD: Status = Status(0x0002);
    pub const DATA_TRANSFER_ERROR: Status = Status(0x0004);
    pub const INTERNAL_ERROR: Status = Status(0x0006);
    pub const FDP_DISABLED: Status = Status(0x0029);
    pub const INVALID_PLACEMENT_HANDLE: Status = Status(0x002A);
    pub const CAPACITY_EXCEEDED: Status = Status(0x0081);
    pub const INVALID_LOG_ID: Status = Status(0x0109);

    /// Do Not Retry.
    pub const DNR: u16 = 0x4000;

    #[inline]
    pub const fn with_dnr(self) -> Status {
        Status(self.0 | Self::DNR)
    }

    #[inline]
    pub const fn code(self) -> u16 {
        self.0 & !Self::DNR
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn dnr(self) -> bool {
        self.0 & Self::DNR != 0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// Errors raised by the reclaim unit manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdpError {
    /// An FDP-only command arrived while FDP is disabled.
    Disabled,
    InvalidLogId(u16),
    /// Requested length cannot hold the page header.
    BufferTooSmall { need: u32, got: u32 },
    UnsupportedOperation(u8),
    InvalidOpcode(u8),
    InvalidPlacement(u16),
    InvalidReclaimGroup(u16),
    /// Write length is zero or not a multiple of the page size.
    InvalidLength(u64),
    TooManyHandles(u16),
    InvalidParams(&'static str),
    /// The RU has no free line left for the write.
    RuExhausted(RuId),
    /// The global pool has no free line left for a default-path write.
    GlobalExhausted,
    /// A RU would receive no line at enable time.
    DistributionFailed(RuId),
    /// The line is not a written line awaiting reclaim.
    NotReclaimable(LineId),
    IO(HostIOError),
    Other(&'static str),
}

impl FdpError {
    pub fn msg(&self) -> &'static str {
        match self {
            FdpError::Disabled => "FDP is disabled",
            FdpError::InvalidLogId(_) => "Unsupported log identifier",
            FdpError::BufferTooSmall { .. } => "Buffer too small for page header",
            FdpError::UnsupportedOperation(_) => "Unsupported management operation",
            FdpError::InvalidOpcode(_) => "Invalid opcode",
            FdpError::InvalidPlacement(_) => "Placement handle out of range",
            FdpError::InvalidReclaimGroup(_) => "Reclaim group out of range",
            FdpError::InvalidLength(_) => "Write length must be a positive multiple of the page size",
            FdpError::TooManyHandles(_) => "More RU handles than placement handles",
            FdpError::InvalidParams(msg) => msg,
            FdpError::RuExhausted(_) => "Reclaim unit out of free lines",
            FdpError::GlobalExhausted => "Global pool out of free lines",
            FdpError::DistributionFailed(_) => "Reclaim unit received no line",
            FdpError::NotReclaimable(_) => "Line is not awaiting reclaim",
            FdpError::IO(e) => e.msg(),
            FdpError::Other(msg) => msg,
        }
    }

    /// Completion status reported to the host. All FDP rejections set DNR.
    pub fn status(&self) -> Status {
        let sc = match self {
            FdpError::Disabled => Status::FDP_DISABLED,
            FdpError::InvalidLogId(_) => Status::INVALID_LOG_ID,
            FdpError::InvalidOpcode(_) => Status::INVALID_OPCODE,
            FdpError::InvalidPlacement(_) | FdpError::InvalidReclaimGroup(_) => {
                Status::INVALID_PLACEMENT_HANDLE
            }
            FdpError::BufferTooSmall { .. }
            | FdpError::UnsupportedOperation(_)
            | FdpError::InvalidLength(_)
            | FdpError::TooManyHandles(_)
            | FdpError::InvalidParams(_)
            | FdpError::DistributionFailed(_) => Status::INVALID_FIELD,
            FdpError::RuExhausted(_) | FdpError::GlobalExhausted => Status::CAPACITY_EXCEEDED,
            FdpError::IO(_) => Status::DATA_TRANSFER_ERROR,
            FdpError::NotReclaimable(_) | FdpError::Other(_) => Status::INTERNAL_ERROR,
        };
        sc.with_dnr()
    }
}

impl From<HostIOError> for FdpError {
    fn from(e: HostIOError) -> Self {
        FdpError::IO(e)
    }
}

impl From<&'static str> for FdpError {
    fn from(s: &'static str) -> Self {
        FdpError::Other(s)
    }
}

impl fmt::Display for FdpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        match self {
            FdpError::InvalidLogId(lid) => write!(f, " (lid: 0x{lid:02x})")?,
            FdpError::BufferTooSmall { need, got } => write!(f, " (need {need}, got {got})")?,
            FdpError::UnsupportedOperation(mo) => write!(f, " (mo: {mo})")?,
            FdpError::InvalidOpcode(opc) => write!(f, " (opcode: 0x{opc:02x})")?,
            FdpError::InvalidPlacement(ph) => write!(f, " (ph: {ph})")?,
            FdpError::InvalidReclaimGroup(rg) => write!(f, " (rg: {rg})")?,
            FdpError::InvalidLength(len) => write!(f, " (len: {len})")?,
            FdpError::TooManyHandles(n) => write!(f, " (nruh: {n})")?,
            FdpError::RuExhausted(ru) | FdpError::DistributionFailed(ru) => write!(f, " ({ru})")?,
            FdpError::NotReclaimable(line) => write!(f, " ({line})")?,
            FdpError::IO(e) => write!(f, "\n  caused by: {e}")?,
            _ => {}
        }
        Ok(())
    }
}

impl core::error::Error for FdpError {}

pub type FdpResult<T = ()> = Result<T, FdpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_carry_dnr() {
        let st = FdpError::Disabled.status();
        assert!(st.dnr());
        assert_eq!(st.code(), Status::FDP_DISABLED.0);
        assert_eq!(FdpError::InvalidLogId(0x30).status().code(), 0x0109);
        assert_eq!(
            FdpError::RuExhausted(RuId(2)).status().code(),
            Status::CAPACITY_EXCEEDED.0
        );
    }

    #[test]
    fn display_includes_detail() {
        let s = alloc::format!("{}", FdpError::BufferTooSmall { need: 16, got: 4 });
        assert_eq!(s, "Buffer too small for page header (need 16, got 4)");
        let s = alloc::format!("{}", FdpError::RuExhausted(RuId(3)));
        assert_eq!(s, "Reclaim unit out of free lines (RU 3)");
    }
}
