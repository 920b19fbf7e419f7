// SPDX-License-Identifier: MIT

//! Decoding of the command dwords this subsystem consumes.

use crate::constants::*;

define_log_ids! {
    FDP_CONFIGS => FdpConfigs, 0x20, "FDP configurations", 16,
    FDP_STATS   => FdpStats,   0x21, "FDP statistics",     8,
    FDP_EVENTS  => FdpEvents,  0x22, "FDP events",         64,
}

/// Write command fields relevant to placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteCmd {
    pub slba: u64,
    /// Number of logical blocks, 0-based.
    pub nlb: u16,
    pub dtype: u8,
    pub dspec: u16,
}

impl WriteCmd {
    /// CDW12: NLB in 15:0, DTYPE in 23:20. CDW13: DSPEC in 31:16.
    pub fn from_dwords(slba: u64, cdw12: u32, cdw13: u32) -> Self {
        Self {
            slba,
            nlb: (cdw12 & 0xffff) as u16,
            dtype: ((cdw12 >> 20) & 0xf) as u8,
            dspec: (cdw13 >> 16) as u16,
        }
    }

    /// Write carrying a data placement directive.
    pub fn placed(slba: u64, nlb: u16, dspec: u16) -> Self {
        Self {
            slba,
            nlb,
            dtype: DTYPE_DATA_PLACEMENT,
            dspec,
        }
    }

    pub fn plain(slba: u64, nlb: u16) -> Self {
        Self {
            slba,
            nlb,
            dtype: DTYPE_NONE,
            dspec: 0,
        }
    }

    pub fn to_dwords(&self) -> (u32, u32) {
        let cdw12 = self.nlb as u32 | ((self.dtype as u32 & 0xf) << 20);
        let cdw13 = (self.dspec as u32) << 16;
        (cdw12, cdw13)
    }

    #[inline]
    pub fn has_placement(&self) -> bool {
        self.dtype == DTYPE_DATA_PLACEMENT
    }

    #[inline]
    pub fn byte_len(&self, lba_size: u32) -> u64 {
        (self.nlb as u64 + 1) * lba_size as u64
    }
}

/// Get Log Page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRequest {
    pub lid: u16,
    /// Transfer length in bytes.
    pub len: u64,
}

impl LogRequest {
    /// CDW10: LID in 15:0, NUMDL in 31:16. CDW11: NUMDU in 15:0.
    pub fn from_dwords(cdw10: u32, cdw11: u32) -> Self {
        let numdl = (cdw10 >> 16) as u64;
        let numdu = (cdw11 & 0xffff) as u64;
        Self {
            lid: (cdw10 & 0xffff) as u16,
            len: (((numdu << 16) | numdl) + 1) << 2,
        }
    }

    /// Encodes a request for `len` bytes (rounded down to dwords, at least one).
    pub fn to_dwords(lid: u16, len: u64) -> (u32, u32) {
        let numd = (len >> 2).max(1) - 1;
        let cdw10 = lid as u32 | (((numd & 0xffff) as u32) << 16);
        let cdw11 = ((numd >> 16) & 0xffff) as u32;
        (cdw10, cdw11)
    }

    pub fn log_id(&self) -> Option<LogId> {
        LogId::from_lid(self.lid)
    }
}

/// IO Management Receive request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MgmtRequest {
    pub mo: u8,
    pub len: u64,
}

impl MgmtRequest {
    /// CDW10: MO in 7:0. CDW11: NUMD, 0-based dwords.
    pub fn from_dwords(cdw10: u32, cdw11: u32) -> Self {
        Self {
            mo: (cdw10 & 0xff) as u8,
            len: (cdw11 as u64 + 1) << 2,
        }
    }

    pub fn to_dwords(mo: u8, len: u64) -> (u32, u32) {
        let numd = (len >> 2).max(1) - 1;
        (mo as u32, numd.min(u32::MAX as u64) as u32)
    }
}

/// Admin toggle codes understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipCode {
    ResetAcct,
    EnableLog,
    DisableLog,
    EnableFdp,
    DisableFdp,
}

impl FlipCode {
    pub fn from_cdw10(cdw10: u64) -> Option<Self> {
        match cdw10 {
            FLIP_RESET_ACCT => Some(Self::ResetAcct),
            FLIP_ENABLE_LOG => Some(Self::EnableLog),
            FLIP_DISABLE_LOG => Some(Self::DisableLog),
            FLIP_ENABLE_FDP => Some(Self::EnableFdp),
            FLIP_DISABLE_FDP => Some(Self::DisableFdp),
            _ => None,
        }
    }

    pub fn cdw10(self) -> u64 {
        match self {
            Self::ResetAcct => FLIP_RESET_ACCT,
            Self::EnableLog => FLIP_ENABLE_LOG,
            Self::DisableLog => FLIP_DISABLE_LOG,
            Self::EnableFdp => FLIP_ENABLE_FDP,
            Self::DisableFdp => FLIP_DISABLE_FDP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_fields() {
        // NLB 7, DTYPE 2, DSPEC 3
        let cmd = WriteCmd::from_dwords(100, 0x0020_0007, 0x0003_0000);
        assert_eq!(cmd.nlb, 7);
        assert!(cmd.has_placement());
        assert_eq!(cmd.dspec, 3);
        assert_eq!(cmd.byte_len(512), 4096);
        assert_eq!(cmd.to_dwords(), (0x0020_0007, 0x0003_0000));

        let plain = WriteCmd::from_dwords(0, 0x0000_0007, 0x0003_0000);
        assert!(!plain.has_placement());
    }

    #[test]
    fn log_length_uses_both_halves() {
        let req = LogRequest::from_dwords(0x00FF_0021, 0);
        assert_eq!(req.log_id(), Some(LogId::FdpStats));
        assert_eq!(req.len, 1024);

        let req = LogRequest::from_dwords(0x0000_0020, 1);
        assert_eq!(req.len, ((1u64 << 16) + 1) << 2);

        let (d10, d11) = LogRequest::to_dwords(LID_FDP_EVENTS, 64);
        assert_eq!(LogRequest::from_dwords(d10, d11).len, 64);
        assert_eq!(LogRequest::from_dwords(0x30, 0).log_id(), None);
    }

    #[test]
    fn log_ids() {
        assert_eq!(LogId::FdpConfigs.lid(), 0x20);
        assert_eq!(LogId::FdpEvents.min_len(), 64);
        assert_eq!(alloc::format!("{}", LogId::FdpStats), "FDP statistics");
    }

    #[test]
    fn mgmt_and_flip() {
        let req = MgmtRequest::from_dwords(0x0000_1201, 3);
        assert_eq!(req.mo, MO_RUH_STATUS);
        assert_eq!(req.len, 16);
        assert_eq!(MgmtRequest::to_dwords(1, 16), (1, 3));

        assert_eq!(FlipCode::from_cdw10(8), Some(FlipCode::EnableFdp));
        assert_eq!(FlipCode::from_cdw10(42), None);
        assert_eq!(FlipCode::DisableFdp.cdw10(), 9);
    }
}
