// SPDX-License-Identifier: MIT

/// Size of the placement handle -> RU handle table.
pub const MAX_PLACEMENT_HANDLES: usize = 128;
/// RU handles per reclaim group when none are configured.
pub const DEFAULT_RUHS: u16 = 4;
/// Per-RU slots in the statistics log page.
pub const STATS_SLOTS: usize = 16;

pub const DEFAULT_PAGE_SIZE: u32 = 4096;
pub const DEFAULT_LBA_SIZE: u32 = 512;
pub const DEFAULT_PAGES_PER_LINE: u32 = 256;
pub const DEFAULT_LINES: u32 = 64;

// Directive types (Write CDW12 bits 23:20)
pub const DTYPE_NONE: u8 = 0;
pub const DTYPE_DATA_PLACEMENT: u8 = 2;

// IO Management Receive operations
pub const MO_RUH_STATUS: u8 = 0x01;

// RUH types (configuration log RUH descriptor)
pub const RUHT_INITIALLY_ISOLATED: u8 = 0x01;

// Admin flip (vendor toggle) codes, CDW10
pub const FLIP_RESET_ACCT: u64 = 5;
pub const FLIP_ENABLE_LOG: u64 = 6;
pub const FLIP_DISABLE_LOG: u64 = 7;
pub const FLIP_ENABLE_FDP: u64 = 8;
pub const FLIP_DISABLE_FDP: u64 = 9;

// Opcodes routed to this subsystem
pub const OPC_ADMIN_GET_LOG_PAGE: u8 = 0x02;
pub const OPC_WRITE: u8 = 0x01;
pub const OPC_READ: u8 = 0x02;
pub const OPC_IO_MGMT_RECV: u8 = 0x12;
pub const OPC_IO_MGMT_SEND: u8 = 0x1D;
pub const OPC_ADMIN_FLIP: u8 = 0xEF;

/// Version byte reported in the configuration log header.
pub const FDP_CONFIG_LOG_VERSION: u8 = 1;
