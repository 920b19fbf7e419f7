// SPDX-License-Identifier: MIT

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::constants::STATS_SLOTS;

/// Header of the FDP configurations log page.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug, Default)]
#[repr(C)]
pub struct FdpConfigLogHeader {
    /// Number of configurations.
    pub num_configs: u16,
    pub version: u8,
    pub rsvd3: u8,
    /// Total page size in bytes.
    pub size: u32,
    pub rsvd8: [u8; 8],
}

/// One FDP configuration descriptor, followed by `nruh` [`RuhDesc`].
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C)]
pub struct FdpConfigDesc {
    /// Descriptor size including RU handle descriptors.
    pub dsze: u16,
    pub fdpa: u8,
    pub vss: u8,
    pub nrg: u32,
    pub nruh: u16,
    pub maxpids: u16,
    pub nnss: u32,
    /// Reclaim unit nominal size in bytes.
    pub runs: u64,
    /// Estimated reclaim unit time limit, 0 for none.
    pub erutl: u32,
    pub rsvd28: [u8; 36],
}

#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct RuhDesc {
    pub ruht: u8,
    pub rsvd1: u8,
    pub ruhid: u16,
}

/// FDP statistics log page. Slot `i` holds reclaim unit `i`.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C)]
pub struct FdpStatsLog {
    pub host_bytes_written: [u64; STATS_SLOTS],
    pub media_bytes_written: [u64; STATS_SLOTS],
    pub host_write_cmds: [u64; STATS_SLOTS],
    pub host_read_cmds: [u64; STATS_SLOTS],
    pub media_wear_index: [u64; STATS_SLOTS],
}

/// FDP events log page (no events are recorded).
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C)]
pub struct FdpEventsLog {
    pub nevents: u32,
    pub rsvd: [u8; 60],
}

/// Header of the RU handle status payload (IO Management Receive).
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C)]
pub struct RuhStatusHeader {
    pub rsvd: [u8; 14],
    pub nruhsd: u16,
}

#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct RuhStatusDesc {
    pub pid: u16,
    pub ruhid: u16,
    /// Estimated active RU time remaining.
    pub earutr: u32,
    /// Reclaim unit available media writes, in bytes.
    pub ruamw: u64,
    pub rsvd: [u8; 16],
}

const _: () = assert!(core::mem::size_of::<FdpConfigLogHeader>() == 16);
const _: () = assert!(core::mem::size_of::<FdpConfigDesc>() == 64);
const _: () = assert!(core::mem::size_of::<RuhDesc>() == 4);
const _: () = assert!(core::mem::size_of::<FdpStatsLog>() == 640);
const _: () = assert!(core::mem::size_of::<FdpEventsLog>() == 64);
const _: () = assert!(core::mem::size_of::<RuhStatusHeader>() == 16);
const _: () = assert!(core::mem::size_of::<RuhStatusDesc>() == 32);

impl FdpStatsLog {
    pub fn zeroed() -> Self {
        Self {
            host_bytes_written: [0; STATS_SLOTS],
            media_bytes_written: [0; STATS_SLOTS],
            host_write_cmds: [0; STATS_SLOTS],
            host_read_cmds: [0; STATS_SLOTS],
            media_wear_index: [0; STATS_SLOTS],
        }
    }
}

impl FdpEventsLog {
    pub fn empty() -> Self {
        Self {
            nevents: 0,
            rsvd: [0; 60],
        }
    }
}
