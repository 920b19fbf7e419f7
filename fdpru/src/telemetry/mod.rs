// SPDX-License-Identifier: MIT

//! FDP log pages and RU handle status, built from live state.

mod types;

pub use types::*;

use alloc::vec::Vec;
use core::mem::size_of;

use fdpio::prelude::*;
use zerocopy::IntoBytes;

use crate::config::FdpConfig;
use crate::constants::*;
use crate::errors::*;
use crate::pool::LinePool;

/// Size of the configurations page for `nruh` RU handles.
pub fn config_log_size(nruh: u16) -> usize {
    size_of::<FdpConfigLogHeader>() + config_desc_size(nruh)
}

fn config_desc_size(nruh: u16) -> usize {
    size_of::<FdpConfigDesc>() + nruh as usize * size_of::<RuhDesc>()
}

/// FDP configurations page (one configuration).
pub fn config_log(cfg: &FdpConfig, pool: &LinePool) -> Vec<u8> {
    let total = config_log_size(cfg.nruh());
    let mut out = Vec::with_capacity(total);

    let header = FdpConfigLogHeader {
        num_configs: 1u16.to_le(),
        version: FDP_CONFIG_LOG_VERSION,
        rsvd3: 0,
        size: (total as u32).to_le(),
        rsvd8: [0; 8],
    };
    out.extend_from_slice(header.as_bytes());

    let runs = pool.pages_per_line() as u64 * cfg.page_size() as u64;
    let desc = FdpConfigDesc {
        dsze: (config_desc_size(cfg.nruh()) as u16).to_le(),
        fdpa: cfg.fdpa().bits(),
        vss: 0,
        nrg: (cfg.nrg() as u32).to_le(),
        nruh: cfg.nruh().to_le(),
        maxpids: (MAX_PLACEMENT_HANDLES as u16).to_le(),
        nnss: 0,
        runs: runs.to_le(),
        erutl: 0,
        rsvd28: [0; 36],
    };
    out.extend_from_slice(desc.as_bytes());

    for ruhid in 0..cfg.nruh() {
        let ruh = RuhDesc {
            ruht: RUHT_INITIALLY_ISOLATED,
            rsvd1: 0,
            ruhid: ruhid.to_le(),
        };
        out.extend_from_slice(ruh.as_bytes());
    }
    out
}

/// FDP statistics page. RUs past the slot count are not reported.
pub fn stats_log(cfg: &FdpConfig, pool: &LinePool) -> FdpStatsLog {
    let mut log = FdpStatsLog::zeroed();
    for (i, ru) in cfg.rus().iter().take(STATS_SLOTS).enumerate() {
        log.host_bytes_written[i] = ru.host_bytes_written().to_le();
        log.media_bytes_written[i] = ru.media_bytes_written().to_le();
        log.host_write_cmds[i] = ru.host_write_cmds().to_le();
        log.host_read_cmds[i] = 0;
        log.media_wear_index[i] = pool.wear_of(ru.id()).to_le();
    }
    log
}

pub fn events_log() -> FdpEventsLog {
    FdpEventsLog::empty()
}

/// RU handle status payload: one descriptor per reclaim unit.
pub fn ruh_status(cfg: &FdpConfig) -> Vec<u8> {
    let rus = cfg.rus();
    let mut out = Vec::with_capacity(
        size_of::<RuhStatusHeader>() + rus.len() * size_of::<RuhStatusDesc>(),
    );
    let header = RuhStatusHeader {
        rsvd: [0; 14],
        nruhsd: (rus.len() as u16).to_le(),
    };
    out.extend_from_slice(header.as_bytes());

    for ru in rus {
        let desc = RuhStatusDesc {
            pid: cfg.placement_id(ru).to_le(),
            ruhid: ru.ruhid().to_le(),
            earutr: 0,
            ruamw: ru.remaining_bytes().to_le(),
            rsvd: [0; 16],
        };
        out.extend_from_slice(desc.as_bytes());
    }
    out
}

/// Copies the leading `min(requested, page.len())` bytes of `page` to the
/// host, refusing requests shorter than `min_len`.
pub fn serve<IO: HostIO + ?Sized>(
    io: &mut IO,
    page: &[u8],
    min_len: u32,
    requested: u64,
) -> FdpResult<usize> {
    if requested < min_len as u64 {
        return Err(FdpError::BufferTooSmall {
            need: min_len,
            got: requested as u32,
        });
    }
    Ok(io.transfer(page, requested)?)
}
