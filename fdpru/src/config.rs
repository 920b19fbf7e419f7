// SPDX-License-Identifier: MIT

use alloc::vec::Vec;

use bitflags::bitflags;

use crate::clock::Clock;
use crate::constants::*;
use crate::distribute::Distribution;
use crate::errors::*;
use crate::geometry::Geometry;
use crate::pool::LinePool;
use crate::ru::{ReclaimUnit, RuId};

bitflags! {
    /// FDP attributes byte of the configuration descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FdpAttributes: u8 {
        /// RU handles are initially isolated.
        const INITIALLY_ISOLATED = 1 << 0;
        /// Volatile write cache present.
        const VWC                = 1 << 4;
        const VALID              = 1 << 7;
    }
}

/// Construction parameters of an FDP configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdpParams {
    pub num_rgs: u16,
    pub num_ruhs: u16,
    pub fdpa: FdpAttributes,
}

impl Default for FdpParams {
    fn default() -> Self {
        Self {
            num_rgs: 1,
            num_ruhs: DEFAULT_RUHS,
            fdpa: FdpAttributes::INITIALLY_ISOLATED,
        }
    }
}

/// Placement tag of a write: reclaim group plus placement handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    pub rg: u16,
    pub ph: u16,
}

impl Placement {
    pub const fn new(rg: u16, ph: u16) -> Self {
        Self { rg, ph }
    }

    pub const fn handle(ph: u16) -> Self {
        Self { rg: 0, ph }
    }
}

#[derive(Debug, Clone)]
pub struct ReclaimGroup {
    pub(crate) rgid: u16,
    pub(crate) rus: Vec<RuId>,
    pub(crate) rgslbs: u64,
}

impl ReclaimGroup {
    pub fn rgid(&self) -> u16 {
        self.rgid
    }
    /// RU of each handle, indexed by RU handle id.
    pub fn rus(&self) -> &[RuId] {
        &self.rus
    }
    /// Logical blocks backing the group.
    pub fn rgslbs(&self) -> u64 {
        self.rgslbs
    }
}

/// Device-wide accumulators. They survive disable/enable cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FdpTotals {
    pub host_bytes_written: u64,
    pub media_bytes_written: u64,
    pub host_write_cmds: u64,
    pub ru_switches: u64,
}

#[derive(Debug, Clone)]
pub struct FdpConfig {
    pub(crate) enabled: bool,
    pub(crate) fdpa: FdpAttributes,
    pub(crate) rgif: u8,
    pub(crate) nruh: u16,
    pub(crate) page_size: u32,
    pub(crate) rgs: Vec<ReclaimGroup>,
    pub(crate) rus: Vec<ReclaimUnit>,
    pub(crate) ph_map: [Option<u16>; MAX_PLACEMENT_HANDLES],
    pub(crate) totals: FdpTotals,
    pub(crate) last_ru: Option<RuId>,
}

impl FdpConfig {
    /// Builds `num_rgs * num_ruhs` reclaim units and the handle map.
    ///
    /// Handles `0..num_ruhs` map one-to-one onto RU handles; every other
    /// handle maps to RU handle 0. FDP starts disabled.
    pub fn initialize(geometry: &Geometry, params: FdpParams) -> FdpResult<Self> {
        geometry.validate()?;
        if params.num_rgs == 0 {
            return Err(FdpError::InvalidParams("at least one reclaim group is required"));
        }
        if params.num_ruhs == 0 {
            return Err(FdpError::InvalidParams("at least one RU handle is required"));
        }
        if params.num_ruhs as usize > MAX_PLACEMENT_HANDLES {
            return Err(FdpError::TooManyHandles(params.num_ruhs));
        }
        let total_rus = params.num_rgs as u32 * params.num_ruhs as u32;
        if total_rus > u16::MAX as u32 {
            return Err(FdpError::InvalidParams("too many reclaim units"));
        }

        let capacity = geometry.capacity_bytes() / total_rus as u64;
        let rgslbs = geometry.total_lbas() / params.num_rgs as u64;

        let mut rgs = Vec::with_capacity(params.num_rgs as usize);
        let mut rus = Vec::with_capacity(total_rus as usize);
        for rgid in 0..params.num_rgs {
            let mut ids = Vec::with_capacity(params.num_ruhs as usize);
            for ruhid in 0..params.num_ruhs {
                let ruid = RuId(rus.len() as u16);
                rus.push(ReclaimUnit::new(ruid, rgid, ruhid, capacity));
                ids.push(ruid);
            }
            rgs.push(ReclaimGroup {
                rgid,
                rus: ids,
                rgslbs,
            });
        }

        let mut ph_map = [Some(0u16); MAX_PLACEMENT_HANDLES];
        for (ph, slot) in ph_map.iter_mut().enumerate().take(params.num_ruhs as usize) {
            *slot = Some(ph as u16);
        }

        log::info!(
            "[fdp] initialized: {} RG(s) x {} RUH(s), {} bytes per RU",
            params.num_rgs,
            params.num_ruhs,
            capacity
        );

        Ok(Self {
            enabled: false,
            fdpa: params.fdpa,
            rgif: rgif_for(params.num_rgs),
            nruh: params.num_ruhs,
            page_size: geometry.page_size,
            rgs,
            rus,
            ph_map,
            totals: FdpTotals::default(),
            last_ru: None,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
    pub fn fdpa(&self) -> FdpAttributes {
        self.fdpa
    }
    /// Bits of the placement identifier that select the reclaim group.
    pub fn rgif(&self) -> u8 {
        self.rgif
    }
    pub fn nrg(&self) -> u16 {
        self.rgs.len() as u16
    }
    pub fn nruh(&self) -> u16 {
        self.nruh
    }
    pub fn page_size(&self) -> u32 {
        self.page_size
    }
    pub fn rgs(&self) -> &[ReclaimGroup] {
        &self.rgs
    }
    pub fn rus(&self) -> &[ReclaimUnit] {
        &self.rus
    }
    pub fn ru(&self, id: RuId) -> Option<&ReclaimUnit> {
        self.rus.get(id.index())
    }
    pub fn totals(&self) -> FdpTotals {
        self.totals
    }
    pub fn ruh_of(&self, ph: u16) -> Option<u16> {
        self.ph_map.get(ph as usize).copied().flatten()
    }

    /// Maps a placement tag onto its reclaim unit.
    pub fn resolve(&self, placement: Placement) -> FdpResult<RuId> {
        let rg = self
            .rgs
            .get(placement.rg as usize)
            .ok_or(FdpError::InvalidReclaimGroup(placement.rg))?;
        let ruhid = self
            .ruh_of(placement.ph)
            .ok_or(FdpError::InvalidPlacement(placement.ph))?;
        rg.rus
            .get(ruhid as usize)
            .copied()
            .ok_or(FdpError::InvalidPlacement(placement.ph))
    }

    /// Splits a directive-specific value into reclaim group and handle.
    pub fn decode_placement(&self, dspec: u16) -> Placement {
        if self.rgif == 0 {
            return Placement::handle(dspec);
        }
        let ph_bits = 16 - self.rgif as u32;
        Placement {
            rg: dspec >> ph_bits,
            ph: dspec & ((1u16 << ph_bits) - 1),
        }
    }

    /// Placement identifier that routes to `ru`: reclaim group in the top
    /// `rgif` bits, RU handle below.
    pub fn placement_id(&self, ru: &ReclaimUnit) -> u16 {
        if self.rgif == 0 {
            return ru.ruhid();
        }
        (ru.rgid() << (16 - self.rgif as u32)) | ru.ruhid()
    }

    /// Turns FDP on and distributes the global free lines.
    ///
    /// Returns `None` when FDP was already enabled. On failure FDP stays
    /// disabled and the pool is untouched.
    pub fn enable(
        &mut self,
        pool: &mut LinePool,
        clock: &dyn Clock,
    ) -> FdpResult<Option<Distribution>> {
        if self.enabled {
            return Ok(None);
        }
        let dist = self.distribute(pool, clock.now_ns())?;
        self.enabled = true;
        log::info!(
            "[fdp] enabled: {} RU(s), {} line(s) distributed",
            self.rus.len(),
            dist.lines_distributed()
        );
        Ok(Some(dist))
    }

    /// Turns FDP off, handing every RU-owned line back to the global pool.
    ///
    /// Per-RU statistics are cleared; device totals are kept. Returns
    /// `false` when FDP was already disabled.
    pub fn disable(&mut self, pool: &mut LinePool) -> bool {
        if !self.enabled {
            return false;
        }
        pool.close_domains();
        for ru in self.rus.iter_mut() {
            ru.reset();
        }
        self.last_ru = None;
        self.enabled = false;
        log::info!("[fdp] disabled: {} free line(s) in global pool", pool.global_free());
        true
    }
}

/// Number of placement identifier bits needed to address `nrg` groups.
fn rgif_for(nrg: u16) -> u8 {
    if nrg <= 1 {
        0
    } else {
        (16 - (nrg - 1).leading_zeros()) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(nrg: u16, nruh: u16) -> FdpConfig {
        let params = FdpParams {
            num_rgs: nrg,
            num_ruhs: nruh,
            ..FdpParams::default()
        };
        FdpConfig::initialize(&Geometry::new(4096, 16, 64), params).unwrap()
    }

    #[test]
    fn builds_units_per_group() {
        let c = cfg(2, 3);
        assert!(!c.is_enabled());
        assert_eq!(c.rus().len(), 6);
        assert_eq!(c.nrg(), 2);
        assert_eq!(c.rgs()[1].rus(), &[RuId(3), RuId(4), RuId(5)]);
        assert_eq!(c.ru(RuId(4)).unwrap().ruhid(), 1);
        assert_eq!(c.ru(RuId(4)).unwrap().rgid(), 1);
        let total = 4096u64 * 16 * 64;
        assert_eq!(c.ru(RuId(0)).unwrap().capacity(), total / 6);
        assert_eq!(c.rgs()[0].rgslbs(), total / 512 / 2);
    }

    #[test]
    fn handle_map_identity_then_zero() {
        let c = cfg(1, 4);
        assert_eq!(c.resolve(Placement::handle(3)), Ok(RuId(3)));
        assert_eq!(c.resolve(Placement::handle(4)), Ok(RuId(0)));
        assert_eq!(c.resolve(Placement::handle(127)), Ok(RuId(0)));
        assert_eq!(
            c.resolve(Placement::handle(128)),
            Err(FdpError::InvalidPlacement(128))
        );
        assert_eq!(
            c.resolve(Placement::new(1, 0)),
            Err(FdpError::InvalidReclaimGroup(1))
        );
    }

    #[test]
    fn rejects_bad_params() {
        let g = Geometry::default();
        let mut p = FdpParams::default();
        p.num_ruhs = 0;
        assert!(FdpConfig::initialize(&g, p).is_err());
        p.num_ruhs = 129;
        assert_eq!(
            FdpConfig::initialize(&g, p).unwrap_err(),
            FdpError::TooManyHandles(129)
        );
        p.num_ruhs = 4;
        p.num_rgs = 0;
        assert!(FdpConfig::initialize(&g, p).is_err());
    }

    #[test]
    fn dspec_decoding() {
        assert_eq!(rgif_for(1), 0);
        assert_eq!(rgif_for(2), 1);
        assert_eq!(rgif_for(4), 2);
        assert_eq!(rgif_for(5), 3);

        let single = cfg(1, 4);
        assert_eq!(single.decode_placement(0x0002), Placement::handle(2));

        let multi = cfg(4, 2);
        assert_eq!(multi.rgif(), 2);
        assert_eq!(multi.decode_placement(0xC001), Placement::new(3, 1));
        assert_eq!(multi.resolve(Placement::new(3, 1)), Ok(RuId(7)));
    }
}
