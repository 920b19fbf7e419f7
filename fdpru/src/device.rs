// SPDX-License-Identifier: MIT

use alloc::boxed::Box;
use alloc::vec::Vec;

use bitflags::bitflags;
use fdpio::prelude::*;
use zerocopy::IntoBytes;

use crate::clock::Clock;
use crate::commands::*;
use crate::config::{FdpConfig, FdpParams};
use crate::constants::*;
use crate::default_path::DefaultWritePath;
use crate::distribute::Distribution;
use crate::errors::*;
use crate::geometry::Geometry;
use crate::pool::LinePool;
use crate::reclaim::{Collector, GcStats, Reclaimed};
use crate::router::WriteReport;
use crate::ru::RuId;
use crate::telemetry;

bitflags! {
    /// Optional NVM command support bits advertised by the controller.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Oncs: u16 {
        const FDP = 1 << 9;
    }
}

bitflags! {
    /// Optional admin command support bits advertised by the controller.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Oacs: u16 {
        const DIRECTIVES = 1 << 5;
    }
}

/// FDP feature fields reported through Get Features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Features {
    pub fdp_mode: bool,
    pub fdp_events: bool,
}

/// IO accounting, cleared by the reset-accounting toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accounting {
    pub writes: u64,
    pub bytes_written: u64,
    pub reads: u64,
    pub rejected: u64,
    pub foreground_gc: u64,
}

/// Outcome of a command submitted through the dword interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub status: Status,
    /// Bytes moved to the host buffer.
    pub transferred: usize,
}

impl Completion {
    pub fn ok(transferred: usize) -> Self {
        Self {
            status: Status::SUCCESS,
            transferred,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }
}

impl From<FdpError> for Completion {
    fn from(e: FdpError) -> Self {
        Self {
            status: e.status(),
            transferred: 0,
        }
    }
}

impl From<Status> for Completion {
    fn from(status: Status) -> Self {
        Self {
            status,
            transferred: 0,
        }
    }
}

fn complete(res: FdpResult<usize>) -> Completion {
    match res {
        Ok(n) => Completion::ok(n),
        Err(e) => e.into(),
    }
}

/// Emulated controller front end for the FDP subsystem.
pub struct FdpDevice {
    geometry: Geometry,
    pool: LinePool,
    fdp: FdpConfig,
    default_path: DefaultWritePath,
    collector: Collector,
    oncs: Oncs,
    oacs: Oacs,
    features: Features,
    acct: Accounting,
    print_log: bool,
    clock: Box<dyn Clock>,
}

impl core::fmt::Debug for FdpDevice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FdpDevice")
            .field("geometry", &self.geometry)
            .field("enabled", &self.fdp.is_enabled())
            .field("oncs", &self.oncs)
            .field("oacs", &self.oacs)
            .field("acct", &self.acct)
            .finish_non_exhaustive()
    }
}

impl FdpDevice {
    #[cfg(feature = "std")]
    pub fn new(geometry: Geometry, params: FdpParams) -> FdpResult<Self> {
        Self::with_clock(geometry, params, Box::new(crate::clock::SystemClock))
    }

    pub fn with_clock(geometry: Geometry, params: FdpParams, clock: Box<dyn Clock>) -> FdpResult<Self> {
        let fdp = FdpConfig::initialize(&geometry, params)?;
        Ok(Self {
            pool: LinePool::new(geometry.lines, geometry.pages_per_line),
            geometry,
            fdp,
            default_path: DefaultWritePath::new(),
            collector: Collector::default(),
            oncs: Oncs::empty(),
            oacs: Oacs::empty(),
            features: Features::default(),
            acct: Accounting::default(),
            print_log: false,
            clock,
        })
    }

    /// Replaces the victim policy used by the collector.
    pub fn set_collector(&mut self, collector: Collector) {
        self.collector = collector;
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }
    pub fn pool(&self) -> &LinePool {
        &self.pool
    }
    pub fn fdp(&self) -> &FdpConfig {
        &self.fdp
    }
    pub fn default_path(&self) -> &DefaultWritePath {
        &self.default_path
    }
    pub fn gc_stats(&self) -> GcStats {
        self.collector.stats()
    }
    pub fn oncs(&self) -> Oncs {
        self.oncs
    }
    pub fn oacs(&self) -> Oacs {
        self.oacs
    }
    pub fn features(&self) -> Features {
        self.features
    }
    pub fn accounting(&self) -> Accounting {
        self.acct
    }
    pub fn print_log(&self) -> bool {
        self.print_log
    }

    // ---------------------------------------------------------------
    // Admin toggle
    // ---------------------------------------------------------------

    /// Handles the admin toggle command (CDW10 carries the code).
    pub fn flip(&mut self, cdw10: u64) -> Status {
        let Some(code) = FlipCode::from_cdw10(cdw10) else {
            log::warn!("[fdp] unknown toggle code {cdw10}");
            return FdpError::InvalidParams("unknown toggle code").status();
        };
        match self.apply_flip(code) {
            Ok(()) => Status::SUCCESS,
            Err(e) => e.status(),
        }
    }

    pub fn apply_flip(&mut self, code: FlipCode) -> FdpResult {
        match code {
            FlipCode::ResetAcct => {
                self.acct = Accounting::default();
                log::info!("[fdp] IO accounting reset");
            }
            FlipCode::EnableLog => self.print_log = true,
            FlipCode::DisableLog => self.print_log = false,
            FlipCode::EnableFdp => {
                self.enable_fdp()?;
            }
            FlipCode::DisableFdp => {
                self.disable_fdp();
            }
        }
        Ok(())
    }

    /// Enables FDP, distributing every free line across the RUs.
    ///
    /// The default path gives up its current line first so that it joins the
    /// distribution. Returns `None` if FDP was already on.
    pub fn enable_fdp(&mut self) -> FdpResult<Option<Distribution>> {
        if self.fdp.is_enabled() {
            return Ok(None);
        }
        self.default_path.close(&mut self.pool)?;
        match self.fdp.enable(&mut self.pool, self.clock.as_ref()) {
            Ok(dist) => {
                self.oncs |= Oncs::FDP;
                self.oacs |= Oacs::DIRECTIVES;
                self.features = Features {
                    fdp_mode: true,
                    fdp_events: true,
                };
                Ok(dist)
            }
            Err(e) => {
                log::warn!("[fdp] enable failed: {e}");
                self.disable_fdp();
                Err(e)
            }
        }
    }

    pub fn disable_fdp(&mut self) -> bool {
        let changed = self.fdp.disable(&mut self.pool);
        self.oncs.remove(Oncs::FDP);
        self.oacs.remove(Oacs::DIRECTIVES);
        self.features = Features::default();
        changed
    }

    // ---------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------

    /// Admin queue entry point for the commands this subsystem owns.
    pub fn submit_admin<IO: HostIO + ?Sized>(
        &mut self,
        io: &mut IO,
        opc: u8,
        cdw10: u32,
        cdw11: u32,
    ) -> Completion {
        match opc {
            OPC_ADMIN_GET_LOG_PAGE => self.get_log(io, cdw10, cdw11),
            OPC_ADMIN_FLIP => Completion::from(self.flip(cdw10 as u64)),
            _ => FdpError::InvalidOpcode(opc).into(),
        }
    }

    /// NVM queue entry point. `cdw` is CDW10..=CDW13; for reads and writes
    /// CDW10/11 hold the starting LBA.
    pub fn submit_io<IO: HostIO + ?Sized>(&mut self, io: &mut IO, opc: u8, cdw: [u32; 4]) -> Completion {
        let slba = cdw[0] as u64 | ((cdw[1] as u64) << 32);
        match opc {
            OPC_WRITE => self.submit_write(slba, cdw[2], cdw[3]),
            OPC_READ => self.read(slba, (cdw[2] & 0xffff) as u16),
            OPC_IO_MGMT_RECV => self.io_mgmt_recv(io, cdw[0], cdw[1]),
            OPC_IO_MGMT_SEND => Completion::from(self.io_mgmt_send()),
            _ => {
                log::warn!("[fdp] unsupported opcode 0x{opc:02x}");
                FdpError::InvalidOpcode(opc).into()
            }
        }
    }

    // ---------------------------------------------------------------
    // IO path
    // ---------------------------------------------------------------

    /// Write command from raw dwords.
    pub fn submit_write(&mut self, slba: u64, cdw12: u32, cdw13: u32) -> Completion {
        let cmd = WriteCmd::from_dwords(slba, cdw12, cdw13);
        complete(self.write(cmd).map(|_| 0))
    }

    /// Executes a write.
    ///
    /// Placed writes go to their RU while FDP is on; anything else takes the
    /// default path. On exhaustion the device reclaims lines of the same
    /// domain and retries once. A placed write that would not fit even after
    /// that reclaim is rejected without erasing anything.
    pub fn write(&mut self, cmd: WriteCmd) -> FdpResult<WriteReport> {
        let byte_len = cmd.byte_len(self.geometry.lba_size);
        let res = if self.fdp.is_enabled() && cmd.has_placement() {
            let placement = self.fdp.decode_placement(cmd.dspec);
            let now = self.clock.now_ns();
            match self.fdp.route_write(&mut self.pool, placement, cmd.slba, byte_len, now) {
                Err(FdpError::RuExhausted(ru)) if self.reclaim_would_fit(ru, byte_len) => {
                    self.acct.foreground_gc += 1;
                    self.reclaim_ru(ru)?;
                    self.fdp
                        .route_write(&mut self.pool, placement, cmd.slba, byte_len, now)
                }
                other => other,
            }
        } else {
            let page_size = self.geometry.page_size;
            match self.default_path.write(&mut self.pool, page_size, cmd.slba, byte_len) {
                Err(FdpError::GlobalExhausted) => {
                    self.acct.foreground_gc += 1;
                    self.collector
                        .collect(&mut self.pool, usize::MAX, |l| l.owner().is_none())?;
                    self.default_path
                        .write(&mut self.pool, page_size, cmd.slba, byte_len)
                }
                other => other,
            }
        };

        match &res {
            Ok(rep) => {
                self.acct.writes += 1;
                self.acct.bytes_written += byte_len;
                if self.print_log {
                    log::trace!(
                        "[fdp] write slba={} len={} ru={:?} lines={:?}",
                        cmd.slba,
                        byte_len,
                        rep.ru,
                        rep.lines
                    );
                }
            }
            Err(e) => {
                self.acct.rejected += 1;
                if self.print_log {
                    log::trace!("[fdp] write slba={} rejected: {e}", cmd.slba);
                }
            }
        }
        res
    }

    /// Read command: accounting only, the placement layer holds no data.
    pub fn read(&mut self, _slba: u64, nlb: u16) -> Completion {
        self.acct.reads += 1;
        if self.print_log {
            log::trace!("[fdp] read nlb={nlb}");
        }
        Completion::ok(0)
    }

    /// IO Management Send: no send operation is supported.
    pub fn io_mgmt_send(&self) -> Status {
        if !self.fdp.is_enabled() {
            return FdpError::Disabled.status();
        }
        FdpError::InvalidOpcode(OPC_IO_MGMT_SEND).status()
    }

    /// IO Management Receive from raw dwords.
    pub fn io_mgmt_recv<IO: HostIO + ?Sized>(&self, io: &mut IO, cdw10: u32, cdw11: u32) -> Completion {
        complete(self.ruh_status_into(io, MgmtRequest::from_dwords(cdw10, cdw11)))
    }

    pub fn ruh_status_into<IO: HostIO + ?Sized>(&self, io: &mut IO, req: MgmtRequest) -> FdpResult<usize> {
        if !self.fdp.is_enabled() {
            return Err(FdpError::Disabled);
        }
        if req.mo != MO_RUH_STATUS {
            return Err(FdpError::UnsupportedOperation(req.mo));
        }
        let page = telemetry::ruh_status(&self.fdp);
        telemetry::serve(io, &page, core::mem::size_of::<telemetry::RuhStatusHeader>() as u32, req.len)
    }

    // ---------------------------------------------------------------
    // Log pages
    // ---------------------------------------------------------------

    /// Get Log Page from raw dwords.
    pub fn get_log<IO: HostIO + ?Sized>(&self, io: &mut IO, cdw10: u32, cdw11: u32) -> Completion {
        complete(self.read_log(io, LogRequest::from_dwords(cdw10, cdw11)))
    }

    pub fn read_log<IO: HostIO + ?Sized>(&self, io: &mut IO, req: LogRequest) -> FdpResult<usize> {
        let id = req.log_id().ok_or(FdpError::InvalidLogId(req.lid))?;
        if !self.fdp.is_enabled() {
            return Err(FdpError::Disabled);
        }
        let page = self.log_page(id);
        if self.print_log {
            log::trace!("[fdp] get log {id}: {} of {} byte(s)", req.len, page.len());
        }
        telemetry::serve(io, &page, id.min_len(), req.len)
    }

    /// Full serialized log page.
    pub fn log_page(&self, id: LogId) -> Vec<u8> {
        match id {
            LogId::FdpConfigs => telemetry::config_log(&self.fdp, &self.pool),
            LogId::FdpStats => telemetry::stats_log(&self.fdp, &self.pool).as_bytes().to_vec(),
            LogId::FdpEvents => telemetry::events_log().as_bytes().to_vec(),
        }
    }

    pub fn ruh_status_page(&self) -> Vec<u8> {
        telemetry::ruh_status(&self.fdp)
    }

    // ---------------------------------------------------------------
    // Garbage collection
    // ---------------------------------------------------------------

    /// Background collection of up to `budget` written lines.
    pub fn gc(&mut self, budget: usize) -> FdpResult<Vec<Reclaimed>> {
        let out = self.collector.collect(&mut self.pool, budget, |_| true)?;
        self.rearm_after(&out);
        Ok(out)
    }

    /// Reclaims every written line owned by `ru`. Returns how many.
    pub fn reclaim_ru(&mut self, ru: RuId) -> FdpResult<usize> {
        let out = self
            .collector
            .collect(&mut self.pool, usize::MAX, |l| l.owner() == Some(ru))?;
        self.rearm_after(&out);
        Ok(out.len())
    }

    fn reclaim_would_fit(&self, ru: RuId, byte_len: u64) -> bool {
        let pages = byte_len / self.geometry.page_size as u64;
        let reclaimable = self.fdp.reclaimable_pages(&self.pool, ru);
        reclaimable > 0 && pages <= self.fdp.available_pages(&self.pool, ru) + reclaimable
    }

    fn rearm_after(&mut self, reclaimed: &[Reclaimed]) {
        let now = self.clock.now_ns();
        for r in reclaimed {
            if let Some(ru) = r.owner {
                self.fdp.rearm(&mut self.pool, ru, now);
            }
        }
    }
}
