// SPDX-License-Identifier: MIT

use anyhow::Context;
use fdpru::prelude::*;

use crate::report::RuTable;
use crate::scenario::{Scenario, Step};
use crate::utils::{LogLevel, log_level, write_progress};
use crate::{log_info, log_verbose};

/// Outcome counters of one scenario run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub steps: usize,
    pub commands: u64,
    pub rejected: u64,
    pub reclaimed: usize,
}

/// Drives an emulated device through the steps of a scenario.
pub struct Runner {
    dev: FdpDevice,
    stats: RunStats,
}

impl Runner {
    pub fn new(scenario: &Scenario) -> anyhow::Result<Self> {
        Self::with_device(scenario, FdpDevice::new)
    }

    /// Builds the device through `make`, so tests can supply their own clock.
    pub fn with_device<F>(scenario: &Scenario, make: F) -> anyhow::Result<Self>
    where
        F: FnOnce(Geometry, FdpParams) -> FdpResult<FdpDevice>,
    {
        scenario.validate()?;
        let mut dev = make(scenario.geometry()?, scenario.params())?;
        if scenario.fdp.trace {
            dev.flip(FLIP_ENABLE_LOG);
        }
        if scenario.fdp.enabled {
            enable(&mut dev)?;
        }
        Ok(Self {
            dev,
            stats: RunStats::default(),
        })
    }

    pub fn device(&self) -> &FdpDevice {
        &self.dev
    }

    pub fn run(&mut self, steps: &[Step]) -> anyhow::Result<RunStats> {
        for (i, step) in steps.iter().enumerate() {
            log_verbose!("step {i}: {step}");
            self.step(step).with_context(|| format!("step {i} ({})", step.name()))?;
            self.stats.steps += 1;
        }
        Ok(self.stats)
    }

    pub fn step(&mut self, step: &Step) -> anyhow::Result<()> {
        match *step {
            Step::Write {
                rg,
                ph,
                size,
                count,
                slba,
            } => self.write(rg, ph, size.bytes(), count, slba)?,
            Step::Read { slba, size } => {
                let nlb = self.blocks(size.bytes())?;
                self.dev.read(slba, nlb);
                self.stats.commands += 1;
            }
            Step::Enable => enable(&mut self.dev)?,
            Step::Disable => {
                if self.dev.disable_fdp() {
                    log_info!("FDP disabled, {} line(s) back in the global pool", self.dev.pool().global_free());
                }
            }
            Step::Gc { budget } => {
                let out = self.dev.gc(budget.unwrap_or(usize::MAX))?;
                let owned = out.iter().filter(|r| r.owner.is_some()).count();
                log_info!("gc reclaimed {} line(s), {owned} back to their RU", out.len());
                self.stats.reclaimed += out.len();
            }
            Step::Reclaim { ru } => {
                let n = self.dev.reclaim_ru(RuId(ru))?;
                log_info!("{} reclaimed {n} line(s)", RuId(ru));
                self.stats.reclaimed += n;
            }
            Step::Flip { code } => {
                let st = self.dev.flip(code);
                if !st.is_success() {
                    anyhow::bail!("toggle {code} failed with status {st}");
                }
            }
            Step::ResetAcct => {
                self.dev.flip(FLIP_RESET_ACCT);
            }
            Step::Check => {
                let rep = self.dev.check_all();
                log_verbose!("{rep}");
                if rep.has_error() {
                    anyhow::bail!("consistency check failed:\n{rep}");
                }
                log_info!("consistency check passed ({} warning(s))", rep.count(Severity::Warn));
            }
            Step::Report => {
                if log_level() != LogLevel::Quiet {
                    print!("{}", RuTable(&self.dev));
                }
            }
        }
        Ok(())
    }

    fn blocks(&self, bytes: u64) -> anyhow::Result<u16> {
        let lba = self.dev.geometry().lba_size as u64;
        let blocks = (bytes / lba).checked_sub(1).context("empty transfer")?;
        u16::try_from(blocks).context("write too large for one command")
    }

    fn write(&mut self, rg: u16, ph: Option<u16>, bytes: u64, count: u32, slba: u64) -> anyhow::Result<()> {
        let nlb = self.blocks(bytes)?;
        let cmd = match ph {
            Some(ph) => WriteCmd::placed(slba, nlb, dspec(self.dev.fdp().rgif(), rg, ph)),
            None => WriteCmd::plain(slba, nlb),
        };
        let (cdw12, cdw13) = cmd.to_dwords();
        let pb = write_progress(count as u64, "writing")?;

        let mut rejected = 0u64;
        let mut last = Status::SUCCESS;
        for n in 0..count as u64 {
            let c = self.dev.submit_write(slba + n * (nlb as u64 + 1), cdw12, cdw13);
            if !c.is_ok() {
                rejected += 1;
                last = c.status;
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.stats.commands += count as u64;
        self.stats.rejected += rejected;
        if rejected > 0 {
            log::warn!("{rejected} of {count} write(s) rejected, last status {last}");
        }
        Ok(())
    }
}

/// DSPEC with the reclaim group in the top `rgif` bits.
pub fn dspec(rgif: u8, rg: u16, ph: u16) -> u16 {
    if rgif == 0 {
        ph
    } else {
        (rg << (16 - rgif as u32)) | ph
    }
}

fn enable(dev: &mut FdpDevice) -> anyhow::Result<()> {
    if let Some(dist) = dev.enable_fdp()? {
        log_info!(
            "FDP enabled, {} line(s) distributed: {:?}",
            dist.lines_distributed(),
            dist.per_ru
        );
    }
    Ok(())
}
