// SPDX-License-Identifier: MIT

use colored::Colorize;
use fdpru::prelude::*;

use crate::utils::pretty_bytes;

/// Per-RU state table of a device.
pub struct RuTable<'a>(pub &'a FdpDevice);

impl core::fmt::Display for RuTable<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let dev = self.0;
        let fdp = dev.fdp();
        let pool = dev.pool();

        writeln!(
            f,
            "\n  ┌──────┬────┬─────┬────────┬──────────┬──────┬──────┬────────────┬────────┬────────────┐"
        )?;
        writeln!(
            f,
            "  | RU   | RG | RUH | State  | Line     | Page | Free | Written    | Cmds   | Remaining  |"
        )?;
        writeln!(
            f,
            "  ├──────┼────┼─────┼────────┼──────────┼──────┼──────┼────────────┼────────┼────────────┤"
        )?;
        for ru in fdp.rus() {
            let wp = ru.write_pointer();
            let line = wp.line.map_or_else(|| "-".to_string(), |l| l.0.to_string());
            let state = format!("{:<6}", ru.state().to_string());
            let state = match ru.state() {
                RuState::Open => state.green(),
                RuState::Full => state.red(),
                RuState::Unused => state.dimmed(),
            };
            writeln!(
                f,
                "  | {id:<4} | {rg:<2} | {ruh:<3} | {state} | {line:>8} | {page:>4} | {free:>4} | {w:>10} | {cmds:>6} | {rem:>10} |",
                id = ru.id().0,
                rg = ru.rgid(),
                ruh = ru.ruhid(),
                page = wp.page,
                free = pool.free_count(Some(ru.id())),
                w = pretty_bytes(ru.host_bytes_written()),
                cmds = ru.host_write_cmds(),
                rem = pretty_bytes(ru.remaining_bytes()),
            )?;
        }
        writeln!(
            f,
            "  └──────┴────┴─────┴────────┴──────────┴──────┴──────┴────────────┴────────┴────────────┘"
        )?;

        let totals = fdp.totals();
        let acct = dev.accounting();
        let gc = dev.gc_stats();
        writeln!(
            f,
            "  FDP {}  lines: {} global free, {} open, {} full  switches: {}",
            if fdp.is_enabled() { "on".green() } else { "off".yellow() },
            pool.global_free(),
            pool.count_state(LineState::Open),
            pool.count_state(LineState::Full),
            totals.ru_switches,
        )?;
        writeln!(
            f,
            "  host: {} in {} cmd(s)  default path: {}  rejected: {}  gc: {} pass(es), {} line(s)",
            pretty_bytes(totals.host_bytes_written),
            totals.host_write_cmds,
            pretty_bytes(dev.default_path().host_bytes_written()),
            acct.rejected,
            gc.passes,
            gc.lines_reclaimed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_row_per_ru() {
        colored::control::set_override(false);
        let mut dev = FdpDevice::with_clock(
            Geometry::new(4096, 4, 16),
            FdpParams::default(),
            Box::new(ManualClock::default()),
        )
        .unwrap();
        dev.enable_fdp().unwrap();
        dev.write(WriteCmd::placed(0, 15, 2)).unwrap();

        let out = RuTable(&dev).to_string();
        let rows: Vec<&str> = out.lines().filter(|l| l.starts_with("  | ") && !l.contains("RUH")).collect();
        assert_eq!(rows.len(), 4);
        assert!(rows[2].contains("8.0 KiB"));
        assert!(out.contains("FDP on"));
    }
}
