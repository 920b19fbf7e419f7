// SPDX-License-Identifier: MIT

mod dump;
mod report;
mod runner;
mod scenario;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use time::OffsetDateTime;

use crate::dump::Page;
use crate::report::RuTable;
use crate::runner::Runner;
use crate::scenario::Scenario;
use crate::utils::{LogLevel, hex_rows, init_logger, pretty_bytes};

#[derive(Parser)]
#[command(name = "fdpctl", version, about = "FDP reclaim unit emulator driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and print the reclaim unit table
    Run {
        /// Scenario path
        #[arg(short, long, default_value = "scenarios/basic.toml")]
        scenario: PathBuf,

        /// Print every step and device trace
        #[arg(short, long, conflicts_with = "quiet")]
        verbose: bool,

        /// Only print warnings and the final table
        #[arg(short, long)]
        quiet: bool,
    },
    /// Run a scenario, then fetch one FDP page from the device
    Dump {
        /// Scenario path
        #[arg(short, long, default_value = "scenarios/basic.toml")]
        scenario: PathBuf,

        /// Page to fetch
        #[arg(short, long, value_enum, default_value = "stats")]
        log: Page,

        /// Output file; hex dump to stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Transfer length in bytes (defaults to the full page)
        #[arg(long)]
        len: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario,
            verbose,
            quiet,
        } => {
            init_logger(match (verbose, quiet) {
                (true, _) => LogLevel::Verbose,
                (_, true) => LogLevel::Quiet,
                _ => LogLevel::Normal,
            });
            let scenario = Scenario::from_file(&scenario)?;
            scenario.validate()?;
            if !quiet {
                scenario.print_summary()?;
            }

            let start = OffsetDateTime::now_utc();
            let mut runner = Runner::new(&scenario)?;
            let stats = runner.run(&scenario.steps)?;
            let elapsed = OffsetDateTime::now_utc() - start;

            print!("{}", RuTable(runner.device()));
            log_info!(
                "{} step(s), {} command(s), {} rejected, {} line(s) reclaimed in {} ms",
                stats.steps,
                stats.commands,
                stats.rejected,
                stats.reclaimed,
                elapsed.whole_milliseconds()
            );
        }
        Commands::Dump {
            scenario,
            log,
            out,
            len,
        } => {
            init_logger(LogLevel::Quiet);
            let scenario = Scenario::from_file(&scenario)?;
            let mut runner = Runner::new(&scenario)?;
            runner.run(&scenario.steps)?;

            let dev = runner.device();
            let len = len.unwrap_or(log.full_len(dev) as u64);
            match out {
                Some(path) => {
                    let n = dump::fetch_to_file(dev, log, len, &path)?;
                    log_normal!("{log:?}: {} written to {}", pretty_bytes(n as u64), path.display());
                }
                None => {
                    for row in hex_rows(&dump::fetch_vec(dev, log, len)?) {
                        println!("{row}");
                    }
                }
            }
        }
    }

    Ok(())
}
