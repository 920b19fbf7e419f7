use std::sync::atomic::{AtomicU8, Ordering};

use colored::Colorize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Quiet,
    Normal,
    Verbose,
}

impl LogLevel {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Quiet,
            2 => LogLevel::Verbose,
            _ => LogLevel::Normal,
        }
    }

    fn filter(self) -> ::log::LevelFilter {
        match self {
            LogLevel::Quiet => ::log::LevelFilter::Warn,
            LogLevel::Normal => ::log::LevelFilter::Info,
            LogLevel::Verbose => ::log::LevelFilter::Trace,
        }
    }
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Normal as u8);

pub fn set_log_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
    ::log::set_max_level(level.filter());
}

pub fn log_level() -> LogLevel {
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Prints records from the device crates under the `[fdpctl]` tag.
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl ::log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &::log::Metadata) -> bool {
        metadata.level() <= log_level().filter()
    }

    fn log(&self, record: &::log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = format!("{}", record.args());
        // device messages already carry their own tag
        let msg = msg.strip_prefix("[fdp] ").unwrap_or(&msg);
        match record.level() {
            ::log::Level::Error => eprintln!("[fdpctl] {}", msg.red()),
            ::log::Level::Warn => eprintln!("[fdpctl] {}", msg.yellow()),
            ::log::Level::Info => println!("[fdpctl] {msg}"),
            ::log::Level::Debug | ::log::Level::Trace => println!("[fdpctl] {}", msg.dimmed()),
        }
    }

    fn flush(&self) {}
}

/// Routes `log` records to the console. Safe to call more than once.
pub fn init_logger(level: LogLevel) {
    let _ = ::log::set_logger(&LOGGER);
    set_log_level(level);
}

#[macro_export]
macro_rules! log_normal {
    ($($arg:tt)*) => {
            println!("[fdpctl] {}", format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if $crate::utils::log_level() != $crate::utils::LogLevel::Quiet {
            println!("[fdpctl] {}", format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_verbose {
    ($($arg:tt)*) => {
        if $crate::utils::log_level() == $crate::utils::LogLevel::Verbose {
            println!("[fdpctl] {}", format_args!($($arg)*));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_round_trips_through_atomic() {
        for level in [LogLevel::Quiet, LogLevel::Verbose, LogLevel::Normal] {
            set_log_level(level);
            assert_eq!(log_level(), level);
        }
    }
}
