// SPDX-License-Identifier: MIT

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    fn tag(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERR ",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Finding {
    pub sev: Severity,
    pub code: &'static str,
    pub msg: String,
}

impl Finding {
    pub fn info(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Info,
            code,
            msg: msg.into(),
        }
    }
    pub fn warn(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Warn,
            code,
            msg: msg.into(),
        }
    }
    pub fn err(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            sev: Severity::Error,
            code,
            msg: msg.into(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct VerifyReport {
    pub findings: Vec<Finding>,
}

impl VerifyReport {
    pub fn push(&mut self, f: Finding) {
        self.findings.push(f)
    }

    pub fn has_error(&self) -> bool {
        self.findings.iter().any(|f| f.sev == Severity::Error)
    }

    pub fn ok(&self) -> bool {
        !self.has_error()
    }

    pub fn count(&self, s: Severity) -> usize {
        self.findings.iter().filter(|f| f.sev == s).count()
    }

    /// Codes of all error findings, in report order.
    pub fn error_codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.findings
            .iter()
            .filter(|f| f.sev == Severity::Error)
            .map(|f| f.code)
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for it in &self.findings {
            writeln!(f, "{}: {:<14} {}", it.sev.tag(), it.code, it.msg)?;
        }
        write!(
            f,
            "Summary: errors={}  warns={}  infos={}",
            self.count(Severity::Error),
            self.count(Severity::Warn),
            self.count(Severity::Info)
        )
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct VerifyPhases: u32 {
        /// Every line sits in exactly one place.
        const PARTITION      = 1 << 0;
        /// Free lists hold only lines of their owner.
        const OWNERSHIP      = 1 << 1;
        const WRITE_POINTERS = 1 << 2;
        const COUNTERS       = 1 << 3;
        const ALL            = u32::MAX;
    }
}

#[derive(Clone, Copy, Debug)]
pub struct VerifyOptions {
    pub phases: VerifyPhases,
    pub fail_fast: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            phases: VerifyPhases::ALL,
            fail_fast: false,
        }
    }
}
