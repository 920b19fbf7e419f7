// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::Path;

use fdpru::prelude::*;

use crate::scenario::{ScenarioError, Size, Step};

/// Largest write one command can carry (NLB is a 16-bit, 0-based count).
pub const MAX_BLOCKS_PER_CMD: u64 = 1 << 16;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceSection {
    pub page_size: Size,
    pub line_size: Size,
    pub lines: u32,
    pub lba_size: Size,
}

impl Default for DeviceSection {
    fn default() -> Self {
        let g = Geometry::default();
        Self {
            page_size: Size(g.page_size as u64),
            line_size: Size(g.line_bytes()),
            lines: g.lines,
            lba_size: Size(g.lba_size as u64),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FdpSection {
    pub nrg: u16,
    pub nruh: u16,
    /// Turn FDP on before the first step.
    pub enabled: bool,
    /// Trace every command through the device log.
    pub trace: bool,
}

impl Default for FdpSection {
    fn default() -> Self {
        let p = FdpParams::default();
        Self {
            nrg: p.num_rgs,
            nruh: p.num_ruhs,
            enabled: true,
            trace: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub device: DeviceSection,
    #[serde(default)]
    pub fdp: FdpSection,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut scenario = Self::from_toml(&content)?;
        if scenario.name.is_none() {
            scenario.name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string);
        }
        Ok(scenario)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn geometry(&self) -> anyhow::Result<Geometry> {
        let d = &self.device;
        let page = u32::try_from(d.page_size.bytes())
            .map_err(|_| ScenarioError::InvalidConfig("page size too large"))?;
        let lba = u32::try_from(d.lba_size.bytes())
            .map_err(|_| ScenarioError::InvalidConfig("LBA size too large"))?;
        if page == 0 {
            return Err(ScenarioError::InvalidConfig("page size must be non-zero").into());
        }
        if d.line_size.bytes() % page as u64 != 0 {
            return Err(ScenarioError::NotAligned("line size", d.line_size.bytes(), page).into());
        }
        let ppl = u32::try_from(d.line_size.bytes() / page as u64)
            .map_err(|_| ScenarioError::InvalidConfig("line size too large"))?;
        let geometry = Geometry {
            page_size: page,
            pages_per_line: ppl,
            lines: d.lines,
            lba_size: lba,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn params(&self) -> FdpParams {
        FdpParams {
            num_rgs: self.fdp.nrg,
            num_ruhs: self.fdp.nruh,
            ..FdpParams::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let geometry = self.geometry()?;
        // surfaces nrg/nruh errors before anything runs
        FdpConfig::initialize(&geometry, self.params())?;

        for (i, step) in self.steps.iter().enumerate() {
            let (what, size, unit) = match step {
                Step::Write { size, .. } => ("write", size.bytes(), geometry.page_size),
                Step::Read { size, .. } => ("read", size.bytes(), geometry.lba_size),
                _ => continue,
            };
            if size == 0 || size % unit as u64 != 0 {
                return Err(ScenarioError::NotAligned(what, size, unit).into());
            }
            if size / geometry.lba_size as u64 > MAX_BLOCKS_PER_CMD {
                return Err(ScenarioError::TooLarge(i, size).into());
            }
        }
        Ok(())
    }

    pub fn print_summary(&self) -> anyhow::Result<()> {
        let g = self.geometry()?;
        println!(
            "[fdpctl] Scenario '{}': {} line(s) of {} ({} pages of {}), {} RG x {} RUH, FDP {}",
            self.name.as_deref().unwrap_or("unnamed"),
            g.lines,
            Size(g.line_bytes()),
            g.pages_per_line,
            Size(g.page_size as u64),
            self.fdp.nrg,
            self.fdp.nruh,
            if self.fdp.enabled { "on" } else { "off" },
        );
        for (i, step) in self.steps.iter().enumerate() {
            crate::log_verbose!("  {i:>3}: {step}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BASIC: &str = r#"
name = "two-streams"

[device]
page_size = "4K"
line_size = "64K"
lines = 32

[fdp]
nruh = 2

[[steps]]
op = "write"
ph = 1
size = "40K"
count = 3

[[steps]]
op = "write"
size = "8K"

[[steps]]
op = "gc"

[[steps]]
op = "reclaim"
ru = 1

[[steps]]
op = "disable"
"#;

    #[test]
    fn parses_sections_and_steps() {
        let s = Scenario::from_toml(BASIC).unwrap();
        assert_eq!(s.name.as_deref(), Some("two-streams"));
        let g = s.geometry().unwrap();
        assert_eq!(g.pages_per_line, 16);
        assert_eq!(g.lba_size, 512);
        assert_eq!(s.params().num_ruhs, 2);
        assert!(s.fdp.enabled);
        assert_eq!(s.steps.len(), 5);
        assert_eq!(
            s.steps[0],
            Step::Write {
                rg: 0,
                ph: Some(1),
                size: Size(40960),
                count: 3,
                slba: 0
            }
        );
        assert!(matches!(s.steps[1], Step::Write { ph: None, count: 1, .. }));
        assert_eq!(s.steps[2], Step::Gc { budget: None });
        assert_eq!(s.steps[3], Step::Reclaim { ru: 1 });
        s.validate().unwrap();
    }

    #[test]
    fn defaults_match_device_defaults() {
        let s = Scenario::from_toml("").unwrap();
        assert_eq!(s.geometry().unwrap(), Geometry::default());
        assert_eq!(s.params(), FdpParams::default());
        assert!(s.steps.is_empty());
    }

    #[test]
    fn rejects_misaligned_sizes() {
        let s = Scenario::from_toml(
            "[device]\nline_size = \"6K\"\npage_size = \"4K\"\n",
        )
        .unwrap();
        assert!(s.geometry().is_err());

        let s = Scenario::from_toml("[[steps]]\nop = \"write\"\nph = 0\nsize = 512\n").unwrap();
        assert!(s.validate().is_err());
        let s = Scenario::from_toml("[[steps]]\nop = \"read\"\nsize = 512\n").unwrap();
        s.validate().unwrap();

        let s = Scenario::from_toml("[[steps]]\nop = \"write\"\nph = 0\nsize = \"64M\"\n").unwrap();
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_bad_fdp_params() {
        let s = Scenario::from_toml("[fdp]\nnruh = 0\n").unwrap();
        assert!(s.validate().is_err());
    }

    #[test]
    fn unknown_op_is_a_parse_error() {
        assert!(Scenario::from_toml("[[steps]]\nop = \"format\"\n").is_err());
    }

    #[test]
    fn name_defaults_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("burst.toml");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "[[steps]]\nop = \"enable\"").unwrap();
        drop(f);

        let s = Scenario::from_file(&path).unwrap();
        assert_eq!(s.name.as_deref(), Some("burst"));
        assert_eq!(s.steps, vec![Step::Enable]);
    }
}
