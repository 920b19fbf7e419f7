// SPDX-License-Identifier: MIT

use core::fmt;

#[derive(Debug)]
pub enum ScenarioError {
    NotAligned(&'static str, u64, u32),
    TooLarge(usize, u64),
    InvalidConfig(&'static str),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::NotAligned(what, size, unit) => {
                write!(f, "{what} of {size} bytes is not a multiple of {unit}")
            }
            ScenarioError::TooLarge(step, size) => {
                write!(f, "step {step}: {size} bytes exceed one write command")
            }
            ScenarioError::InvalidConfig(msg) => write!(f, "Invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ScenarioError {}
