//! Built-in pipeline profiles shipped inside the binary

use crate::core::config::PipelineConfig;
use anyhow::{Context, Result};
use std::fmt;
use std::str::FromStr;

const STANDARD_YAML: &str = include_str!("../../pipelines/standard.yml");
const EXAMPLES_YAML: &str = include_str!("../../pipelines/examples.yml");

/// A built-in pipeline definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Toolchain setup, fmt, clippy, tests, Miri tests, release tests
    #[default]
    Standard,
    /// Standard plus every example program under Miri
    Examples,
}

impl Profile {
    pub const ALL: [Profile; 2] = [Profile::Standard, Profile::Examples];

    pub fn name(&self) -> &'static str {
        match self {
            Profile::Standard => "standard",
            Profile::Examples => "examples",
        }
    }

    /// Raw YAML definition
    pub fn yaml(&self) -> &'static str {
        match self {
            Profile::Standard => STANDARD_YAML,
            Profile::Examples => EXAMPLES_YAML,
        }
    }

    /// Parse and validate the profile
    pub fn load(&self) -> Result<PipelineConfig> {
        PipelineConfig::from_yaml(self.yaml())
            .with_context(|| format!("Built-in profile '{}' is invalid", self.name()))
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("Unknown profile: {}", s))
    }
}
