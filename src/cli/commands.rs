//! CLI command definitions

use crate::core::{config::PipelineConfig, Profile};
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

/// Where a pipeline definition comes from
#[derive(Debug, Args, Clone, Default)]
pub struct PipelineSource {
    /// Path to pipeline YAML file
    #[arg(short, long, conflicts_with = "profile")]
    pub file: Option<PathBuf>,

    /// Built-in profile to use when no file is given
    #[arg(short, long, value_enum)]
    pub profile: Option<ProfileArg>,
}

impl PipelineSource {
    /// The selected profile, or the default one
    pub fn profile(&self) -> Profile {
        self.profile.map(Profile::from).unwrap_or_default()
    }

    /// Load and validate the pipeline configuration
    pub fn load(&self) -> Result<PipelineConfig> {
        match &self.file {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("Failed to load pipeline config {}", path.display())),
            None => {
                let profile = self.profile();
                profile
                    .load()
                    .with_context(|| format!("Failed to load built-in profile {}", profile))
            }
        }
    }
}

/// Run a pipeline
#[derive(Debug, Args, Clone, Default)]
pub struct RunCommand {
    #[command(flatten)]
    pub source: PipelineSource,

    /// Variable overrides (key=value)
    #[arg(long = "var", value_parser = parse_key_value)]
    pub variables: Vec<(String, String)>,

    /// Environment overrides applied to every step (KEY=value)
    #[arg(long = "env", value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,

    /// Working directory for every step
    #[arg(short = 'C', long)]
    pub dir: Option<PathBuf>,

    /// Wall-clock limit for the whole run
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print the commands that would run without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Print a JSON run summary on stdout
    #[arg(long)]
    pub json: bool,
}

/// Validate a pipeline configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    #[command(flatten)]
    pub source: PipelineSource,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List the steps of a pipeline
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    #[command(flatten)]
    pub source: PipelineSource,
}

/// Built-in profile argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProfileArg {
    Standard,
    Examples,
}

impl From<ProfileArg> for Profile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Standard => Profile::Standard,
            ProfileArg::Examples => Profile::Examples,
        }
    }
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Invalid key=value pair: {}", s)),
    }
}
