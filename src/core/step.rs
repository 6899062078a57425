//! Step domain model

use crate::core::{
    condition::LineFilter,
    config::StepConfig,
    fanout::FanOut,
    state::StepState,
};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};

/// An external command: executable, arguments and environment overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name or path
    pub program: String,

    /// Arguments (may contain `{{ name }}` placeholders)
    pub args: Vec<String>,

    /// Environment overrides (may contain placeholders)
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// What a step does when it runs
#[derive(Debug, Clone)]
pub enum StepKind {
    /// Run one external command
    Command(CommandSpec),
    /// Discover items, then insert one generated step per item
    FanOut(FanOut),
}

/// A single step in a pipeline
#[derive(Debug, Clone)]
pub struct Step {
    /// Unique step identifier
    pub id: String,

    /// Human-readable step name
    pub name: String,

    /// Command or fan-out
    pub kind: StepKind,

    /// Timeout in seconds (None = no per-step limit)
    pub timeout_secs: Option<u64>,

    /// Placeholders bound for this step only, such as a fan-out item
    pub bindings: HashMap<String, String>,

    /// Runtime state
    pub state: StepState,
}

impl Step {
    /// Create a command step
    pub fn command(id: impl Into<String>, spec: CommandSpec) -> Self {
        let id = id.into();
        Step {
            name: id.clone(),
            id,
            kind: StepKind::Command(spec),
            timeout_secs: None,
            bindings: HashMap::new(),
            state: StepState::Pending,
        }
    }

    /// Create a fan-out step
    pub fn fan_out(id: impl Into<String>, fan_out: FanOut) -> Self {
        let id = id.into();
        Step {
            name: id.clone(),
            id,
            kind: StepKind::FanOut(fan_out),
            timeout_secs: None,
            bindings: HashMap::new(),
            state: StepState::Pending,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Create a step from a step config
    pub fn from_config(config: &StepConfig) -> Result<Self> {
        let kind = match (&config.run, &config.fan_out) {
            (_, Some(fan_out)) => {
                let filter = LineFilter::from_config(&fan_out.filter).with_context(|| {
                    format!("Step '{}' has an invalid filter regex", config.id)
                })?;

                StepKind::FanOut(FanOut {
                    discover: CommandSpec {
                        program: fan_out.discover.run.clone(),
                        args: fan_out.discover.args.clone(),
                        env: fan_out.discover.env.clone(),
                    },
                    merge_stderr: fan_out.discover.merge_stderr,
                    ignore_exit_status: fan_out.discover.ignore_exit_status,
                    filter,
                    bind: fan_out.bind.clone(),
                    template: CommandSpec {
                        program: fan_out.step.run.clone(),
                        args: fan_out.step.args.clone(),
                        env: fan_out.step.env.clone(),
                    },
                    template_timeout_secs: fan_out.step.timeout_secs,
                })
            }
            (run, None) => StepKind::Command(CommandSpec {
                program: run.clone().unwrap_or_default(),
                args: config.args.clone(),
                env: config.env.clone(),
            }),
        };

        Ok(Step {
            id: config.id.clone(),
            name: config.name.clone().unwrap_or_else(|| config.id.clone()),
            kind,
            timeout_secs: config.timeout_secs,
            bindings: HashMap::new(),
            state: StepState::Pending,
        })
    }

    /// Whether this step expands into generated steps
    pub fn is_fan_out(&self) -> bool {
        matches!(self.kind, StepKind::FanOut(_))
    }
}
