//! Running external commands

pub mod config;
pub mod output;
pub mod process;
pub mod streaming;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub use config::RunnerConfig;
pub use output::{CommandOutput, RunnerError};
pub use process::ProcessRunner;
pub use streaming::{OutputCallback, OutputLine};

/// A fully rendered command ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable name or path
    pub program: String,

    /// Arguments
    pub args: Vec<String>,

    /// Overrides merged over the inherited environment
    pub env: BTreeMap<String, String>,

    /// Working directory (None = runner default)
    pub working_dir: Option<PathBuf>,

    /// Kill the child after this long
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            working_dir: None,
            timeout: None,
        }
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

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Shell-style trace line, like `set -x`: `+ KEY=value program args...`
    pub fn echo_line(&self) -> String {
        let mut parts = vec!["+".to_string()];
        for (key, value) in &self.env {
            parts.push(format!("{}={}", key, shell_quote(value)));
        }
        parts.push(shell_quote(&self.program));
        parts.extend(self.args.iter().map(|arg| shell_quote(arg)));
        parts.join(" ")
    }
}

fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_+=./:,@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Trait for command execution - allows for different implementations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion, streaming its output lines to `callback`
    ///
    /// A non-zero exit is not an error here; callers inspect
    /// [`CommandOutput::exit_code`]. Errors mean the command could not be run
    /// or was killed by its timeout.
    async fn run(
        &self,
        invocation: &Invocation,
        callback: Option<&dyn OutputCallback>,
    ) -> Result<CommandOutput, RunnerError>;
}
