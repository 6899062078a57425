//! Command output and runner error types

use crate::runner::OutputLine;
use std::time::Duration;
use thiserror::Error;

/// Error types for running an external command
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {limit:?}")]
    Timeout { program: String, limit: Duration },
}

impl RunnerError {
    /// Exit code a shell would report for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RunnerError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                127
            }
            RunnerError::Spawn { .. } => 126,
            RunnerError::Io { .. } => 1,
            RunnerError::Timeout { .. } => 124,
        }
    }
}

/// Everything a finished command produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (`128 + signal` when killed by a signal)
    pub exit_code: i32,

    /// Lines in the order they were read, across both streams
    pub lines: Vec<OutputLine>,
}

impl CommandOutput {
    /// Create output with the given exit code and no lines
    pub fn new(exit_code: i32) -> Self {
        Self {
            exit_code,
            lines: Vec::new(),
        }
    }

    /// Builder: append a stdout line
    pub fn with_stdout(mut self, text: impl Into<String>) -> Self {
        for line in text.into().lines() {
            self.lines.push(OutputLine::Stdout(line.to_string()));
        }
        self
    }

    /// Builder: append a stderr line
    pub fn with_stderr(mut self, text: impl Into<String>) -> Self {
        for line in text.into().lines() {
            self.lines.push(OutputLine::Stderr(line.to_string()));
        }
        self
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout only
    pub fn stdout(&self) -> String {
        join(self.lines.iter().filter(|l| !l.is_stderr()))
    }

    /// Stderr only
    pub fn stderr(&self) -> String {
        join(self.lines.iter().filter(|l| l.is_stderr()))
    }

    /// Both streams interleaved as read
    pub fn combined(&self) -> String {
        join(self.lines.iter())
    }

    /// Last `max_lines` lines of combined output
    pub fn tail(&self, max_lines: usize) -> String {
        let skip = self.lines.len().saturating_sub(max_lines);
        join(self.lines.iter().skip(skip))
    }
}

fn join<'a>(lines: impl Iterator<Item = &'a OutputLine>) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line.text());
        out.push('\n');
    }
    out
}
