//! Runner configuration

use std::path::PathBuf;

/// Configuration for the process runner
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Directory commands run in when the invocation names none
    ///
    /// If not provided, children inherit the current working directory.
    pub working_dir: Option<PathBuf>,
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}
