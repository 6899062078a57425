//! Pipeline-level errors

use crate::runner::RunnerError;
use std::time::Duration;
use thiserror::Error;

/// Why a pipeline run stopped early
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A step's command exited non-zero
    #[error("step '{step_id}' exited with code {exit_code}")]
    StepFailed {
        step_id: String,
        exit_code: i32,
        /// Tail of the step's captured output
        output: String,
    },

    /// A step's command could not be run or hit its own timeout
    #[error("step '{step_id}' could not run: {source}")]
    Runner {
        step_id: String,
        #[source]
        source: RunnerError,
    },

    /// The whole pipeline exceeded its wall-clock limit
    #[error("pipeline timed out after {limit:?}")]
    Timeout { limit: Duration },
}

impl PipelineError {
    /// Exit code the pipeline process should terminate with
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::StepFailed { exit_code, .. } => *exit_code,
            PipelineError::Runner { source, .. } => source.exit_code(),
            PipelineError::Timeout { .. } => 124,
        }
    }

    /// Step that halted the pipeline, if one did
    pub fn step_id(&self) -> Option<&str> {
        match self {
            PipelineError::StepFailed { step_id, .. } | PipelineError::Runner { step_id, .. } => {
                Some(step_id)
            }
            PipelineError::Timeout { .. } => None,
        }
    }
}
