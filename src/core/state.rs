//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall pipeline execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Pipeline has not started
    Pending,
    /// Pipeline is currently running
    Running,
    /// Every step exited 0
    Completed,
    /// A step failed and the pipeline halted
    Failed,
}

/// State of a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StepState {
    /// Step has not run yet
    Pending,
    /// Step is currently running
    Running {
        started_at: DateTime<Utc>,
    },
    /// Step finished and the pipeline may continue
    Succeeded {
        exit_code: i32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Step exited non-zero or could not be run
    Failed {
        exit_code: Option<i32>,
        error: String,
        output: String,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
    /// Step never ran because an earlier step halted the pipeline
    Skipped {
        reason: String,
    },
}

impl StepState {
    /// Check if step is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepState::Succeeded { .. } | StepState::Failed { .. } | StepState::Skipped { .. }
        )
    }

    /// Short lowercase label
    pub fn label(&self) -> &'static str {
        match self {
            StepState::Pending => "pending",
            StepState::Running { .. } => "running",
            StepState::Succeeded { .. } => "succeeded",
            StepState::Failed { .. } => "failed",
            StepState::Skipped { .. } => "skipped",
        }
    }

    /// Exit code recorded for the step, if it ran to completion
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            StepState::Succeeded { exit_code, .. } => Some(*exit_code),
            StepState::Failed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// Wall-clock time spent in the step
    pub fn duration_ms(&self) -> Option<i64> {
        match self {
            StepState::Succeeded {
                started_at,
                completed_at,
                ..
            } => Some((*completed_at - *started_at).num_milliseconds()),
            StepState::Failed {
                started_at,
                failed_at,
                ..
            } => Some((*failed_at - *started_at).num_milliseconds()),
            _ => None,
        }
    }
}

/// Overall pipeline state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// Current execution status
    pub status: ExecutionStatus,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution completed/failed
    pub completed_at: Option<DateTime<Utc>>,

    /// Total number of steps, including generated ones
    pub total_steps: usize,

    /// Number of succeeded steps
    pub completed_steps: usize,

    /// Number of failed steps (at most one under fail-fast)
    pub failed_steps: usize,

    /// Number of steps skipped after a failure
    pub skipped_steps: usize,
}

impl PipelineState {
    /// Create a new pipeline state
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            status: ExecutionStatus::Pending,
            started_at: None,
            completed_at: None,
            total_steps: 0,
            completed_steps: 0,
            failed_steps: 0,
            skipped_steps: 0,
        }
    }

    /// Mark pipeline as started
    pub fn start(&mut self, total_steps: usize) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_steps = total_steps;
    }

    /// Mark pipeline as completed
    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark pipeline as failed
    pub fn fail(&mut self) {
        self.status = ExecutionStatus::Failed;
        self.completed_at = Some(Utc::now());
    }

    /// Update step counts
    pub fn update_counts(&mut self, total: usize, completed: usize, failed: usize, skipped: usize) {
        self.total_steps = total;
        self.completed_steps = completed;
        self.failed_steps = failed;
        self.skipped_steps = skipped;
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}
