//! Run summaries for reporting

use crate::core::{ExecutionStatus, Pipeline, StepState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary of a pipeline execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// Pipeline name
    pub pipeline_name: String,

    /// Execution status
    pub status: ExecutionStatus,

    /// When execution started
    pub started_at: DateTime<Utc>,

    /// When execution completed (if complete)
    pub completed_at: Option<DateTime<Utc>>,

    /// Number of steps that exited 0
    pub completed_steps: usize,

    /// Total number of steps, including generated ones
    pub total_steps: usize,

    /// Step that halted the pipeline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,

    /// Per-step outcomes in execution order
    pub steps: Vec<StepSummary>,
}

/// Outcome of one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSummary {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Create a summary from a pipeline
pub fn create_summary(pipeline: &Pipeline) -> RunSummary {
    let steps = pipeline
        .steps
        .iter()
        .map(|step| StepSummary {
            id: step.id.clone(),
            name: step.name.clone(),
            status: step.state.label().to_string(),
            exit_code: step.state.exit_code(),
            duration_ms: step.state.duration_ms(),
            error: match &step.state {
                StepState::Failed { error, .. } => Some(error.clone()),
                _ => None,
            },
        })
        .collect();

    RunSummary {
        execution_id: pipeline.state.execution_id,
        pipeline_name: pipeline.name.clone(),
        status: pipeline.state.status,
        started_at: pipeline.state.started_at.unwrap_or_else(Utc::now),
        completed_at: pipeline.state.completed_at,
        completed_steps: pipeline.state.completed_steps,
        total_steps: pipeline.steps.len(),
        failed_step: pipeline.failed_step().map(|s| s.id.clone()),
        steps,
    }
}
