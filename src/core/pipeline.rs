//! Pipeline domain model

use crate::core::{
    config::PipelineConfig,
    context::PipelineContext,
    state::{ExecutionStatus, PipelineState, StepState},
    step::Step,
};
use anyhow::Result;
use std::collections::{BTreeMap, HashMap};

/// A pipeline: an ordered sequence of steps run fail-fast
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Variables available to all steps
    pub variables: HashMap<String, String>,

    /// Environment overrides applied to every step
    pub env: BTreeMap<String, String>,

    /// Command-line environment overrides; these win over step env
    pub env_overrides: BTreeMap<String, String>,

    /// Steps in execution order
    pub steps: Vec<Step>,

    /// Wall-clock limit for the whole run
    pub timeout_secs: Option<u64>,

    /// Execution state
    pub state: PipelineState,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new(name: impl Into<String>) -> Self {
        Pipeline {
            name: name.into(),
            variables: HashMap::new(),
            env: BTreeMap::new(),
            env_overrides: BTreeMap::new(),
            steps: Vec::new(),
            timeout_secs: None,
            state: PipelineState::new(),
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_env_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overrides.insert(key.into(), value.into());
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Create a pipeline from configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Pipeline {
            name: config.name.clone(),
            variables: config.variables_as_string_map(),
            env: config.env.clone(),
            env_overrides: BTreeMap::new(),
            steps: config
                .steps
                .iter()
                .map(Step::from_config)
                .collect::<Result<_>>()?,
            timeout_secs: config.timeout_secs,
            state: PipelineState::new(),
        })
    }

    /// Get a step by ID
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Get a mutable step by ID
    pub fn step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    /// Index of the first step that has not run yet
    pub fn next_pending(&self) -> Option<usize> {
        self.steps
            .iter()
            .position(|s| matches!(s.state, StepState::Pending))
    }

    /// Insert generated steps directly after `index`
    pub fn insert_after(&mut self, index: usize, steps: Vec<Step>) {
        let at = (index + 1).min(self.steps.len());
        self.steps.splice(at..at, steps);
    }

    /// Mark every step that has not run yet as skipped
    pub fn skip_pending(&mut self, reason: &str) -> Vec<String> {
        let mut skipped = Vec::new();
        for step in self.steps.iter_mut() {
            if matches!(step.state, StepState::Pending) {
                step.state = StepState::Skipped {
                    reason: reason.to_string(),
                };
                skipped.push(step.id.clone());
            }
        }
        skipped
    }

    /// Check if every step has reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.state.is_terminal())
    }

    /// Check if pipeline has failed
    pub fn has_failed(&self) -> bool {
        self.state.status == ExecutionStatus::Failed
    }

    /// The step that halted the pipeline, if any
    pub fn failed_step(&self) -> Option<&Step> {
        self.steps
            .iter()
            .find(|s| matches!(s.state, StepState::Failed { .. }))
    }

    /// Recount step states into the pipeline state
    pub fn update_counts(&mut self) {
        let mut completed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for step in &self.steps {
            match &step.state {
                StepState::Succeeded { .. } => completed += 1,
                StepState::Failed { .. } => failed += 1,
                StepState::Skipped { .. } => skipped += 1,
                _ => {}
            }
        }

        self.state
            .update_counts(self.steps.len(), completed, failed, skipped);
    }

    /// Create execution context for a step
    pub fn create_context_for_step(&self, step_id: &str) -> PipelineContext {
        let mut context = PipelineContext::new();
        context.variables.extend(self.variables.clone());
        context.env.extend(self.env.clone());
        context.env_overrides.extend(self.env_overrides.clone());
        if let Some(step) = self.step(step_id) {
            context.variables.extend(step.bindings.clone());
        }
        context.current_step_id = Some(step_id.to_string());
        context
    }
}
