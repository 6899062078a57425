//! Test utility functions for checkrun
#![allow(dead_code)]

use async_trait::async_trait;
use checkrun::core::{config::PipelineConfig, ExecutionStatus, Pipeline, StepState};
use checkrun::execution::{ExecutionEngine, PipelineError};
use checkrun::runner::{
    CommandOutput, CommandRunner, Invocation, OutputCallback, OutputLine, RunnerError,
};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

/// What a scripted command does when invoked
#[derive(Debug, Clone)]
enum Scripted {
    Exit(CommandOutput),
    NotFound,
}

/// Runner that answers commands from a script instead of spawning them
///
/// Commands are keyed by `program arg1 arg2 ...`. Anything not scripted
/// exits 0 with no output. Every invocation is recorded in order.
#[derive(Clone, Default)]
pub struct MockRunner {
    scripts: HashMap<String, Scripted>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `command` exit with `exit_code`
    pub fn exits(self, command: &str, exit_code: i32) -> Self {
        self.outputs(command, CommandOutput::new(exit_code))
    }

    /// Make `command` produce `output`
    pub fn outputs(mut self, command: &str, output: CommandOutput) -> Self {
        self.scripts
            .insert(command.to_string(), Scripted::Exit(output));
        self
    }

    /// Make `command` fail to spawn as if the program were missing
    pub fn not_found(mut self, command: &str) -> Self {
        self.scripts.insert(command.to_string(), Scripted::NotFound);
        self
    }

    /// Shared handle to the recorded invocations
    pub fn invocations(&self) -> Arc<Mutex<Vec<Invocation>>> {
        self.invocations.clone()
    }
}

/// `program arg1 arg2 ...` for an invocation
pub fn command_line(invocation: &Invocation) -> String {
    std::iter::once(invocation.program.as_str())
        .chain(invocation.args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        callback: Option<&dyn OutputCallback>,
    ) -> Result<CommandOutput, RunnerError> {
        self.invocations.lock().unwrap().push(invocation.clone());

        let key = command_line(invocation);
        match self.scripts.get(&key) {
            Some(Scripted::NotFound) => Err(RunnerError::Spawn {
                program: invocation.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            }),
            Some(Scripted::Exit(output)) => {
                if let Some(cb) = callback {
                    for line in &output.lines {
                        cb.on_line(line);
                    }
                }
                Ok(output.clone())
            }
            None => Ok(CommandOutput::new(0)),
        }
    }
}

/// Callback that keeps every streamed line
#[derive(Clone, Default)]
pub struct CollectingCallback {
    pub lines: Arc<Mutex<Vec<OutputLine>>>,
}

impl OutputCallback for CollectingCallback {
    fn on_line(&self, line: &OutputLine) {
        self.lines.lock().unwrap().push(line.clone());
    }
}

/// Test result from running a pipeline
#[derive(Debug)]
pub struct PipelineTestResult {
    pub pipeline: Pipeline,
    pub error: Option<PipelineError>,
    pub invocations: Vec<Invocation>,
}

impl PipelineTestResult {
    /// Check if the pipeline completed successfully
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.pipeline.state.status == ExecutionStatus::Completed
    }

    /// Check if the pipeline failed
    pub fn is_failed(&self) -> bool {
        self.error.is_some() && self.pipeline.has_failed()
    }

    /// Exit code the CLI would terminate with
    pub fn exit_code(&self) -> i32 {
        self.error.as_ref().map(PipelineError::exit_code).unwrap_or(0)
    }

    /// Get the state of a specific step
    pub fn get_step_state(&self, step_id: &str) -> Option<&StepState> {
        self.pipeline.step(step_id).map(|s| &s.state)
    }

    /// Commands in the order they were invoked
    pub fn command_lines(&self) -> Vec<String> {
        self.invocations.iter().map(command_line).collect()
    }

    /// Step ids in pipeline order
    pub fn step_ids(&self) -> Vec<String> {
        self.pipeline.steps.iter().map(|s| s.id.clone()).collect()
    }

    /// Get a summary of the result
    pub fn summary(&self) -> String {
        format!(
            "{:?} - {} invocations, error: {:?}",
            self.pipeline.state.status,
            self.invocations.len(),
            self.error.as_ref().map(|e| e.to_string())
        )
    }
}

/// Run a pipeline with a scripted runner
pub async fn run_pipeline_with_runner(
    pipeline: &mut Pipeline,
    runner: MockRunner,
) -> PipelineTestResult {
    let invocations = runner.invocations();
    let engine = ExecutionEngine::new(runner);
    let error = engine.execute(pipeline).await.err();
    let invocations = invocations.lock().unwrap().clone();

    PipelineTestResult {
        pipeline: pipeline.clone(),
        error,
        invocations,
    }
}

/// Parse a pipeline from YAML string
pub fn pipeline_from_yaml(yaml: &str) -> Pipeline {
    PipelineConfig::from_yaml(yaml)
        .unwrap_or_else(|e| panic!("Failed to parse pipeline YAML: {:#}", e))
        .to_pipeline()
        .unwrap_or_else(|e| panic!("Failed to build pipeline: {:#}", e))
}

/// Assert pipeline completed successfully
pub fn assert_pipeline_completed(result: &PipelineTestResult) {
    assert!(
        result.is_success(),
        "Pipeline should be completed, but was: {}",
        result.summary()
    );
}

/// Assert pipeline failed
pub fn assert_pipeline_failed(result: &PipelineTestResult) {
    assert!(
        result.is_failed(),
        "Pipeline should have failed, but was: {}",
        result.summary()
    );
}

/// Assert a step ran and exited 0
pub fn assert_step_succeeded(result: &PipelineTestResult, step_id: &str) {
    let state = result
        .get_step_state(step_id)
        .unwrap_or_else(|| panic!("Step '{}' not found in result", step_id));
    assert!(
        matches!(state, StepState::Succeeded { .. }),
        "Step '{}' should have succeeded, but was in state: {:?}",
        step_id,
        state
    );
}

/// Assert a step failed with a specific exit code
pub fn assert_step_failed(result: &PipelineTestResult, step_id: &str, expected_code: Option<i32>) {
    let state = result
        .get_step_state(step_id)
        .unwrap_or_else(|| panic!("Step '{}' not found in result", step_id));
    match state {
        StepState::Failed { exit_code, .. } => assert_eq!(
            *exit_code, expected_code,
            "Step '{}' failed with an unexpected exit code",
            step_id
        ),
        other => panic!("Step '{}' should have failed, but was in state: {:?}", step_id, other),
    }
}

/// Assert a step never ran
pub fn assert_step_skipped(result: &PipelineTestResult, step_id: &str) {
    let state = result
        .get_step_state(step_id)
        .unwrap_or_else(|| panic!("Step '{}' not found in result", step_id));
    assert!(
        matches!(state, StepState::Skipped { .. }),
        "Step '{}' should have been skipped, but was in state: {:?}",
        step_id,
        state
    );
}

/// Assert exactly these commands ran, in this order
pub fn assert_invoked(result: &PipelineTestResult, expected: &[&str]) {
    assert_eq!(
        result.command_lines(),
        expected,
        "Unexpected invocations for: {}",
        result.summary()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkrun::core::{CommandSpec, Step};

    #[tokio::test]
    async fn test_mock_runner_records_and_scripts() {
        let mut pipeline = Pipeline::new("mock")
            .with_step(Step::command("a", CommandSpec::new("cargo").arg("build")))
            .with_step(Step::command("b", CommandSpec::new("cargo").arg("test")));

        let runner = MockRunner::new().exits("cargo test", 101);
        let result = run_pipeline_with_runner(&mut pipeline, runner).await;

        assert_pipeline_failed(&result);
        assert_invoked(&result, &["cargo build", "cargo test"]);
        assert_step_succeeded(&result, "a");
        assert_step_failed(&result, "b", Some(101));
        assert_eq!(result.exit_code(), 101);
    }
}
