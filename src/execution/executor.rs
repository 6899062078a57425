//! Step executor - runs individual steps with the command runner

use crate::{
    core::{CommandSpec, FanOut, PipelineContext},
    runner::{CommandRunner, Invocation, OutputCallback, RunnerError},
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lines of captured output kept when a step fails
pub const FAILURE_TAIL_LINES: usize = 40;

/// Result of executing a command step
#[derive(Debug)]
pub enum ExecutionResult {
    /// Command exited 0
    Success { exit_code: i32 },
    /// Command exited non-zero
    Failed { exit_code: i32, output: String },
    /// Command could not be run or timed out
    Error { error: RunnerError },
}

/// Result of running a fan-out's discovery command
#[derive(Debug)]
pub enum DiscoveryResult {
    /// Names selected from the output
    Found { names: Vec<String>, exit_code: i32 },
    /// Discovery exited non-zero and that is not ignored
    Failed { exit_code: i32, output: String },
    /// Discovery could not be run or timed out
    Error { error: RunnerError },
}

/// Render a command against the context into a runnable invocation
pub fn invocation_for(
    spec: &CommandSpec,
    timeout_secs: Option<u64>,
    context: &PipelineContext,
) -> Invocation {
    Invocation {
        program: context.render(&spec.program),
        args: context.render_args(&spec.args),
        env: context.effective_env(&spec.env),
        working_dir: None,
        timeout: timeout_secs.map(Duration::from_secs),
    }
}

/// Executes single steps
pub struct StepExecutor<R> {
    runner: R,
}

impl<R: CommandRunner> StepExecutor<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run a command step and classify its exit
    pub async fn execute(
        &self,
        step_id: &str,
        invocation: &Invocation,
        callback: Option<&dyn OutputCallback>,
    ) -> ExecutionResult {
        info!("Executing step: {}", step_id);

        match self.runner.run(invocation, callback).await {
            Ok(output) if output.success() => {
                debug!("Step {} exited 0", step_id);
                ExecutionResult::Success {
                    exit_code: output.exit_code,
                }
            }
            Ok(output) => {
                warn!("Step {} exited with code {}", step_id, output.exit_code);
                ExecutionResult::Failed {
                    exit_code: output.exit_code,
                    output: output.tail(FAILURE_TAIL_LINES),
                }
            }
            Err(error) => {
                warn!("Step {} could not run: {}", step_id, error);
                ExecutionResult::Error { error }
            }
        }
    }

    /// Run the discovery command of a fan-out and select item names
    ///
    /// Discovery output is captured, not streamed.
    pub async fn discover(
        &self,
        step_id: &str,
        fan_out: &FanOut,
        invocation: &Invocation,
    ) -> DiscoveryResult {
        info!("Discovering items for step: {}", step_id);

        let output = match self.runner.run(invocation, None).await {
            Ok(output) => output,
            Err(error) => {
                warn!("Discovery for step {} could not run: {}", step_id, error);
                return DiscoveryResult::Error { error };
            }
        };

        if !output.success() {
            if fan_out.ignore_exit_status {
                debug!(
                    "Discovery for step {} exited with code {} (ignored)",
                    step_id, output.exit_code
                );
            } else {
                warn!(
                    "Discovery for step {} exited with code {}",
                    step_id, output.exit_code
                );
                return DiscoveryResult::Failed {
                    exit_code: output.exit_code,
                    output: output.tail(FAILURE_TAIL_LINES),
                };
            }
        }

        let scanned = if fan_out.merge_stderr {
            output.combined()
        } else {
            output.stdout()
        };
        let names = fan_out.discover_names(&scanned);
        info!("Step {} discovered {} item(s)", step_id, names.len());

        DiscoveryResult::Found {
            names,
            exit_code: output.exit_code,
        }
    }
}
