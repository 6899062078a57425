//! Main execution engine - runs a pipeline's steps in order, fail-fast

use crate::{
    core::{ExecutionStatus, Pipeline, StepKind, StepState},
    execution::{invocation_for, DiscoveryResult, ExecutionResult, PipelineError, StepExecutor},
    runner::{CommandRunner, OutputCallback},
};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        execution_id: Uuid,
        pipeline_name: String,
        total_steps: usize,
    },
    StepStarted {
        step_id: String,
        name: String,
        position: usize,
        total: usize,
        command_line: String,
    },
    DiscoveryStarted {
        step_id: String,
        name: String,
        command_line: String,
    },
    ItemsDiscovered {
        step_id: String,
        names: Vec<String>,
    },
    StepCompleted {
        step_id: String,
        exit_code: i32,
        duration_ms: i64,
    },
    StepFailed {
        step_id: String,
        exit_code: Option<i32>,
        error: String,
    },
    StepsSkipped {
        step_ids: Vec<String>,
        reason: String,
    },
    PipelineCompleted {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Main pipeline execution engine
pub struct ExecutionEngine<R> {
    executor: StepExecutor<R>,
    event_handlers: Mutex<Vec<EventHandler>>,
    output_callback: Option<Arc<dyn OutputCallback>>,
    timeout: Option<Duration>,
}

impl<R: CommandRunner> ExecutionEngine<R> {
    pub fn new(runner: R) -> Self {
        Self {
            executor: StepExecutor::new(runner),
            event_handlers: Mutex::new(Vec::new()),
            output_callback: None,
            timeout: None,
        }
    }

    /// Limit the whole run; overrides the pipeline's own `timeout_secs`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Receive child output lines as they are produced
    pub fn with_output_callback(mut self, callback: Arc<dyn OutputCallback>) -> Self {
        self.output_callback = Some(callback);
        self
    }

    pub fn runner(&self) -> &R {
        self.executor.runner()
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    fn emit_event(&self, event: ExecutionEvent) {
        let handlers = self
            .event_handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    /// Execute the entire pipeline
    ///
    /// Steps run one at a time in order. The first step that exits non-zero
    /// (or cannot run) halts the pipeline; every later step is marked skipped.
    pub async fn execute(&self, pipeline: &mut Pipeline) -> Result<(), PipelineError> {
        let execution_id = pipeline.state.execution_id;
        let pipeline_name = pipeline.name.clone();

        info!("Starting pipeline execution: {} ({})", pipeline_name, execution_id);
        pipeline.state.start(pipeline.steps.len());
        self.emit_event(ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name: pipeline_name.clone(),
            total_steps: pipeline.steps.len(),
        });

        let limit = self
            .timeout
            .or(pipeline.timeout_secs.map(Duration::from_secs));

        let result = match limit {
            Some(limit) => match tokio::time::timeout(limit, self.run_steps(pipeline)).await {
                Ok(result) => result,
                Err(_) => {
                    error!("Pipeline {} timed out after {:?}", pipeline_name, limit);
                    let err = PipelineError::Timeout { limit };
                    self.fail_running_steps(pipeline, &err.to_string());
                    Err(err)
                }
            },
            None => self.run_steps(pipeline).await,
        };

        let status = match &result {
            Ok(()) => {
                pipeline.state.complete();
                ExecutionStatus::Completed
            }
            Err(err) => {
                let reason = match err.step_id() {
                    Some(step_id) => format!("halted by failure of '{}'", step_id),
                    None => err.to_string(),
                };
                let skipped = pipeline.skip_pending(&reason);
                if !skipped.is_empty() {
                    self.emit_event(ExecutionEvent::StepsSkipped {
                        step_ids: skipped,
                        reason,
                    });
                }
                pipeline.state.fail();
                ExecutionStatus::Failed
            }
        };
        pipeline.update_counts();

        info!("Pipeline execution finished: {} - {:?}", pipeline_name, status);
        self.emit_event(ExecutionEvent::PipelineCompleted {
            execution_id,
            status,
        });

        result
    }

    async fn run_steps(&self, pipeline: &mut Pipeline) -> Result<(), PipelineError> {
        while let Some(index) = pipeline.next_pending() {
            let step = pipeline.steps[index].clone();
            let context = pipeline.create_context_for_step(&step.id);
            pipeline.steps[index].state = StepState::Running {
                started_at: Utc::now(),
            };

            match &step.kind {
                StepKind::Command(spec) => {
                    let invocation = invocation_for(spec, step.timeout_secs, &context);
                    self.emit_event(ExecutionEvent::StepStarted {
                        step_id: step.id.clone(),
                        name: step.name.clone(),
                        position: index + 1,
                        total: pipeline.steps.len(),
                        command_line: invocation.echo_line(),
                    });

                    let result = self
                        .executor
                        .execute(&step.id, &invocation, self.output_callback.as_deref())
                        .await;

                    match result {
                        ExecutionResult::Success { exit_code } => {
                            self.mark_step_succeeded(pipeline, index, exit_code);
                        }
                        ExecutionResult::Failed { exit_code, output } => {
                            let error = format!("exited with code {}", exit_code);
                            self.mark_step_failed(
                                pipeline,
                                index,
                                Some(exit_code),
                                error,
                                output.clone(),
                            );
                            return Err(PipelineError::StepFailed {
                                step_id: step.id,
                                exit_code,
                                output,
                            });
                        }
                        ExecutionResult::Error { error } => {
                            self.mark_step_failed(
                                pipeline,
                                index,
                                None,
                                error.to_string(),
                                String::new(),
                            );
                            return Err(PipelineError::Runner {
                                step_id: step.id,
                                source: error,
                            });
                        }
                    }
                }
                StepKind::FanOut(fan_out) => {
                    let invocation =
                        invocation_for(&fan_out.discover, step.timeout_secs, &context);
                    self.emit_event(ExecutionEvent::DiscoveryStarted {
                        step_id: step.id.clone(),
                        name: step.name.clone(),
                        command_line: invocation.echo_line(),
                    });

                    match self.executor.discover(&step.id, fan_out, &invocation).await {
                        DiscoveryResult::Found { names, exit_code } => {
                            if names.is_empty() {
                                warn!("Step {} discovered nothing to run", step.id);
                            }
                            let generated = fan_out.expand(&step, &names);
                            self.emit_event(ExecutionEvent::ItemsDiscovered {
                                step_id: step.id.clone(),
                                names,
                            });
                            pipeline.insert_after(index, generated);
                            pipeline.state.total_steps = pipeline.steps.len();
                            self.mark_step_succeeded(pipeline, index, exit_code);
                        }
                        DiscoveryResult::Failed { exit_code, output } => {
                            let error = format!("discovery exited with code {}", exit_code);
                            self.mark_step_failed(
                                pipeline,
                                index,
                                Some(exit_code),
                                error,
                                output.clone(),
                            );
                            return Err(PipelineError::StepFailed {
                                step_id: step.id,
                                exit_code,
                                output,
                            });
                        }
                        DiscoveryResult::Error { error } => {
                            self.mark_step_failed(
                                pipeline,
                                index,
                                None,
                                error.to_string(),
                                String::new(),
                            );
                            return Err(PipelineError::Runner {
                                step_id: step.id,
                                source: error,
                            });
                        }
                    }
                }
            }

            pipeline.update_counts();
        }

        Ok(())
    }

    /// Mark a step as finished successfully
    fn mark_step_succeeded(&self, pipeline: &mut Pipeline, index: usize, exit_code: i32) {
        let step = &mut pipeline.steps[index];
        let started_at = match &step.state {
            StepState::Running { started_at } => *started_at,
            _ => Utc::now(),
        };
        let completed_at = Utc::now();
        step.state = StepState::Succeeded {
            exit_code,
            started_at,
            completed_at,
        };

        self.emit_event(ExecutionEvent::StepCompleted {
            step_id: step.id.clone(),
            exit_code,
            duration_ms: (completed_at - started_at).num_milliseconds(),
        });
    }

    /// Mark a step as failed
    fn mark_step_failed(
        &self,
        pipeline: &mut Pipeline,
        index: usize,
        exit_code: Option<i32>,
        error: String,
        output: String,
    ) {
        let step = &mut pipeline.steps[index];
        let started_at = match &step.state {
            StepState::Running { started_at } => *started_at,
            _ => Utc::now(),
        };
        step.state = StepState::Failed {
            exit_code,
            error: error.clone(),
            output,
            started_at,
            failed_at: Utc::now(),
        };

        self.emit_event(ExecutionEvent::StepFailed {
            step_id: step.id.clone(),
            exit_code,
            error,
        });
    }

    /// Fail whatever step was cut off by the pipeline timeout
    fn fail_running_steps(&self, pipeline: &mut Pipeline, error: &str) {
        let running: Vec<usize> = pipeline
            .steps
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s.state, StepState::Running { .. }))
            .map(|(i, _)| i)
            .collect();

        for index in running {
            self.mark_step_failed(pipeline, index, None, error.to_string(), String::new());
        }
    }
}
