//! checkrun - A fail-fast CI pipeline runner for Rust projects

pub mod cli;
pub mod core;
pub mod execution;
pub mod runner;

// Re-export commonly used types
pub use core::{ExecutionStatus, Pipeline, PipelineContext, Profile, Step, StepState};
pub use execution::{create_summary, ExecutionEngine, ExecutionEvent, PipelineError, RunSummary};
pub use runner::{CommandRunner, Invocation, OutputCallback, OutputLine, ProcessRunner};
