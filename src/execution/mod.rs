//! Pipeline execution engine

pub mod engine;
pub mod error;
pub mod executor;
pub mod summary;

pub use engine::{EventHandler, ExecutionEngine, ExecutionEvent};
pub use error::PipelineError;
pub use executor::{invocation_for, DiscoveryResult, ExecutionResult, StepExecutor};
pub use summary::{create_summary, RunSummary, StepSummary};
