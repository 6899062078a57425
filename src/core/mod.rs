//! Core domain models for checkrun
//!
//! This module defines the data structures that represent pipelines, steps,
//! fan-outs and their configuration.

pub mod condition;
pub mod config;
pub mod context;
pub mod fanout;
pub mod pipeline;
pub mod profiles;
pub mod state;
pub mod step;

pub use condition::LineFilter;
pub use context::PipelineContext;
pub use fanout::FanOut;
pub use pipeline::Pipeline;
pub use profiles::Profile;
pub use state::{ExecutionStatus, PipelineState, StepState};
pub use step::{CommandSpec, Step, StepKind};
