//! Discover-then-fan-out: enumerate names from a command's output, then
//! generate one templated step per name.

use crate::core::{
    condition::LineFilter,
    step::{CommandSpec, Step, StepKind},
    state::StepState,
};
use std::collections::HashMap;

/// Fan-out definition attached to a step
#[derive(Debug, Clone)]
pub struct FanOut {
    /// Command whose output lists the items
    pub discover: CommandSpec,

    /// Scan stderr as well as stdout
    pub merge_stderr: bool,

    /// Keep going when discovery exits non-zero
    pub ignore_exit_status: bool,

    /// Which output lines name an item
    pub filter: LineFilter,

    /// Placeholder the item is bound to inside `template`
    pub bind: String,

    /// Command run once per item
    pub template: CommandSpec,

    /// Timeout for each generated step
    pub template_timeout_secs: Option<u64>,
}

impl FanOut {
    pub fn new(discover: CommandSpec, filter: LineFilter, template: CommandSpec) -> Self {
        Self {
            discover,
            merge_stderr: false,
            ignore_exit_status: false,
            filter,
            bind: "item".to_string(),
            template,
            template_timeout_secs: None,
        }
    }

    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    pub fn merge_stderr(mut self, merge: bool) -> Self {
        self.merge_stderr = merge;
        self
    }

    pub fn ignore_exit_status(mut self, ignore: bool) -> Self {
        self.ignore_exit_status = ignore;
        self
    }

    /// Names selected from discovery output
    pub fn discover_names(&self, output: &str) -> Vec<String> {
        self.filter.extract(output)
    }

    /// Generate one command step per name
    ///
    /// The template is kept as written and the name is bound as a step-local
    /// placeholder, so it is rendered together with the pipeline variables in
    /// one pass and never expanded twice.
    pub fn expand(&self, parent: &Step, names: &[String]) -> Vec<Step> {
        names
            .iter()
            .map(|name| {
                let mut bindings = HashMap::new();
                bindings.insert(self.bind.clone(), name.clone());

                Step {
                    id: format!("{}:{}", parent.id, name),
                    name: format!("{} ({})", parent.name, name),
                    kind: StepKind::Command(self.template.clone()),
                    timeout_secs: self.template_timeout_secs,
                    bindings,
                    state: StepState::Pending,
                }
            })
            .collect()
    }
}
