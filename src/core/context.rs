//! Pipeline context - variables and environment shared by all steps

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.-]*)\s*\}\}").expect("placeholder regex is valid")
    })
}

/// Names of all `{{ name }}` placeholders in `text`, in order of appearance
pub fn placeholders(text: &str) -> Vec<String> {
    placeholder_regex()
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Replace `{{ name }}` placeholders with values from `variables`
///
/// Unknown placeholders are left untouched.
pub fn render(text: &str, variables: &HashMap<String, String>) -> String {
    placeholder_regex()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            variables
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Execution context for one step
///
/// Contains the pipeline variables and the pipeline-level environment overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineContext {
    /// Global and user-defined variables
    pub variables: HashMap<String, String>,

    /// Pipeline-level environment overrides
    pub env: BTreeMap<String, String>,

    /// Overrides from the command line, applied after step env
    pub env_overrides: BTreeMap<String, String>,

    /// The current step being executed (if any)
    pub current_step_id: Option<String>,
}

impl PipelineContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable
    pub fn set_variable(&mut self, key: String, value: String) {
        self.variables.insert(key, value);
    }

    /// Get a variable
    pub fn get_variable(&self, key: &str) -> Option<&String> {
        self.variables.get(key)
    }

    /// Render a template against this context's variables
    pub fn render(&self, text: &str) -> String {
        render(text, &self.get_rendering_variables())
    }

    /// Render every argument
    pub fn render_args(&self, args: &[String]) -> Vec<String> {
        let vars = self.get_rendering_variables();
        args.iter().map(|arg| render(arg, &vars)).collect()
    }

    /// Merge pipeline env, a step's own env and the command-line overrides
    ///
    /// Later layers win: step env over pipeline env, command-line overrides
    /// over both.
    pub fn effective_env(&self, step_env: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let vars = self.get_rendering_variables();
        self.env
            .iter()
            .chain(step_env.iter())
            .chain(self.env_overrides.iter())
            .map(|(key, value)| (key.clone(), render(value, &vars)))
            .collect()
    }

    /// Get all variables available for rendering
    pub fn get_rendering_variables(&self) -> HashMap<String, String> {
        let mut vars = self.variables.clone();
        if let Some(ref current_step) = self.current_step_id {
            vars.insert("current_step".to_string(), current_step.clone());
        }
        vars
    }
}
