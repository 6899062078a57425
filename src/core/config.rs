//! Pipeline configuration from YAML

use crate::core::{condition::LineFilter, context::placeholders, Pipeline};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Optional pipeline description
    #[serde(default)]
    pub description: Option<String>,

    /// Environment overrides applied to every step
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Variables substituted into `{{ name }}` placeholders
    #[serde(default)]
    variables: HashMap<String, Value>,

    /// Wall-clock limit for the whole pipeline (in seconds)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Pipeline steps, run in declaration order
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// Step configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Unique step identifier
    pub id: String,

    /// Human-readable step name (defaults to the id)
    #[serde(default)]
    pub name: Option<String>,

    /// Optional step description
    #[serde(default)]
    pub description: Option<String>,

    /// Executable to invoke
    #[serde(default)]
    pub run: Option<String>,

    /// Arguments passed to the executable
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment overrides for this step (win over pipeline env)
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Timeout for this step (in seconds)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Discover items and run a templated command once per item
    #[serde(default)]
    pub fan_out: Option<FanOutConfig>,
}

/// Discover-then-fan-out configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanOutConfig {
    /// Command whose output lists the items
    pub discover: DiscoverConfig,

    /// Which output lines name an item
    pub filter: FilterConfig,

    /// Placeholder name the item is bound to inside `step`
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Command template run once per discovered item
    pub step: TemplateConfig,
}

/// Discovery command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverConfig {
    /// Executable to invoke
    pub run: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Scan stderr as well as stdout
    #[serde(default)]
    pub merge_stderr: bool,

    /// Keep going when discovery itself exits non-zero
    #[serde(default)]
    pub ignore_exit_status: bool,
}

/// Line filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Required line prefix, or a regex when `use_regex` is set
    pub prefix: String,

    /// Whether to use regex pattern matching
    #[serde(default)]
    pub use_regex: bool,
}

/// Templated command generated for each discovered item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Executable to invoke
    pub run: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Timeout for each generated step (in seconds)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_bind() -> String {
    "item".to_string()
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Pipeline name must not be empty");
        }

        let mut seen_ids = HashSet::new();
        for step in &self.steps {
            if step.id.trim().is_empty() {
                anyhow::bail!("Step IDs must not be empty");
            }
            // Generated fan-out steps are named `<id>:<item>`
            if step.id.contains(':') {
                anyhow::bail!("Step ID '{}' must not contain ':'", step.id);
            }
            if !seen_ids.insert(&step.id) {
                anyhow::bail!("Duplicate step ID: {}", step.id);
            }
        }

        let mut defined: HashSet<String> = self.variables.keys().cloned().collect();
        defined.insert("current_step".to_string());

        for step in &self.steps {
            match (&step.run, &step.fan_out) {
                (Some(_), Some(_)) => anyhow::bail!(
                    "Step '{}' must define either 'run' or 'fan_out', not both",
                    step.id
                ),
                (None, None) => {
                    anyhow::bail!("Step '{}' must define 'run' or 'fan_out'", step.id)
                }
                (Some(run), None) => {
                    if run.trim().is_empty() {
                        anyhow::bail!("Step '{}' has an empty 'run' command", step.id);
                    }
                    check_placeholders(&step.id, run, &step.args, &step.env, &defined)?;
                }
                (None, Some(fan_out)) => {
                    if fan_out.discover.run.trim().is_empty() {
                        anyhow::bail!("Step '{}' has an empty discovery command", step.id);
                    }
                    if fan_out.step.run.trim().is_empty() {
                        anyhow::bail!("Step '{}' has an empty fan-out step command", step.id);
                    }
                    if fan_out.bind.trim().is_empty() {
                        anyhow::bail!("Step '{}' has an empty fan-out 'bind' name", step.id);
                    }
                    if let Err(e) = LineFilter::from_config(&fan_out.filter) {
                        anyhow::bail!("Step '{}' has an invalid filter regex: {}", step.id, e);
                    }
                    check_placeholders(
                        &step.id,
                        &fan_out.discover.run,
                        &fan_out.discover.args,
                        &fan_out.discover.env,
                        &defined,
                    )?;

                    let mut with_bind = defined.clone();
                    with_bind.insert(fan_out.bind.clone());
                    check_placeholders(
                        &step.id,
                        &fan_out.step.run,
                        &fan_out.step.args,
                        &fan_out.step.env,
                        &with_bind,
                    )?;
                }
            }
        }

        Ok(())
    }

    /// Get variables as string map
    pub fn variables_as_string_map(&self) -> HashMap<String, String> {
        self.variables
            .iter()
            .map(|(key, value)| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    Value::Null => String::new(),
                    // Fallback: serialize nested values as YAML
                    other => serde_yaml::to_string(other)
                        .unwrap_or_default()
                        .trim_end()
                        .to_string(),
                };
                (key.clone(), rendered)
            })
            .collect()
    }

    /// Convert config to a Pipeline domain model
    pub fn to_pipeline(&self) -> Result<Pipeline> {
        Pipeline::from_config(self)
    }
}

fn check_placeholders(
    step_id: &str,
    run: &str,
    args: &[String],
    env: &BTreeMap<String, String>,
    defined: &HashSet<String>,
) -> Result<()> {
    let texts = std::iter::once(run)
        .chain(args.iter().map(String::as_str))
        .chain(env.values().map(String::as_str));

    for text in texts {
        for name in placeholders(text) {
            if !defined.contains(&name) {
                anyhow::bail!(
                    "Step '{}' references undefined variable '{}'",
                    step_id,
                    name
                );
            }
        }
    }
    Ok(())
}
