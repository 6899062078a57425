//! Line filters used by fan-out discovery

use crate::core::config::FilterConfig;
use regex::Regex;

/// Pattern selecting which lines of a discovery command's output name an item
/// (not serializable due to Regex)
#[derive(Debug, Clone)]
pub enum LineFilter {
    /// Line starts with the given prefix
    Prefix(String),
    /// Line matches the regular expression anywhere
    Regex(Regex),
}

impl LineFilter {
    /// Build a filter from its YAML configuration
    pub fn from_config(config: &FilterConfig) -> Result<Self, regex::Error> {
        if config.use_regex {
            Ok(LineFilter::Regex(Regex::new(&config.prefix)?))
        } else {
            Ok(LineFilter::Prefix(config.prefix.clone()))
        }
    }

    /// Check if a single line is selected by this filter
    pub fn matches(&self, line: &str) -> bool {
        match self {
            LineFilter::Prefix(prefix) => line.starts_with(prefix.as_str()),
            LineFilter::Regex(regex) => regex.is_match(line),
        }
    }

    /// Extract item names from command output
    ///
    /// Selected lines are trimmed; blank results and repeats are dropped while
    /// keeping first-seen order.
    pub fn extract(&self, output: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for line in output.lines() {
            if !self.matches(line) {
                continue;
            }
            let name = line.trim();
            if name.is_empty() || names.iter().any(|n| n == name) {
                continue;
            }
            names.push(name.to_string());
        }
        names
    }

    /// Human-readable form for dry runs and logs
    pub fn display(&self) -> String {
        match self {
            LineFilter::Prefix(p) => format!("lines starting with {:?}", p),
            LineFilter::Regex(r) => format!("[regex: {}]", r.as_str()),
        }
    }
}
