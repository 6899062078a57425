//! Streaming support for child process output
//!
//! While a step runs, each line the child writes is delivered to an
//! [`OutputCallback`] as soon as it is read, so the operator sees tool output
//! live while the runner keeps its own copy for failure reports.
//!
//! # Example
//!
//! ```
//! use checkrun::runner::{OutputCallback, OutputLine};
//!
//! struct Printer;
//!
//! impl OutputCallback for Printer {
//!     fn on_line(&self, line: &OutputLine) {
//!         match line {
//!             OutputLine::Stdout(text) => println!("{}", text),
//!             OutputLine::Stderr(text) => eprintln!("{}", text),
//!         }
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};

/// One line of child output, tagged with the stream it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

impl OutputLine {
    /// Line text without the stream tag
    pub fn text(&self) -> &str {
        match self {
            OutputLine::Stdout(text) | OutputLine::Stderr(text) => text,
        }
    }

    pub fn is_stderr(&self) -> bool {
        matches!(self, OutputLine::Stderr(_))
    }
}

/// Callback for processing output lines as they arrive
///
/// This trait is object-safe and can be used as `&dyn OutputCallback`.
pub trait OutputCallback: Send + Sync {
    /// Called for every line read from the child's stdout or stderr
    fn on_line(&self, line: &OutputLine);
}
