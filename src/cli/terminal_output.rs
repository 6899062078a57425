//! Terminal output for pipeline runs
//!
//! [`TerminalOutput`] forwards child output lines to the terminal as they
//! arrive, and [`TerminalReporter`] turns execution events into step
//! headers, command echo lines and results:
//!
//! ```text
//! [3 / 11] format-check
//! + RUST_BACKTRACE=1 cargo fmt --check
//! ...tool output...
//! ✅ format-check 2s
//! ```
//!
//! With `--json` the stdout stream is reserved for the run summary, so both
//! write everything to stderr instead.

use crate::cli::output::{create_spinner, format_execution_event, style, SPINNER};
use crate::execution::ExecutionEvent;
use crate::runner::{OutputCallback, OutputLine};
use indicatif::ProgressBar;
use std::io::{self, Write};
use std::sync::Mutex;

/// Callback that echoes child output lines to the terminal
#[derive(Debug, Clone, Default)]
pub struct TerminalOutput {
    quiet: bool,
    stderr_only: bool,
}

impl TerminalOutput {
    /// Create a new terminal output callback
    ///
    /// * `quiet` - drop child output instead of echoing it
    /// * `stderr_only` - send child stdout to stderr too
    pub fn new(quiet: bool, stderr_only: bool) -> Self {
        Self { quiet, stderr_only }
    }
}

impl OutputCallback for TerminalOutput {
    fn on_line(&self, line: &OutputLine) {
        if self.quiet {
            return;
        }

        match line {
            OutputLine::Stdout(text) if !self.stderr_only => {
                let mut stdout = io::stdout().lock();
                let _ = writeln!(stdout, "{}", text);
                let _ = stdout.flush();
            }
            _ => {
                let _ = writeln!(io::stderr().lock(), "{}", line.text());
            }
        }
    }
}

/// Prints execution events as they happen
#[derive(Default)]
pub struct TerminalReporter {
    stderr_only: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl TerminalReporter {
    pub fn new(stderr_only: bool) -> Self {
        Self {
            stderr_only,
            spinner: Mutex::new(None),
        }
    }

    /// Handle one execution event
    pub fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::StepStarted {
                name,
                position,
                total,
                ..
            } => {
                self.print_separator();
                self.print_step_header(*position, *total, name);
                self.print(&format_execution_event(event));
            }
            ExecutionEvent::DiscoveryStarted { name, .. } => {
                self.print_separator();
                self.print(&format_execution_event(event));
                self.start_spinner(format!("{}Discovering items for {}", SPINNER, name));
            }
            ExecutionEvent::ItemsDiscovered { .. } => {
                self.stop_spinner();
                self.print(&format_execution_event(event));
            }
            ExecutionEvent::StepFailed { .. } => {
                self.stop_spinner();
                self.print(&format_execution_event(event));
            }
            ExecutionEvent::PipelineStarted { .. }
            | ExecutionEvent::StepCompleted { .. }
            | ExecutionEvent::StepsSkipped { .. } => {
                self.print(&format_execution_event(event));
            }
            // The final status line is printed by the caller
            ExecutionEvent::PipelineCompleted { .. } => {
                self.stop_spinner();
            }
        }
    }

    /// Print a step header
    ///
    /// Format: `[N / M] Step Name`
    fn print_step_header(&self, position: usize, total: usize, name: &str) {
        self.print(&format!(
            "[{} / {}] {}",
            style(position).cyan(),
            style(total).dim(),
            style(name).bold()
        ));
    }

    /// Print a horizontal rule spanning the terminal width
    fn print_separator(&self) {
        let width = term_size::dimensions_stdout()
            .map(|(w, _)| w)
            .unwrap_or(80);
        self.print(&style("─".repeat(width)).dim().to_string());
    }

    fn print(&self, text: &str) {
        if self.stderr_only {
            let _ = writeln!(io::stderr().lock(), "{}", text);
        } else {
            let mut stdout = io::stdout().lock();
            let _ = writeln!(stdout, "{}", text);
            let _ = stdout.flush();
        }
    }

    fn start_spinner(&self, message: String) {
        let mut spinner = self
            .spinner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = spinner.take() {
            previous.finish_and_clear();
        }
        *spinner = Some(create_spinner(message));
    }

    fn stop_spinner(&self) {
        let mut spinner = self
            .spinner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(spinner) = spinner.take() {
            spinner.finish_and_clear();
        }
    }
}
