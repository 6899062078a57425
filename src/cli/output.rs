//! CLI output formatting

use crate::{
    core::{ExecutionStatus, Pipeline, StepKind},
    execution::{invocation_for, ExecutionEvent, RunSummary},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;
use console::Emoji;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a spinner shown while a discovery command runs
pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format a duration given in milliseconds
pub fn format_duration(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    if secs < 1 {
        format!("{}ms", ms.max(0))
    } else if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Format an execution event for display
///
/// `StepStarted` renders as the command echo; the step header is printed
/// separately by the terminal reporter.
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name,
            total_steps,
        } => format!(
            "{} Running pipeline {} ({} steps, {})",
            ROCKET,
            style(pipeline_name).bold(),
            total_steps,
            style(&execution_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::StepStarted { command_line, .. } => {
            style(command_line).dim().to_string()
        }
        ExecutionEvent::DiscoveryStarted { command_line, .. } => {
            style(command_line).dim().to_string()
        }
        ExecutionEvent::ItemsDiscovered { step_id, names } => {
            if names.is_empty() {
                format!("{} {}: nothing discovered", WARN, style(step_id).yellow())
            } else {
                format!(
                    "{} {}: discovered {} ({})",
                    INFO,
                    style(step_id).cyan(),
                    names.len(),
                    names.join(", ")
                )
            }
        }
        ExecutionEvent::StepCompleted {
            step_id,
            duration_ms,
            ..
        } => format!(
            "{} {} {}",
            CHECK,
            style(step_id).green(),
            style(format_duration(*duration_ms)).dim()
        ),
        ExecutionEvent::StepFailed { step_id, error, .. } => {
            format!("{} {}: {}", CROSS, style(step_id).red(), style(error).dim())
        }
        ExecutionEvent::StepsSkipped { step_ids, reason } => format!(
            "{} Skipped {} step(s) ({})",
            WARN,
            step_ids.len(),
            style(reason).dim()
        ),
        ExecutionEvent::PipelineCompleted {
            execution_id,
            status,
        } => format!(
            "{} Pipeline ({}) {}",
            INFO,
            style(&execution_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Format the per-step table of a finished run
pub fn format_run_summary(summary: &RunSummary) -> String {
    let width = summary
        .steps
        .iter()
        .map(|s| s.id.len())
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(summary.steps.len() + 1);
    lines.push(format!(
        "{} {} - {} ({}/{})",
        INFO,
        style(&summary.pipeline_name).bold(),
        format_status(summary.status),
        summary.completed_steps,
        summary.total_steps
    ));

    for step in &summary.steps {
        let status = match step.status.as_str() {
            "succeeded" => style("ok").green().to_string(),
            "failed" => match step.exit_code {
                Some(code) => style(format!("failed ({})", code)).red().to_string(),
                None => style("failed").red().to_string(),
            },
            other => style(other).dim().to_string(),
        };
        let duration = step
            .duration_ms
            .map(|ms| style(format_duration(ms)).dim().to_string())
            .unwrap_or_default();
        lines.push(format!("  {:<width$}  {} {}", step.id, status, duration, width = width));
    }

    lines.join("\n")
}

/// The commands a pipeline would run, without running them
///
/// Fan-out steps show their discovery command and the per-item template.
pub fn plan_lines(pipeline: &Pipeline) -> Vec<String> {
    let mut lines = Vec::new();

    for (index, step) in pipeline.steps.iter().enumerate() {
        let context = pipeline.create_context_for_step(&step.id);
        lines.push(format!("[{}] {}", index + 1, step.name));

        match &step.kind {
            StepKind::Command(spec) => {
                lines.push(invocation_for(spec, step.timeout_secs, &context).echo_line());
            }
            StepKind::FanOut(fan_out) => {
                lines.push(
                    invocation_for(&fan_out.discover, step.timeout_secs, &context).echo_line(),
                );
                lines.push(format!(
                    "  for each {} in {}:",
                    fan_out.bind,
                    fan_out.filter.display()
                ));
                lines.push(format!(
                    "  {}",
                    invocation_for(&fan_out.template, fan_out.template_timeout_secs, &context)
                        .echo_line()
                ));
            }
        }
    }

    lines
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let shown = lines[lines.len() - max_lines..].join("\n");
        format!(
            "{}... ({} earlier lines)\n{}",
            style("[truncated]").dim(),
            lines.len() - max_lines,
            shown
        )
    }
}
