use anyhow::{bail, Context, Result};
use checkrun::cli::commands::{ListCommand, RunCommand, ValidateCommand};
use checkrun::cli::output::*;
use checkrun::cli::terminal_output::{TerminalOutput, TerminalReporter};
use checkrun::cli::{Cli, Command};
use checkrun::core::Profile;
use checkrun::execution::{create_summary, ExecutionEngine, PipelineError};
use checkrun::runner::{ProcessRunner, RunnerConfig};
use std::sync::Arc;
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Lines of failure output shown when child output was not echoed
const QUIET_FAILURE_LINES: usize = 20;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match cli.command() {
        Command::Run(cmd) => run_pipeline(&cmd, cli.quiet).await?,
        Command::Validate(cmd) => validate_pipeline(&cmd)?,
        Command::List(cmd) => list_steps(&cmd)?,
        Command::Profiles => list_profiles()?,
    }

    Ok(())
}

async fn run_pipeline(cmd: &RunCommand, quiet: bool) -> Result<()> {
    let config = cmd.source.load()?;
    let mut pipeline = config.to_pipeline()?;

    // Apply overrides
    for (key, value) in &cmd.variables {
        debug!("Variable override: {} = {}", key, value);
        pipeline.variables.insert(key.clone(), value.clone());
    }
    for (key, value) in &cmd.env {
        debug!("Environment override: {}={}", key, value);
        pipeline.env_overrides.insert(key.clone(), value.clone());
    }
    if let Some(secs) = cmd.timeout_secs {
        pipeline.timeout_secs = Some(secs);
    }

    if cmd.dry_run {
        for line in plan_lines(&pipeline) {
            println!("{}", line);
        }
        return Ok(());
    }

    let mut runner_config = RunnerConfig::new();
    if let Some(dir) = &cmd.dir {
        if !dir.is_dir() {
            bail!("Working directory {} does not exist", dir.display());
        }
        runner_config = runner_config.with_working_dir(dir);
    }

    // With --json, stdout carries only the summary
    let engine = ExecutionEngine::new(ProcessRunner::new(runner_config))
        .with_output_callback(Arc::new(TerminalOutput::new(quiet, cmd.json)));
    let reporter = Arc::new(TerminalReporter::new(cmd.json));
    let handler = reporter.clone();
    engine.add_event_handler(move |event| handler.on_event(&event));

    let result = engine.execute(&mut pipeline).await;
    let summary = create_summary(&pipeline);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("\n{}", format_run_summary(&summary));
    }

    match result {
        Ok(()) => {
            report(
                cmd.json,
                &format!(
                    "\n{} {} completed {}",
                    CHECK,
                    style(&pipeline.name).bold(),
                    style("successfully").green()
                ),
            );
            Ok(())
        }
        Err(err) => {
            if let PipelineError::StepFailed { output, .. } = &err {
                if quiet && !output.is_empty() {
                    report(cmd.json, &format_output(output, QUIET_FAILURE_LINES));
                }
            }
            report(
                cmd.json,
                &format!(
                    "\n{} {} {}: {}",
                    CROSS,
                    style(&pipeline.name).bold(),
                    style("failed").red(),
                    err
                ),
            );
            error!("{}", err);
            std::process::exit(err.exit_code());
        }
    }
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    if !cmd.json {
        println!("{} Validating pipeline...", INFO);
    }

    match cmd.source.load() {
        Ok(config) => {
            let fan_outs = config.steps.iter().filter(|s| s.fan_out.is_some()).count();
            let variables = config.variables_as_string_map();

            if cmd.json {
                let data = serde_json::json!({
                    "valid": true,
                    "name": config.name,
                    "steps": config.steps.len(),
                    "fan_outs": fan_outs,
                    "variables": variables,
                });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{} Pipeline configuration is valid!", CHECK);
                println!("  Name: {}", style(&config.name).bold());
                println!("  Steps: {}", style(config.steps.len()).cyan());
                println!("  Fan-outs: {}", style(fan_outs).cyan());
                println!("  Variables: {}", style(variables.len()).cyan());
            }
            Ok(())
        }
        Err(e) => {
            if cmd.json {
                let data = serde_json::json!({
                    "valid": false,
                    "error": format!("{:#}", e),
                });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{} Validation failed:", CROSS);
                println!("  {}", style(format!("{:#}", e)).red());
            }
            std::process::exit(1);
        }
    }
}

fn list_steps(cmd: &ListCommand) -> Result<()> {
    let config = cmd.source.load()?;

    println!("{} {}", INFO, style(&config.name).bold());
    if let Some(description) = &config.description {
        println!("  {}", style(description).dim());
    }
    println!();

    for line in plan_lines(&config.to_pipeline()?) {
        println!("{}", line);
    }

    Ok(())
}

fn list_profiles() -> Result<()> {
    println!("{} Built-in profiles:", INFO);

    for profile in Profile::ALL {
        let config = profile.load()?;
        let marker = if profile == Profile::default() {
            style(" (default)").dim().to_string()
        } else {
            String::new()
        };
        println!(
            "  {}{} - {} ({} steps)",
            style(profile).bold(),
            marker,
            config.description.as_deref().unwrap_or(&config.name),
            config.steps.len()
        );
    }

    Ok(())
}

/// Print a status line where it will not mix with the JSON summary
fn report(json: bool, text: &str) {
    if json {
        eprintln!("{}", text);
    } else {
        println!("{}", text);
    }
}
