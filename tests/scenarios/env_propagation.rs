//! Test: Environment Propagation - overrides reach every invoked step

use crate::helpers::*;
use checkrun::core::Profile;
use checkrun::runner::CommandOutput;

/// Pipeline-level overrides are observed by every step, generated ones included
#[tokio::test]
async fn test_pipeline_env_reaches_every_step() {
    let yaml = r#"
name: "Test: Environment"

env:
  RUST_BACKTRACE: "1"

steps:
  - id: "test"
    run: cargo
    args: [test]

  - id: "examples"
    fan_out:
      discover:
        run: cargo
        args: [run, --example]
      filter:
        prefix: " "
      step:
        run: cargo
        args: [run, --example, "{{ item }}"]

  - id: "release"
    run: cargo
    args: [test, -r]
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let runner = MockRunner::new().outputs(
        "cargo run --example",
        CommandOutput::new(0).with_stdout("Available examples:\n    hello\n    world"),
    );

    let result = run_pipeline_with_runner(&mut pipeline, runner).await;

    assert_pipeline_completed(&result);
    assert_eq!(result.invocations.len(), 5);
    for invocation in &result.invocations {
        assert_eq!(
            invocation.env.get("RUST_BACKTRACE").map(String::as_str),
            Some("1"),
            "{} did not see RUST_BACKTRACE",
            command_line(invocation)
        );
    }
}

/// Step overrides win over pipeline overrides for that step only
#[tokio::test]
async fn test_step_env_overrides_pipeline_env() {
    let yaml = r#"
name: "Test: Step Override"

env:
  RUST_BACKTRACE: "1"
  MIRIFLAGS: "-Zmiri-backtrace=1"

steps:
  - id: "miri"
    run: cargo
    args: [miri, test]
    env:
      MIRIFLAGS: "-Zmiri-backtrace=full"

  - id: "test"
    run: cargo
    args: [test]
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let result = run_pipeline_with_runner(&mut pipeline, MockRunner::new()).await;

    assert_pipeline_completed(&result);
    let miri = &result.invocations[0];
    assert_eq!(miri.env["MIRIFLAGS"], "-Zmiri-backtrace=full");
    assert_eq!(miri.env["RUST_BACKTRACE"], "1");

    let test = &result.invocations[1];
    assert_eq!(test.env["MIRIFLAGS"], "-Zmiri-backtrace=1");
}

/// Variables render into args and env values
#[tokio::test]
async fn test_variables_render_into_args_and_env() {
    let yaml = r#"
name: "Test: Variables"

variables:
  toolchain: nightly
  depth: 3

steps:
  - id: "miri"
    run: cargo
    args: ["+{{ toolchain }}", miri, test]
    env:
      NOTE: "step {{ current_step }} at depth {{depth}}"
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let result = run_pipeline_with_runner(&mut pipeline, MockRunner::new()).await;

    assert_pipeline_completed(&result);
    assert_invoked(&result, &["cargo +nightly miri test"]);
    assert_eq!(result.invocations[0].env["NOTE"], "step miri at depth 3");
}

/// Overrides added after loading are applied like declared ones
#[tokio::test]
async fn test_overrides_applied_after_load() {
    let yaml = r#"
name: "Test: Late Overrides"

variables:
  toolchain: nightly

steps:
  - id: "install"
    run: rustup
    args: [toolchain, install, "{{ toolchain }}"]
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    pipeline
        .variables
        .insert("toolchain".to_string(), "nightly-2024-06-01".to_string());
    pipeline
        .env
        .insert("RUSTUP_TOOLCHAIN".to_string(), "stable".to_string());

    let result = run_pipeline_with_runner(&mut pipeline, MockRunner::new()).await;

    assert_invoked(&result, &["rustup toolchain install nightly-2024-06-01"]);
    assert_eq!(result.invocations[0].env["RUSTUP_TOOLCHAIN"], "stable");
}

/// Command-line overrides win over the step env of the built-in Miri steps
#[tokio::test]
async fn test_command_line_env_reaches_miri_steps() {
    let mut pipeline = Profile::Standard
        .load()
        .expect("standard profile loads")
        .to_pipeline()
        .expect("standard profile builds")
        .with_env_override("MIRIFLAGS", "-Zmiri-backtrace=short");

    let result = run_pipeline_with_runner(&mut pipeline, MockRunner::new()).await;

    assert_pipeline_completed(&result);
    let miri: Vec<_> = result
        .invocations
        .iter()
        .filter(|i| i.program == "cargo" && i.args.iter().any(|a| a == "miri"))
        .collect();
    assert_eq!(miri.len(), 2);
    for invocation in miri {
        assert_eq!(invocation.env["MIRIFLAGS"], "-Zmiri-backtrace=short");
        assert_eq!(invocation.env["RUST_BACKTRACE"], "1");
    }
}
