//! Test: Fan-Out - discover names, then run one step per name

use crate::helpers::*;
use checkrun::core::StepKind;
use checkrun::runner::CommandOutput;

fn fan_out_pipeline(discover_flags: &str) -> checkrun::core::Pipeline {
    let yaml = format!(
        r#"
name: "Test: Fan-Out"

steps:
  - id: "build"
    run: cargo
    args: [build]

  - id: "examples"
    name: "Example"
    fan_out:
      discover:
        run: list-examples
        {}
      filter:
        prefix: " "
      bind: example
      step:
        run: run-example
        args: ["{{{{ example }}}}"]

  - id: "release"
    run: cargo
    args: [test, -r]
"#,
        discover_flags
    );
    pipeline_from_yaml(&yaml)
}

/// Only indented lines name items; generated steps run in order, right
/// after the fan-out and before the next declared step
#[tokio::test]
async fn test_prefix_selects_indented_names() {
    let mut pipeline = fan_out_pipeline("");
    let runner = MockRunner::new().outputs(
        "list-examples",
        CommandOutput::new(0).with_stdout("  foo\n  bar\nbaz\n"),
    );

    let result = run_pipeline_with_runner(&mut pipeline, runner).await;

    assert_pipeline_completed(&result);
    assert_invoked(
        &result,
        &[
            "cargo build",
            "list-examples",
            "run-example foo",
            "run-example bar",
            "cargo test -r",
        ],
    );
    assert_eq!(
        result.step_ids(),
        vec!["build", "examples", "examples:foo", "examples:bar", "release"]
    );
    assert_eq!(result.pipeline.step("examples:foo").unwrap().name, "Example (foo)");
    assert_eq!(result.pipeline.state.total_steps, 5);
}

/// Discovery that finds nothing generates nothing and the run continues
#[tokio::test]
async fn test_zero_names_continues() {
    let mut pipeline = fan_out_pipeline("");
    let runner = MockRunner::new().outputs(
        "list-examples",
        CommandOutput::new(0).with_stdout("no examples here\n"),
    );

    let result = run_pipeline_with_runner(&mut pipeline, runner).await;

    assert_pipeline_completed(&result);
    assert_invoked(&result, &["cargo build", "list-examples", "cargo test -r"]);
    assert_step_succeeded(&result, "examples");
}

/// A generated step that fails halts the pipeline like any other step
#[tokio::test]
async fn test_generated_step_failure_halts() {
    let mut pipeline = fan_out_pipeline("");
    let runner = MockRunner::new()
        .outputs(
            "list-examples",
            CommandOutput::new(0).with_stdout("  foo\n  bar\n  baz\n"),
        )
        .exits("run-example bar", 1);

    let result = run_pipeline_with_runner(&mut pipeline, runner).await;

    assert_pipeline_failed(&result);
    assert_eq!(result.exit_code(), 1);
    assert_step_succeeded(&result, "examples:foo");
    assert_step_failed(&result, "examples:bar", Some(1));
    assert_step_skipped(&result, "examples:baz");
    assert_step_skipped(&result, "release");
    assert_eq!(result.invocations.len(), 4);
}

/// Discovery exiting non-zero fails the pipeline unless ignored
#[tokio::test]
async fn test_discovery_failure_halts() {
    let mut pipeline = fan_out_pipeline("");
    let runner = MockRunner::new().outputs(
        "list-examples",
        CommandOutput::new(101).with_stdout("  foo\n"),
    );

    let result = run_pipeline_with_runner(&mut pipeline, runner).await;

    assert_pipeline_failed(&result);
    assert_eq!(result.exit_code(), 101);
    assert_step_failed(&result, "examples", Some(101));
    assert_invoked(&result, &["cargo build", "list-examples"]);
}

/// Listings printed on stderr by a command that exits non-zero still work
/// with `merge_stderr` and `ignore_exit_status`
#[tokio::test]
async fn test_stderr_listing_with_ignored_exit_status() {
    let mut pipeline = fan_out_pipeline("merge_stderr: true\n        ignore_exit_status: true");
    let runner = MockRunner::new().outputs(
        "list-examples",
        CommandOutput::new(101).with_stderr(concat!(
            "error: \"--example\" takes one argument.\n",
            "Available examples:\n",
            "    first\n",
            "    second\n",
        )),
    );

    let result = run_pipeline_with_runner(&mut pipeline, runner).await;

    assert_pipeline_completed(&result);
    assert_invoked(
        &result,
        &[
            "cargo build",
            "list-examples",
            "run-example first",
            "run-example second",
            "cargo test -r",
        ],
    );
}

/// Generated steps are plain command steps with the name bound
#[tokio::test]
async fn test_generated_steps_are_commands() {
    let mut pipeline = fan_out_pipeline("");
    let runner = MockRunner::new().outputs(
        "list-examples",
        CommandOutput::new(0).with_stdout("  foo\n  foo\n"),
    );

    let result = run_pipeline_with_runner(&mut pipeline, runner).await;

    assert_pipeline_completed(&result);
    let generated: Vec<_> = result
        .pipeline
        .steps
        .iter()
        .filter(|s| s.id.starts_with("examples:"))
        .collect();
    assert_eq!(generated.len(), 1);
    assert_eq!(generated[0].bindings["example"], "foo");
    match &generated[0].kind {
        StepKind::Command(spec) => assert_eq!(spec.args, vec!["{{ example }}"]),
        other => panic!("expected a command step, got {:?}", other),
    }
}

/// Discovered names are passed through literally, even if they look like
/// placeholders
#[tokio::test]
async fn test_discovered_names_are_not_rendered_again() {
    let yaml = r#"
name: "Test: Literal Names"

variables:
  toolchain: nightly

steps:
  - id: "examples"
    fan_out:
      discover:
        run: list-examples
      filter:
        prefix: " "
      bind: example
      step:
        run: cargo
        args: ["+{{ toolchain }}", run, --example, "{{ example }}"]
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let runner = MockRunner::new().outputs(
        "list-examples",
        CommandOutput::new(0).with_stdout("  plain\n  odd{{ toolchain }}\n"),
    );

    let result = run_pipeline_with_runner(&mut pipeline, runner).await;

    assert_pipeline_completed(&result);
    assert_invoked(
        &result,
        &[
            "list-examples",
            "cargo +nightly run --example plain",
            "cargo +nightly run --example odd{{ toolchain }}",
        ],
    );
}
