//! Test: Built-in Profiles - the shipped pipelines run the expected commands

use crate::helpers::*;
use checkrun::core::Profile;
use checkrun::runner::CommandOutput;

const STANDARD_COMMANDS: [&str; 12] = [
    "rustup update",
    "rustup toolchain install nightly",
    "rustup component add miri --toolchain nightly",
    "cargo fmt --check",
    "cargo clippy --all-targets --no-default-features",
    "cargo clippy --all-targets --all-features",
    "cargo test --no-default-features",
    "cargo test --all-features",
    "cargo +nightly miri test --no-default-features",
    "cargo +nightly miri test --all-features",
    "cargo test -r --no-default-features",
    "cargo test -r --all-features",
];

/// The standard profile runs the checks in order with full Miri backtraces
#[tokio::test]
async fn test_standard_profile_sequence() {
    let mut pipeline = Profile::Standard.load().unwrap().to_pipeline().unwrap();
    let result = run_pipeline_with_runner(&mut pipeline, MockRunner::new()).await;

    assert_pipeline_completed(&result);
    assert_invoked(&result, &STANDARD_COMMANDS);

    for invocation in &result.invocations {
        assert_eq!(invocation.env["RUST_BACKTRACE"], "1");
    }
    let miri = &result.invocations[8];
    assert_eq!(miri.env["MIRIFLAGS"], "-Zmiri-backtrace=full");
}

/// The examples profile runs every listed example under Miri before the
/// release tests
#[tokio::test]
async fn test_examples_profile_fans_out_over_examples() {
    let mut pipeline = Profile::Examples.load().unwrap().to_pipeline().unwrap();
    let runner = MockRunner::new().outputs(
        "cargo run --example",
        CommandOutput::new(101).with_stderr(concat!(
            "error: \"--example\" takes one argument.\n",
            "Available examples:\n",
            "    classical_linear_logic\n",
            "    sequent_search\n",
        )),
    );

    let result = run_pipeline_with_runner(&mut pipeline, runner).await;
    assert_pipeline_completed(&result);

    let mut expected: Vec<&str> = STANDARD_COMMANDS[..10].to_vec();
    expected.extend([
        "cargo run --example",
        "cargo +nightly miri run --example classical_linear_logic",
        "cargo +nightly miri run --example sequent_search",
    ]);
    expected.extend(&STANDARD_COMMANDS[10..]);
    assert_invoked(&result, &expected);

    let example = &result.invocations[11];
    assert_eq!(example.env["MIRIFLAGS"], "-Zmiri-backtrace=1");
    assert_eq!(example.env["RUST_BACKTRACE"], "1");
}

/// A failing Miri run in the examples profile skips the release tests
#[tokio::test]
async fn test_examples_profile_halts_on_example_failure() {
    let mut pipeline = Profile::Examples.load().unwrap().to_pipeline().unwrap();
    let runner = MockRunner::new()
        .outputs(
            "cargo run --example",
            CommandOutput::new(101).with_stderr("Available examples:\n    broken\n"),
        )
        .exits("cargo +nightly miri run --example broken", 1);

    let result = run_pipeline_with_runner(&mut pipeline, runner).await;

    assert_pipeline_failed(&result);
    assert_step_failed(&result, "miri-examples:broken", Some(1));
    assert_step_skipped(&result, "release-no-features");
    assert_step_skipped(&result, "release-all-features");
}
