//! Unit tests for the command runner
//!
//! These drive `sh` instead of h2c so that exit codes, output and timing are
//! fully controlled.

#![cfg(unix)]

use super::*;
use std::time::Instant;

fn sh() -> CommandRunner {
    CommandRunner::new("sh")
}

fn script(body: &str) -> Vec<String> {
    vec!["-c".to_string(), body.to_string()]
}

#[tokio::test]
async fn test_run_captures_stdout_and_stderr() {
    let result = sh()
        .run(
            &script("echo 'Hello, World!'; echo 'Btw, this is request number 1.'; echo warn >&2"),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    assert_eq!(result.exit_code(), 0);
    assert_eq!(
        result.stdout_lines(),
        ["Hello, World!", "Btw, this is request number 1."]
    );
    assert_eq!(result.stdout(), "Hello, World!\nBtw, this is request number 1.");
    assert_eq!(result.stderr(), "warn");
    assert!(result.command().starts_with("sh -c "));
}

#[tokio::test]
async fn test_non_zero_exit_reports_code_and_full_stderr() {
    let err = sh()
        .run(
            &script("echo partial; echo 'first problem' >&2; echo 'second problem' >&2; exit 3"),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

    match err {
        HarnessError::ProcessFailed { command, exit_code, stderr } => {
            assert!(command.starts_with("sh -c"));
            assert_eq!(exit_code, 3);
            assert_eq!(stderr, "first problem\nsecond problem");
        }
        other => panic!("Expected ProcessFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_never_returns_partial_result() {
    let start = Instant::now();
    let err = sh()
        .run(&script("echo started; sleep 5"), Duration::from_millis(200))
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "Expected timeout, got {:?}", err);
    assert!(start.elapsed() < Duration::from_secs(4));
    match err {
        HarnessError::Timeout { command, timeout } => {
            assert!(command.contains("sleep 5"));
            assert_eq!(timeout, Duration::from_millis(200));
        }
        other => panic!("Expected Timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_program_is_a_spawn_error() {
    let runner = CommandRunner::new("/nonexistent/h2c-binary");
    let err = runner
        .run(&["version".to_string()], Duration::from_secs(1))
        .await
        .unwrap_err();

    match err {
        HarnessError::Spawn { command, .. } => {
            assert_eq!(command, "/nonexistent/h2c-binary version");
        }
        other => panic!("Expected Spawn, got {:?}", other),
    }
}

#[tokio::test]
async fn test_large_output_is_fully_drained() {
    let result = sh()
        .run(&script("seq 1 20000"), Duration::from_secs(10))
        .await
        .unwrap();

    let lines = result.stdout_lines();
    assert_eq!(lines.len(), 20000);
    assert_eq!(lines.first().map(String::as_str), Some("1"));
    assert_eq!(lines.last().map(String::as_str), Some("20000"));
}

#[tokio::test]
async fn test_output_assertions() {
    let result = sh()
        .run(&script("echo 'Received 27 characters.'"), Duration::from_secs(5))
        .await
        .unwrap();

    assert!(result.assert_stdout_contains("Received 27 characters.").is_ok());
    assert!(result.assert_stdout_longer_than(10).is_ok());

    let err = result.assert_stdout_contains("Received 28 characters.").unwrap_err();
    match &err {
        HarnessError::Assertion { stdout, expectation, .. } => {
            assert_eq!(stdout, "Received 27 characters.");
            assert!(expectation.contains("Received 28 characters."));
        }
        other => panic!("Expected Assertion, got {:?}", other),
    }
    assert!(err.to_string().contains("Unexpected output:\nReceived 27 characters."));

    assert!(matches!(
        result.assert_stdout_longer_than(1000),
        Err(HarnessError::Assertion { .. })
    ));
}

#[test]
fn test_command_line_rendering() {
    let runner = CommandRunner::new("h2c");
    let args = vec!["get".to_string(), "/h2c/test".to_string()];
    assert_eq!(runner.command_line(&args), "h2c get /h2c/test");
    assert_eq!(runner.command_line(&[]), "h2c");
    assert_eq!(runner.program(), Path::new("h2c"));
}

#[tokio::test]
async fn test_base_args_prefix_every_command() {
    let runner = CommandRunner::new("sh").with_base_args(script("echo \"$0 $1\""));
    let args = vec!["get".to_string(), "/h2c/test".to_string()];

    assert_eq!(runner.command_line(&args), "sh -c echo \"$0 $1\" get /h2c/test");

    let result = runner.run(&args, Duration::from_secs(5)).await.unwrap();
    assert_eq!(result.stdout(), "get /h2c/test");
}

#[tokio::test]
async fn test_wait_survives_a_failed_pump() {
    let runner = sh();
    let mut process = runner.spawn(&script("echo still captured")).unwrap();
    process.pumps.push(tokio::spawn(async {
        panic!("pump failed");
    }));

    let exit_code = process.wait(Duration::from_secs(5)).await.unwrap();
    assert_eq!(exit_code, 0);
    assert_eq!(process.stdout().await.lines(), ["still captured"]);
}
