//! Failure paths: every fatal error still runs the guardian and maps to
//! the documented exit code.

use std::sync::Arc;

use s3gate_core::{ExitOutcome, SCENARIO_MATRIX};
use s3gate_env::CommandOutput;

use crate::helpers::config::{
    GATEWAY, TestWorkspace, gateway_log, passing_runner, run_to_completion,
};
use crate::helpers::runner::ScriptedRunner;

/// The guardian issued a project-wide stop followed by `rm -f -v`.
fn assert_cleaned_up(runner: &ScriptedRunner) {
    let lines = runner.command_lines();
    let stop = lines
        .iter()
        .rposition(|l| l.ends_with("-p ngt stop"))
        .expect("guardian stop");
    let rm = lines
        .iter()
        .rposition(|l| l.ends_with("-p ngt rm -f -v"))
        .expect("guardian rm");
    assert!(stop < rm);
}

/// Passing script apart from the backend health status.
fn passing_runner_with_health(status: &str) -> ScriptedRunner {
    ScriptedRunner::new()
        .respond("curl", CommandOutput::success(status))
        .respond(
            "compose version",
            CommandOutput::success("Docker Compose version v2.24.5"),
        )
        .respond("ps -aq", CommandOutput::success("c0ffee\n"))
        .respond(
            &format!("logs --no-color {GATEWAY}"),
            CommandOutput::success(gateway_log(3)),
        )
}

fn dumped_full_logs(runner: &ScriptedRunner) -> bool {
    runner
        .command_lines()
        .iter()
        .any(|l| l.ends_with("logs --no-color"))
}

#[tokio::test]
async fn test_e2e_build_failure_propagates_status() {
    // Given: the image build exits 17
    let ws = TestWorkspace::new();
    let runner = Arc::new(
        ScriptedRunner::new()
            .respond("docker build", CommandOutput::failure(17, ""))
            .respond(
                "compose version",
                CommandOutput::success("Docker Compose version v2.24.5"),
            ),
    );

    // When
    let report = run_to_completion(&ws, ws.config(), &runner, "oss").await;

    // Then
    assert_eq!(report.outcome, ExitOutcome::Unexpected(17));
    assert_eq!(report.exit_code, 17);
    assert!(report.scenarios.is_empty());
    assert_eq!(runner.count("up -d"), 0);
    assert_eq!(runner.count("run --rm"), 0);
    assert!(dumped_full_logs(&runner));
    assert_cleaned_up(&runner);
}

#[tokio::test]
async fn test_e2e_validation_failure_is_test_failure() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(
        passing_runner().respond("awssig4_test.js", CommandOutput::failure(1, "")),
    );

    let report = run_to_completion(&ws, ws.config(), &runner, "oss").await;

    assert_eq!(report.exit_code, 2);
    assert!(
        report
            .error
            .as_deref()
            .is_some_and(|e| e.contains("awssig4_test.js"))
    );
    assert_eq!(runner.count("up -d"), 0);
    assert_cleaned_up(&runner);
}

#[tokio::test]
async fn test_e2e_assertion_failure_aborts_matrix() {
    // Given: the second scenario's assertions fail
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner().respond_seq(
        "test_api.sh",
        vec![CommandOutput::success(""), CommandOutput::failure(1, "")],
    ));

    // When
    let report = run_to_completion(&ws, ws.config(), &runner, "oss").await;

    // Then
    assert_eq!(report.outcome, ExitOutcome::TestFailure);
    assert_eq!(report.exit_code, 2);
    assert_eq!(report.scenarios.len(), 2);
    assert!(report.scenarios[0].passed);
    let failed = &report.scenarios[1];
    assert_eq!(failed.config, SCENARIO_MATRIX[1]);
    assert!(!failed.passed);
    assert!(!failed.http_assertions_passed);
    assert_eq!(runner.count("test_api.sh"), 2);
    assert!(dumped_full_logs(&runner));
    assert_cleaned_up(&runner);
}

#[tokio::test]
async fn test_e2e_log_verification_below_threshold() {
    // Given: only two marker lines per version
    let ws = TestWorkspace::new();
    let runner = Arc::new(
        ScriptedRunner::new()
            .respond(
                &format!("logs --no-color {GATEWAY}"),
                CommandOutput::success(gateway_log(2)),
            )
            .respond(
                "compose version",
                CommandOutput::success("Docker Compose version v2.24.5"),
            )
            .respond("ps -aq", CommandOutput::success("c0ffee\n"))
            .respond("curl", CommandOutput::success("200")),
    );

    // When
    let report = run_to_completion(&ws, ws.config(), &runner, "oss").await;

    // Then
    assert_eq!(report.exit_code, 2);
    assert_eq!(report.scenarios.len(), 1);
    let failed = &report.scenarios[0];
    assert!(failed.http_assertions_passed);
    assert_eq!(failed.log_evidence_count, 2);
    assert!(!failed.passed);
    assert!(
        report
            .error
            .as_deref()
            .is_some_and(|e| e.contains("signature version v2"))
    );
    assert_cleaned_up(&runner);
}

#[tokio::test]
async fn test_e2e_raised_threshold_is_honored() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner());
    let mut config = ws.config();
    config.verification.min_marker_lines = 4;

    let report = run_to_completion(&ws, config, &runner, "oss").await;

    assert_eq!(report.exit_code, 2);
    assert_eq!(report.scenarios[0].log_evidence_count, 3);
}

#[tokio::test]
async fn test_e2e_unhealthy_backend_is_not_fatal() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner_with_health("503"));

    let report = run_to_completion(&ws, ws.config(), &runner, "oss").await;

    assert_eq!(report.exit_code, 0);
    // three health attempts per scenario
    assert_eq!(runner.count("curl"), 3 * SCENARIO_MATRIX.len());
}

#[tokio::test]
async fn test_e2e_tcp_wait_failure_is_unexpected() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner().respond("wait-for-it", CommandOutput::failure(124, "")));

    let report = run_to_completion(&ws, ws.config(), &runner, "oss").await;

    assert_eq!(report.outcome, ExitOutcome::Unexpected(124));
    assert_eq!(report.exit_code, 124);
    assert_eq!(runner.count("test_api.sh"), 0);
    assert_cleaned_up(&runner);
}

#[tokio::test]
async fn test_e2e_compose_failure_keeps_tool_status() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner().respond("up -d", CommandOutput::failure(18, "")));

    let report = run_to_completion(&ws, ws.config(), &runner, "oss").await;

    assert_eq!(report.exit_code, 18);
    assert_eq!(report.scenarios.len(), 1);
    assert!(!report.scenarios[0].passed);
    assert_cleaned_up(&runner);
}

#[tokio::test]
async fn test_e2e_failing_cleanup_keeps_original_outcome() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(
        passing_runner()
            .respond("test_api.sh", CommandOutput::failure(1, ""))
            .respond("rm -f -v", CommandOutput::failure(1, "")),
    );

    let report = run_to_completion(&ws, ws.config(), &runner, "oss").await;

    assert_eq!(report.exit_code, 2);
    assert_cleaned_up(&runner);
}
