//! Dependency gate: a missing mandatory tool stops the run before any
//! build or environment command, with exit code 3 and no cleanup.

use std::sync::Arc;

use s3gate_core::ExitOutcome;
use s3gate_env::CommandOutput;

use crate::helpers::config::{TestWorkspace, passing_runner, run_to_completion};
use crate::helpers::runner::ScriptedRunner;

fn assert_nothing_mutated(runner: &ScriptedRunner) {
    for line in runner.command_lines() {
        assert!(
            line.ends_with("compose version"),
            "unexpected command before preflight passed: {line}"
        );
    }
}

#[tokio::test]
async fn test_e2e_missing_docker_exits_three() {
    let ws = TestWorkspace::with_tools(&["curl", "wait-for-it"]);
    let runner = Arc::new(passing_runner());

    let report = run_to_completion(&ws, ws.config(), &runner, "oss").await;

    assert_eq!(report.outcome, ExitOutcome::MissingDependency);
    assert_eq!(report.exit_code, 3);
    assert!(report.scenarios.is_empty());
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_e2e_missing_curl_exits_three() {
    let ws = TestWorkspace::with_tools(&["docker", "wait-for-it"]);
    let runner = Arc::new(passing_runner());

    let report = run_to_completion(&ws, ws.config(), &runner, "plus").await;

    assert_eq!(report.exit_code, 3);
    assert!(report.error.as_deref().is_some_and(|e| e.contains("curl")));
    assert_nothing_mutated(&runner);
}

#[tokio::test]
async fn test_e2e_missing_compose_exits_three() {
    let ws = TestWorkspace::with_tools(&["docker", "curl"]);
    let runner = Arc::new(
        ScriptedRunner::new().respond("compose version", CommandOutput::failure(1, "")),
    );

    let report = run_to_completion(&ws, ws.config(), &runner, "oss").await;

    assert_eq!(report.exit_code, 3);
    assert_nothing_mutated(&runner);
}

#[tokio::test]
async fn test_e2e_standalone_compose_is_used() {
    let ws = TestWorkspace::with_tools(&["docker", "docker-compose", "curl"]);
    let runner = Arc::new(
        ScriptedRunner::new()
            .respond("compose version", CommandOutput::failure(1, ""))
            .respond("ps -aq", CommandOutput::success("c0ffee\n"))
            .respond("curl", CommandOutput::success("200"))
            .respond(
                "logs --no-color nginx-s3-gateway",
                CommandOutput::success(crate::helpers::config::gateway_log(3)),
            ),
    );

    let report = run_to_completion(&ws, ws.config(), &runner, "oss").await;

    assert_eq!(report.exit_code, 0);
    let ups: Vec<_> = runner
        .command_lines()
        .into_iter()
        .filter(|l| l.ends_with("up -d"))
        .collect();
    assert!(ups.iter().all(|l| l.contains("bin/docker-compose -f")));
}

#[tokio::test]
async fn test_e2e_missing_wait_for_it_is_optional() {
    let ws = TestWorkspace::with_tools(&["docker", "curl"]);
    let runner = Arc::new(passing_runner());

    let report = run_to_completion(&ws, ws.config(), &runner, "oss").await;

    assert_eq!(report.exit_code, 0);
    assert_eq!(runner.count("wait-for-it"), 0);
}
