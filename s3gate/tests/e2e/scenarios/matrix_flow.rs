//! Full passing run: build, validation, fixtures, and the six-scenario matrix.

use std::sync::Arc;

use s3gate_core::{ExitOutcome, SCENARIO_MATRIX};

use crate::helpers::config::{GATEWAY, TestWorkspace, passing_runner, run_to_completion};

#[tokio::test]
async fn test_e2e_full_matrix_passes() {
    // Given
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner());

    // When
    let report = run_to_completion(&ws, ws.config(), &runner, "oss").await;

    // Then
    assert_eq!(report.outcome, ExitOutcome::Success);
    assert_eq!(report.exit_code, 0);
    assert!(report.error.is_none());
    assert_eq!(report.scenarios.len(), SCENARIO_MATRIX.len());
    for (result, config) in report.scenarios.iter().zip(SCENARIO_MATRIX.iter()) {
        assert_eq!(&result.config, config);
        assert!(result.passed);
        assert!(result.http_assertions_passed);
        assert_eq!(result.log_evidence_count, 3);
    }
}

#[tokio::test]
async fn test_e2e_environment_seeded_once() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner());

    run_to_completion(&ws, ws.config(), &runner, "oss").await;

    assert_eq!(runner.count("up --no-start"), 1);
    assert_eq!(runner.count(" cp "), 1);
    assert_eq!(runner.count(" diff c0ffee"), 1);
    assert_eq!(runner.count("up -d"), SCENARIO_MATRIX.len());
}

#[tokio::test]
async fn test_e2e_up_carries_each_tuple() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner());

    run_to_completion(&ws, ws.config(), &runner, "oss").await;

    let ups: Vec<_> = runner
        .calls()
        .into_iter()
        .filter(|c| c.command_line().ends_with("up -d"))
        .collect();
    assert_eq!(ups.len(), SCENARIO_MATRIX.len());
    for (spec, config) in ups.iter().zip(SCENARIO_MATRIX.iter()) {
        assert_eq!(spec.envs, config.env_vars(), "scenario {config}");
    }
}

#[tokio::test]
async fn test_e2e_scenarios_are_sequential() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner());

    run_to_completion(&ws, ws.config(), &runner, "oss").await;

    let ups = runner.positions("up -d");
    let assertions = runner.positions("test_api.sh");
    assert_eq!(ups.len(), 6);
    assert_eq!(assertions.len(), 6);
    for i in 0..6 {
        assert!(ups[i] < assertions[i], "scenario {i}: up -d must precede assertions");
        if i + 1 < 6 {
            assert!(
                assertions[i] < ups[i + 1],
                "scenario {i}: assertions must finish before next up -d"
            );
        }
    }
}

#[tokio::test]
async fn test_e2e_assertion_arguments() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner());

    run_to_completion(&ws, ws.config(), &runner, "oss").await;

    let lines = runner.command_lines();
    let assertions: Vec<_> = lines.iter().filter(|l| l.contains("test_api.sh")).collect();
    assert_eq!(
        assertions[0],
        "bash test/integration/test_api.sh http://localhost:8989 test 2 0 0 0"
    );
    assert_eq!(
        assertions[5],
        "bash test/integration/test_api.sh http://localhost:8989 test 4 0 1 1"
    );
}

#[tokio::test]
async fn test_e2e_only_gateway_stopped_between_scenarios() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner());

    run_to_completion(&ws, ws.config(), &runner, "oss").await;

    assert_eq!(runner.count(&format!("stop {GATEWAY}")), 5);
    // guardian: one project-wide stop, one rm, no log dump on success
    let lines = runner.command_lines();
    assert_eq!(lines.iter().filter(|l| l.ends_with(" stop")).count(), 1);
    assert_eq!(runner.count("rm -f -v"), 1);
    assert!(lines.iter().all(|l| !l.ends_with("logs --no-color")));
    assert!(lines.last().is_some_and(|l| l.ends_with("rm -f -v")));
}

#[tokio::test]
async fn test_e2e_pipeline_order() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner());

    run_to_completion(&ws, ws.config(), &runner, "oss").await;

    let build = runner.positions("docker build")[0];
    let validation = runner.positions("run --rm")[0];
    let first_up = runner.positions("up --no-start")[0];
    assert!(build < validation);
    assert!(validation < first_up);
    assert_eq!(runner.count("run --rm"), 9);
    assert_eq!(runner.count("buildx"), 0);
}

#[tokio::test]
async fn test_e2e_special_character_fixtures_written() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner());

    run_to_completion(&ws, ws.config(), &runner, "oss").await;

    let special = ws.data_dir().join("bucket-1").join("special");
    assert!(special.join("space in name.txt").is_file());
    assert!(special.join("quote'mark.txt").is_file());
}

#[tokio::test]
async fn test_e2e_fixtures_and_validation_can_be_disabled() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner());
    let mut config = ws.config();
    config.fixtures.special_characters = false;
    config.validation.enabled = false;

    let report = run_to_completion(&ws, config, &runner, "oss").await;

    assert_eq!(report.exit_code, 0);
    assert_eq!(runner.count("run --rm"), 0);
    assert!(!ws.data_dir().join("bucket-1").join("special").exists());
}

#[tokio::test]
async fn test_e2e_plus_variant_with_latest_runtime() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner());

    let report = run_to_completion(&ws, ws.config(), &runner, "latest-njs-plus").await;

    assert_eq!(report.exit_code, 0);
    assert_eq!(report.variant, "latest-njs-plus");
    assert_eq!(runner.count("buildx version"), 1);
    assert_eq!(runner.count("Dockerfile.buildkit.plus"), 1);
    assert_eq!(runner.count("Dockerfile.latest-njs"), 1);
}
