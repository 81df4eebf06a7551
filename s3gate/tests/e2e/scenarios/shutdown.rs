//! Termination signals abort the run, still tear the environment down,
//! and exit with `128 + signo`.

use std::sync::Arc;

use s3gate::orchestrator::{Orchestrator, ShutdownSignal};
use s3gate_core::{BuildVariant, ExitOutcome};

use crate::helpers::config::{TestWorkspace, passing_runner};

#[tokio::test]
async fn test_e2e_sigterm_during_assertions_cleans_up() {
    // Given: the first assertion subprocess never finishes
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner().hang("test_api.sh"));
    let hung = runner.hung();
    let shutdown = async move {
        hung.notified().await;
        ShutdownSignal::Terminate
    };

    // When: SIGTERM arrives while it is running
    let report = Orchestrator::new(ws.config(), Arc::clone(&runner))
        .with_search_path(ws.bin())
        .run(BuildVariant::default(), shutdown)
        .await;

    // Then
    assert_eq!(report.outcome, ExitOutcome::Unexpected(143));
    assert_eq!(report.exit_code, 143);
    assert!(report.error.as_deref().is_some_and(|e| e.contains("SIGTERM")));
    let lines = runner.command_lines();
    let assertion = runner.positions("test_api.sh")[0];
    let stop = lines
        .iter()
        .rposition(|l| l.ends_with("-p ngt stop"))
        .expect("guardian stop");
    let rm = lines
        .iter()
        .rposition(|l| l.ends_with("-p ngt rm -f -v"))
        .expect("guardian rm");
    assert!(assertion < stop);
    assert!(stop < rm);
}

#[tokio::test]
async fn test_e2e_sigint_during_build_exits_130() {
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner().hang("docker build"));
    let hung = runner.hung();
    let shutdown = async move {
        hung.notified().await;
        ShutdownSignal::Interrupt
    };

    let report = Orchestrator::new(ws.config(), Arc::clone(&runner))
        .with_search_path(ws.bin())
        .run(BuildVariant::default(), shutdown)
        .await;

    assert_eq!(report.exit_code, 130);
    assert!(report.scenarios.is_empty());
    assert_eq!(runner.count("up -d"), 0);
    assert_eq!(runner.count("rm -f -v"), 1);
}

#[tokio::test]
async fn test_e2e_completed_scenarios_survive_interrupt() {
    // Given: the fourth scenario's assertions hang
    let ws = TestWorkspace::new();
    let runner = Arc::new(passing_runner().hang("test_api.sh http://localhost:8989 test 4 0 0 0"));
    let hung = runner.hung();
    let shutdown = async move {
        hung.notified().await;
        ShutdownSignal::Interrupt
    };

    let report = Orchestrator::new(ws.config(), Arc::clone(&runner))
        .with_search_path(ws.bin())
        .run(BuildVariant::default(), shutdown)
        .await;

    assert_eq!(report.exit_code, 130);
    assert_eq!(report.scenarios.len(), 3);
    assert!(report.scenarios.iter().all(|r| r.passed));
}
