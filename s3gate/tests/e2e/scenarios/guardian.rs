//! Cleanup guardian behavior in isolation.

use std::path::PathBuf;
use std::sync::Arc;

use s3gate::context::HarnessContext;
use s3gate::guardian::CleanupGuardian;
use s3gate_core::{ExitOutcome, HarnessConfig};
use s3gate_env::{ComposeCommand, Toolchain};

use crate::helpers::runner::ScriptedRunner;

fn context(runner: &Arc<ScriptedRunner>, docker: &str) -> HarnessContext<ScriptedRunner> {
    let toolchain = Toolchain {
        docker: PathBuf::from(docker),
        compose: ComposeCommand::Plugin {
            docker: PathBuf::from(docker),
        },
        http_client: PathBuf::from("curl"),
        tcp_wait: None,
    };
    HarnessContext::new(HarnessConfig::default(), toolchain, Arc::clone(runner))
}

#[tokio::test]
async fn test_finish_returns_outcome_unchanged() {
    let runner = Arc::new(ScriptedRunner::new());
    let ctx = context(&runner, "docker");

    for outcome in [
        ExitOutcome::Success,
        ExitOutcome::TestFailure,
        ExitOutcome::Unexpected(143),
    ] {
        let guardian = CleanupGuardian::arm(&ctx);
        assert!(guardian.is_armed());
        assert_eq!(guardian.finish(outcome).await, outcome);
    }
}

#[tokio::test]
async fn test_success_skips_log_dump() {
    let runner = Arc::new(ScriptedRunner::new());
    let ctx = context(&runner, "docker");

    CleanupGuardian::arm(&ctx)
        .finish(ExitOutcome::Success)
        .await;

    assert_eq!(
        runner.command_lines(),
        vec![
            "docker compose -f test/docker-compose.yaml -p ngt stop",
            "docker compose -f test/docker-compose.yaml -p ngt rm -f -v",
        ]
    );
}

#[tokio::test]
async fn test_failure_dumps_logs_first() {
    let runner = Arc::new(ScriptedRunner::new());
    let ctx = context(&runner, "docker");

    CleanupGuardian::arm(&ctx)
        .finish(ExitOutcome::TestFailure)
        .await;

    let lines = runner.command_lines();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("logs --no-color"));
    assert!(lines[1].ends_with("stop"));
    assert!(lines[2].ends_with("rm -f -v"));
}

#[test]
fn test_drop_while_armed_runs_synchronous_cleanup() {
    // Given: a guardian whose docker binary does not exist
    let runner = Arc::new(ScriptedRunner::new());
    let ctx = context(&runner, "/nonexistent/s3gate-test-docker");

    // When: dropped without finish (e.g. during a panic)
    let guardian = CleanupGuardian::arm(&ctx);
    drop(guardian);

    // Then: the fallback runs outside the runner and tolerates spawn failures
    assert!(runner.calls().is_empty());
}

#[test]
fn test_drop_during_panic_does_not_abort() {
    let runner = Arc::new(ScriptedRunner::new());
    let ctx = context(&runner, "/nonexistent/s3gate-test-docker");

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _guardian = CleanupGuardian::arm(&ctx);
        panic!("scenario runner panicked");
    }));

    assert!(result.is_err());
}
