//! Guaranteed environment teardown.
//!
//! The [`CleanupGuardian`] is armed once, right after the dependency
//! preflight. Every exit path of the orchestrator calls [`CleanupGuardian::finish`].
//! If the guardian is dropped while still armed (a panic unwinding through the
//! run), `Drop` performs the same stop/remove steps synchronously.

use std::process::Stdio;
use std::sync::Arc;

use s3gate_core::ExitOutcome;
use s3gate_env::{CommandRunner, CommandSpec, Compose};
use tracing::{info, warn};

use crate::context::HarnessContext;
use crate::scenario::dump_log;

pub struct CleanupGuardian<R: CommandRunner> {
    runner: Arc<R>,
    compose: Compose,
    armed: bool,
}

impl<R: CommandRunner> CleanupGuardian<R> {
    /// Arms a guardian for the context's project namespace.
    pub fn arm(ctx: &HarnessContext<R>) -> Self {
        let compose = ctx.environment().compose().clone();
        info!(project = compose.project(), "cleanup guardian armed");
        Self {
            runner: Arc::clone(&ctx.runner),
            compose,
            armed: true,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Tears the environment down and hands `outcome` back unchanged.
    ///
    /// On a non-success outcome the full environment log is dumped first.
    /// Each step is best-effort: failures are logged and the next step runs.
    pub async fn finish(mut self, outcome: ExitOutcome) -> ExitOutcome {
        info!(outcome = %outcome, "cleaning up environment");

        if !outcome.is_success() {
            let spec = self.compose.logs(None);
            match self.runner.run(&spec).await {
                Ok(output) if output.is_success() => dump_log("environment", &output.stdout),
                Ok(output) => warn!(status = output.status, "failed to collect environment logs"),
                Err(e) => warn!(error = %e, "failed to collect environment logs"),
            }
        }

        for spec in [self.compose.stop(None), self.compose.remove()] {
            self.best_effort(&spec).await;
        }

        self.armed = false;
        info!(outcome = %outcome, "environment cleaned up");
        outcome
    }

    async fn best_effort(&self, spec: &CommandSpec) {
        match self.runner.run(spec).await {
            Ok(output) if output.is_success() => {}
            Ok(output) => warn!(
                command = %spec.command_line(),
                status = output.status,
                "cleanup step failed, continuing"
            ),
            Err(e) => warn!(
                command = %spec.command_line(),
                error = %e,
                "cleanup step failed, continuing"
            ),
        }
    }
}

impl<R: CommandRunner> Drop for CleanupGuardian<R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(
            project = self.compose.project(),
            "guardian dropped while armed, running synchronous cleanup"
        );
        for spec in [self.compose.stop(None), self.compose.remove()] {
            let status = spec
                .to_std_command()
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
            match status {
                Ok(status) if status.success() => {}
                Ok(status) => warn!(
                    command = %spec.command_line(),
                    status = ?status.code(),
                    "cleanup step failed, continuing"
                ),
                Err(e) => warn!(
                    command = %spec.command_line(),
                    error = %e,
                    "cleanup step failed, continuing"
                ),
            }
        }
    }
}
