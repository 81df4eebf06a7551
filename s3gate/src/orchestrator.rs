//! Run orchestration: preflight, guarded pipeline, teardown and report.
//!
//! The [`Orchestrator`] drives a single end-to-end run:
//!
//! 1. Dependency preflight (a missing tool ends the run with code 3 before
//!    anything is built or started)
//! 2. Arm the cleanup guardian
//! 3. Pipeline, raced against termination signals:
//!    build → module validation → fixtures → scenario matrix
//! 4. Guardian teardown (always)
//! 5. Run report
//!
//! # Signals
//!
//! SIGINT and SIGTERM drop the in-flight pipeline. Child processes are spawned
//! with kill-on-drop, so dropping the pipeline terminates them; the guardian
//! then tears the environment down and the run exits with `128 + signo`.

use std::ffi::OsString;
use std::future::Future;
use std::sync::Arc;

use s3gate_core::{
    BuildVariant, ExitOutcome, HarnessConfig, HarnessError, SCENARIO_MATRIX, ScenarioResult,
};
use s3gate_env::{CommandRunner, DependencyProber, ensure_special_character_fixtures};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::context::HarnessContext;
use crate::guardian::CleanupGuardian;
use crate::report::RunReport;
use crate::scenario::ScenarioRunner;

/// Termination signal that interrupted a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl ShutdownSignal {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        }
    }

    /// Shell convention: `128 + signo`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Interrupt => 128 + 2,
            Self::Terminate => 128 + 15,
        }
    }
}

/// Single-run orchestrator.
pub struct Orchestrator<R: CommandRunner> {
    config: HarnessConfig,
    runner: Arc<R>,
    search_path: Option<OsString>,
}

impl<R: CommandRunner> Orchestrator<R> {
    pub fn new(config: HarnessConfig, runner: Arc<R>) -> Self {
        Self {
            config,
            runner,
            search_path: None,
        }
    }

    /// Resolve tools from `search_path` instead of the process `PATH`.
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs the whole pipeline and returns the report.
    ///
    /// `shutdown` resolves when a termination signal arrives; see
    /// [`shutdown_signal`] for the production source.
    pub async fn run<F>(self, variant: BuildVariant, shutdown: F) -> RunReport
    where
        F: Future<Output = ShutdownSignal>,
    {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", run_id = %run_id, variant = %variant);
        self.run_inner(run_id, variant, shutdown)
            .instrument(span)
            .await
    }

    async fn run_inner<F>(self, run_id: Uuid, variant: BuildVariant, shutdown: F) -> RunReport
    where
        F: Future<Output = ShutdownSignal>,
    {
        info!(project = %self.config.project.name, "s3gate run starting");

        let prober = match self.search_path {
            Some(path) => DependencyProber::with_search_path(Arc::clone(&self.runner), path),
            None => DependencyProber::new(Arc::clone(&self.runner)),
        };
        let toolchain = match prober.probe().await {
            Ok(toolchain) => toolchain,
            Err(e) => {
                let err = HarnessError::from(e);
                error!(error = %err, "dependency preflight failed");
                return report(run_id, variant, Vec::new(), err.outcome(), Some(err.to_string()));
            }
        };

        let ctx = HarnessContext::new(self.config, toolchain, self.runner);
        let guardian = CleanupGuardian::arm(&ctx);

        let mut results = Vec::new();
        let (outcome, failure) = {
            let pipeline = run_pipeline(&ctx, variant, &mut results);
            tokio::select! {
                result = pipeline => match result {
                    Ok(()) => (ExitOutcome::Success, None),
                    Err(e) => {
                        error!(error = %e, "run failed");
                        (e.outcome(), Some(e.to_string()))
                    }
                },
                signal = shutdown => {
                    warn!(signal = signal.name(), "termination signal received, aborting run");
                    (
                        ExitOutcome::Unexpected(signal.exit_code()),
                        Some(format!("interrupted by {}", signal.name())),
                    )
                }
            }
        };

        let outcome = guardian.finish(outcome).await;
        info!(outcome = %outcome, code = outcome.code(), "s3gate run finished");

        report(run_id, variant, results, outcome, failure)
    }
}

async fn run_pipeline<R: CommandRunner>(
    ctx: &HarnessContext<R>,
    variant: BuildVariant,
    results: &mut Vec<ScenarioResult>,
) -> Result<(), HarnessError> {
    ctx.builder().build(variant).await?;
    ctx.validator().validate_all().await?;

    if ctx.config.fixtures.special_characters && !cfg!(windows) {
        ensure_special_character_fixtures(ctx.data_dir()).await?;
    }

    ScenarioRunner::new(ctx)
        .run_matrix(&SCENARIO_MATRIX, results)
        .await
}

fn report(
    run_id: Uuid,
    variant: BuildVariant,
    scenarios: Vec<ScenarioResult>,
    outcome: ExitOutcome,
    error: Option<String>,
) -> RunReport {
    RunReport {
        run_id: run_id.to_string(),
        variant: variant.name(),
        scenarios,
        outcome,
        exit_code: outcome.code(),
        error,
    }
}

/// Resolves when SIGINT or SIGTERM arrives.
///
/// If the handlers cannot be installed the run continues without
/// signal-triggered teardown and the future never resolves.
pub async fn shutdown_signal() -> ShutdownSignal {
    match wait_for_shutdown_signal().await {
        Ok(signal) => signal,
        Err(e) => {
            warn!(error = %e, "signal handlers unavailable");
            std::future::pending().await
        }
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<ShutdownSignal> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::select! {
        _ = sigterm.recv() => ShutdownSignal::Terminate,
        _ = sigint.recv() => ShutdownSignal::Interrupt,
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<ShutdownSignal> {
    tokio::signal::ctrl_c().await?;
    Ok(ShutdownSignal::Interrupt)
}
