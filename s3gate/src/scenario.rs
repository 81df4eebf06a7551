//! Configuration-matrix driver.
//!
//! Each scenario walks a small state machine:
//!
//! ```text
//! Pending ─ensure+ready─> EnvReady ─assertions─> AssertionsRun ─logs─> LogVerified ─> Done
//!    │                       │                        │                    │
//!    └───────────────────────┴────────── error ───────┴────────────────────┴──> Failed
//! ```
//!
//! Scenarios run strictly in sequence. A failure aborts the rest of the
//! matrix; the failed scenario is still recorded.

use std::fmt;

use s3gate_core::{HarnessError, ScenarioConfig, ScenarioResult};
use s3gate_env::{CommandRunner, CommandSpec, EnvironmentController, ReadinessPoller};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::context::HarnessContext;

/// Lifecycle phase of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioPhase {
    Pending,
    EnvReady,
    AssertionsRun,
    LogVerified,
    Done,
    Failed,
}

impl fmt::Display for ScenarioPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::EnvReady => "env_ready",
            Self::AssertionsRun => "assertions_run",
            Self::LogVerified => "log_verified",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Mutable bookkeeping for the scenario in flight.
#[derive(Debug)]
struct ScenarioProgress {
    config: ScenarioConfig,
    phase: ScenarioPhase,
    http_assertions_passed: bool,
    log_evidence_count: usize,
}

impl ScenarioProgress {
    fn new(config: ScenarioConfig) -> Self {
        Self {
            config,
            phase: ScenarioPhase::Pending,
            http_assertions_passed: false,
            log_evidence_count: 0,
        }
    }

    fn advance(&mut self, next: ScenarioPhase) {
        debug!(scenario = %self.config, from = %self.phase, to = %next, "scenario transition");
        self.phase = next;
    }

    fn finish(self) -> ScenarioResult {
        ScenarioResult {
            config: self.config,
            http_assertions_passed: self.http_assertions_passed,
            log_evidence_count: self.log_evidence_count,
            passed: self.phase == ScenarioPhase::Done,
        }
    }
}

/// Drives the scenario matrix against a live environment.
pub struct ScenarioRunner<'a, R: CommandRunner> {
    ctx: &'a HarnessContext<R>,
    env: EnvironmentController<R>,
    readiness: ReadinessPoller<R>,
}

impl<'a, R: CommandRunner> ScenarioRunner<'a, R> {
    pub fn new(ctx: &'a HarnessContext<R>) -> Self {
        Self {
            ctx,
            env: ctx.environment(),
            readiness: ctx.readiness(),
        }
    }

    /// Runs every scenario in order, appending each result to `results`.
    ///
    /// Between scenarios only the gateway service is stopped; the backend
    /// and its fixture data persist.
    ///
    /// # Errors
    ///
    /// Returns the first scenario failure. Its result has already been
    /// pushed to `results` with `passed = false`.
    pub async fn run_matrix(
        &self,
        matrix: &[ScenarioConfig],
        results: &mut Vec<ScenarioResult>,
    ) -> Result<(), HarnessError> {
        let gateway = self.ctx.config.project.gateway_service.as_str();

        for (index, config) in matrix.iter().enumerate() {
            info!(
                scenario = %config,
                index = index + 1,
                total = matrix.len(),
                "scenario started"
            );

            let mut progress = ScenarioProgress::new(*config);
            let outcome = self.run_scenario(&mut progress).await;
            if let Err(e) = &outcome {
                error!(
                    scenario = %config,
                    phase = %progress.phase,
                    error = %e,
                    "scenario failed"
                );
                progress.advance(ScenarioPhase::Failed);
            }
            results.push(progress.finish());
            outcome?;

            info!(scenario = %config, "scenario passed");
            if index + 1 < matrix.len() {
                self.env.stop(Some(gateway)).await?;
            }
        }
        Ok(())
    }

    async fn run_scenario(&self, progress: &mut ScenarioProgress) -> Result<(), HarnessError> {
        let config = progress.config;

        self.env.ensure(&config).await?;
        self.readiness.wait().await?;
        progress.advance(ScenarioPhase::EnvReady);

        self.run_assertions(&config).await?;
        progress.http_assertions_passed = true;
        progress.advance(ScenarioPhase::AssertionsRun);

        self.verify_logs(progress).await?;
        progress.advance(ScenarioPhase::LogVerified);

        progress.advance(ScenarioPhase::Done);
        Ok(())
    }

    /// `<interpreter> <script> <base_url> <fixture_dir> <sig> <listing> <index> <slash>`
    pub fn assertion_command(&self, config: &ScenarioConfig) -> CommandSpec {
        let fixtures = &self.ctx.config.fixtures;
        CommandSpec::new(&fixtures.assertion_interpreter)
            .arg(fixtures.assertion_script.as_str())
            .arg(self.ctx.config.endpoints.gateway_url())
            .arg(fixtures.test_dir.as_str())
            .args(config.positional_args())
    }

    async fn run_assertions(&self, config: &ScenarioConfig) -> Result<(), HarnessError> {
        let spec = self.assertion_command(config);
        info!(scenario = %config, command = %spec.command_line(), "running http assertions");

        let output = self.ctx.runner.run(&spec).await?;
        if !output.is_success() {
            return Err(HarnessError::Assertion {
                scenario: config.tuple(),
                status: output.status,
            });
        }
        Ok(())
    }

    /// Records the marker count on `progress` before checking the threshold.
    async fn verify_logs(&self, progress: &mut ScenarioProgress) -> Result<(), HarnessError> {
        let config = progress.config;
        let verification = &self.ctx.config.verification;
        let gateway = self.ctx.config.project.gateway_service.as_str();
        let version = config.signature_version;

        let logs = self.env.logs(Some(gateway)).await?;
        let markers = verification.markers_for(version.as_u8());
        let found = count_marker_lines(&logs, &markers);
        progress.log_evidence_count = found;
        let required = verification.min_marker_lines as usize;

        if found < required {
            error!(
                scenario = %config,
                found,
                required,
                "gateway log lacks signature version evidence"
            );
            dump_log(gateway, &logs);
            return Err(HarnessError::LogVerification {
                scenario: config.tuple(),
                version: version.to_string(),
                found,
                required,
            });
        }

        debug!(scenario = %config, found, "log evidence verified");
        Ok(())
    }
}

/// Counts lines containing at least one of `markers`.
pub fn count_marker_lines(log: &str, markers: &[String]) -> usize {
    log.lines()
        .filter(|line| markers.iter().any(|m| line.contains(m.as_str())))
        .count()
}

/// Emits captured container output line by line.
pub(crate) fn dump_log(source: &str, text: &str) {
    for line in text.lines() {
        error!(source, "{line}");
    }
}
