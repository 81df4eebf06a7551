//! Shared run context.
//!
//! [`HarnessContext`] bundles the validated configuration, the resolved
//! toolchain, and the command runner. It is built once after the dependency
//! preflight and passed by reference to every stage.

use std::path::Path;
use std::sync::Arc;

use s3gate_core::HarnessConfig;
use s3gate_env::{
    BuildOrchestrator, CommandRunner, EnvironmentController, ModuleValidator, ReadinessPoller,
    Toolchain,
};

/// Configuration, toolchain and runner for a single orchestration run.
pub struct HarnessContext<R: CommandRunner> {
    /// Validated configuration.
    pub config: HarnessConfig,
    /// Tools resolved by the preflight.
    pub toolchain: Toolchain,
    /// Runner used for every external command.
    pub runner: Arc<R>,
}

impl<R: CommandRunner> HarnessContext<R> {
    pub fn new(config: HarnessConfig, toolchain: Toolchain, runner: Arc<R>) -> Self {
        Self {
            config,
            toolchain,
            runner,
        }
    }

    /// Image builder for the configured image.
    pub fn builder(&self) -> BuildOrchestrator<R> {
        BuildOrchestrator::new(
            Arc::clone(&self.runner),
            &self.toolchain.docker,
            self.config.build.clone(),
        )
    }

    /// In-image module validator.
    pub fn validator(&self) -> ModuleValidator<R> {
        ModuleValidator::new(
            Arc::clone(&self.runner),
            &self.toolchain.docker,
            self.config.build.image.clone(),
            self.config.validation.clone(),
        )
    }

    /// Environment controller scoped to the configured project.
    pub fn environment(&self) -> EnvironmentController<R> {
        EnvironmentController::new(
            Arc::clone(&self.runner),
            &self.toolchain,
            &self.config.project,
            self.config.fixtures.data_dir.clone(),
        )
    }

    /// Backend health poller.
    pub fn readiness(&self) -> ReadinessPoller<R> {
        ReadinessPoller::new(
            Arc::clone(&self.runner),
            &self.toolchain,
            &self.config.endpoints,
            &self.config.readiness,
        )
    }

    /// Fixture data directory.
    pub fn data_dir(&self) -> &Path {
        Path::new(&self.config.fixtures.data_dir)
    }
}
