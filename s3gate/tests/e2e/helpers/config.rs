//! Test configuration and fake toolchain.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use s3gate::orchestrator::{Orchestrator, ShutdownSignal};
use s3gate::report::RunReport;
use s3gate_core::{BuildVariant, HarnessConfig};
use s3gate_env::CommandOutput;
use tempfile::TempDir;

use super::runner::ScriptedRunner;

/// Gateway service name used by the default configuration.
pub const GATEWAY: &str = "nginx-s3-gateway";

/// Temporary workspace with a fake `bin/` and a fixture data directory.
pub struct TestWorkspace {
    pub dir: TempDir,
}

impl TestWorkspace {
    /// Workspace with docker, curl and wait-for-it on the fake `PATH`.
    pub fn new() -> Self {
        Self::with_tools(&["docker", "curl", "wait-for-it"])
    }

    pub fn with_tools(tools: &[&str]) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("bin")).expect("bin dir");
        std::fs::create_dir_all(dir.path().join("data").join("bucket-1")).expect("data dir");
        for tool in tools {
            fake_tool(&dir.path().join("bin"), tool);
        }
        Self { dir }
    }

    pub fn bin(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    /// Default configuration with fixtures inside the workspace and no
    /// readiness delay.
    pub fn config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::default();
        config.fixtures.data_dir = self.data_dir().display().to_string();
        config.readiness.delay_secs = 0;
        config
    }
}

fn fake_tool(dir: &Path, name: &str) {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, "#!/bin/sh\nexit 0\n").expect("write tool");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
}

/// Gateway log text with `count` marker lines for both signature versions.
pub fn gateway_log(count: usize) -> String {
    let mut log = String::from("nginx-s3-gateway-1  | start worker processes\n");
    for i in 0..count {
        log.push_str(&format!(
            "nginx-s3-gateway-1  | AWS Signatures Version: v2 request {i}\n"
        ));
        log.push_str(&format!("nginx-s3-gateway-1  | AWS v4 Auth request {i}\n"));
    }
    log
}

/// Runner scripted for a fully passing run.
pub fn passing_runner() -> ScriptedRunner {
    ScriptedRunner::new()
        .respond(
            "compose version",
            CommandOutput::success("Docker Compose version v2.24.5\n"),
        )
        .respond_seq(
            "ps -q",
            vec![CommandOutput::success(""), CommandOutput::success("c0ffee\n")],
        )
        .respond("ps -aq", CommandOutput::success("c0ffee\n"))
        .respond("curl", CommandOutput::success("200"))
        .respond(
            &format!("logs --no-color {GATEWAY}"),
            CommandOutput::success(gateway_log(3)),
        )
}

/// Runs the orchestrator with a shutdown future that never fires.
pub async fn run_to_completion(
    ws: &TestWorkspace,
    config: HarnessConfig,
    runner: &Arc<ScriptedRunner>,
    variant: &str,
) -> RunReport {
    let variant: BuildVariant = variant.parse().expect("variant");
    Orchestrator::new(config, Arc::clone(runner))
        .with_search_path(ws.bin())
        .run(variant, std::future::pending::<ShutdownSignal>())
        .await
}
