//! 컨테이너 환경 수명 주기 관리
//!
//! [`EnvironmentController`]는 게이트웨이와 백엔드로 구성된 다중 컨테이너 환경을
//! 프로젝트 이름 하나로 관리합니다.
//!
//! - `ensure`: 백엔드가 실행 중이 아니면 한 번만 생성하고 테스트 데이터를 복사한 뒤,
//!   항상 시나리오 환경변수로 `up -d`를 실행합니다.
//! - `stop`: 컨테이너를 정지만 합니다 (로그 보존).
//! - `remove`: 프로젝트의 모든 컨테이너를 강제로 제거합니다.
//! - `logs`: 집계된 로그 텍스트를 반환합니다.

use std::path::PathBuf;
use std::sync::Arc;

use s3gate_core::ScenarioConfig;
use s3gate_core::config::ProjectConfig;
use tracing::{debug, info};

use crate::command::CommandSpec;
use crate::compose::Compose;
use crate::error::EnvError;
use crate::probe::Toolchain;
use crate::runner::CommandRunner;

/// `ensure` 호출 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// 환경을 새로 생성하고 테스트 데이터를 복사함
    Created,
    /// 기존 환경에 새 설정을 적용함
    Reconfigured,
}

/// 다중 컨테이너 환경 제어기
pub struct EnvironmentController<R: CommandRunner> {
    runner: Arc<R>,
    docker: PathBuf,
    compose: Compose,
    backend_filter: String,
    data_dir: String,
}

impl<R: CommandRunner> EnvironmentController<R> {
    /// 새 제어기를 생성합니다.
    pub fn new(
        runner: Arc<R>,
        toolchain: &Toolchain,
        project: &ProjectConfig,
        data_dir: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            docker: toolchain.docker.clone(),
            compose: Compose::new(
                toolchain.compose.clone(),
                project.compose_file.clone(),
                project.name.clone(),
            ),
            backend_filter: backend_filter(&project.name, &project.backend_service),
            data_dir: data_dir.into(),
        }
    }

    /// compose 명령 빌더
    pub fn compose(&self) -> &Compose {
        &self.compose
    }

    /// 백엔드 컨테이너 이름 필터 (`<project>[-_]<backend>[-_]1`)
    pub fn backend_filter(&self) -> &str {
        &self.backend_filter
    }

    /// 환경이 주어진 설정으로 실행 중이도록 보장합니다.
    ///
    /// 실행 중인 백엔드 컨테이너가 없을 때만 생성과 데이터 복사를 수행하므로
    /// 여러 번 호출해도 데이터는 한 번만 복사됩니다.
    pub async fn ensure(&self, config: &ScenarioConfig) -> Result<EnsureOutcome, EnvError> {
        let outcome = if self.backend_running().await? {
            EnsureOutcome::Reconfigured
        } else {
            self.materialize(config).await?;
            EnsureOutcome::Created
        };

        self.exec(self.compose.up_detached(config)).await?;
        info!(
            scenario = %config,
            project = self.compose.project(),
            created = outcome == EnsureOutcome::Created,
            "environment up"
        );
        Ok(outcome)
    }

    /// 컨테이너를 정지합니다. `service`가 None 이면 프로젝트 전체를 정지합니다.
    pub async fn stop(&self, service: Option<&str>) -> Result<(), EnvError> {
        self.exec(self.compose.stop(service)).await?;
        debug!(service = service.unwrap_or("*"), "environment stopped");
        Ok(())
    }

    /// 프로젝트의 모든 컨테이너를 강제로 제거합니다.
    pub async fn remove(&self) -> Result<(), EnvError> {
        self.exec(self.compose.remove()).await?;
        debug!(project = self.compose.project(), "environment removed");
        Ok(())
    }

    /// 집계된 로그 텍스트를 반환합니다.
    pub async fn logs(&self, service: Option<&str>) -> Result<String, EnvError> {
        let output = self.exec(self.compose.logs(service)).await?;
        Ok(output)
    }

    async fn backend_running(&self) -> Result<bool, EnvError> {
        let spec = self.docker_cmd().args([
            "ps".to_owned(),
            "-q".to_owned(),
            "-f".to_owned(),
            format!("name={}", self.backend_filter),
        ]);
        let ids = self.exec(spec.capture()).await?;
        Ok(!ids.trim().is_empty())
    }

    /// 최초 1회: 컨테이너 생성, 백엔드에 데이터 복사, 변경 내역 기록
    async fn materialize(&self, config: &ScenarioConfig) -> Result<(), EnvError> {
        info!(project = self.compose.project(), "creating environment");
        self.exec(self.compose.up_no_start(config)).await?;

        let spec = self.docker_cmd().args([
            "ps".to_owned(),
            "-aq".to_owned(),
            "-f".to_owned(),
            format!("name={}", self.backend_filter),
        ]);
        let ids = self.exec(spec.capture()).await?;
        let container = ids
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| EnvError::ContainerNotFound(self.backend_filter.clone()))?
            .to_owned();

        self.exec(
            self.docker_cmd()
                .arg("cp")
                .arg(self.data_dir.as_str())
                .arg(format!("{container}:/")),
        )
        .await?;
        info!(
            container = %container,
            data_dir = %self.data_dir,
            "copied fixture data into backend"
        );

        let diff = self
            .exec(self.docker_cmd().arg("diff").arg(container.as_str()).capture())
            .await?;
        debug!(container = %container, changes = diff.lines().count(), "backend diff");
        for line in diff.lines() {
            debug!(container = %container, "{line}");
        }
        Ok(())
    }

    fn docker_cmd(&self) -> CommandSpec {
        CommandSpec::new(&self.docker)
    }

    async fn exec(&self, spec: CommandSpec) -> Result<String, EnvError> {
        let output = self.runner.run(&spec).await?.check(&spec)?;
        Ok(output.stdout)
    }
}

/// compose v1 (`_`)과 v2 (`-`) 명명 규칙을 모두 허용하는 이름 필터
pub fn backend_filter(project: &str, backend: &str) -> String {
    format!("{project}[-_]{backend}[-_]1")
}
