//! 의존성 사전 점검
//!
//! 빌드나 환경 변경 이전에 필수 외부 도구가 `PATH`에 존재하고 실행 가능한지
//! 확인합니다. 필수 도구가 하나라도 없으면 [`EnvError::MissingDependency`]를
//! 반환하며, 이 경우 어떤 빌드/환경 명령도 실행되지 않습니다.
//!
//! | 도구          | 필수 여부 | 비고                                     |
//! |---------------|-----------|------------------------------------------|
//! | docker        | 필수      | 컨테이너 런타임                          |
//! | compose       | 필수      | `docker compose` (v2 이상) 또는 `docker-compose` |
//! | curl          | 필수      | 헬스 체크                                |
//! | wait-for-it   | 선택      | 없으면 경고 후 TCP 대기 생략             |

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::command::CommandSpec;
use crate::compose::ComposeCommand;
use crate::error::EnvError;
use crate::runner::CommandRunner;

/// 컨테이너 런타임 실행 파일 이름
pub const DOCKER: &str = "docker";
/// 독립 실행형 compose 실행 파일 이름
pub const DOCKER_COMPOSE: &str = "docker-compose";
/// HTTP 클라이언트 실행 파일 이름
pub const CURL: &str = "curl";
/// TCP 대기 도우미 실행 파일 이름
pub const WAIT_FOR_IT: &str = "wait-for-it";

/// `docker compose version` 출력에서 주 버전을 추출하는 패턴
static COMPOSE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v?(\d+)\.(\d+)\.(\d+)").expect("static pattern"));

/// compose 플러그인으로 인정하는 최소 주 버전
const MIN_COMPOSE_PLUGIN_MAJOR: u32 = 2;

/// 도구 하나의 탐색 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDependency {
    /// 도구 이름
    pub name: String,
    /// 해석된 실행 경로 (없으면 None)
    pub path: Option<PathBuf>,
}

impl ToolDependency {
    /// 탐색에 성공했는지 확인합니다.
    pub fn is_resolved(&self) -> bool {
        self.path.is_some()
    }
}

/// 사전 점검을 통과한 도구 집합
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// 컨테이너 런타임
    pub docker: PathBuf,
    /// compose 호출 방식
    pub compose: ComposeCommand,
    /// HTTP 클라이언트
    pub http_client: PathBuf,
    /// 선택적 TCP 대기 도우미
    pub tcp_wait: Option<PathBuf>,
}

/// `PATH` 기반 의존성 점검기
pub struct DependencyProber<R: CommandRunner> {
    runner: Arc<R>,
    search_path: OsString,
}

impl<R: CommandRunner> DependencyProber<R> {
    /// 현재 프로세스의 `PATH`를 탐색하는 점검기를 생성합니다.
    pub fn new(runner: Arc<R>) -> Self {
        let search_path = std::env::var_os("PATH").unwrap_or_default();
        Self::with_search_path(runner, search_path)
    }

    /// 지정된 탐색 경로를 사용하는 점검기를 생성합니다.
    pub fn with_search_path(runner: Arc<R>, search_path: impl Into<OsString>) -> Self {
        Self {
            runner,
            search_path: search_path.into(),
        }
    }

    /// 이름으로 실행 파일을 찾습니다.
    pub fn resolve(&self, name: &str) -> ToolDependency {
        let path = std::env::split_paths(&self.search_path)
            .map(|dir| dir.join(name))
            .find(|candidate| is_executable(candidate));
        ToolDependency {
            name: name.to_owned(),
            path,
        }
    }

    /// 모든 필수 도구를 점검하고 [`Toolchain`]을 반환합니다.
    ///
    /// # Errors
    ///
    /// 필수 도구가 없거나 compose 메커니즘을 찾지 못하면
    /// `EnvError::MissingDependency`를 반환합니다.
    pub async fn probe(&self) -> Result<Toolchain, EnvError> {
        let docker = require(self.resolve(DOCKER))?;
        let compose = self.probe_compose(&docker).await?;
        let http_client = require(self.resolve(CURL))?;

        let tcp_wait = self.resolve(WAIT_FOR_IT).path;
        if tcp_wait.is_none() {
            warn!(
                tool = WAIT_FOR_IT,
                "optional dependency not found, skipping tcp readiness check"
            );
        }

        let toolchain = Toolchain {
            docker,
            compose,
            http_client,
            tcp_wait,
        };
        info!(
            docker = %toolchain.docker.display(),
            compose = %toolchain.compose,
            http_client = %toolchain.http_client.display(),
            tcp_wait = toolchain.tcp_wait.is_some(),
            "dependency preflight passed"
        );
        Ok(toolchain)
    }

    /// compose 플러그인(v2 이상)을 우선 확인하고, 없으면 독립 실행형을 찾습니다.
    async fn probe_compose(&self, docker: &Path) -> Result<ComposeCommand, EnvError> {
        let spec = CommandSpec::new(docker)
            .args(["compose", "version"])
            .capture();

        match self.runner.run(&spec).await {
            Ok(output) if output.is_success() => {
                if let Some(major) = compose_major_version(&output.stdout) {
                    if major >= MIN_COMPOSE_PLUGIN_MAJOR {
                        debug!(major, "using docker compose plugin");
                        return Ok(ComposeCommand::Plugin {
                            docker: docker.to_path_buf(),
                        });
                    }
                    debug!(major, "docker compose plugin too old");
                }
            }
            Ok(output) => {
                debug!(status = output.status, "docker compose plugin unavailable");
            }
            Err(e) => {
                debug!(error = %e, "docker compose plugin probe failed");
            }
        }

        let binary = self.resolve(DOCKER_COMPOSE).path.ok_or_else(|| {
            EnvError::MissingDependency {
                tool: DOCKER_COMPOSE.to_owned(),
                reason: "neither `docker compose` (v2+) nor `docker-compose` is available"
                    .to_owned(),
            }
        })?;
        debug!(path = %binary.display(), "using standalone docker-compose");
        Ok(ComposeCommand::Standalone { binary })
    }
}

/// `docker compose version` 출력에서 주 버전을 추출합니다.
///
/// 버전 문자열이 없으면 `None`을 반환합니다.
pub fn compose_major_version(output: &str) -> Option<u32> {
    COMPOSE_VERSION
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn require(dep: ToolDependency) -> Result<PathBuf, EnvError> {
    dep.path.ok_or_else(|| EnvError::MissingDependency {
        tool: dep.name.clone(),
        reason: "not found in PATH or not executable".to_owned(),
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
