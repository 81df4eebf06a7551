//! compose 명령 구성
//!
//! 모든 compose 호출은 고정된 compose 파일과 프로젝트 이름(`-f <file> -p <project>`)으로
//! 범위가 제한됩니다. 이 모듈은 명령을 구성만 하며 실행하지 않습니다.

use std::fmt;
use std::path::PathBuf;

use s3gate_core::ScenarioConfig;

use crate::command::CommandSpec;

/// compose 호출 방식
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeCommand {
    /// `docker compose` 플러그인 (v2 이상)
    Plugin {
        /// docker 실행 파일 경로
        docker: PathBuf,
    },
    /// 독립 실행형 `docker-compose`
    Standalone {
        /// docker-compose 실행 파일 경로
        binary: PathBuf,
    },
}

impl ComposeCommand {
    /// 하위 명령 인자를 붙이기 전의 기본 명령
    fn base(&self) -> CommandSpec {
        match self {
            Self::Plugin { docker } => CommandSpec::new(docker).arg("compose"),
            Self::Standalone { binary } => CommandSpec::new(binary),
        }
    }
}

impl fmt::Display for ComposeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plugin { docker } => write!(f, "{} compose", docker.display()),
            Self::Standalone { binary } => write!(f, "{}", binary.display()),
        }
    }
}

/// 프로젝트 범위로 고정된 compose 명령 빌더
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compose {
    command: ComposeCommand,
    file: String,
    project: String,
}

impl Compose {
    /// 새 빌더를 생성합니다.
    pub fn new(
        command: ComposeCommand,
        file: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            command,
            file: file.into(),
            project: project.into(),
        }
    }

    /// 프로젝트 이름
    pub fn project(&self) -> &str {
        &self.project
    }

    fn base(&self) -> CommandSpec {
        self.command
            .base()
            .args(["-f", self.file.as_str(), "-p", self.project.as_str()])
    }

    /// 컨테이너를 생성만 하고 시작하지 않습니다 (`up --no-start`).
    pub fn up_no_start(&self, config: &ScenarioConfig) -> CommandSpec {
        self.base()
            .args(["up", "--no-start"])
            .envs(config.env_vars())
    }

    /// 시나리오 환경변수를 주입하여 백그라운드로 시작합니다 (`up -d`).
    ///
    /// 환경변수가 바뀐 서비스는 compose 가 재생성합니다.
    pub fn up_detached(&self, config: &ScenarioConfig) -> CommandSpec {
        self.base().args(["up", "-d"]).envs(config.env_vars())
    }

    /// 컨테이너를 정지합니다. 컨테이너는 로그 확인을 위해 유지됩니다.
    pub fn stop(&self, service: Option<&str>) -> CommandSpec {
        let spec = self.base().arg("stop");
        match service {
            Some(service) => spec.arg(service),
            None => spec,
        }
    }

    /// 프로젝트의 모든 컨테이너와 익명 볼륨을 강제로 제거합니다 (`rm -f -v`).
    pub fn remove(&self) -> CommandSpec {
        self.base().args(["rm", "-f", "-v"])
    }

    /// 집계된 로그를 캡처합니다.
    pub fn logs(&self, service: Option<&str>) -> CommandSpec {
        let spec = self.base().args(["logs", "--no-color"]).capture();
        match service {
            Some(service) => spec.arg(service),
            None => spec,
        }
    }
}
