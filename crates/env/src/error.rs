//! 환경 제어 에러 타입
//!
//! [`EnvError`]는 외부 도구 실행과 컨테이너 환경 조작 중 발생하는 모든 에러를
//! 표현합니다. `From<EnvError> for HarnessError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use s3gate_core::error::HarnessError;

/// 환경 제어 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    /// 필수 도구 누락
    #[error("required dependency not found: {tool}: {reason}")]
    MissingDependency {
        /// 도구 이름
        tool: String,
        /// 누락 사유
        reason: String,
    },

    /// 프로세스 실행 실패 (실행 파일 없음, 권한 없음 등)
    #[error("failed to spawn `{program}`: {reason}")]
    Spawn {
        /// 실행 파일
        program: String,
        /// 실패 사유
        reason: String,
    },

    /// 도구가 0 이 아닌 상태로 종료
    #[error("`{command}` exited with status {status}: {stderr}")]
    ToolFailed {
        /// 실행한 명령줄
        command: String,
        /// 종료 코드
        status: i32,
        /// 캡처된 stderr (있을 경우)
        stderr: String,
    },

    /// 이미지 빌드 단계 실패
    #[error("build step '{step}' failed with exit status {status}")]
    BuildFailed {
        /// 빌드 단계 이름
        step: String,
        /// 종료 코드
        status: i32,
    },

    /// 모듈 검증 스위트 실패
    #[error("module validation '{suite}' failed with exit status {status}")]
    ValidationFailed {
        /// 스위트 이름
        suite: String,
        /// 종료 코드
        status: i32,
    },

    /// 생성된 컨테이너를 찾을 수 없음
    #[error("container matching '{0}' not found")]
    ContainerNotFound(String),

    /// 테스트 데이터 준비 실패
    #[error("fixture error: {path}: {reason}")]
    Fixture {
        /// 대상 경로
        path: String,
        /// 실패 사유
        reason: String,
    },
}

impl From<EnvError> for HarnessError {
    fn from(err: EnvError) -> Self {
        match err {
            EnvError::MissingDependency { tool, reason } => {
                HarnessError::MissingDependency { tool, reason }
            }
            EnvError::Spawn { program, reason } => HarnessError::Spawn { program, reason },
            EnvError::ToolFailed {
                command, status, ..
            } => HarnessError::Tool { command, status },
            EnvError::BuildFailed { step, status } => HarnessError::Build { step, status },
            EnvError::ValidationFailed { suite, status } => {
                HarnessError::Validation { suite, status }
            }
            EnvError::ContainerNotFound(filter) => HarnessError::Tool {
                command: format!("container lookup '{filter}'"),
                status: 1,
            },
            EnvError::Fixture { path, reason } => HarnessError::Io(std::io::Error::other(
                format!("fixture {path}: {reason}"),
            )),
        }
    }
}
