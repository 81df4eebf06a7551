//! 에러 타입: 오케스트레이션 실패 분류

use crate::types::ExitOutcome;

/// s3gate 최상위 에러 타입
///
/// 각 변형은 [`HarnessError::outcome`]을 통해 고정된 종료 코드로 매핑됩니다.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 필수 외부 도구 누락
    #[error("required dependency not found: {tool}: {reason}")]
    MissingDependency {
        /// 도구 이름
        tool: String,
        /// 누락 사유
        reason: String,
    },

    /// 이미지 빌드 실패
    #[error("image build step '{step}' failed with exit status {status}")]
    Build {
        /// 빌드 단계 이름
        step: String,
        /// 빌드 도구의 종료 코드
        status: i32,
    },

    /// 이미지 내부 모듈 검증 실패
    #[error("module validation '{suite}' failed with exit status {status}")]
    Validation {
        /// 검증 스크립트 이름
        suite: String,
        /// 검증 프로세스의 종료 코드
        status: i32,
    },

    /// HTTP 검증 스크립트 실패
    #[error("http assertions failed for scenario {scenario} with exit status {status}")]
    Assertion {
        /// 시나리오 설정 표기
        scenario: String,
        /// 검증 스크립트의 종료 코드
        status: i32,
    },

    /// 게이트웨이 로그에서 설정 경로 증거 부족
    #[error(
        "gateway was not detected using signature version {version} for scenario {scenario}: \
         found {found} marker lines, expected at least {required}"
    )]
    LogVerification {
        /// 시나리오 설정 표기
        scenario: String,
        /// 기대한 서명 버전 (`v2`/`v4`)
        version: String,
        /// 발견된 마커 라인 수
        found: usize,
        /// 요구되는 최소 라인 수
        required: usize,
    },

    /// 외부 도구의 예기치 않은 실패
    #[error("`{command}` exited with status {status}")]
    Tool {
        /// 실행한 명령줄
        command: String,
        /// 종료 코드
        status: i32,
    },

    /// 외부 도구 실행 불가
    #[error("failed to spawn `{program}`: {reason}")]
    Spawn {
        /// 실행 파일
        program: String,
        /// 실패 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// 에러를 프로세스 종료 상태로 매핑합니다.
    ///
    /// | 에러                                   | 종료 코드           |
    /// |----------------------------------------|---------------------|
    /// | Assertion, LogVerification, Validation | 2                   |
    /// | MissingDependency                      | 3                   |
    /// | Build, Tool                            | 도구의 종료 코드    |
    /// | Spawn                                  | 127                 |
    /// | Config, Io                             | 1                   |
    pub fn outcome(&self) -> ExitOutcome {
        match self {
            Self::Assertion { .. } | Self::LogVerification { .. } | Self::Validation { .. } => {
                ExitOutcome::TestFailure
            }
            Self::MissingDependency { .. } => ExitOutcome::MissingDependency,
            Self::Build { status, .. } | Self::Tool { status, .. } => {
                ExitOutcome::Unexpected(*status)
            }
            Self::Spawn { .. } => ExitOutcome::Unexpected(127),
            Self::Config(_) | Self::Io(_) => ExitOutcome::Unexpected(1),
        }
    }
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
