//! 도메인 타입: 시나리오 설정, 결과, 종료 상태
//!
//! 오케스트레이터의 모든 구성 요소가 공유하는 데이터 구조를 정의합니다.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 서명 버전 환경변수명
pub const ENV_SIGS_VERSION: &str = "AWS_SIGS_VERSION";
/// 디렉토리 목록 허용 환경변수명
pub const ENV_ALLOW_DIRECTORY_LIST: &str = "ALLOW_DIRECTORY_LIST";
/// 인덱스 페이지 제공 환경변수명
pub const ENV_PROVIDE_INDEX_PAGE: &str = "PROVIDE_INDEX_PAGE";
/// 디렉토리 경로에 슬래시 추가 환경변수명
pub const ENV_APPEND_SLASH: &str = "APPEND_SLASH_FOR_POSSIBLE_DIRECTORY";

/// 게이트웨이가 백엔드 요청에 사용하는 서명 버전
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SignatureVersion {
    /// 서명 v2
    V2,
    /// 서명 v4
    V4,
}

impl SignatureVersion {
    /// 숫자 형태의 버전을 반환합니다.
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::V2 => 2,
            Self::V4 => 4,
        }
    }
}

impl TryFrom<u8> for SignatureVersion {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Self::V2),
            4 => Ok(Self::V4),
            other => Err(ConfigError::InvalidValue {
                field: "signature_version".to_owned(),
                reason: format!("unsupported signature version {other}, expected 2 or 4"),
            }),
        }
    }
}

impl From<SignatureVersion> for u8 {
    fn from(value: SignatureVersion) -> Self {
        value.as_u8()
    }
}

impl fmt::Display for SignatureVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.as_u8())
    }
}

/// 하나의 테스트 시나리오 설정
///
/// 컨테이너 시작 시 환경변수로 주입됩니다. 생성 후 변경되지 않으며
/// 값으로 전달됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// 서명 버전
    pub signature_version: SignatureVersion,
    /// 디렉토리 목록 허용 여부
    pub allow_directory_listing: bool,
    /// 정적 사이트 인덱스 페이지 제공 여부
    pub provide_index_page: bool,
    /// 디렉토리로 추정되는 경로에 `/` 추가 여부
    pub append_slash_for_directory: bool,
}

impl ScenarioConfig {
    /// 새 시나리오 설정을 생성합니다.
    pub const fn new(
        signature_version: SignatureVersion,
        allow_directory_listing: bool,
        provide_index_page: bool,
        append_slash_for_directory: bool,
    ) -> Self {
        Self {
            signature_version,
            allow_directory_listing,
            provide_index_page,
            append_slash_for_directory,
        }
    }

    /// compose 호출에 주입할 환경변수 목록을 반환합니다.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        vec![
            (
                ENV_SIGS_VERSION.to_owned(),
                self.signature_version.as_u8().to_string(),
            ),
            (
                ENV_ALLOW_DIRECTORY_LIST.to_owned(),
                flag(self.allow_directory_listing).to_owned(),
            ),
            (
                ENV_PROVIDE_INDEX_PAGE.to_owned(),
                flag(self.provide_index_page).to_owned(),
            ),
            (
                ENV_APPEND_SLASH.to_owned(),
                flag(self.append_slash_for_directory).to_owned(),
            ),
        ]
    }

    /// 검증 스크립트에 전달할 위치 인자 4개를 순서대로 반환합니다.
    pub fn positional_args(&self) -> [String; 4] {
        [
            self.signature_version.as_u8().to_string(),
            flag(self.allow_directory_listing).to_owned(),
            flag(self.provide_index_page).to_owned(),
            flag(self.append_slash_for_directory).to_owned(),
        ]
    }

    /// `(2,0,0,0)` 형식의 튜플 표기
    pub fn tuple(&self) -> String {
        let [sig, listing, index, slash] = self.positional_args();
        format!("({sig},{listing},{index},{slash})")
    }
}

impl fmt::Display for ScenarioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sigs={} directory_list={} index_page={} append_slash={}",
            self.signature_version,
            flag(self.allow_directory_listing),
            flag(self.provide_index_page),
            flag(self.append_slash_for_directory),
        )
    }
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

/// 한 시나리오의 최종 결과
///
/// 시나리오 종료 시 한 번 생성되며 이후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// 실행한 설정
    pub config: ScenarioConfig,
    /// HTTP 검증 스크립트 통과 여부
    pub http_assertions_passed: bool,
    /// 게이트웨이 로그에서 발견된 서명 버전 마커 라인 수
    pub log_evidence_count: usize,
    /// 시나리오 전체 통과 여부
    pub passed: bool,
}

/// 프로세스 종료 상태
///
/// 정리 가드의 동작과 최종 종료 코드를 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "code", rename_all = "snake_case")]
pub enum ExitOutcome {
    /// 모든 단계 성공
    Success,
    /// 검증/로그 확인/모듈 검증 실패 (코드 2)
    TestFailure,
    /// 필수 의존성 누락 (코드 3)
    MissingDependency,
    /// 외부 도구의 예기치 않은 실패 (도구의 종료 코드 그대로)
    Unexpected(i32),
}

impl ExitOutcome {
    /// 테스트 실패 종료 코드
    pub const TEST_FAILURE_CODE: i32 = 2;
    /// 의존성 누락 종료 코드
    pub const MISSING_DEPENDENCY_CODE: i32 = 3;

    /// 프로세스 종료 코드를 반환합니다.
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::TestFailure => Self::TEST_FAILURE_CODE,
            Self::MissingDependency => Self::MISSING_DEPENDENCY_CODE,
            // 0 으로 보고되는 예기치 않은 실패는 성공으로 오인되지 않도록 1 로 바꿉니다.
            Self::Unexpected(0) => 1,
            Self::Unexpected(code) => *code,
        }
    }

    /// 성공 여부
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::TestFailure => write!(f, "test_failure"),
            Self::MissingDependency => write!(f, "missing_dependency"),
            Self::Unexpected(code) => write!(f, "unexpected_error({code})"),
        }
    }
}

/// 빌드할 게이트웨이 이미지 계열
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    /// 기본 (오픈소스) 이미지
    #[default]
    Oss,
    /// 상용 라이선스 이미지
    Plus,
}

impl Flavor {
    /// Dockerfile 접미사 및 이미지 태그로 쓰이는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oss => "oss",
            Self::Plus => "plus",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CLI 위치 인자로 선택되는 빌드 변형
///
/// - 인자 없음 ⇒ `oss`
/// - `plus` 로 끝남 ⇒ 상용 변형
/// - `latest-njs-` 접두사 ⇒ 최신 런타임 레이어 추가 빌드
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildVariant {
    /// 이미지 계열
    pub flavor: Flavor,
    /// 최신 런타임 레이어 추가 여부
    pub latest_runtime: bool,
}

impl BuildVariant {
    /// 최신 런타임 변형을 나타내는 접두사
    pub const LATEST_RUNTIME_PREFIX: &'static str = "latest-njs-";

    /// CLI 에 표시되는 변형 이름 (`latest-njs-plus` 등)
    pub fn name(&self) -> String {
        if self.latest_runtime {
            format!("{}{}", Self::LATEST_RUNTIME_PREFIX, self.flavor)
        } else {
            self.flavor.to_string()
        }
    }
}

impl FromStr for BuildVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (latest_runtime, rest) = match s.strip_prefix(Self::LATEST_RUNTIME_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let flavor = match rest {
            "oss" => Flavor::Oss,
            "plus" => Flavor::Plus,
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "variant".to_owned(),
                    reason: format!(
                        "unknown variant '{s}', expected one of: oss, plus, latest-njs-oss, latest-njs-plus"
                    ),
                });
            }
        };
        Ok(Self {
            flavor,
            latest_runtime,
        })
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
