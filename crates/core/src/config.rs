//! 설정 관리: s3gate.toml 파싱 및 런타임 설정
//!
//! [`HarnessConfig`]는 오케스트레이터 전체 설정을 담는 최상위 구조체입니다.
//! 설정 파일이 없어도 모든 필드에 기본값이 있어 그대로 실행할 수 있습니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (로그 레벨/형식, 최고 우선)
//! 2. 환경변수 (`S3GATE_ENDPOINTS_GATEWAY_PORT=8989` 형식)
//! 3. 설정 파일 (`--config` 로 지정한 TOML)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), s3gate_core::error::HarnessError> {
//! use s3gate_core::config::HarnessConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = HarnessConfig::load(Some("s3gate.toml")).await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = HarnessConfig::parse("[project]\nname = \"ngt\"")?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, HarnessError};

/// 마커 패턴에서 서명 버전으로 치환되는 자리표시자
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// 설정 상한값 상수
const MAX_READINESS_ATTEMPTS: u32 = 20;
const MAX_READINESS_DELAY_SECS: u64 = 60;

/// 파싱에 실패해 적용되지 않은 환경변수
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredOverride {
    /// 환경변수 이름
    pub key: String,
    /// 원래 값
    pub value: String,
    /// 기대한 타입
    pub expected: &'static str,
}

impl fmt::Display for IgnoredOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ignoring {}={:?}: not a valid {}",
            self.key, self.value, self.expected
        )
    }
}

/// s3gate 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// compose 프로젝트 설정
    #[serde(default)]
    pub project: ProjectConfig,
    /// 게이트웨이/백엔드 엔드포인트
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    /// 준비 상태 폴링 설정
    #[serde(default)]
    pub readiness: ReadinessConfig,
    /// 테스트 데이터 및 검증 스크립트
    #[serde(default)]
    pub fixtures: FixturesConfig,
    /// 이미지 빌드 설정
    #[serde(default)]
    pub build: BuildConfig,
    /// 이미지 내부 모듈 검증 설정
    #[serde(default)]
    pub validation: ValidationConfig,
    /// 로그 기반 사후 검증 설정
    #[serde(default)]
    pub verification: VerificationConfig,
}

impl HarnessConfig {
    /// 설정을 로드하고 환경변수 오버라이드를 적용한 뒤 검증합니다.
    ///
    /// `path`가 `None`이면 기본값에서 시작합니다. 무시된 환경변수는 `warn!`으로
    /// 기록됩니다.
    pub async fn load(path: Option<impl AsRef<Path>>) -> Result<Self, HarnessError> {
        let (config, ignored) = Self::load_unvalidated(path).await?;
        for entry in &ignored {
            warn!(env_key = %entry.key, value = %entry.value, "{entry}");
        }
        config.validate()?;
        Ok(config)
    }

    /// 파일과 환경변수까지만 반영하고 검증은 호출자에게 맡깁니다.
    ///
    /// CLI 오버라이드를 적용한 뒤 한 번만 검증해야 하는 바이너리에서 사용합니다.
    /// 파싱할 수 없어 무시된 환경변수 목록을 함께 반환합니다.
    pub async fn load_unvalidated(
        path: Option<impl AsRef<Path>>,
    ) -> Result<(Self, Vec<IgnoredOverride>), HarnessError> {
        let mut config = match path {
            Some(path) => Self::from_file(path).await?,
            None => Self::default(),
        };
        let ignored = config.apply_env_overrides();
        Ok((config, ignored))
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HarnessError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                HarnessError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, HarnessError> {
        toml::from_str(toml_str).map_err(|e| {
            HarnessError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `S3GATE_{SECTION}_{FIELD}`.
    /// 타입에 맞지 않는 값은 적용하지 않고 반환 목록에 담습니다.
    pub fn apply_env_overrides(&mut self) -> Vec<IgnoredOverride> {
        let mut ignored = Vec::new();

        // General
        override_string(&mut self.general.log_level, "S3GATE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "S3GATE_GENERAL_LOG_FORMAT");

        // Project
        override_string(&mut self.project.name, "S3GATE_PROJECT_NAME");
        override_string(
            &mut self.project.compose_file,
            "S3GATE_PROJECT_COMPOSE_FILE",
        );

        // Endpoints
        override_string(
            &mut self.endpoints.gateway_host,
            "S3GATE_ENDPOINTS_GATEWAY_HOST",
        );
        override_parsed(
            &mut self.endpoints.gateway_port,
            "S3GATE_ENDPOINTS_GATEWAY_PORT",
            &mut ignored,
        );
        override_string(
            &mut self.endpoints.backend_url,
            "S3GATE_ENDPOINTS_BACKEND_URL",
        );

        // Readiness
        override_parsed(
            &mut self.readiness.max_attempts,
            "S3GATE_READINESS_MAX_ATTEMPTS",
            &mut ignored,
        );
        override_parsed(
            &mut self.readiness.delay_secs,
            "S3GATE_READINESS_DELAY_SECS",
            &mut ignored,
        );

        // Build / validation
        override_string(&mut self.build.image, "S3GATE_BUILD_IMAGE");
        override_parsed(
            &mut self.validation.enabled,
            "S3GATE_VALIDATION_ENABLED",
            &mut ignored,
        );

        // Verification
        override_parsed(
            &mut self.verification.min_marker_lines,
            "S3GATE_VERIFICATION_MIN_MARKER_LINES",
            &mut ignored,
        );

        ignored
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), HarnessError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        // compose 프로젝트 이름 규칙: 소문자, 숫자, `-`, `_`
        let name = &self.project.name;
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(invalid(
                "project.name",
                "must be non-empty and contain only [a-z0-9_-]".to_owned(),
            ));
        }

        for (field, value) in [
            ("project.compose_file", &self.project.compose_file),
            ("project.gateway_service", &self.project.gateway_service),
            ("project.backend_service", &self.project.backend_service),
            ("endpoints.gateway_host", &self.endpoints.gateway_host),
            ("endpoints.backend_url", &self.endpoints.backend_url),
            ("build.image", &self.build.image),
            ("fixtures.assertion_script", &self.fixtures.assertion_script),
        ] {
            if value.is_empty() {
                return Err(invalid(field, "must not be empty".to_owned()));
            }
        }

        let valid_protos = ["http", "https"];
        if !valid_protos.contains(&self.endpoints.gateway_proto.as_str()) {
            return Err(invalid(
                "endpoints.gateway_proto",
                format!("must be one of: {}", valid_protos.join(", ")),
            ));
        }

        if self.endpoints.gateway_port == 0 {
            return Err(invalid(
                "endpoints.gateway_port",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.readiness.max_attempts == 0 || self.readiness.max_attempts > MAX_READINESS_ATTEMPTS
        {
            return Err(invalid(
                "readiness.max_attempts",
                format!("must be 1-{MAX_READINESS_ATTEMPTS}"),
            ));
        }

        if self.readiness.delay_secs > MAX_READINESS_DELAY_SECS {
            return Err(invalid(
                "readiness.delay_secs",
                format!("must be 0-{MAX_READINESS_DELAY_SECS}"),
            ));
        }

        if self.verification.min_marker_lines == 0 {
            return Err(invalid(
                "verification.min_marker_lines",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.verification.markers.is_empty() {
            return Err(invalid(
                "verification.markers",
                "at least one marker pattern is required".to_owned(),
            ));
        }

        if let Some(marker) = self
            .verification
            .markers
            .iter()
            .find(|m| !m.contains(VERSION_PLACEHOLDER))
        {
            return Err(invalid(
                "verification.markers",
                format!("pattern '{marker}' lacks the {VERSION_PLACEHOLDER} placeholder"),
            ));
        }

        if self.validation.enabled && self.validation.suites.is_empty() {
            return Err(invalid(
                "validation.suites",
                "must not be empty when validation is enabled".to_owned(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> HarnessError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// compose 프로젝트 설정
///
/// 모든 컨테이너 조작은 이 프로젝트 이름과 compose 파일로 범위가 제한됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// compose 프로젝트 이름
    pub name: String,
    /// compose 설정 파일 경로
    pub compose_file: String,
    /// 게이트웨이 서비스 이름
    pub gateway_service: String,
    /// 스토리지 백엔드 서비스 이름
    pub backend_service: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "ngt".to_owned(),
            compose_file: "test/docker-compose.yaml".to_owned(),
            gateway_service: "nginx-s3-gateway".to_owned(),
            backend_service: "minio".to_owned(),
        }
    }
}

/// 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// 게이트웨이 프로토콜
    pub gateway_proto: String,
    /// 게이트웨이 호스트
    pub gateway_host: String,
    /// 게이트웨이 포트
    pub gateway_port: u16,
    /// 백엔드 기본 URL
    pub backend_url: String,
    /// 백엔드 헬스 체크 경로
    pub health_path: String,
}

impl EndpointsConfig {
    /// 검증 스크립트에 전달할 게이트웨이 기본 URL
    pub fn gateway_url(&self) -> String {
        format!(
            "{}://{}:{}",
            self.gateway_proto, self.gateway_host, self.gateway_port
        )
    }

    /// 백엔드 헬스 체크 URL
    pub fn health_url(&self) -> String {
        format!(
            "{}/{}",
            self.backend_url.trim_end_matches('/'),
            self.health_path.trim_start_matches('/')
        )
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            gateway_proto: "http".to_owned(),
            gateway_host: "localhost".to_owned(),
            gateway_port: 8989,
            backend_url: "http://localhost:9090".to_owned(),
            health_path: "/minio/health/cluster".to_owned(),
        }
    }
}

/// 준비 상태 폴링 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// 최대 시도 횟수
    pub max_attempts: u32,
    /// 시도 간 고정 대기 시간 (초)
    pub delay_secs: u64,
    /// 준비 완료로 인정하는 HTTP 상태 코드
    pub expected_status: String,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 2,
            expected_status: "200".to_owned(),
        }
    }
}

/// 테스트 데이터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixturesConfig {
    /// 테스트 루트 디렉토리 (검증 스크립트에 전달)
    pub test_dir: String,
    /// 백엔드 컨테이너에 복사할 데이터 디렉토리
    pub data_dir: String,
    /// 검증 스크립트 인터프리터
    pub assertion_interpreter: String,
    /// 검증 스크립트 경로
    pub assertion_script: String,
    /// 특수문자 파일명 테스트 데이터 생성 여부
    pub special_characters: bool,
}

impl Default for FixturesConfig {
    fn default() -> Self {
        Self {
            test_dir: "test".to_owned(),
            data_dir: "test/data".to_owned(),
            assertion_interpreter: "bash".to_owned(),
            assertion_script: "test/integration/test_api.sh".to_owned(),
            special_characters: true,
        }
    }
}

/// 빌드 시 주입하는 secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSecret {
    /// secret ID
    pub id: String,
    /// 원본 파일 경로
    pub src: String,
}

/// 이미지 빌드 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// 이미지 이름
    pub image: String,
    /// 빌드 컨텍스트 디렉토리
    pub context_dir: String,
    /// Dockerfile 이름 접두사 (`Dockerfile.oss` 등)
    pub dockerfile_prefix: String,
    /// 최신 런타임 레이어 Dockerfile 접미사
    pub latest_runtime_suffix: String,
    /// 상용 변형 BuildKit 빌드에 주입할 secret 목록
    pub secrets: Vec<BuildSecret>,
}

impl BuildConfig {
    /// `Dockerfile.<suffix>` 경로
    pub fn dockerfile(&self, suffix: &str) -> String {
        format!("{}.{}", self.dockerfile_prefix, suffix)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            image: "nginx-s3-gateway".to_owned(),
            context_dir: ".".to_owned(),
            dockerfile_prefix: "Dockerfile".to_owned(),
            latest_runtime_suffix: "latest-njs".to_owned(),
            secrets: vec![
                BuildSecret {
                    id: "nginx-crt".to_owned(),
                    src: "plus/etc/ssl/nginx/nginx-repo.crt".to_owned(),
                },
                BuildSecret {
                    id: "nginx-key".to_owned(),
                    src: "plus/etc/ssl/nginx/nginx-repo.key".to_owned(),
                },
            ],
        }
    }
}

/// 모듈 검증 스위트 하나
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSuite {
    /// 단위 테스트 디렉토리 내 스크립트 이름
    pub script: String,
    /// 세션 토큰 환경변수 제공 여부
    #[serde(default)]
    pub session_token: bool,
}

impl ValidationSuite {
    fn new(script: &str, session_token: bool) -> Self {
        Self {
            script: script.to_owned(),
            session_token,
        }
    }
}

/// 이미지 내부 모듈 검증 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 호스트의 단위 테스트 디렉토리
    pub unit_dir: String,
    /// 컨테이너 내부 마운트 위치
    pub mount_point: String,
    /// 검증기 entrypoint
    pub entrypoint: String,
    /// 모듈 검색 경로
    pub module_path: String,
    /// 실행할 스위트 목록 (순서대로)
    pub suites: Vec<ValidationSuite>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            unit_dir: "test/unit".to_owned(),
            mount_point: "/var/tmp".to_owned(),
            entrypoint: "/usr/bin/njs".to_owned(),
            module_path: "/etc/nginx".to_owned(),
            suites: vec![
                ValidationSuite::new("utils_test.js", true),
                ValidationSuite::new("awscredentials_test.js", true),
                ValidationSuite::new("awssig2_test.js", true),
                ValidationSuite::new("awssig4_test.js", true),
                ValidationSuite::new("s3gateway_test.js", true),
                ValidationSuite::new("awscredentials_test.js", false),
                ValidationSuite::new("awssig2_test.js", false),
                ValidationSuite::new("awssig4_test.js", false),
                ValidationSuite::new("s3gateway_test.js", false),
            ],
        }
    }
}

/// 로그 기반 사후 검증 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// 요구되는 최소 마커 라인 수
    pub min_marker_lines: u32,
    /// 마커 패턴 (`{version}`은 2 또는 4 로 치환)
    pub markers: Vec<String>,
}

impl VerificationConfig {
    /// 주어진 서명 버전에 대한 마커 문자열 목록
    pub fn markers_for(&self, version: u8) -> Vec<String> {
        self.markers
            .iter()
            .map(|m| m.replace(VERSION_PLACEHOLDER, &version.to_string()))
            .collect()
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            min_marker_lines: 3,
            markers: vec![
                "AWS Signatures Version: v{version}".to_owned(),
                "AWS v{version} Auth".to_owned(),
            ],
        }
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_parsed<T: FromStr>(
    target: &mut T,
    env_key: &str,
    ignored: &mut Vec<IgnoredOverride>,
) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => ignored.push(IgnoredOverride {
                key: env_key.to_owned(),
                value: val,
                expected: std::any::type_name::<T>(),
            }),
        }
    }
}
