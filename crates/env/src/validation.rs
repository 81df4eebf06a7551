//! 빌드된 이미지 내부 모듈 검증
//!
//! 단위 테스트 디렉토리를 컨테이너에 마운트하고 이미지의 njs 인터프리터로
//! 각 스크립트를 실행합니다. 스위트는 고정된 테스트용 자격 증명과 엔드포인트
//! 환경변수로 실행되며, 0 이 아닌 종료는 [`EnvError::ValidationFailed`]입니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use s3gate_core::config::{ValidationConfig, ValidationSuite};
use tracing::info;

use crate::command::CommandSpec;
use crate::error::EnvError;
use crate::runner::CommandRunner;

/// 모든 스위트에 주입되는 고정 환경변수
const FIXED_ENV: &[(&str, &str)] = &[
    ("DEBUG", "true"),
    ("S3_STYLE", "virtual"),
    ("AWS_ACCESS_KEY_ID", "unit_test"),
    ("AWS_SECRET_ACCESS_KEY", "unit_test"),
    ("S3_BUCKET_NAME", "unit_test"),
    ("S3_SERVER", "unit_test"),
    ("S3_SERVER_PROTO", "https"),
    ("S3_SERVER_PORT", "443"),
    ("S3_REGION", "test-1"),
    ("AWS_SIGS_VERSION", "4"),
];

/// 세션 토큰을 요구하는 스위트에 추가되는 환경변수
const SESSION_TOKEN_ENV: (&str, &str) = ("AWS_SESSION_TOKEN", "unit_test");

/// Windows 계열 셸의 경로 변환 비활성화
const NO_PATH_CONVERSION: (&str, &str) = ("MSYS_NO_PATHCONV", "1");

/// 이미지 내부 모듈 검증기
pub struct ModuleValidator<R: CommandRunner> {
    runner: Arc<R>,
    docker: PathBuf,
    image: String,
    config: ValidationConfig,
}

impl<R: CommandRunner> ModuleValidator<R> {
    /// 새 검증기를 생성합니다.
    pub fn new(
        runner: Arc<R>,
        docker: impl Into<PathBuf>,
        image: impl Into<String>,
        config: ValidationConfig,
    ) -> Self {
        Self {
            runner,
            docker: docker.into(),
            image: image.into(),
            config,
        }
    }

    /// 스위트 하나를 실행할 명령을 구성합니다.
    pub fn suite_command(&self, unit_dir: &Path, suite: &ValidationSuite) -> CommandSpec {
        let mount_point = self.config.mount_point.as_str();
        let mut spec = CommandSpec::new(&self.docker)
            .env(NO_PATH_CONVERSION.0, NO_PATH_CONVERSION.1)
            .args(["run", "--rm", "-v"])
            .arg(format!("{}:{mount_point}", unit_dir.display()))
            .args(["--workdir", mount_point]);

        let token = suite.session_token.then_some(SESSION_TOKEN_ENV);
        for (key, value) in FIXED_ENV.iter().copied().chain(token) {
            spec = spec.arg("-e").arg(format!("{key}={value}"));
        }

        spec.args(["--entrypoint", self.config.entrypoint.as_str()])
            .arg(self.image.as_str())
            .args(["-t", "module", "-p", self.config.module_path.as_str()])
            .arg(format!("{mount_point}/{}", suite.script))
    }

    /// 설정된 모든 스위트를 순서대로 실행합니다.
    ///
    /// 비활성화되어 있으면 아무것도 실행하지 않고 0 을 반환합니다.
    ///
    /// # Errors
    ///
    /// 첫 번째로 실패한 스위트에서 `EnvError::ValidationFailed`를 반환합니다.
    pub async fn validate_all(&self) -> Result<usize, EnvError> {
        if !self.config.enabled {
            info!("module validation disabled");
            return Ok(0);
        }

        let unit_dir = std::path::absolute(&self.config.unit_dir).map_err(|e| {
            EnvError::Fixture {
                path: self.config.unit_dir.clone(),
                reason: e.to_string(),
            }
        })?;

        for suite in &self.config.suites {
            let spec = self.suite_command(&unit_dir, suite);
            let output = self.runner.run(&spec).await?;
            if !output.is_success() {
                return Err(EnvError::ValidationFailed {
                    suite: suite_label(suite),
                    status: output.status,
                });
            }
            info!(suite = %suite_label(suite), "module validation passed");
        }
        Ok(self.config.suites.len())
    }
}

fn suite_label(suite: &ValidationSuite) -> String {
    if suite.session_token {
        format!("{} (session token)", suite.script)
    } else {
        suite.script.clone()
    }
}
