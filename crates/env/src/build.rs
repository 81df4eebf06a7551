//! 테스트 대상 이미지 빌드
//!
//! 빌드 계획은 변형과 BuildKit 사용 가능 여부만으로 결정되는 순수 함수
//! [`BuildOrchestrator::plan`]으로 만들어지고, [`BuildOrchestrator::build`]가
//! 단계별로 실행합니다. 실패한 단계는 재시도 없이 즉시 도구의 종료 코드로 전파됩니다.
//!
//! | 변형         | BuildKit | Dockerfile               | 추가 옵션                               |
//! |--------------|----------|--------------------------|-----------------------------------------|
//! | oss          | -        | `Dockerfile.oss`         |                                         |
//! | plus         | 있음     | `Dockerfile.buildkit.plus` | `DOCKER_BUILDKIT=1`, secret, `--no-cache --squash` |
//! | plus         | 없음     | `Dockerfile.plus`        |                                         |
//! | latest-njs-* | -        | 위 빌드 + `Dockerfile.latest-njs` | 태그 `latest-njs-<flavor>`     |

use std::path::PathBuf;
use std::sync::Arc;

use s3gate_core::config::BuildConfig;
use s3gate_core::{BuildVariant, Flavor};
use tracing::{debug, info};

use crate::command::CommandSpec;
use crate::error::EnvError;
use crate::runner::CommandRunner;

/// BuildKit 활성화 환경변수
pub const DOCKER_BUILDKIT: &str = "DOCKER_BUILDKIT";

/// 빌드 단계 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStep {
    /// 로그와 에러에 쓰이는 단계 이름
    pub name: String,
    /// 실행할 명령
    pub spec: CommandSpec,
}

/// 이미지 빌드 오케스트레이터
pub struct BuildOrchestrator<R: CommandRunner> {
    runner: Arc<R>,
    docker: PathBuf,
    config: BuildConfig,
}

impl<R: CommandRunner> BuildOrchestrator<R> {
    /// 새 오케스트레이터를 생성합니다.
    pub fn new(runner: Arc<R>, docker: impl Into<PathBuf>, config: BuildConfig) -> Self {
        Self {
            runner,
            docker: docker.into(),
            config,
        }
    }

    /// 변형에 맞는 이미지를 빌드합니다.
    ///
    /// 상용 변형일 때만 BuildKit 사용 가능 여부(`docker buildx version`)를 확인합니다.
    ///
    /// # Errors
    ///
    /// 단계가 실패하면 `EnvError::BuildFailed`를 반환합니다.
    pub async fn build(&self, variant: BuildVariant) -> Result<Vec<BuildStep>, EnvError> {
        let buildkit = match variant.flavor {
            Flavor::Plus => self.buildkit_available().await,
            Flavor::Oss => false,
        };
        let steps = self.plan(variant, buildkit);
        info!(
            variant = %variant,
            buildkit,
            steps = steps.len(),
            "building images"
        );

        for step in &steps {
            info!(step = %step.name, "build step started");
            let output = self.runner.run(&step.spec).await?;
            if !output.is_success() {
                return Err(EnvError::BuildFailed {
                    step: step.name.clone(),
                    status: output.status,
                });
            }
            info!(step = %step.name, "build step finished");
        }
        Ok(steps)
    }

    /// `docker buildx version` 성공 여부로 BuildKit 사용 가능 여부를 판단합니다.
    pub async fn buildkit_available(&self) -> bool {
        let spec = CommandSpec::new(&self.docker)
            .args(["buildx", "version"])
            .capture();
        match self.runner.run(&spec).await {
            Ok(output) => {
                debug!(status = output.status, "buildx probe");
                output.is_success()
            }
            Err(e) => {
                debug!(error = %e, "buildx probe failed");
                false
            }
        }
    }

    /// 빌드 단계 목록을 계산합니다.
    pub fn plan(&self, variant: BuildVariant, buildkit: bool) -> Vec<BuildStep> {
        let flavor = variant.flavor.as_str();
        let image = &self.config.image;

        let base = match variant.flavor {
            Flavor::Plus if buildkit => {
                let mut spec = CommandSpec::new(&self.docker)
                    .env(DOCKER_BUILDKIT, "1")
                    .args(["build", "-f"])
                    .arg(self.config.dockerfile(&format!("buildkit.{flavor}")));
                for secret in &self.config.secrets {
                    spec = spec
                        .arg("--secret")
                        .arg(format!("id={},src={}", secret.id, secret.src));
                }
                spec.args(["--no-cache", "--squash"])
            }
            Flavor::Oss | Flavor::Plus => CommandSpec::new(&self.docker)
                .args(["build", "-f"])
                .arg(self.config.dockerfile(flavor)),
        };
        let base = base
            .arg("--tag")
            .arg(image.as_str())
            .arg("--tag")
            .arg(format!("{image}:{flavor}"))
            .arg(self.config.context_dir.as_str());

        let mut steps = vec![BuildStep {
            name: format!("build {flavor}{}", if buildkit { " (buildkit)" } else { "" }),
            spec: base,
        }];

        if variant.latest_runtime {
            let tag = variant.name();
            let layer = CommandSpec::new(&self.docker)
                .args(["build", "-f"])
                .arg(self.config.dockerfile(&self.config.latest_runtime_suffix))
                .arg("--tag")
                .arg(image.as_str())
                .arg("--tag")
                .arg(format!("{image}:{tag}"))
                .arg(self.config.context_dir.as_str());
            steps.push(BuildStep {
                name: format!("build {tag}"),
                spec: layer,
            });
        }

        steps
    }
}
