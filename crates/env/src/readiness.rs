//! 준비 상태 폴링
//!
//! 백엔드 헬스 URL 을 고정 간격으로 제한된 횟수만큼 확인합니다. 모든 시도가
//! 실패해도 치명적이지 않으며 경고를 남기고 진행합니다. TCP 대기 도우미가
//! 있으면 이어서 게이트웨이 포트가 열릴 때까지 기다립니다.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use s3gate_core::config::{EndpointsConfig, ReadinessConfig};
use tracing::{debug, info, warn};

use crate::command::CommandSpec;
use crate::error::EnvError;
use crate::probe::Toolchain;
use crate::runner::CommandRunner;

/// 폴링 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessReport {
    /// 수행한 시도 횟수
    pub attempts: u32,
    /// 헬스 체크 성공 여부
    pub healthy: bool,
    /// 마지막으로 관찰한 HTTP 상태 코드
    pub last_status: String,
    /// TCP 대기 수행 여부
    pub tcp_checked: bool,
}

/// 헬스 엔드포인트 폴러
pub struct ReadinessPoller<R: CommandRunner> {
    runner: Arc<R>,
    http_client: PathBuf,
    tcp_wait: Option<PathBuf>,
    health_url: String,
    gateway_host: String,
    gateway_port: u16,
    max_attempts: u32,
    delay: Duration,
    expected_status: String,
}

impl<R: CommandRunner> ReadinessPoller<R> {
    /// 새 폴러를 생성합니다.
    pub fn new(
        runner: Arc<R>,
        toolchain: &Toolchain,
        endpoints: &EndpointsConfig,
        readiness: &ReadinessConfig,
    ) -> Self {
        Self {
            runner,
            http_client: toolchain.http_client.clone(),
            tcp_wait: toolchain.tcp_wait.clone(),
            health_url: endpoints.health_url(),
            gateway_host: endpoints.gateway_host.clone(),
            gateway_port: endpoints.gateway_port,
            max_attempts: readiness.max_attempts.max(1),
            delay: Duration::from_secs(readiness.delay_secs),
            expected_status: readiness.expected_status.clone(),
        }
    }

    /// 헬스 체크를 폴링하고, 가능하면 TCP 대기를 수행합니다.
    ///
    /// # Errors
    ///
    /// HTTP 클라이언트를 실행할 수 없거나 TCP 대기 도우미가 실패하면 에러를 반환합니다.
    /// 헬스 체크 재시도 소진은 에러가 아닙니다.
    pub async fn wait(&self) -> Result<ReadinessReport, EnvError> {
        let spec = CommandSpec::new(&self.http_client)
            .args(["-s", "-o", "/dev/null", "-w", "%{http_code}"])
            .arg(self.health_url.as_str())
            .capture();

        let mut attempts = 0;
        let mut last_status = String::new();
        let mut healthy = false;

        while attempts < self.max_attempts {
            attempts += 1;
            // curl 자체의 종료 코드는 무시하고 상태 코드 출력만 비교
            let output = self.runner.run(&spec).await?;
            last_status = output.stdout.trim().to_owned();
            debug!(attempt = attempts, status = %last_status, url = %self.health_url, "health poll");

            if last_status == self.expected_status {
                healthy = true;
                break;
            }
            if attempts < self.max_attempts {
                tokio::time::sleep(self.delay).await;
            }
        }

        if healthy {
            info!(attempts, url = %self.health_url, "backend healthy");
        } else {
            warn!(
                attempts,
                last_status = %last_status,
                url = %self.health_url,
                "backend health check did not succeed, continuing"
            );
        }

        let tcp_checked = self.wait_for_gateway().await?;

        Ok(ReadinessReport {
            attempts,
            healthy,
            last_status,
            tcp_checked,
        })
    }

    async fn wait_for_gateway(&self) -> Result<bool, EnvError> {
        let Some(helper) = &self.tcp_wait else {
            return Ok(false);
        };

        let spec = CommandSpec::new(helper).args([
            "-h".to_owned(),
            self.gateway_host.clone(),
            "-p".to_owned(),
            self.gateway_port.to_string(),
        ]);
        self.runner.run(&spec).await?.check(&spec)?;
        debug!(host = %self.gateway_host, port = self.gateway_port, "gateway port open");
        Ok(true)
    }
}
