//! 외부 명령 실행 추상화
//!
//! [`CommandRunner`] 트레이트는 모든 외부 도구 호출(docker, compose, curl,
//! 검증 스크립트)을 하나의 경계로 모읍니다. 프로덕션 코드는 [`ProcessRunner`]를,
//! 테스트는 `MockRunner`를 사용합니다.
//!
//! ```text
//! ┌────────────────────┐
//! │ Prober / Compose / │
//! │ Build / Readiness  │
//! └─────────┬──────────┘
//!           ▼
//!   ┌───────────────┐
//!   │ CommandRunner │ (trait)
//!   └───────────────┘
//!       │        │
//!       ▼        ▼
//!  ┌─────────┐ ┌──────┐
//!  │ Process │ │ Mock │
//!  └────┬────┘ └──────┘
//!       ▼
//!  tokio::process
//! ```

use std::future::Future;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::command::{CommandOutput, CommandSpec, OutputMode, exit_code};
use crate::error::EnvError;

/// 외부 명령 실행 트레이트
///
/// 0 이 아닌 종료 코드는 에러가 아니라 [`CommandOutput::status`]로 전달됩니다.
/// 에러는 프로세스를 시작하지 못한 경우에만 반환됩니다.
pub trait CommandRunner: Send + Sync + 'static {
    /// 명령을 실행하고 종료될 때까지 기다립니다.
    ///
    /// # Errors
    ///
    /// 프로세스를 생성할 수 없으면 `EnvError::Spawn`을 반환합니다.
    fn run(
        &self,
        spec: &CommandSpec,
    ) -> impl Future<Output = Result<CommandOutput, EnvError>> + Send;
}

/// `tokio::process` 기반 프로덕션 실행기
///
/// 자식은 자체 프로세스 그룹에서 실행되며, future 가 취소되면 그룹 전체가
/// 종료됩니다. `Inherit` 모드의 자식 stdout 은 부모의 stderr 로 보내므로
/// 부모 stdout 에는 실행 보고서만 남습니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// 새 실행기를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    fn build(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        match spec.output {
            OutputMode::Capture => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
            OutputMode::Inherit => {
                cmd.stdout(std::io::stderr());
            }
        }
        #[cfg(unix)]
        cmd.process_group(0);
        if let Some(dir) = &spec.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, EnvError> {
        debug!(command = %spec.command_line(), "running command");

        let spawn_err = |e: std::io::Error| EnvError::Spawn {
            program: spec.program.display().to_string(),
            reason: e.to_string(),
        };

        let mut child = Self::build(spec).spawn().map_err(spawn_err)?;
        let group = ProcessGroup::new(child.id());

        let output = match spec.output {
            OutputMode::Capture => {
                let out = child.wait_with_output().await.map_err(spawn_err)?;
                CommandOutput {
                    status: exit_code(out.status),
                    stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
                }
            }
            OutputMode::Inherit => {
                let status = child.wait().await.map_err(spawn_err)?;
                CommandOutput {
                    status: exit_code(status),
                    ..CommandOutput::default()
                }
            }
        };
        group.release();

        debug!(
            command = %spec.command_line(),
            status = output.status,
            "command finished"
        );
        Ok(output)
    }
}

/// 실행 중인 자식의 프로세스 그룹
///
/// 해제되지 않은 채 drop 되면 (실행 future 취소) 그룹 전체에 SIGKILL 을 보냅니다.
/// 정상 종료 후에는 [`ProcessGroup::release`]로 해제합니다.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pid: Option<u32>) -> Self {
        Self { pgid: pid }
    }

    fn release(mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        let Some(pgid) = self.pgid.take() else {
            return;
        };
        debug!(pgid, "killing process group of cancelled command");
        #[cfg(unix)]
        {
            // SAFETY: killpg(2) 는 메모리를 건드리지 않으며, 그룹은 process_group(0)
            // 으로 생성된 자식의 것입니다. 자식이 아직 회수되지 않았으므로 pgid 는 유효합니다.
            let _ = unsafe { libc::killpg(pgid as libc::pid_t, libc::SIGKILL) };
        }
    }
}

/// 테스트용 mock 실행기
///
/// 명령줄에 `needle` 부분 문자열이 포함되면 해당 규칙의 응답을 반환합니다.
/// 규칙은 등록 순서대로 검사하며, 일치하는 규칙이 없으면 빈 성공 결과를 반환합니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockRunner {
    rules: std::sync::Mutex<Vec<MockRule>>,
    calls: std::sync::Mutex<Vec<CommandSpec>>,
}

#[cfg(test)]
struct MockRule {
    needle: String,
    responses: std::collections::VecDeque<Result<CommandOutput, String>>,
}

#[cfg(test)]
impl MockRunner {
    /// 규칙 없는 mock 실행기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// `needle`을 포함하는 명령에 항상 같은 응답을 반환합니다.
    pub fn respond(self, needle: &str, output: CommandOutput) -> Self {
        self.respond_seq(needle, vec![output])
    }

    /// `needle`을 포함하는 명령에 응답을 순서대로 반환합니다.
    /// 마지막 응답은 이후 호출에서 계속 반환됩니다.
    pub fn respond_seq(self, needle: &str, outputs: Vec<CommandOutput>) -> Self {
        self.push_rule(needle, outputs.into_iter().map(Ok).collect())
    }

    /// `needle`을 포함하는 명령의 실행 자체를 실패시킵니다.
    pub fn fail_spawn(self, needle: &str) -> Self {
        self.push_rule(needle, vec![Err("No such file or directory".to_owned())])
    }

    fn push_rule(self, needle: &str, responses: Vec<Result<CommandOutput, String>>) -> Self {
        self.rules
            .lock()
            .expect("mock lock poisoned")
            .push(MockRule {
                needle: needle.to_owned(),
                responses: responses.into(),
            });
        self
    }

    /// 기록된 호출 목록
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }

    /// 기록된 호출의 명령줄 목록
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::command_line).collect()
    }
}

#[cfg(test)]
impl CommandRunner for MockRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, EnvError> {
        self.calls
            .lock()
            .expect("mock lock poisoned")
            .push(spec.clone());

        let line = spec.command_line();
        let mut rules = self.rules.lock().expect("mock lock poisoned");
        let Some(rule) = rules.iter_mut().find(|r| line.contains(&r.needle)) else {
            return Ok(CommandOutput::default());
        };

        let response = if rule.responses.len() > 1 {
            rule.responses.pop_front()
        } else {
            rule.responses.front().cloned()
        };

        match response {
            Some(Ok(output)) => Ok(output),
            Some(Err(reason)) => Err(EnvError::Spawn {
                program: spec.program.display().to_string(),
                reason,
            }),
            None => Ok(CommandOutput::default()),
        }
    }
}
