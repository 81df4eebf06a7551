//! 외부 명령 기술자
//!
//! [`CommandSpec`]은 실행할 프로그램, 인자, 추가 환경 변수, 출력 처리 방식을
//! 값으로 표현합니다. 실제 실행은 [`CommandRunner`](crate::runner::CommandRunner)가
//! 담당하므로 명령 구성 로직은 프로세스 없이 테스트할 수 있습니다.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use crate::error::EnvError;

/// 자식 프로세스 출력 처리 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// stdout/stderr 를 캡처하여 호출자에게 반환
    Capture,
    /// 부모 프로세스의 stdout/stderr 를 그대로 상속
    #[default]
    Inherit,
}

/// 실행할 외부 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// 실행 파일 경로
    pub program: PathBuf,
    /// 인자 목록
    pub args: Vec<String>,
    /// 자식 프로세스에 추가할 환경 변수
    pub envs: Vec<(String, String)>,
    /// 작업 디렉토리 (None 이면 현재 디렉토리)
    pub current_dir: Option<PathBuf>,
    /// 출력 처리 방식
    pub output: OutputMode,
}

impl CommandSpec {
    /// 인자 없는 명령을 생성합니다. 기본 출력 방식은 [`OutputMode::Inherit`]입니다.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
            output: OutputMode::Inherit,
        }
    }

    /// 인자 하나를 추가합니다.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// 여러 인자를 추가합니다.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// 환경 변수 하나를 추가합니다.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// 여러 환경 변수를 추가합니다.
    pub fn envs<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.envs.extend(vars);
        self
    }

    /// 작업 디렉토리를 지정합니다.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// 출력을 캡처하도록 설정합니다.
    pub fn capture(mut self) -> Self {
        self.output = OutputMode::Capture;
        self
    }

    /// 로그와 에러 메시지에 쓰이는 사람이 읽을 수 있는 명령줄
    ///
    /// 공백을 포함한 인자는 작은따옴표로 감쌉니다.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                line.push('\'');
                line.push_str(arg);
                line.push('\'');
            } else {
                line.push_str(arg);
            }
        }
        line
    }

    /// 동기 실행용 `std::process::Command`로 변환합니다.
    ///
    /// 비동기 런타임을 사용할 수 없는 정리 경로(Drop)에서 사용합니다.
    pub fn to_std_command(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(std::process::Stdio::null());
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// 명령 실행 결과
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// 종료 코드
    pub status: i32,
    /// 캡처된 stdout (Inherit 모드에서는 빈 문자열)
    pub stdout: String,
    /// 캡처된 stderr (Inherit 모드에서는 빈 문자열)
    pub stderr: String,
}

impl CommandOutput {
    /// 성공 결과를 생성합니다.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// 실패 결과를 생성합니다.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// 종료 코드가 0 인지 확인합니다.
    pub fn is_success(&self) -> bool {
        self.status == 0
    }

    /// 실패 시 [`EnvError::ToolFailed`]로 변환합니다.
    pub fn check(self, spec: &CommandSpec) -> Result<Self, EnvError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(EnvError::ToolFailed {
                command: spec.command_line(),
                status: self.status,
                stderr: self.stderr.trim().to_owned(),
            })
        }
    }
}

/// 프로세스 종료 상태를 셸 규칙의 정수 코드로 변환합니다.
///
/// 시그널로 종료된 경우 `128 + signo`를 반환합니다.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
