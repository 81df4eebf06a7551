//! s3gate 환경 제어 크레이트
//!
//! 외부 도구 실행과 테스트 환경 수명 주기를 담당합니다. 모든 외부 프로세스는
//! [`CommandRunner`] 트레이트를 통해 실행되므로 실제 docker 없이 테스트할 수 있습니다.
//!
//! # Module Structure
//!
//! - [`error`]: 도메인 에러 타입 (`EnvError`)
//! - [`command`]: 외부 명령 기술자 (`CommandSpec`, `CommandOutput`)
//! - [`runner`]: 실행 추상화 (`CommandRunner` trait, `ProcessRunner`)
//! - [`probe`]: 의존성 사전 점검 (`DependencyProber`, `Toolchain`)
//! - [`compose`]: compose 명령 구성 (`Compose`, `ComposeCommand`)
//! - [`environment`]: 환경 수명 주기 (`EnvironmentController`)
//! - [`readiness`]: 준비 상태 폴링 (`ReadinessPoller`)
//! - [`build`]: 이미지 빌드 (`BuildOrchestrator`)
//! - [`validation`]: 이미지 내부 모듈 검증 (`ModuleValidator`)
//! - [`fixtures`]: 특수문자 테스트 데이터
//!
//! # Architecture
//!
//! ```text
//! DependencyProber --Toolchain--> BuildOrchestrator
//!                                       |
//!                                 ModuleValidator
//!                                       |
//!                      EnvironmentController.ensure()
//!                                       |
//!                              ReadinessPoller.wait()
//! ```

pub mod build;
pub mod command;
pub mod compose;
pub mod environment;
pub mod error;
pub mod fixtures;
pub mod probe;
pub mod readiness;
pub mod runner;
pub mod validation;

// --- Public API Re-exports ---

// Error
pub use error::EnvError;

// Command execution
pub use command::{CommandOutput, CommandSpec, OutputMode};
pub use runner::{CommandRunner, ProcessRunner};

// Preflight
pub use probe::{DependencyProber, ToolDependency, Toolchain};

// Environment
pub use compose::{Compose, ComposeCommand};
pub use environment::{EnsureOutcome, EnvironmentController};
pub use readiness::{ReadinessPoller, ReadinessReport};

// Build & validation
pub use build::{BuildOrchestrator, BuildStep};
pub use validation::ModuleValidator;

// Fixtures
pub use fixtures::ensure_special_character_fixtures;
