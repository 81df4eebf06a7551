//! s3gate 공통 크레이트
//!
//! 오케스트레이터의 모든 구성 요소가 공유하는 설정, 에러, 도메인 타입과
//! 고정 시나리오 매트릭스를 제공합니다.

pub mod config;
pub mod error;
pub mod matrix;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, HarnessError};

// 설정
pub use config::{HarnessConfig, IgnoredOverride};

// 매트릭스
pub use matrix::SCENARIO_MATRIX;

// 도메인 타입
pub use types::{
    BuildVariant, ExitOutcome, Flavor, ScenarioConfig, ScenarioResult, SignatureVersion,
};
