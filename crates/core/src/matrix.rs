//! 시나리오 매트릭스: 고정된 6개 설정 조합
//!
//! 16개 전체 조합 대신, 두 서명 버전과 세 가지 불리언 축을 각각 한 번 이상
//! 다루도록 고른 순서 있는 목록입니다. 순서는 실행 순서와 같습니다.

use crate::types::{ScenarioConfig, SignatureVersion};

/// 실행 순서대로 정렬된 시나리오 매트릭스
pub const SCENARIO_MATRIX: [ScenarioConfig; 6] = [
    ScenarioConfig::new(SignatureVersion::V2, false, false, false),
    ScenarioConfig::new(SignatureVersion::V2, true, false, false),
    ScenarioConfig::new(SignatureVersion::V2, false, true, false),
    ScenarioConfig::new(SignatureVersion::V4, false, false, false),
    ScenarioConfig::new(SignatureVersion::V4, true, false, true),
    ScenarioConfig::new(SignatureVersion::V4, false, true, true),
];
