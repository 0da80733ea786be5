//! # Forecast Core
//!
//! 지수 예측 시트 업데이터의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 시장 식별자 및 시장 프로파일 (오프셋 스키마, 시트 범위)
//! - 고정 오프셋 레코드 파서
//! - 예측 판정 및 매매 신호
//! - 외부 협력자(스크래퍼, 예측기, 스프레드시트) trait
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod parser;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use parser::{parse_record, parse_rows};
pub use types::*;
