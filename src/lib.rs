//! 모의 레버리지 트레이딩 엔진 라이브러리
//!
//! 실시간 시세를 기준으로 가상 레버리지 포지션을 개설, 평가, 종결하는 시뮬레이션 엔진입니다.

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod price;
pub mod storage;
pub mod utils;

// 핵심 타입 재노출
pub use crate::error::EngineError;
pub use crate::models::account::Account;
pub use crate::models::position::{CloseReason, Direction, Position, PositionId, PositionStatus};
pub use crate::engine::lifecycle::{OpenRequest, PositionLifecycle};
pub use crate::engine::triggers::TriggerOutcome;
pub use crate::engine::valuation::Valuation;
pub use crate::price::traits::PriceSource;
pub use crate::storage::AccountStore;

/// 버전 정보
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 결과 타입 별칭
pub type Result<T> = std::result::Result<T, EngineError>;
