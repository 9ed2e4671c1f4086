//! 포지션 시뮬레이션 엔진의 핵심 구현체

pub mod lifecycle;
pub mod triggers;
pub mod valuation;
