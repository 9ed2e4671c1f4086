//! 로깅 유틸리티
//!
//! 로그 초기화 및 엔진 이벤트 로그 함수 제공

use std::env;
use env_logger::Builder;
use log::LevelFilter;

use crate::error::EngineError;
use crate::models::position::{CloseReason, Position};

/// 로깅 시스템 초기화
pub fn init() -> Result<(), EngineError> {
    let mut builder = Builder::from_default_env();

    // RUST_LOG 환경변수 확인
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    // 로그 레벨 파싱
    let level_filter = match log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };

    builder
      .filter_level(level_filter)
      .format_timestamp_millis()
      .init();

    log::info!("로깅 시스템 초기화 완료: 레벨 = {}", log_level);

    Ok(())
}

/// 포지션 개설 로그
pub fn log_position_opened(position: &Position) {
    log::info!(
        "포지션 개설: {} - 사용자: {} - 심볼: {} - 방향: {:?} - 증거금: {} - 레버리지: x{} - 진입가: {}",
        position.id, position.owner, position.symbol, position.direction,
        position.margin, position.leverage, position.entry_price
    );
}

/// 포지션 종결 로그
pub fn log_position_closed(position: &Position, realized_pnl: f64, reason: CloseReason) {
    log::info!(
        "포지션 종결: {} - 심볼: {} - 사유: {} - 종결가: {:?} - 실현 손익: {:.2}",
        position.id, position.symbol, reason, position.close_price, realized_pnl
    );
}

/// 시세 조회 실패로 포지션 갱신을 건너뛴 경우
pub fn log_refresh_skipped(user_id: &str, symbol: &str, error: &EngineError) {
    log::warn!(
        "시세 조회 실패, 포지션 건너뜀 - 사용자: {} - 심볼: {}: {}",
        user_id, symbol, error
    );
}

/// 오류 로그
pub fn log_error(context: &str, error: &EngineError) {
    log::error!("오류 발생 - {}: {}", context, error);
}
