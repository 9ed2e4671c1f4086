//! 포지션 평가 모듈
//!
//! 미실현 손익, ROI, 청산 가격 계산 기능 구현

use crate::error::EngineError;
use crate::models::position::{Direction, Position};

/// 포지션 평가 결과
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Valuation {
    /// 미실현 손익 (USD)
    pub unrealized_pnl: f64,
    /// 레버리지 반영 수익률 (%)
    pub roi: f64,
    /// 청산까지 남은 증거금 비율 (진입 직후 1.0, 청산 가격에서 0.0)
    pub liquidation_distance_ratio: f64,
}

/// 현재 가격 기준 포지션 평가
///
/// 순수 함수이며 포지션을 변경하지 않음. 가격이 0 이하이거나 NaN이면 실패
pub fn value_position(position: &Position, current_price: f64) -> Result<Valuation, EngineError> {
    if current_price <= 0.0 || current_price.is_nan() {
        return Err(EngineError::InvalidPrice(current_price));
    }

    let move_fraction = match position.direction {
        Direction::Long => (current_price - position.entry_price) / position.entry_price,
        Direction::Short => (position.entry_price - current_price) / position.entry_price,
    };

    let unrealized_pnl = move_fraction * position.notional();
    let roi = move_fraction * position.leverage as f64 * 100.0;
    let liquidation_distance_ratio =
        ((position.margin + unrealized_pnl) / position.margin).max(0.0);

    Ok(Valuation {
        unrealized_pnl,
        roi,
        liquidation_distance_ratio,
    })
}

/// 청산 가격: 손실이 증거금 전체를 소진하는 가격
///
/// 진입 가격에서 불리한 방향으로 `margin / notional = 1 / leverage` 비율만큼 이동한 지점
pub fn liquidation_price(position: &Position) -> f64 {
    let adverse_fraction = 1.0 / position.leverage as f64;
    match position.direction {
        Direction::Long => position.entry_price * (1.0 - adverse_fraction),
        Direction::Short => position.entry_price * (1.0 + adverse_fraction),
    }
}

/// 청산 조건: 미실현 손실이 증거금 이상 소진
pub fn is_liquidatable(position: &Position, current_price: f64) -> Result<bool, EngineError> {
    let valuation = value_position(position, current_price)?;
    Ok(valuation.unrealized_pnl <= -position.margin)
}
