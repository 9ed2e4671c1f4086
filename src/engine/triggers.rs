//! 트리거 판정 모듈
//!
//! 청산 / 익절 / 손절 조건 판정. 판정만 수행하고 종결은 생명주기 관리자가 담당

use crate::engine::valuation;
use crate::error::EngineError;
use crate::models::position::{Direction, Position};

/// 트리거 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    None,
    TakeProfit,
    StopLoss,
    Liquidation,
}

/// 현재 가격 기준 트리거 판정
///
/// 동일 틱에서 여러 조건이 동시에 충족될 수 있으므로 우선순위 고정:
/// 청산(자본 보존 최우선) → 익절 → 손절. 손절 가격이 설정되어 있어도
/// 손실이 증거금을 소진했다면 청산으로 판정한다.
pub fn evaluate(position: &Position, current_price: f64) -> Result<TriggerOutcome, EngineError> {
    if valuation::is_liquidatable(position, current_price)? {
        return Ok(TriggerOutcome::Liquidation);
    }

    match position.direction {
        Direction::Long => {
            if let Some(tp) = position.take_profit {
                if current_price >= tp {
                    return Ok(TriggerOutcome::TakeProfit);
                }
            }
            if let Some(sl) = position.stop_loss {
                if current_price <= sl {
                    return Ok(TriggerOutcome::StopLoss);
                }
            }
        }
        Direction::Short => {
            if let Some(tp) = position.take_profit {
                if current_price <= tp {
                    return Ok(TriggerOutcome::TakeProfit);
                }
            }
            if let Some(sl) = position.stop_loss {
                if current_price >= sl {
                    return Ok(TriggerOutcome::StopLoss);
                }
            }
        }
    }

    Ok(TriggerOutcome::None)
}
