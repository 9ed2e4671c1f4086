use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::utils::current_timestamp_ms;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, Hash, PartialEq)]
pub struct PositionId(pub String);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PositionStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CloseReason {
    Manual,
    TakeProfit,
    StopLoss,
    Liquidation,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CloseReason::Manual => "manual",
            CloseReason::TakeProfit => "take profit",
            CloseReason::StopLoss => "stop loss",
            CloseReason::Liquidation => "liquidation",
        };
        write!(f, "{}", label)
    }
}

/// A single simulated leveraged trade. Entry price, margin and leverage are
/// fixed at open; the close fields are written exactly once when the position
/// transitions to `Closed` and the record becomes immutable history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub owner: String,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub margin: f64,
    pub leverage: u32,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
    pub status: PositionStatus,
    pub opened_at: i64,

    // Populated only when status == Closed
    pub close_price: Option<f64>,
    pub close_reason: Option<CloseReason>,
    pub realized_pnl: Option<f64>,
    pub closed_at: Option<i64>,
}

impl Position {
    pub fn new(
        owner: impl Into<String>,
        symbol: impl Into<String>,
        direction: Direction,
        entry_price: f64,
        margin: f64,
        leverage: u32,
    ) -> Self {
        Position {
            id: PositionId(Uuid::new_v4().to_string()),
            owner: owner.into(),
            symbol: symbol.into(),
            direction,
            entry_price,
            margin,
            leverage,
            take_profit: None,
            stop_loss: None,
            status: PositionStatus::Open,
            opened_at: current_timestamp_ms(),
            close_price: None,
            close_reason: None,
            realized_pnl: None,
            closed_at: None,
        }
    }

    pub fn with_take_profit(mut self, take_profit: f64) -> Self {
        self.take_profit = Some(take_profit);
        self
    }

    pub fn with_stop_loss(mut self, stop_loss: f64) -> Self {
        self.stop_loss = Some(stop_loss);
        self
    }

    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    pub fn is_short(&self) -> bool {
        self.direction == Direction::Short
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// 명목 노출 금액 = 증거금 × 레버리지
    pub fn notional(&self) -> f64 {
        self.margin * self.leverage as f64
    }

    /// 진입 가격 기준 보유 수량 (표시용)
    pub fn quantity(&self) -> f64 {
        if self.entry_price > 0.0 {
            self.notional() / self.entry_price
        } else {
            0.0
        }
    }

    /// 종결 필드 기록. 생명주기 관리자만 호출하며, 이후 레코드는 변경되지 않음
    pub fn settle(&mut self, close_price: f64, realized_pnl: f64, reason: CloseReason) {
        self.status = PositionStatus::Closed;
        self.close_price = Some(close_price);
        self.close_reason = Some(reason);
        self.realized_pnl = Some(realized_pnl);
        self.closed_at = Some(current_timestamp_ms());
    }
}
