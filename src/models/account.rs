use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::position::{Position, PositionId};

/// A user's simulated wallet: uncommitted balance, open positions and the
/// closed-position history in closure order. The lifecycle manager is the
/// only component that moves positions between the two lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub user_id: String,
    pub balance: f64,
    pub open_positions: Vec<Position>,
    pub history: Vec<Position>,
}

impl Account {
    pub fn new(user_id: impl Into<String>) -> Self {
        Account {
            user_id: user_id.into(),
            balance: 0.0,
            open_positions: Vec::new(),
            history: Vec::new(),
        }
    }

    /// 입금. 금액이 0 이하이면 실패
    pub fn deposit(&mut self, amount: f64) -> Result<(), EngineError> {
        if !(amount > 0.0) {
            return Err(EngineError::Validation(
                "deposit amount must be greater than zero".to_string(),
            ));
        }
        self.balance += amount;
        Ok(())
    }

    /// 출금. 금액이 0 이하이거나 잔고 부족 시 실패
    pub fn withdraw(&mut self, amount: f64) -> Result<(), EngineError> {
        if !(amount > 0.0) {
            return Err(EngineError::Validation(
                "withdrawal amount must be greater than zero".to_string(),
            ));
        }
        if !self.has_enough_balance(amount) {
            return Err(EngineError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    pub fn has_enough_balance(&self, amount: f64) -> bool {
        self.balance >= amount
    }

    /// 미체결 포지션에 묶인 증거금 합계
    pub fn margin_committed(&self) -> f64 {
        self.open_positions.iter().map(|p| p.margin).sum()
    }

    /// 잔고 + 묶인 증거금 (실현 손익 반영 전 총 자본)
    pub fn committed_capital(&self) -> f64 {
        self.balance + self.margin_committed()
    }

    pub fn open_count(&self) -> usize {
        self.open_positions.len()
    }

    pub fn open_position(&self, position_id: &PositionId) -> Option<&Position> {
        self.open_positions.iter().find(|p| &p.id == position_id)
    }

    pub fn open_position_mut(&mut self, position_id: &PositionId) -> Option<&mut Position> {
        self.open_positions.iter_mut().find(|p| &p.id == position_id)
    }

    pub fn closed_position(&self, position_id: &PositionId) -> Option<&Position> {
        self.history.iter().find(|p| &p.id == position_id)
    }
}
