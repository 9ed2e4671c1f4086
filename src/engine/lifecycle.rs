//! 포지션 생명주기 관리자
//!
//! 개설/종결 전이와 잔고 정산을 담당. Account 상태를 변경하는 유일한 컴포넌트이며,
//! 모든 연산은 검증을 전부 통과한 뒤에만 상태를 변경한다 (all-or-nothing)

use crate::config::EngineConfig;
use crate::engine::triggers::{self, TriggerOutcome};
use crate::engine::valuation;
use crate::error::EngineError;
use crate::models::account::Account;
use crate::models::position::{CloseReason, Direction, Position, PositionId};
use crate::price::traits::PriceSource;
use crate::utils::logging;

/// 포지션 개설 요청 파라미터
#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub symbol: String,
    pub direction: Direction,
    pub margin: f64,
    pub leverage: u32,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
}

/// 포지션 생명주기 관리자
pub struct PositionLifecycle {
    config: EngineConfig,
}

impl PositionLifecycle {
    pub fn new(config: EngineConfig) -> Self {
        PositionLifecycle { config }
    }

    /// 포지션 개설
    ///
    /// 증거금을 잔고에서 차감하고 OPEN 포지션을 생성. 검증 실패 시
    /// 계정 상태는 변경되지 않는다
    pub fn open(
        &self,
        account: &mut Account,
        request: OpenRequest,
        current_price: f64,
    ) -> Result<PositionId, EngineError> {
        let symbol = Self::normalize_symbol(&request.symbol)?;

        if current_price <= 0.0 || current_price.is_nan() {
            return Err(EngineError::InvalidPrice(current_price));
        }
        if !(request.margin > 0.0) {
            return Err(EngineError::Validation(
                "margin must be greater than zero".to_string(),
            ));
        }
        if !account.has_enough_balance(request.margin) {
            return Err(EngineError::InsufficientBalance {
                requested: request.margin,
                available: account.balance,
            });
        }
        if request.leverage < 1 || request.leverage > self.config.max_leverage {
            return Err(EngineError::Validation(format!(
                "leverage must be between 1 and {}",
                self.config.max_leverage
            )));
        }
        Self::validate_targets(
            request.direction,
            current_price,
            request.take_profit,
            request.stop_loss,
        )?;

        // 여기부터는 실패 경로 없음
        account.withdraw(request.margin)?;

        let mut position = Position::new(
            account.user_id.clone(),
            symbol,
            request.direction,
            current_price,
            request.margin,
            request.leverage,
        );
        position.take_profit = request.take_profit;
        position.stop_loss = request.stop_loss;

        let position_id = position.id.clone();
        logging::log_position_opened(&position);
        account.open_positions.push(position);

        Ok(position_id)
    }

    /// 포지션 종결 (수동 또는 트리거)
    ///
    /// 실현 손익은 증거금을 하한으로 정산하므로 계정이 증거금 이상을
    /// 잃는 일은 없다. 잔고 반영과 포지션 이동은 한 번의 가변 차용
    /// 안에서 일어난다
    pub fn close(
        &self,
        account: &mut Account,
        position_id: &PositionId,
        current_price: f64,
        reason: CloseReason,
    ) -> Result<Position, EngineError> {
        let index = Self::require_open_index(account, position_id)?;

        let valuation = valuation::value_position(&account.open_positions[index], current_price)?;
        let margin = account.open_positions[index].margin;
        // 손실 상한: 실현 손익은 -증거금 아래로 내려가지 않음
        let realized_pnl = valuation.unrealized_pnl.max(-margin);

        let mut position = account.open_positions.remove(index);
        position.settle(current_price, realized_pnl, reason);
        account.balance += margin + realized_pnl;

        logging::log_position_closed(&position, realized_pnl, reason);
        account.history.push(position.clone());

        Ok(position)
    }

    /// TP/SL 목표 가격 수정
    ///
    /// 설정(`allow_amend_targets`)으로 허용된 경우에만 가능하며
    /// 진입 가격 기준으로 방향 일관성을 재검증한다
    pub fn amend_targets(
        &self,
        account: &mut Account,
        position_id: &PositionId,
        take_profit: Option<f64>,
        stop_loss: Option<f64>,
    ) -> Result<(), EngineError> {
        if !self.config.allow_amend_targets {
            return Err(EngineError::Validation(
                "take profit / stop loss amendment is disabled".to_string(),
            ));
        }

        let index = Self::require_open_index(account, position_id)?;
        let position = &account.open_positions[index];
        Self::validate_targets(
            position.direction,
            position.entry_price,
            take_profit,
            stop_loss,
        )?;

        let position = &mut account.open_positions[index];
        position.take_profit = take_profit;
        position.stop_loss = stop_loss;
        Ok(())
    }

    /// 계정의 모든 미체결 포지션을 현재 시세로 재평가
    ///
    /// 트리거된 포지션은 해당 사유로 종결하고, 시세 조회에 실패한 포지션은
    /// 이번 스캔에서 건너뛴다 (fail-soft). 이번 호출로 종결된 포지션 목록 반환
    pub async fn refresh_account(
        &self,
        account: &mut Account,
        source: &dyn PriceSource,
    ) -> Result<Vec<Position>, EngineError> {
        let open: Vec<(PositionId, String)> = account
            .open_positions
            .iter()
            .map(|p| (p.id.clone(), p.symbol.clone()))
            .collect();

        let mut closed = Vec::new();

        for (position_id, symbol) in open {
            let current_price = match source.get_price(&symbol).await {
                Ok(price) => price,
                Err(e) => {
                    logging::log_refresh_skipped(&account.user_id, &symbol, &e);
                    continue;
                }
            };
            if current_price <= 0.0 || current_price.is_nan() {
                logging::log_refresh_skipped(
                    &account.user_id,
                    &symbol,
                    &EngineError::InvalidPrice(current_price),
                );
                continue;
            }

            let position = match account.open_position(&position_id) {
                Some(position) => position,
                None => continue,
            };

            let reason = match triggers::evaluate(position, current_price)? {
                TriggerOutcome::None => continue,
                TriggerOutcome::TakeProfit => CloseReason::TakeProfit,
                TriggerOutcome::StopLoss => CloseReason::StopLoss,
                TriggerOutcome::Liquidation => CloseReason::Liquidation,
            };

            closed.push(self.close(account, &position_id, current_price, reason)?);
        }

        Ok(closed)
    }

    /// 미체결 포지션 인덱스 조회. 이미 종결된 포지션이면 InvalidState
    fn require_open_index(
        account: &Account,
        position_id: &PositionId,
    ) -> Result<usize, EngineError> {
        if let Some(index) = account
            .open_positions
            .iter()
            .position(|p| &p.id == position_id)
        {
            return Ok(index);
        }
        if account.closed_position(position_id).is_some() {
            return Err(EngineError::InvalidState(format!(
                "position {} is already closed",
                position_id
            )));
        }
        Err(EngineError::PositionNotFound(position_id.clone()))
    }

    /// 심볼 정규화 및 검증 (영숫자 대문자)
    fn normalize_symbol(symbol: &str) -> Result<String, EngineError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(EngineError::Validation(format!(
                "invalid symbol: {:?}",
                symbol
            )));
        }
        Ok(symbol)
    }

    /// TP/SL 방향 일관성 검증
    ///
    /// LONG: TP > 기준 가격 > SL, SHORT: TP < 기준 가격 < SL
    fn validate_targets(
        direction: Direction,
        reference_price: f64,
        take_profit: Option<f64>,
        stop_loss: Option<f64>,
    ) -> Result<(), EngineError> {
        // NaN은 모든 비교에서 false가 되므로 방향 검사만으로는 걸러지지 않음
        for target in [take_profit, stop_loss].into_iter().flatten() {
            if !target.is_finite() {
                return Err(EngineError::Validation(format!(
                    "take profit / stop loss must be a finite price, got {}",
                    target
                )));
            }
        }

        match direction {
            Direction::Long => {
                if let Some(tp) = take_profit {
                    if tp <= reference_price {
                        return Err(EngineError::Validation(
                            "take profit must be above entry price for a long position"
                                .to_string(),
                        ));
                    }
                }
                if let Some(sl) = stop_loss {
                    if sl <= 0.0 || sl >= reference_price {
                        return Err(EngineError::Validation(
                            "stop loss must be positive and below entry price for a long position"
                                .to_string(),
                        ));
                    }
                }
            }
            Direction::Short => {
                if let Some(tp) = take_profit {
                    if tp <= 0.0 || tp >= reference_price {
                        return Err(EngineError::Validation(
                            "take profit must be positive and below entry price for a short position"
                                .to_string(),
                        ));
                    }
                }
                if let Some(sl) = stop_loss {
                    if sl <= reference_price {
                        return Err(EngineError::Validation(
                            "stop loss must be above entry price for a short position".to_string(),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifecycle() -> PositionLifecycle {
        PositionLifecycle::new(EngineConfig::default())
    }

    fn funded_account(balance: f64) -> Account {
        let mut account = Account::new("user-1");
        account.deposit(balance).unwrap();
        account
    }

    fn open_request() -> OpenRequest {
        OpenRequest {
            symbol: "BTC".to_string(),
            direction: Direction::Long,
            margin: 50.0,
            leverage: 10,
            take_profit: Some(110.0),
            stop_loss: Some(95.0),
        }
    }

    #[test]
    fn test_open_debits_margin() {
        let lifecycle = lifecycle();
        let mut account = funded_account(200.0);

        let id = lifecycle.open(&mut account, open_request(), 100.0).unwrap();

        assert_eq!(account.balance, 150.0);
        assert_eq!(account.open_count(), 1);
        assert_eq!(account.margin_committed(), 50.0);
        assert_eq!(account.committed_capital(), 200.0);

        let position = account.open_position(&id).unwrap();
        assert_eq!(position.entry_price, 100.0);
        assert_eq!(position.notional(), 500.0);
        assert_eq!(position.symbol, "BTC");
    }

    #[test]
    fn test_open_rejects_margin_over_balance() {
        let lifecycle = lifecycle();
        let mut account = funded_account(40.0);

        let result = lifecycle.open(&mut account, open_request(), 100.0);
        assert!(matches!(
            result,
            Err(EngineError::InsufficientBalance { .. })
        ));

        // 실패 시 상태 불변
        assert_eq!(account.balance, 40.0);
        assert_eq!(account.open_count(), 0);
    }

    #[test]
    fn test_open_rejects_bad_leverage() {
        let lifecycle = lifecycle();
        let mut account = funded_account(200.0);

        let mut request = open_request();
        request.leverage = 0;
        assert!(matches!(
            lifecycle.open(&mut account, request, 100.0),
            Err(EngineError::Validation(_))
        ));

        let mut request = open_request();
        request.leverage = EngineConfig::default().max_leverage + 1;
        assert!(matches!(
            lifecycle.open(&mut account, request, 100.0),
            Err(EngineError::Validation(_))
        ));
        assert_eq!(account.balance, 200.0);
    }

    #[test]
    fn test_open_rejects_inconsistent_targets() {
        let lifecycle = lifecycle();
        let mut account = funded_account(200.0);

        // LONG인데 TP가 진입 가격 아래
        let mut request = open_request();
        request.take_profit = Some(90.0);
        assert!(matches!(
            lifecycle.open(&mut account, request, 100.0),
            Err(EngineError::Validation(_))
        ));

        // LONG인데 SL이 진입 가격 위
        let mut request = open_request();
        request.stop_loss = Some(105.0);
        assert!(matches!(
            lifecycle.open(&mut account, request, 100.0),
            Err(EngineError::Validation(_))
        ));

        // SHORT 방향 검증
        let request = OpenRequest {
            symbol: "BTC".to_string(),
            direction: Direction::Short,
            margin: 50.0,
            leverage: 10,
            take_profit: Some(110.0),
            stop_loss: None,
        };
        assert!(matches!(
            lifecycle.open(&mut account, request, 100.0),
            Err(EngineError::Validation(_))
        ));

        assert_eq!(account.balance, 200.0);
        assert_eq!(account.open_count(), 0);
    }

    #[test]
    fn test_open_rejects_non_finite_targets() {
        let lifecycle = lifecycle();
        let mut account = funded_account(200.0);

        // NaN TP는 방향 비교를 모두 통과하므로 명시적으로 거부되어야 함
        let mut request = open_request();
        request.take_profit = Some(f64::NAN);
        assert!(matches!(
            lifecycle.open(&mut account, request, 100.0),
            Err(EngineError::Validation(_))
        ));

        let mut request = open_request();
        request.stop_loss = Some(f64::NAN);
        assert!(matches!(
            lifecycle.open(&mut account, request, 100.0),
            Err(EngineError::Validation(_))
        ));

        let mut request = open_request();
        request.take_profit = Some(f64::INFINITY);
        assert!(matches!(
            lifecycle.open(&mut account, request, 100.0),
            Err(EngineError::Validation(_))
        ));

        assert_eq!(account.balance, 200.0);
        assert_eq!(account.open_count(), 0);

        // 수정 경로도 동일하게 거부
        let id = lifecycle.open(&mut account, open_request(), 100.0).unwrap();
        let result = lifecycle.amend_targets(&mut account, &id, Some(f64::NAN), None);
        assert!(matches!(result, Err(EngineError::Validation(_))));
        let position = account.open_position(&id).unwrap();
        assert_eq!(position.take_profit, Some(110.0));
    }

    #[test]
    fn test_open_rejects_bad_symbol() {
        let lifecycle = lifecycle();
        let mut account = funded_account(200.0);

        let mut request = open_request();
        request.symbol = "BTC/USD".to_string();
        assert!(matches!(
            lifecycle.open(&mut account, request, 100.0),
            Err(EngineError::Validation(_))
        ));

        let mut request = open_request();
        request.symbol = "  ".to_string();
        assert!(matches!(
            lifecycle.open(&mut account, request, 100.0),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_close_round_trip_restores_balance() {
        let lifecycle = lifecycle();
        let mut account = funded_account(200.0);

        let id = lifecycle.open(&mut account, open_request(), 100.0).unwrap();
        let closed = lifecycle
            .close(&mut account, &id, 100.0, CloseReason::Manual)
            .unwrap();

        assert_eq!(closed.realized_pnl, Some(0.0));
        assert_eq!(account.balance, 200.0);
        assert_eq!(account.open_count(), 0);
        assert_eq!(account.history.len(), 1);
    }

    #[test]
    fn test_close_settles_profit() {
        let lifecycle = lifecycle();
        let mut account = funded_account(200.0);

        let id = lifecycle.open(&mut account, open_request(), 100.0).unwrap();
        let closed = lifecycle
            .close(&mut account, &id, 111.0, CloseReason::TakeProfit)
            .unwrap();

        // (111-100)/100 * 500 = 55, 잔고 = 150 + 50 + 55
        assert_eq!(closed.realized_pnl, Some(55.0));
        assert_eq!(account.balance, 255.0);
        assert_eq!(closed.close_reason, Some(CloseReason::TakeProfit));
    }

    #[test]
    fn test_close_settles_loss() {
        let lifecycle = lifecycle();
        let mut account = funded_account(200.0);

        let id = lifecycle.open(&mut account, open_request(), 100.0).unwrap();
        let closed = lifecycle
            .close(&mut account, &id, 94.0, CloseReason::StopLoss)
            .unwrap();

        // (94-100)/100 * 500 = -30, 잔고 = 150 + 50 - 30
        assert_eq!(closed.realized_pnl, Some(-30.0));
        assert_eq!(account.balance, 170.0);
    }

    #[test]
    fn test_liquidation_caps_loss_at_margin() {
        let lifecycle = lifecycle();
        let mut account = funded_account(200.0);

        let id = lifecycle.open(&mut account, open_request(), 100.0).unwrap();
        // 가격 80이면 계산상 손실 -100이지만 증거금 50으로 상한
        let closed = lifecycle
            .close(&mut account, &id, 80.0, CloseReason::Liquidation)
            .unwrap();

        assert_eq!(closed.realized_pnl, Some(-50.0));
        assert_eq!(account.balance, 150.0);
    }

    #[test]
    fn test_double_close_rejected() {
        let lifecycle = lifecycle();
        let mut account = funded_account(200.0);

        let id = lifecycle.open(&mut account, open_request(), 100.0).unwrap();
        lifecycle
            .close(&mut account, &id, 100.0, CloseReason::Manual)
            .unwrap();

        let balance_after_first = account.balance;
        let result = lifecycle.close(&mut account, &id, 120.0, CloseReason::Manual);
        assert!(matches!(result, Err(EngineError::InvalidState(_))));
        assert_eq!(account.balance, balance_after_first);
        assert_eq!(account.history.len(), 1);
    }

    #[test]
    fn test_close_unknown_position() {
        let lifecycle = lifecycle();
        let mut account = funded_account(200.0);

        let unknown = PositionId("missing".to_string());
        let result = lifecycle.close(&mut account, &unknown, 100.0, CloseReason::Manual);
        assert!(matches!(result, Err(EngineError::PositionNotFound(_))));
    }

    #[test]
    fn test_close_with_invalid_price_leaves_state() {
        let lifecycle = lifecycle();
        let mut account = funded_account(200.0);

        let id = lifecycle.open(&mut account, open_request(), 100.0).unwrap();
        let result = lifecycle.close(&mut account, &id, -1.0, CloseReason::Manual);
        assert!(matches!(result, Err(EngineError::InvalidPrice(_))));

        assert_eq!(account.open_count(), 1);
        assert_eq!(account.balance, 150.0);
    }

    #[test]
    fn test_amend_targets() {
        let lifecycle = lifecycle();
        let mut account = funded_account(200.0);

        let id = lifecycle.open(&mut account, open_request(), 100.0).unwrap();
        lifecycle
            .amend_targets(&mut account, &id, Some(120.0), Some(92.0))
            .unwrap();

        let position = account.open_position(&id).unwrap();
        assert_eq!(position.take_profit, Some(120.0));
        assert_eq!(position.stop_loss, Some(92.0));

        // 방향 불일치 수정은 거부
        let result = lifecycle.amend_targets(&mut account, &id, Some(90.0), None);
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_amend_targets_disabled_by_config() {
        let config = EngineConfig {
            allow_amend_targets: false,
            ..EngineConfig::default()
        };
        let lifecycle = PositionLifecycle::new(config);
        let mut account = funded_account(200.0);

        let id = lifecycle.open(&mut account, open_request(), 100.0).unwrap();
        let result = lifecycle.amend_targets(&mut account, &id, Some(120.0), None);
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_conservation_across_sequence() {
        let lifecycle = lifecycle();
        let mut account = funded_account(1000.0);

        // 개설/종결을 반복해도 잔고 + 증거금 = 총자본 (실현 손익 반영)
        let id1 = lifecycle.open(&mut account, open_request(), 100.0).unwrap();
        let mut request = open_request();
        request.symbol = "ETH".to_string();
        request.take_profit = None;
        request.stop_loss = None;
        let id2 = lifecycle.open(&mut account, request, 2000.0).unwrap();
        assert_eq!(account.committed_capital(), 1000.0);

        let closed = lifecycle
            .close(&mut account, &id1, 110.0, CloseReason::Manual)
            .unwrap();
        let pnl1 = closed.realized_pnl.unwrap();
        assert_eq!(account.committed_capital(), 1000.0 + pnl1);

        let closed = lifecycle
            .close(&mut account, &id2, 1900.0, CloseReason::Manual)
            .unwrap();
        let pnl2 = closed.realized_pnl.unwrap();
        assert!((account.committed_capital() - (1000.0 + pnl1 + pnl2)).abs() < 1e-9);
        assert_eq!(account.margin_committed(), 0.0);
    }
}
