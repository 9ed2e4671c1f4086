use std::collections::HashMap;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::RwLock;

use crate::error::EngineError;
use crate::price::traits::PriceSource;

/// A mock implementation of the PriceSource trait for testing and development
pub struct MockPriceSource {
    prices: RwLock<HashMap<String, f64>>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        // Seed a couple of liquid symbols
        let mut prices = HashMap::new();
        prices.insert("BTC".to_string(), 50000.0);
        prices.insert("ETH".to_string(), 3000.0);
        Self {
            prices: RwLock::new(prices),
        }
    }

    /// 빈 시세 테이블로 생성 (실패 경로 테스트용)
    pub fn empty() -> Self {
        Self {
            prices: RwLock::new(HashMap::new()),
        }
    }

    pub async fn set_price(&self, symbol: impl Into<String>, price: f64) {
        let mut prices = self.prices.write().await;
        prices.insert(symbol.into().to_uppercase(), price);
    }

    pub async fn remove_symbol(&self, symbol: &str) {
        let mut prices = self.prices.write().await;
        prices.remove(&symbol.to_uppercase());
    }

    /// 모든 심볼 가격을 ±2% 범위에서 랜덤 워크로 갱신
    pub async fn tick(&self) {
        let mut prices = self.prices.write().await;
        for price in prices.values_mut() {
            let change = rand::thread_rng().gen_range(-200.0..200.0) / 10000.0;
            *price *= 1.0 + change;
        }
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn get_price(&self, symbol: &str) -> Result<f64, EngineError> {
        let prices = self.prices.read().await;
        prices
            .get(&symbol.to_uppercase())
            .copied()
            .ok_or_else(|| EngineError::PriceUnavailable {
                symbol: symbol.to_string(),
                reason: "unknown symbol".to_string(),
            })
    }
}
