use async_trait::async_trait;
use std::time::Duration;

use crate::error::EngineError;
use crate::price::traits::PriceSource;

/// Binance spot REST ticker connector (price lookup only)
pub struct BinancePriceSource {
  pub base_url: String,
  http: reqwest::Client,
}

impl BinancePriceSource {
  /// The request timeout bounds every lookup so a refresh scan never hangs
  pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Result<Self, EngineError> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_millis(timeout_ms))
      .build()
      .map_err(|e| EngineError::ConfigError(format!("failed to build http client: {}", e)))?;
    Ok(BinancePriceSource { base_url: base_url.into(), http })
  }

  fn unavailable(symbol: &str, reason: impl Into<String>) -> EngineError {
    EngineError::PriceUnavailable { symbol: symbol.to_string(), reason: reason.into() }
  }
}

#[async_trait]
impl PriceSource for BinancePriceSource {
  async fn get_price(&self, symbol: &str) -> Result<f64, EngineError> {
    // USDT 마켓 시세 사용 (원 심볼에 USDT를 붙여 조회)
    let url = format!("{}/api/v3/ticker/price?symbol={}USDT", self.base_url, symbol.to_uppercase());
    let res = self.http.get(&url)
      .send().await
      .map_err(|e| Self::unavailable(symbol, format!("http error: {}", e)))?;
    let status = res.status();
    if !status.is_success() {
      return Err(Self::unavailable(symbol, format!("status {}", status)));
    }
    let json = res.json::<serde_json::Value>().await
      .map_err(|e| Self::unavailable(symbol, format!("parse error: {}", e)))?;
    let price = json.get("price")
      .and_then(|v| v.as_str())
      .and_then(|s| s.parse::<f64>().ok())
      .ok_or_else(|| Self::unavailable(symbol, "price field missing"))?;
    if price <= 0.0 {
      return Err(Self::unavailable(symbol, format!("non-positive quote: {}", price)));
    }
    Ok(price)
  }
}
