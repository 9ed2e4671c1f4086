use async_trait::async_trait;

use crate::error::EngineError;

/// The `PriceSource` trait defines the interface for quote providers.
/// It will be implemented by real exchange connectors and mock implementations.
///
/// Implementations must return a positive price or `PriceUnavailable`;
/// retries and backoff are the caller's concern, not the engine's.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Get the latest quoted price for a symbol (e.g. "BTC", "ETH")
    async fn get_price(&self, symbol: &str) -> Result<f64, EngineError>;
}
