/**
* filename : error
* author : HAMA
* date: 2026. 8. 30.
* description:
**/

use thiserror::Error;

use crate::models::position::PositionId;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: f64, available: f64 },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Position not found: {0}")]
    PositionNotFound(PositionId),

    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    #[error("Price unavailable for {symbol}: {reason}")]
    PriceUnavailable { symbol: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
