pub mod binance;
pub mod mocks;
pub mod traits;
