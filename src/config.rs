/**
* filename : config
* author : HAMA
* date: 2026. 8. 30.
* description:
**/

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::EngineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub price_source: PriceSourceConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 허용되는 최대 레버리지
    pub max_leverage: u32,
    /// 개설 후 TP/SL 수정 허용 여부
    pub allow_amend_targets: bool,
    /// 모니터 스캔 주기 (밀리초)
    pub refresh_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSourceConfig {
    pub base_url: String,
    pub timeout_ms: Option<u64>,
    pub use_mock: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub fn load() -> Result<Self, EngineError> {
        // Try to load from config.json
        let config_path = Path::new("config.json");

        if config_path.exists() {
            let mut file = File::open(config_path)
                .map_err(|e| EngineError::ConfigError(format!("Failed to open config file: {}", e)))?;

            let mut contents = String::new();
            file.read_to_string(&mut contents)
                .map_err(|e| EngineError::ConfigError(format!("Failed to read config file: {}", e)))?;

            let mut cfg: Config = serde_json::from_str(&contents)
                .map_err(|e| EngineError::ConfigError(format!("Failed to parse config file: {}", e)))?;
            // environment overrides
            cfg.apply_env_overrides();
            Ok(cfg)
        } else {
            // Return default configuration
            let mut cfg = Config::default();
            cfg.apply_env_overrides();
            Ok(cfg)
        }
    }

    /// Apply environment variable overrides for runtime fields
    fn apply_env_overrides(&mut self) {
        use std::env;
        if let Ok(v) = env::var("PRICE_API_URL") { if !v.is_empty() { self.price_source.base_url = v; } }
        if let Ok(v) = env::var("DB_PATH") { if !v.is_empty() { self.storage.db_path = v; } }
        if let Ok(v) = env::var("MAX_LEVERAGE") { if let Ok(n) = v.parse() { self.engine.max_leverage = n; } }
        if let Ok(v) = env::var("USE_MOCK") {
            let lower = v.to_lowercase();
            if ["1","true","yes"].contains(&lower.as_str()) { self.price_source.use_mock = true; }
            if ["0","false","no"].contains(&lower.as_str()) { self.price_source.use_mock = false; }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            engine: EngineConfig::default(),
            price_source: PriceSourceConfig {
                base_url: "https://api.binance.com".to_string(),
                timeout_ms: Some(5000),
                use_mock: true,
            },
            storage: StorageConfig {
                db_path: "db.json".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
            },
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_leverage: 100,
            allow_amend_targets: true,
            refresh_interval_ms: 5000,
        }
    }
}
