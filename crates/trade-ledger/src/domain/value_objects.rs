//! # Value Objects
//!
//! Constants and configuration for the trade ledger.

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Positional arguments expected by `init_trade`.
pub const TRADE_FIELD_COUNT: usize = 11;

/// Key holding the trade index unless configured otherwise.
pub const DEFAULT_INDEX_KEY: &str = "_tradeindex";

/// Key written by `init` as a connectivity probe unless configured otherwise.
pub const DEFAULT_PROBE_KEY: &str = "abc";

/// Commit attempts per read-modify-write before giving up.
pub const DEFAULT_MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Positions of the `init_trade` arguments.
pub mod positions {
    pub const TRADE_DATE: usize = 0;
    pub const VALUE_DATE: usize = 1;
    pub const OPERATION: usize = 2;
    pub const QUANTITY: usize = 3;
    pub const SECURITY: usize = 4;
    pub const PRICE: usize = 5;
    pub const COUNTERPARTY: usize = 6;
    pub const USER: usize = 7;
    pub const CORRELATION: usize = 8;
    pub const SETTLED: usize = 9;
    pub const NEEDS_REVISION: usize = 10;
}

/// Which creation argument is appended to the trade index.
///
/// Records are always stored under the trade date argument. Indexing the
/// same value keeps every index entry resolvable; indexing the correlation
/// value reproduces the older ledger layout, where the index is a list of
/// correlation values that do not resolve to records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexedField {
    #[default]
    StorageKey,
    CorrelationValue,
}

impl std::str::FromStr for IndexedField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "storage_key" | "storage-key" | "key" => Ok(Self::StorageKey),
            "correlation_value" | "correlation-value" | "correlation" => {
                Ok(Self::CorrelationValue)
            }
            other => Err(ConfigError::InvalidValue {
                name: "TL_INDEXED_FIELD",
                value: other.to_string(),
            }),
        }
    }
}

/// Configuration for the trade ledger services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Key holding the trade index (default: `_tradeindex`).
    pub index_key: String,
    /// Key written by `init` as a connectivity probe (default: `abc`).
    pub probe_key: String,
    /// Commit attempts per read-modify-write (default: 3).
    pub max_commit_attempts: u32,
    /// Argument appended to the index on creation.
    pub indexed_field: IndexedField,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            index_key: DEFAULT_INDEX_KEY.to_string(),
            probe_key: DEFAULT_PROBE_KEY.to_string(),
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
            indexed_field: IndexedField::default(),
        }
    }
}

impl LedgerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TL_INDEX_KEY`: index key (default: `_tradeindex`)
    /// - `TL_PROBE_KEY`: probe key (default: `abc`)
    /// - `TL_MAX_COMMIT_ATTEMPTS`: commit attempts (default: 3)
    /// - `TL_INDEXED_FIELD`: `storage_key` or `correlation_value`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(key) = env::var("TL_INDEX_KEY") {
            config.index_key = key;
        }
        if let Ok(key) = env::var("TL_PROBE_KEY") {
            config.probe_key = key;
        }
        if let Ok(raw) = env::var("TL_MAX_COMMIT_ATTEMPTS") {
            config.max_commit_attempts =
                raw.parse().map_err(|_| ConfigError::InvalidValue {
                    name: "TL_MAX_COMMIT_ATTEMPTS",
                    value: raw.clone(),
                })?;
        }
        if let Ok(raw) = env::var("TL_INDEXED_FIELD") {
            config.indexed_field = raw.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the services cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index_key.is_empty() {
            return Err(ConfigError::EmptyKey { name: "index_key" });
        }
        if self.probe_key.is_empty() {
            return Err(ConfigError::EmptyKey { name: "probe_key" });
        }
        if self.index_key == self.probe_key {
            return Err(ConfigError::KeyCollision {
                key: self.index_key.clone(),
            });
        }
        if self.max_commit_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_commit_attempts",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must not be empty")]
    EmptyKey { name: &'static str },

    #[error("index key and probe key must differ (both are {key})")]
    KeyCollision { key: String },

    #[error("invalid value {value:?} for {name}")]
    InvalidValue { name: &'static str, value: String },
}
