//! # Node Configuration
//!
//! Ledger, storage and telemetry settings, loaded from the environment and
//! then overridden by command-line flags.

use ledger_telemetry::TelemetryConfig;
use std::env;
use std::path::PathBuf;
use trade_ledger::domain::{ConfigError, LedgerConfig};

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Ledger keys and commit policy.
    pub ledger: LedgerConfig,
    /// Where state lives.
    pub storage: StorageConfig,
    /// Logging.
    pub telemetry: TelemetryConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageConfig {
    /// Snapshot file for the file-backed store. `None` keeps state in memory
    /// for the lifetime of the process.
    pub state_file: Option<PathBuf>,
}

impl StorageConfig {
    /// Reads `TL_STATE_FILE`.
    pub fn from_env() -> Self {
        Self {
            state_file: env::var_os("TL_STATE_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Values given on the command line. Each one that is set replaces the
/// environment value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub state_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub json_logs: bool,
}

impl NodeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            ledger: LedgerConfig::from_env()?,
            storage: StorageConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
        })
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(path) = overrides.state_file {
            self.storage.state_file = Some(path);
        }
        if let Some(level) = overrides.log_level {
            self.telemetry.log_level = level;
        }
        if overrides.json_logs {
            self.telemetry.json_logs = true;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_values() {
        let config = NodeConfig::default().with_overrides(Overrides {
            state_file: Some(PathBuf::from("/tmp/ledger.state")),
            log_level: Some("debug".into()),
            json_logs: true,
        });
        assert_eq!(
            config.storage.state_file.as_deref(),
            Some(std::path::Path::new("/tmp/ledger.state"))
        );
        assert_eq!(config.telemetry.log_level, "debug");
        assert!(config.telemetry.json_logs);
    }

    #[test]
    fn test_empty_overrides_keep_values() {
        let base = NodeConfig::default();
        let config = base.clone().with_overrides(Overrides::default());
        assert_eq!(config.storage, base.storage);
        assert_eq!(config.telemetry, base.telemetry);
        assert_eq!(config.ledger, base.ledger);
    }
}
