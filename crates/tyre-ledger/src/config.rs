//! # Ledger Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TYRE_DB_PATH=/var/lib/tyres/ledger.db                              │
//! │     TYRE_NOTIFY_TIMEOUT_MS=500                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tyre-ledger/ledger.toml (Linux)                          │
//! │     ~/Library/Application Support/com.tyres.tyre-ledger/ (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/tyres/ledger.db"
//! max_connections = 5
//!
//! [notify]
//! enabled = true
//! timeout_ms = 2000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use tyre_db::DbConfig;

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

// =============================================================================
// Sections
// =============================================================================

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path. Defaults to `ledger.db` in the platform data dir.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "tyres", "tyre-ledger")
        .map(|dirs| dirs.data_dir().join("ledger.db"))
        .unwrap_or_else(|| PathBuf::from("./ledger.db"))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Notification delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifySettings {
    /// When false, events are dropped without spawning a task.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Upper bound on one delivery attempt (milliseconds).
    #[serde(default = "default_notify_timeout")]
    pub timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_notify_timeout() -> u64 {
    2_000
}

impl Default for NotifySettings {
    fn default() -> Self {
        NotifySettings {
            enabled: true,
            timeout_ms: default_notify_timeout(),
        }
    }
}

// =============================================================================
// Ledger Config
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub notify: NotifySettings,
}

impl LedgerConfig {
    /// Loads configuration.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`ledger.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) with overrides read through `lookup` instead
    /// of the process environment.
    pub fn load_with<F>(config_path: Option<PathBuf>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading ledger config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(lookup)?;
        config.validate()?;

        Ok(config)
    }

    /// Applies `TYRE_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("TYRE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("TYRE_DB_MAX_CONNECTIONS") {
            self.database.max_connections = max
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TYRE_DB_MAX_CONNECTIONS".to_string()))?;
        }

        if let Some(timeout) = lookup("TYRE_NOTIFY_TIMEOUT_MS") {
            self.notify.timeout_ms = timeout
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TYRE_NOTIFY_TIMEOUT_MS".to_string()))?;
        }

        if let Some(enabled) = lookup("TYRE_NOTIFY_ENABLED") {
            match enabled.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.notify.enabled = true,
                "0" | "false" | "no" | "off" => self.notify.enabled = false,
                _ => warn!(value = %enabled, "Unknown TYRE_NOTIFY_ENABLED value, ignoring"),
            }
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue("database.max_connections".to_string()));
        }

        if self.notify.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("notify.timeout_ms".to_string()));
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue("database.path".to_string()));
        }

        Ok(())
    }

    /// Pool configuration for `tyre-db`.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone()).max_connections(self.database.max_connections)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify.timeout_ms)
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tyres", "tyre-ledger")
            .map(|dirs| dirs.config_dir().join("ledger.toml"))
    }
}
