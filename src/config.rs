//! Configuration management with validation and defaults
//!
//! Values come from built-in defaults, an optional TOML file, and finally
//! environment overrides, in that order.

use crate::errors::{ConfigurationError, TaixiuResult};
use serde::{Deserialize, Serialize};
use std::{env, path::Path, time::Duration};

/// Complete service configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaixiuConfig {
    pub server: ServerConfig,
    pub game: GameConfig,
    pub storage: StorageConfig,
    pub monitoring: MonitoringConfig,
}

/// HTTP adapter configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Enables the administrative top-up endpoint when set
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
            admin_token: None,
        }
    }
}

/// Game rules that are deployment settings rather than house rules
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Balance credited to a newly opened account
    pub start_balance: u64,
    pub default_history_limit: usize,
    pub max_history_limit: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            start_balance: 1000,
            default_history_limit: 20,
            max_history_limit: 100,
        }
    }
}

/// Storage configuration with optimization settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_directory: String,
    pub write_buffer_size_mb: usize,
    pub max_write_buffer_number: i32,
    pub compression_type: CompressionType,
    /// Whether to clear database on startup (testing only!)
    pub clear_on_start: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum CompressionType {
    None,
    Snappy,
    Lz4,
    Zstd,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_directory: "./DB/taixiu_data".to_string(),
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            compression_type: CompressionType::Lz4,
            clear_on_start: false, // Production default: preserve data
        }
    }
}

/// Logging and metrics configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enable_metrics: bool,
    /// Default `tracing` filter directive; `RUST_LOG` takes precedence
    pub log_level: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            log_level: "info".to_string(),
        }
    }
}

impl TaixiuConfig {
    /// Configuration for tests: throwaway database, small history window
    pub fn testing() -> Self {
        Self {
            game: GameConfig {
                default_history_limit: 10,
                max_history_limit: 50,
                ..Default::default()
            },
            storage: StorageConfig {
                data_directory: "./DB/taixiu_test".to_string(),
                clear_on_start: true,
                ..Default::default()
            },
            monitoring: MonitoringConfig {
                log_level: "debug".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Configuration for production deployment with persistence
    pub fn production() -> Self {
        Self {
            server: ServerConfig {
                request_timeout_secs: 10,
                ..Default::default()
            },
            storage: StorageConfig {
                write_buffer_size_mb: 128,
                max_write_buffer_number: 6,
                compression_type: CompressionType::Zstd,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Validate configuration for logical consistency
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.server.port == 0 {
            return Err(ConfigurationError::ValidationFailed(
                "server.port must be > 0".to_string(),
            ));
        }

        if self.game.max_history_limit == 0 {
            return Err(ConfigurationError::ValidationFailed(
                "game.max_history_limit must be > 0".to_string(),
            ));
        }

        if self.game.default_history_limit == 0
            || self.game.default_history_limit > self.game.max_history_limit
        {
            return Err(ConfigurationError::ValidationFailed(
                "game.default_history_limit must be in 1..=max_history_limit".to_string(),
            ));
        }

        if self.storage.data_directory.trim().is_empty() {
            return Err(ConfigurationError::ValidationFailed(
                "storage.data_directory must not be empty".to_string(),
            ));
        }

        if let Some(token) = &self.server.admin_token {
            if token.len() < 16 {
                return Err(ConfigurationError::ValidationFailed(
                    "server.admin_token must be at least 16 characters".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

/// Configuration loader with environment variable support
#[derive(Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> TaixiuResult<TaixiuConfig> {
        let mut config = match &self.config_path {
            Some(path) => Self::load_from_file(path)?,
            None => TaixiuConfig::default(),
        };

        apply_overrides(&mut config, |key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    fn load_from_file(path: &str) -> TaixiuResult<TaixiuConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e))
        })?;

        Ok(toml::from_str(&content)?)
    }
}

/// Apply overrides from a key lookup (the process environment in production).
///
/// `PORT` and `START_BALANCE` keep their historical unprefixed names.
pub fn apply_overrides<F>(config: &mut TaixiuConfig, lookup: F) -> Result<(), ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("TAIXIU_HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("PORT") {
        config.server.port = parse_var("PORT", &port, "Invalid port number")?;
    }
    if let Some(balance) = lookup("START_BALANCE") {
        config.game.start_balance = parse_var("START_BALANCE", &balance, "Expected a non-negative integer")?;
    }
    if let Some(path) = lookup("TAIXIU_DB_PATH") {
        config.storage.data_directory = path;
    }
    if let Some(token) = lookup("TAIXIU_ADMIN_TOKEN") {
        config.server.admin_token = if token.is_empty() { None } else { Some(token) };
    }
    if let Some(level) = lookup("TAIXIU_LOG_LEVEL") {
        config.monitoring.log_level = level;
    }
    Ok(())
}

fn parse_var<T: std::str::FromStr>(field: &str, value: &str, reason: &str) -> Result<T, ConfigurationError> {
    value.trim().parse().map_err(|_| ConfigurationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_presets_are_valid() {
        assert!(TaixiuConfig::default().validate().is_ok());
        assert!(TaixiuConfig::testing().validate().is_ok());
        assert!(TaixiuConfig::production().validate().is_ok());
    }

    #[test]
    fn test_invalid_history_limits() {
        let mut config = TaixiuConfig::default();
        config.game.default_history_limit = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_short_admin_token_rejected() {
        let mut config = TaixiuConfig::default();
        config.server.admin_token = Some("short".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "8081"),
            ("START_BALANCE", "2500"),
            ("TAIXIU_DB_PATH", "/tmp/taixiu"),
        ]
        .into_iter()
        .collect();

        let mut config = TaixiuConfig::default();
        apply_overrides(&mut config, |k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.game.start_balance, 2500);
        assert_eq!(config.storage.data_directory, "/tmp/taixiu");
    }

    #[test]
    fn test_bad_override_is_reported() {
        let mut config = TaixiuConfig::default();
        let err = apply_overrides(&mut config, |k| (k == "START_BALANCE").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("START_BALANCE"));
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[game]\nstart_balance = 5000\n\n[server]\nport = 9000").unwrap();

        let config = ConfigLoader::load_from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.game.start_balance, 5000);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.game.default_history_limit, 20);
    }

    #[test]
    fn test_duration_conversion() {
        assert_eq!(TaixiuConfig::default().request_timeout(), Duration::from_secs(30));
    }
}
