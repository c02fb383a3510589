//! Application Configuration
//!
//! This module provides configuration management for the application,
//! supporting YAML configuration files with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use log::{info, warn};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "BLOBVAULT_CONFIG";

/// Configuration file used when the environment does not name one
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Object store configuration
    pub storage: StorageConfig,
    /// Range request policy
    pub range: RangeConfig,
    /// Outbound peer calls
    pub peer: PeerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Number of worker threads
    pub workers: usize,
    /// Maximum payload size in bytes
    pub max_payload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9710,
            workers: 4,
            max_payload_size: 1073741824, // 1GB
        }
    }
}

/// Object store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Buckets available from startup
    pub buckets: Vec<String>,
    /// Buckets whose objects can not be deleted
    pub protected_buckets: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            buckets: vec!["default".to_string()],
            protected_buckets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RangeConfig {
    /// Most range specs accepted in one `Range` header
    pub max_ranges: usize,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self { max_ranges: 16 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PeerConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Path to log configuration file
    pub config_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            config_file: "server_log.yaml".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the file named by `BLOBVAULT_CONFIG`
    /// (or `config.yaml`), use defaults if not found
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path =
            env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific file, use defaults if not found
    pub fn load_from<P: AsRef<Path>>(config_path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = config_path.as_ref();
        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            let config: AppConfig = serde_yaml::from_str(&content)?;
            info!("Loaded configuration from {}", config_path.display());
            Ok(config)
        } else {
            warn!("Config file {} not found, using defaults", config_path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 9710);
        assert_eq!(config.storage.buckets, vec!["default".to_string()]);
        assert_eq!(config.range.max_ranges, 16);
        assert_eq!(config.peer.timeout_secs, 30);
        assert_eq!(config.logging.config_file, "server_log.yaml");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server:\n  port: 8000\n\
             storage:\n  buckets: [photos, videos]\n  protected_buckets: [videos]"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.buckets, vec!["photos".to_string(), "videos".to_string()]);
        assert_eq!(config.storage.protected_buckets, vec!["videos".to_string()]);
        assert_eq!(config.range, RangeConfig::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server: [not, a, map").unwrap();
        assert!(AppConfig::load_from(file.path()).is_err());
    }

    #[test]
    #[serial]
    fn test_load_honours_env_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "range:\n  max_ranges: 2").unwrap();

        env::set_var(CONFIG_PATH_ENV, file.path());
        let config = AppConfig::load();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(config.unwrap().range.max_ranges, 2);
    }
}
