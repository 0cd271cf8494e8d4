//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Generation orchestration configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Maximum concurrent backend calls
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Retry budget per generation call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for transient-error backoff
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Stagger between batch submissions
    #[serde(default = "default_submit_stagger_ms")]
    pub submit_stagger_ms: u64,
}

fn default_max_concurrent() -> usize {
    50
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    3000
}

fn default_submit_stagger_ms() -> u64 {
    500
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            submit_stagger_ms: default_submit_stagger_ms(),
        }
    }
}

/// Image fetch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_retries")]
    pub max_retries: u32,
    #[serde(default = "default_fetch_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_fetch_retries() -> u32 {
    2
}

fn default_fetch_base_delay_ms() -> u64 {
    1500
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_cache_ttl_secs() -> u64 {
    300
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: default_fetch_retries(),
            base_delay_ms: default_fetch_base_delay_ms(),
            timeout_secs: default_fetch_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Generation backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_backend_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_endpoint() -> String {
    "http://localhost:9090".to_string()
}

fn default_backend_timeout_ms() -> u64 {
    120000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_ms: default_backend_timeout_ms(),
        }
    }
}

/// Artifact storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub base_path: String,
}

fn default_storage_path() -> String {
    "./artifacts".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_storage_path(),
        }
    }
}

/// Inbound API rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

fn default_true() -> bool {
    true
}

fn default_rps() -> u32 {
    100
}

fn default_burst() -> u32 {
    200
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: default_rps(),
            burst_size: default_burst(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(
                File::with_name(path.as_ref().to_str().unwrap_or("config/default"))
                    .required(false),
            )
            // Override with environment variables (prefixed with ROOMVIZ_)
            .add_source(
                Environment::with_prefix("ROOMVIZ")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Server port cannot be 0".to_string(),
            )));
        }

        if self.generation.max_concurrent == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "generation.max_concurrent must be at least 1".to_string(),
            )));
        }

        if self.backend.endpoint.trim().is_empty() {
            return Err(AppError::Config(config::ConfigError::Message(
                "backend.endpoint cannot be empty".to_string(),
            )));
        }

        if self.storage.base_path.trim().is_empty() {
            return Err(AppError::Config(config::ConfigError::Message(
                "storage.base_path cannot be empty".to_string(),
            )));
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            generation: GenerationConfig::default(),
            fetch: FetchConfig::default(),
            backend: BackendConfig::default(),
            storage: StorageConfig::default(),
            rate_limit: RateLimitConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.generation.max_concurrent, 50);
        assert_eq!(settings.generation.max_retries, 3);
        assert_eq!(settings.generation.base_delay_ms, 3000);
        assert_eq!(settings.fetch.max_retries, 2);
        assert_eq!(settings.fetch.base_delay_ms, 1500);
        assert_eq!(settings.fetch.cache_ttl_secs, 300);
        assert!(settings.rate_limit.enabled);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut settings = Settings::default();
        settings.generation.max_concurrent = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_endpoint() {
        let mut settings = Settings::default();
        settings.backend.endpoint = "".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let settings = Settings::load_from_path("does/not/exist.toml").unwrap();
        assert_eq!(settings.generation.max_concurrent, 50);
    }
}
