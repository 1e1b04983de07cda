//! Configuration management for ebloc-bridge
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files with support for environment variable overrides.

use crate::error::{EblocError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod defaults;

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "EBLOC_CONFIG";

/// Environment variable overriding `portal.cookie`
pub const COOKIE_ENV: &str = "EBLOC_COOKIE";

/// Accepted range for `history_months`
pub const HISTORY_MONTHS_RANGE: std::ops::RangeInclusive<u32> = 1..=120;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Billing portal connection settings
    pub portal: PortalConfig,

    /// Refresh interval in minutes
    pub scan_interval_min: u64,

    /// Number of trailing months of meter readings and payments to keep
    pub history_months: u32,

    /// Upper bound for a single month's meter-reading fetch, in seconds
    pub month_timeout_secs: u64,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Web server binding configuration
    pub web: WebConfig,
}

/// Billing portal connection parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PortalConfig {
    /// Portal base URL, without trailing slash
    pub base_url: String,

    /// Session cookie copied from a logged-in browser
    pub cookie: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Browser-like User-Agent sent with every request
    pub user_agent: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional override for console output level
    pub console_level: Option<String>,

    /// Optional override for file output level
    pub file_level: Option<String>,

    /// Optional override for the web log stream level
    pub web_level: Option<String>,

    /// Path to log file (its directory receives the rolling files)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WebConfig {
    /// Serve the read-only HTTP API
    pub enabled: bool,

    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first location that exists, then apply
    /// environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::load_from_default_paths()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_from_default_paths() -> Result<Self> {
        let default_paths = [
            "ebloc_config.yaml",
            "/data/ebloc_config.yaml",
            "/etc/ebloc/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(cookie) = std::env::var(COOKIE_ENV)
            && !cookie.trim().is_empty()
        {
            self.portal.cookie = cookie.trim().to_string();
        }
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let base = self.portal.base_url.trim();
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(EblocError::validation(
                "portal.base_url",
                "Must be an http(s) URL",
            ));
        }

        if self.portal.request_timeout_secs == 0 {
            return Err(EblocError::validation(
                "portal.request_timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.scan_interval_min == 0 {
            return Err(EblocError::validation(
                "scan_interval_min",
                "Must be greater than 0",
            ));
        }

        if !HISTORY_MONTHS_RANGE.contains(&self.history_months) {
            return Err(EblocError::validation(
                "history_months",
                "Must be between 1 and 120",
            ));
        }

        if self.month_timeout_secs == 0 {
            return Err(EblocError::validation(
                "month_timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.web.enabled && self.web.port == 0 {
            return Err(EblocError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Refresh interval as a duration
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_min.saturating_mul(60))
    }

    /// Copy of this configuration that is safe to expose (cookie masked)
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.portal.cookie.is_empty() {
            copy.portal.cookie = "***".to_string();
        }
        copy
    }
}
