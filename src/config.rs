//! Configuration management for Heliodash
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::error::{HelioError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dongle HTTP endpoint configuration
    pub dongle: DongleConfig,

    /// WiFi dongle discovery configuration
    pub discovery: DiscoveryConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Graded smart-control thresholds
    pub smart_control: SmartControlConfig,

    /// Exchange-rate service configuration
    pub exchange_rates: ExchangeRateConfig,

    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

/// Dongle HTTP endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DongleConfig {
    /// Base URL of the dongle's local HTTP interface
    pub url: String,

    /// Dongle serial number (sent as `pwd`), required by the service. It is
    /// the part of the dongle SSID after `discovery.ssid_prefix`.
    pub serial: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

/// Parameters for [`DongleDiscovery`](crate::dongle::DongleDiscovery)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// SSID prefix advertised by the dongle
    pub ssid_prefix: String,

    /// Association checks per candidate network
    pub retries: u32,

    /// Delay between association checks in milliseconds
    pub retry_delay_ms: u64,

    /// Reachability probe timeout in milliseconds
    pub probe_timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-specific level; falls back to `level`
    pub console_level: Option<String>,

    /// Optional file-specific level; falls back to `level`
    pub file_level: Option<String>,

    /// Path to log file (its parent directory receives the rolling files)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Thresholds for the graded smart-control resolver (watts)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartControlConfig {
    /// Surplus above which the load is fully enabled
    pub enable_full_w: i32,

    /// Surplus above which the load is partially enabled
    pub enable_partial_w: i32,

    /// Deficit beyond which the load is fully disabled
    pub disable_full_w: i32,

    /// Deficit beyond which the load is partially disabled
    pub disable_partial_w: i32,
}

/// Exchange-rate service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeRateConfig {
    /// Whether rates are fetched at all (fallback rates are used otherwise)
    pub enabled: bool,

    /// Endpoint returning `{"rates": {...}}` relative to EUR
    pub url: String,

    /// Cache lifetime in hours
    pub refresh_hours: u32,

    /// Wait after a failed fetch before trying again, in minutes
    pub retry_minutes: u32,

    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            "heliodash.yaml",
            "/data/heliodash.yaml",
            "/etc/heliodash/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.dongle.url.trim().is_empty() {
            return Err(HelioError::validation(
                "dongle.url",
                "URL cannot be empty",
            ));
        }

        if self.dongle.timeout_ms == 0 {
            return Err(HelioError::validation(
                "dongle.timeout_ms",
                "Must be greater than 0",
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(HelioError::validation(
                "poll_interval_ms",
                "Must be greater than 0",
            ));
        }

        if self.discovery.ssid_prefix.is_empty() {
            return Err(HelioError::validation(
                "discovery.ssid_prefix",
                "Prefix cannot be empty",
            ));
        }
        if self.discovery.retries == 0 {
            return Err(HelioError::validation(
                "discovery.retries",
                "Must be greater than 0",
            ));
        }

        let sc = &self.smart_control;
        if sc.enable_partial_w > sc.enable_full_w {
            return Err(HelioError::validation(
                "smart_control.enable_partial_w",
                "Must not exceed enable_full_w",
            ));
        }
        if sc.disable_partial_w > sc.disable_full_w {
            return Err(HelioError::validation(
                "smart_control.disable_partial_w",
                "Must not exceed disable_full_w",
            ));
        }

        if self.exchange_rates.enabled {
            if self.exchange_rates.refresh_hours == 0 {
                return Err(HelioError::validation(
                    "exchange_rates.refresh_hours",
                    "Must be greater than 0",
                ));
            }
            if self.exchange_rates.retry_minutes == 0 {
                return Err(HelioError::validation(
                    "exchange_rates.retry_minutes",
                    "Must be greater than 0",
                ));
            }
        }

        crate::logging::parse_log_level(&self.logging.level)
            .map_err(|_| HelioError::validation("logging.level", "Unknown log level"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.dongle.url, "http://5.8.8.8");
        assert_eq!(config.dongle.timeout_ms, 5000);
        assert_eq!(config.discovery.retries, 100);
        assert_eq!(config.discovery.retry_delay_ms, 100);
        assert_eq!(config.smart_control.enable_full_w, 1500);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.dongle.url = String::new();
        assert!(config.validate().is_err());

        config = Config::default();
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.logging.level = "LOUD".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "dongle:\n  serial: SXABCDEF\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.dongle.serial, "SXABCDEF");
        assert_eq!(config.dongle.url, "http://5.8.8.8");
        assert_eq!(config.poll_interval_ms, 5000);
    }
}
