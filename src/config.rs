//! Configuration management for amberwatch
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files. The location of the file can be overridden
//! with the `AMBERWATCH_CONFIG` environment variable.

use crate::error::{AmberError, Result};
use chrono_tz::Tz;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

mod defaults;

/// Smallest accepted lookback window in hours
pub const MIN_PAST_HOURS: u8 = 1;

/// Largest accepted lookback window in hours
pub const MAX_PAST_HOURS: u8 = 24;

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "AMBERWATCH_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Price API and location configuration
    pub amber: AmberConfig,

    /// Seconds between two polls of the price API
    pub poll_interval_secs: u64,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Web server binding configuration
    pub web: WebConfig,
}

/// Price API configuration for one location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AmberConfig {
    /// Postcode identifying the network region
    pub postcode: String,

    /// Hours of already elapsed intervals to request (1-24)
    pub past_hours: u8,

    /// Base URL of the price API
    pub base_url: String,

    /// Value sent in the `origin` header
    pub origin: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// IANA zone used for timestamps that carry no offset
    pub source_timezone: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-specific level
    pub console_level: Option<String>,

    /// Optional file-specific level
    pub file_level: Option<String>,

    /// Path to log file; its directory receives the rotated files
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WebConfig {
    /// Whether the read API is served at all
    pub enabled: bool,

    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

impl AmberConfig {
    /// Lookback window clamped into the range the API accepts
    pub fn clamped_past_hours(&self) -> u8 {
        self.past_hours.clamp(MIN_PAST_HOURS, MAX_PAST_HOURS)
    }

    /// Postcode with surrounding whitespace removed
    pub fn postcode(&self) -> &str {
        self.postcode.trim()
    }

    /// Parsed source timezone
    pub fn timezone(&self) -> Result<Tz> {
        self.source_timezone.parse::<Tz>().map_err(|_| {
            AmberError::validation(
                "amber.source_timezone",
                format!("Unknown timezone '{}'", self.source_timezone),
            )
        })
    }

    /// Parsed base URL
    pub fn base_url(&self) -> Result<Url> {
        parse_http_url("amber.base_url", &self.base_url)
    }

    /// Stable identity of this configured location.
    ///
    /// The same postcode always maps to the same id, so sensor unique ids
    /// survive restarts without any stored state.
    pub fn entry_id(&self) -> Uuid {
        let name = format!("amberwatch:postcode:{}", self.postcode());
        Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first location that exists
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Self::from_file(path);
        }

        let default_paths = [
            "amberwatch.yaml",
            "/data/amberwatch.yaml",
            "/etc/amberwatch/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Self::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.amber.postcode().is_empty() {
            return Err(AmberError::validation(
                "amber.postcode",
                "Postcode cannot be empty",
            ));
        }

        if !(MIN_PAST_HOURS..=MAX_PAST_HOURS).contains(&self.amber.past_hours) {
            return Err(AmberError::validation(
                "amber.past_hours",
                format!("Must be between {MIN_PAST_HOURS} and {MAX_PAST_HOURS}"),
            ));
        }

        self.amber.base_url()?;
        parse_http_url("amber.origin", &self.amber.origin)?;

        if self.amber.timeout_secs == 0 {
            return Err(AmberError::validation(
                "amber.timeout_secs",
                "Must be greater than 0",
            ));
        }

        self.amber.timezone()?;

        if self.poll_interval_secs == 0 {
            return Err(AmberError::validation(
                "poll_interval_secs",
                "Must be greater than 0",
            ));
        }

        crate::logging::parse_log_level(&self.logging.level)
            .map_err(|e| AmberError::validation("logging.level", e.to_string()))?;

        if self.web.enabled && self.web.port == 0 {
            return Err(AmberError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }
}

fn parse_http_url(field: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| AmberError::validation(field, format!("Invalid URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AmberError::validation(
            field,
            format!("Unsupported scheme '{other}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        let mut config = Config::default();
        config.amber.postcode = "3000".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.amber.past_hours, 1);
        assert_eq!(config.amber.timeout_secs, 10);
        assert_eq!(config.poll_interval_secs, 300);
        assert_eq!(config.amber.base_url, "https://backend.amber.com.au");
        assert!(config.web.enabled);
    }

    #[test]
    fn test_config_validation() {
        assert!(configured().validate().is_ok());

        // Default has no postcode
        assert!(Config::default().validate().is_err());

        let mut config = configured();
        config.amber.postcode = "   ".to_string();
        assert!(config.validate().is_err());

        config = configured();
        config.amber.past_hours = 0;
        assert!(config.validate().is_err());

        config = configured();
        config.amber.past_hours = 25;
        assert!(config.validate().is_err());

        config = configured();
        config.amber.source_timezone = "Mars/Olympus_Mons".to_string();
        assert!(config.validate().is_err());

        config = configured();
        config.amber.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clamped_past_hours() {
        let mut amber = AmberConfig::default();
        amber.past_hours = 0;
        assert_eq!(amber.clamped_past_hours(), 1);
        amber.past_hours = 200;
        assert_eq!(amber.clamped_past_hours(), 24);
        amber.past_hours = 6;
        assert_eq!(amber.clamped_past_hours(), 6);
    }

    #[test]
    fn test_entry_id_is_stable_per_postcode() {
        let a = configured().amber;
        let mut b = configured().amber;
        b.postcode = " 3000 ".to_string();
        assert_eq!(a.entry_id(), b.entry_id());

        b.postcode = "4000".to_string();
        assert_ne!(a.entry_id(), b.entry_id());
    }

    #[test]
    fn test_config_serialization() {
        let config = configured();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let deserialized: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("amber:\n  postcode: \"2000\"\n").unwrap();
        assert_eq!(config.amber.postcode, "2000");
        assert_eq!(config.amber.past_hours, 1);
        assert_eq!(config.poll_interval_secs, 300);
    }
}
