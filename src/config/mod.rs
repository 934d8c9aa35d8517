//! Configuration for hosts embedding the container
//!
//! Settings are read from TOML; every field has a default so an absent file
//! or section is valid.

pub mod loader;

use std::str::FromStr;

use serde::Deserialize;
use tracing::Level;

use crate::error::ConfigError;
use crate::logging::{LogFormat, LoggingConfig, LoggingEnvironment};

pub use loader::ConfigLoader;

/// Top-level settings
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub container: ContainerSettings,
}

/// `[logging]` section
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    /// One of `trace`, `debug`, `info`, `warn`, `error`
    pub level: String,
    pub format: LogFormat,
    pub show_target: bool,
    pub show_thread_ids: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            show_target: true,
            show_thread_ids: false,
        }
    }
}

impl LoggingSettings {
    pub fn to_logging_config(&self) -> Result<LoggingConfig, ConfigError> {
        let level = Level::from_str(&self.level).map_err(|_| ConfigError::InvalidValue {
            key: "logging.level".to_string(),
            value: self.level.clone(),
        })?;
        let environment = match self.format {
            LogFormat::Json => LoggingEnvironment::Production,
            _ => LoggingEnvironment::Development,
        };
        Ok(LoggingConfig {
            environment,
            level,
            format: self.format,
            show_target: self.show_target,
            show_thread_ids: self.show_thread_ids,
        })
    }
}

/// `[container]` section, consumed by `Container::seal`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContainerSettings {
    /// Check for missing dependencies and cycles before sharing the container
    pub verify_on_start: bool,
    /// Build every instance up front instead of on first use
    pub eager: bool,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            verify_on_start: true,
            eager: false,
        }
    }
}
