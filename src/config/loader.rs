use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use super::Settings;
use crate::error::ConfigError;
use crate::logging::LogFormat;

/// Environment variable pointing at an explicit config file
pub const CONFIG_PATH_ENV: &str = "LAZYIOC_CONFIG";
pub const LOG_LEVEL_ENV: &str = "LAZYIOC_LOG_LEVEL";
pub const LOG_FORMAT_ENV: &str = "LAZYIOC_LOG_FORMAT";

const CONFIG_DIR_NAME: &str = "lazyioc";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration loader responsible for loading settings from file and environment
pub struct ConfigLoader {
    path: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Create a loader using `$LAZYIOC_CONFIG` or the user config directory
    pub fn new() -> Self {
        Self {
            path: None,
            env: None,
        }
    }

    /// Create a loader reading a specific file (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            env: None,
        }
    }

    /// Use a fixed variable map instead of the process environment (for testing)
    pub fn with_env(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// Load settings; a missing file yields defaults
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let mut settings = match self.config_path() {
            Some(path) if path.exists() => Self::read_file(&path)?,
            Some(path) => {
                tracing::debug!(path = %path.display(), "Config file not found, using defaults");
                Settings::default()
            }
            None => Settings::default(),
        };
        self.apply_env(&mut settings)?;
        Ok(settings)
    }

    /// Resolve the config file path
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.path {
            return Some(path.clone());
        }
        if let Some(path) = self.var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    fn read_file(path: &Path) -> Result<Settings, ConfigError> {
        let shown = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: shown.clone(),
            source,
        })?;
        let settings = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: shown.clone(),
            source,
        })?;
        tracing::debug!(path = %shown, "Loaded config file");
        Ok(settings)
    }

    fn apply_env(&self, settings: &mut Settings) -> Result<(), ConfigError> {
        if let Some(level) = self.var(LOG_LEVEL_ENV) {
            settings.logging.level = level;
        }
        if let Some(format) = self.var(LOG_FORMAT_ENV) {
            settings.logging.format = match format.to_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                "compact" => LogFormat::Compact,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: LOG_FORMAT_ENV.to_string(),
                        value: format,
                    })
                }
            };
        }
        Ok(())
    }

    fn var(&self, key: &str) -> Option<String> {
        match &self.env {
            Some(vars) => vars.get(key).cloned(),
            None => env::var(key).ok(),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
