use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_QUERY_PATH: &str = "/.netlify/functions/query";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid config value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Base URL of the query service; the query path is appended to it.
    pub api_url: Option<String>,
    pub query_path: String,
    pub timeout_secs: u64,
    /// Complete filter rows a search needs before it is dispatched.
    pub min_complete_filters: usize,
    /// Maximum characters of a message shown in the results table.
    pub message_width: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            query_path: DEFAULT_QUERY_PATH.to_string(),
            timeout_secs: 30,
            min_complete_filters: 1,
            message_width: 60,
        }
    }
}

impl ConsoleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.message_width < 4 {
            return Err(ConfigError::Invalid {
                key: "message_width",
                reason: "must be at least 4".to_string(),
            });
        }
        Ok(self)
    }
}

pub fn load_config(path: Option<&Path>) -> Result<ConsoleConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    toml::from_str::<ConsoleConfig>(&raw)
        .map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?
        .validate()
}

pub fn default_config() -> &'static ConsoleConfig {
    static DEFAULT_CONFIG: LazyLock<ConsoleConfig> = LazyLock::new(ConsoleConfig::default);
    &DEFAULT_CONFIG
}
