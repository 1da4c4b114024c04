//! `casegraph.toml`: store location and default log filter.

use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "casegraph.toml";
pub const DEFAULT_STORE_ROOT: &str = ".casegraph/cases";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub root: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_STORE_ROOT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load the config file.
    ///
    /// With no explicit path a missing `casegraph.toml` means defaults; an
    /// explicit path must exist.
    pub fn load(explicit: Option<&str>) -> Result<Self, ConfigError> {
        let path = explicit.unwrap_or(DEFAULT_CONFIG_PATH);
        if explicit.is_none() && !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::ParseToml {
            path: path.to_string(),
            source,
        })
    }

    /// Store root, with an explicit flag taking precedence.
    pub fn store_root<'a>(&'a self, flag: Option<&'a str>) -> &'a str {
        flag.unwrap_or(&self.store.root)
    }
}
