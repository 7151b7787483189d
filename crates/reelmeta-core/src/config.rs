use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ReelmetaError;
use crate::resolver::RetryPolicy;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Environment variable that overrides `lookup.api_key`.
pub const API_KEY_ENV: &str = "OMDB_API_KEY";

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub lookup: LookupConfig,
    pub paths: PathsConfig,
}

/// Lookup service endpoint and request pacing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LookupConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub retries: u32,
    pub request_delay_ms: u64,
    pub retry_delay_ms: u64,
    pub entry_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    pub database: PathBuf,
    pub movies_csv: PathBuf,
    pub ratings_csv: PathBuf,
}

impl LookupConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn entry_delay(&self) -> Duration {
        Duration::from_millis(self.entry_delay_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retries.max(1),
            request_delay: Duration::from_millis(self.request_delay_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

impl AppConfig {
    /// Load config: built-in defaults, with the given file (or the user config
    /// file, if it exists) merged over them, then the API key from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ReelmetaError> {
        let user_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Some(Self::config_path()).filter(|p| p.exists()),
        };

        let mut config = match user_path {
            Some(p) => {
                let user_str = std::fs::read_to_string(&p)
                    .map_err(|e| ReelmetaError::Config(format!("{}: {e}", p.display())))?;
                Self::from_toml_over_defaults(&user_str)?
            }
            None => Self::default(),
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.lookup.api_key = key;
            }
        }
        Ok(config)
    }

    /// Parse a (possibly partial) TOML document merged over the defaults.
    pub fn from_toml_over_defaults(user: &str) -> Result<Self, ReelmetaError> {
        let mut merged: toml::Table =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| ReelmetaError::Config(e.to_string()))?;
        let user: toml::Table =
            toml::from_str(user).map_err(|e| ReelmetaError::Config(e.to_string()))?;
        merge_tables(&mut merged, user);
        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ReelmetaError::Config(e.to_string()))
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "reelmeta")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("reelmeta.toml"))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
