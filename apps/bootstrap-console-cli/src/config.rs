use std::env;
use std::path::PathBuf;

use bootstrap_console_client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS};
use thiserror::Error;

const BASE_URL_KEY: &str = "BOOTSTRAP_CONSOLE_BASE_URL";
const TIMEOUT_MS_KEY: &str = "BOOTSTRAP_CONSOLE_TIMEOUT_MS";
const SETTINGS_DIR_KEY: &str = "BOOTSTRAP_CONSOLE_SETTINGS_DIR";
const SETTINGS_DIR_NAME: &str = "bootstrap-console";

const MIN_TIMEOUT_MS: u64 = 250;
const MAX_TIMEOUT_MS: u64 = 600_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub settings_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid BOOTSTRAP_CONSOLE_TIMEOUT_MS: {0}")]
    InvalidTimeoutMs(String),
    #[error("BOOTSTRAP_CONSOLE_SETTINGS_DIR is unset and no config directory is available")]
    SettingsDirUnavailable,
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let base_url = lookup(BASE_URL_KEY).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_ms = match lookup(TIMEOUT_MS_KEY) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|error| ConfigError::InvalidTimeoutMs(format!("{raw}: {error}")))?
                .clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS),
            None => DEFAULT_TIMEOUT_MS,
        };
        let settings_dir = match lookup(SETTINGS_DIR_KEY) {
            Some(dir) => PathBuf::from(dir.trim()),
            None => dirs::config_dir()
                .map(|dir| dir.join(SETTINGS_DIR_NAME))
                .ok_or(ConfigError::SettingsDirUnavailable)?,
        };

        Ok(Self {
            base_url,
            timeout_ms,
            settings_dir,
        })
    }
}
