//! Record store connection settings and service timings.

use crate::config_utils;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the config file holding `StoreConfig`
pub const CONFIG_FILE_NAME: &str = "store.json";

pub const ENV_API_HOST: &str = "UPLOAD_RECORDS_API_HOST";
pub const ENV_PROJECT_ID: &str = "UPLOAD_RECORDS_PROJECT_ID";
pub const ENV_PUBLIC_KEY: &str = "UPLOAD_RECORDS_PUBLIC_KEY";
pub const ENV_TIMEOUT_SECS: &str = "UPLOAD_RECORDS_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where and how to reach the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub base_url: String,
    pub project_id: String,
    pub public_key: String,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: String::new(),
            public_key: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl StoreConfig {
    /// Resolve from the default config directory and the process environment.
    ///
    /// Priority: runtime env var > config file > default.
    pub fn load() -> Result<Self, String> {
        let file = config_utils::load_config_file(CONFIG_FILE_NAME)?;
        Ok(Self::resolve(file, |key| env::var(key).ok()))
    }

    /// Same as `load`, reading the config file from `dir`
    pub fn load_from(dir: &Path) -> Result<Self, String> {
        let file = config_utils::load_config_file_in(dir, CONFIG_FILE_NAME)?;
        Ok(Self::resolve(file, |key| env::var(key).ok()))
    }

    /// Persist to the default config directory
    pub fn save(&self) -> Result<PathBuf, String> {
        config_utils::save_config_file(CONFIG_FILE_NAME, self)
    }

    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, String> {
        config_utils::save_config_file_in(dir, CONFIG_FILE_NAME, self)
    }

    /// Apply env overrides on top of the file config (or defaults)
    fn resolve(file: Option<StoreConfig>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = file.unwrap_or_default();

        if let Some(host) = lookup(ENV_API_HOST) {
            config.base_url = host;
        }
        if let Some(project_id) = lookup(ENV_PROJECT_ID) {
            config.project_id = project_id;
        }
        if let Some(key) = lookup(ENV_PUBLIC_KEY) {
            config.public_key = key;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.parse() {
                Ok(secs) => config.timeout_secs = secs,
                Err(e) => tracing::warn!(
                    value = %raw,
                    error = %e,
                    "Ignoring invalid {}",
                    ENV_TIMEOUT_SECS
                ),
            }
        }

        config
    }
}

/// Fixed pauses used by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTimings {
    /// Pause before each simulated progress step
    pub progress_step_delay: Duration,
    /// Pause before a file is validated
    pub validation_delay: Duration,
}

impl Default for ServiceTimings {
    fn default() -> Self {
        Self {
            progress_step_delay: Duration::from_millis(150),
            validation_delay: Duration::from_millis(100),
        }
    }
}

impl ServiceTimings {
    /// No pauses at all
    pub fn immediate() -> Self {
        Self {
            progress_step_delay: Duration::ZERO,
            validation_delay: Duration::ZERO,
        }
    }
}
