use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "MedPortal";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Portal REST service used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://13.201.22.79:8000/api";

const ENV_API_URL: &str = "MEDPORTAL_API_URL";
const ENV_TIMEOUT_SECS: &str = "MEDPORTAL_TIMEOUT_SECS";
const ENV_APPOINTMENT_MINUTES: &str = "MEDPORTAL_APPOINTMENT_MINUTES";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "medportal=debug,warn"
    } else {
        "medportal=info,warn"
    }
}

/// Get the application data directory
/// ~/MedPortal/ on all platforms
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Get the config file path (~/MedPortal/config.json)
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("config.json"))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

/// Runtime settings for the portal core. Every field has a default, so a
/// config file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortalConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub appointment_duration_minutes: u32,
    pub buffer_minutes: u32,
    pub booking_window_days: u32,
    pub week_starts_on: Weekday,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 30,
            appointment_duration_minutes: 30,
            buffer_minutes: 0,
            booking_window_days: 30,
            week_starts_on: Weekday::Sun,
        }
    }
}

impl PortalConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Config file (if any) with environment overrides applied on top.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        tracing::debug!(api = %config.api_base_url, "Configuration loaded");
        Ok(config)
    }

    /// Applies `MEDPORTAL_*` overrides read through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = raw.parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup(ENV_APPOINTMENT_MINUTES) {
            self.appointment_duration_minutes =
                raw.parse().map_err(|_| ConfigError::InvalidEnv {
                    key: ENV_APPOINTMENT_MINUTES,
                    value: raw.clone(),
                })?;
        }
        Ok(())
    }
}
