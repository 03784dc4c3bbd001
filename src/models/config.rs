//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// MobiiElite API settings
    #[serde(default)]
    pub mobiielite: MobiiEliteConfig,

    /// Output file settings
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        Url::parse(&self.mobiielite.api_base_url).map_err(|e| {
            AppError::validation(format!(
                "mobiielite.api_base_url '{}' is not a valid URL: {e}",
                self.mobiielite.api_base_url
            ))
        })?;
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// MobiiElite results API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobiiEliteConfig {
    /// Base URL of the results API
    #[serde(default = "defaults::mobiielite_api")]
    pub api_base_url: String,

    /// Also emit JSON fields that no display column maps
    #[serde(default)]
    pub include_all_fields: bool,
}

impl Default for MobiiEliteConfig {
    fn default() -> Self {
        Self {
            api_base_url: defaults::mobiielite_api(),
            include_all_fields: false,
        }
    }
}

/// Output file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Columns removed before writing
    #[serde(default = "defaults::drop_columns")]
    pub drop_columns: Vec<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            drop_columns: defaults::drop_columns(),
        }
    }
}

mod defaults {
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; race-scraper/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn mobiielite_api() -> String {
        "https://live.mobii.com/".into()
    }
    pub fn drop_columns() -> Vec<String> {
        vec!["Fav".into(), "Share".into(), "Behind".into(), "".into()]
    }
}
