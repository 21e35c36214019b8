//! Process configuration.
//!
//! Everything is read from environment variables once at startup.
//! [`AppConfig::from_lookup`] takes any lookup function so tests never touch
//! the real process environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::artifacts::registry::ModelTier;
use crate::llms::providers::gemini::{GeminiConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_FAST_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_QUALITY_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_SQLITE_PATH: &str = "data/brandforge.db";
pub const DEFAULT_REQUIRED_ENV: &str = "DATABASE_URL,GEMINI_API_KEY";

/// API key variables, in precedence order.
pub const API_KEY_VARS: [&str; 3] = [
    "GEMINI_API_KEY",
    "GOOGLE_GENERATIVE_AI_API_KEY",
    "GOOGLE_API_KEY",
];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{var} is required when {because}")]
    Missing {
        var: &'static str,
        because: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Model selection
// ---------------------------------------------------------------------------

/// Concrete model ids behind each [`ModelTier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub fast: String,
    pub quality: String,
    /// Model used by the self-repair loop and the system check ping.
    pub diagnostics: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST_MODEL.to_string(),
            quality: DEFAULT_QUALITY_MODEL.to_string(),
            diagnostics: DEFAULT_FAST_MODEL.to_string(),
        }
    }
}

impl ModelConfig {
    pub fn for_tier(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast,
            ModelTier::Quality => &self.quality,
        }
    }
}

// ---------------------------------------------------------------------------
// Store selection
// ---------------------------------------------------------------------------

/// Which [`BrandStore`](crate::store::BrandStore) backs the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite(PathBuf),
    Postgres(String),
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub store: StoreBackend,
    pub gemini: GeminiConfig,
    pub models: ModelConfig,
    /// Reported as the diagnostic `mode`.
    pub app_env: String,
    pub sdk_version: Option<String>,
    /// JSON file mirroring the diagnostic history.
    pub selfrepair_log: Option<PathBuf>,
    /// Variables the system check requires to be set.
    pub required_env: Vec<String>,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let store = match get("BRAND_STORE").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("memory") => StoreBackend::Memory,
            Some("sqlite") => StoreBackend::Sqlite(
                get("SQLITE_PATH")
                    .unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_string())
                    .into(),
            ),
            Some("postgres") => StoreBackend::Postgres(get("DATABASE_URL").ok_or(
                ConfigError::Missing {
                    var: "DATABASE_URL",
                    because: "BRAND_STORE=postgres",
                },
            )?),
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "BRAND_STORE",
                    value: other.to_string(),
                    reason: "expected memory, sqlite or postgres".to_string(),
                })
            }
        };

        let timeout = match get("GEMINI_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "GEMINI_TIMEOUT_SECS",
                        value: raw,
                        reason: "expected a positive number of seconds".to_string(),
                    })
                }
            },
            None => DEFAULT_TIMEOUT,
        };

        let gemini = GeminiConfig {
            api_key: API_KEY_VARS.iter().find_map(|var| get(*var)),
            base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout,
            temperature: None,
        };

        let fast = get("BRANDFORGE_FAST_MODEL").unwrap_or_else(|| DEFAULT_FAST_MODEL.to_string());
        let models = ModelConfig {
            quality: get("BRANDFORGE_QUALITY_MODEL")
                .unwrap_or_else(|| DEFAULT_QUALITY_MODEL.to_string()),
            diagnostics: get("BRANDFORGE_DIAGNOSTICS_MODEL").unwrap_or_else(|| fast.clone()),
            fast,
        };

        let required_env = get("BRANDFORGE_REQUIRED_ENV")
            .unwrap_or_else(|| DEFAULT_REQUIRED_ENV.to_string())
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            port,
            store,
            gemini,
            models,
            app_env: get("APP_ENV").unwrap_or_else(|| "development".to_string()),
            sdk_version: get("BRANDFORGE_SDK_VERSION"),
            selfrepair_log: get("SELFREPAIR_LOG").map(PathBuf::from),
            required_env,
        })
    }
}
