//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub database_url: String,
    pub log_level: Level,
    pub http_timeout: Duration,
    pub location_timeout: Duration,
    pub geocoder_url: String,
    pub user_agent: String,
    /// Charged for paid services, in the smallest currency unit.
    pub payment_amount: u64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Backend and Storage ---
        let api_base_url = lookup("VYTAL_API_BASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("VYTAL_API_BASE_URL".to_string()))?;
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "VYTAL_API_BASE_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_base_url),
            ));
        }

        let database_url = lookup("VYTAL_DATABASE_URL")
            .unwrap_or_else(|| "sqlite://vytal.db?mode=rwc".to_string());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Timeouts ---
        let http_timeout = Duration::from_secs(parse_or(&lookup, "VYTAL_HTTP_TIMEOUT_SECS", 30)?);
        let location_timeout =
            Duration::from_secs(parse_or(&lookup, "VYTAL_LOCATION_TIMEOUT_SECS", 20)?);

        // --- Collaborators ---
        let geocoder_url = lookup("VYTAL_GEOCODER_URL")
            .unwrap_or_else(|| "https://nominatim.openstreetmap.org".to_string());
        let user_agent =
            lookup("VYTAL_USER_AGENT").unwrap_or_else(|| "VytalYouApp/1.0".to_string());
        let payment_amount = parse_or(&lookup, "VYTAL_PAYMENT_AMOUNT", 1000)?;

        Ok(Self {
            api_base_url,
            database_url,
            log_level,
            http_timeout,
            location_timeout,
            geocoder_url,
            user_agent,
            payment_amount,
        })
    }
}

fn parse_or<F>(lookup: &F, name: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
            ConfigError::InvalidValue(name.to_string(), format!("'{}': {}", raw, e))
        }),
    }
}
