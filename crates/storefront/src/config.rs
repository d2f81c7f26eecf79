//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PULPERIA_API_URL` - Base URL of the backend REST API
//!
//! ## Optional
//! - `PULPERIA_STORAGE_DIR` - Directory for durable local state (default: `.pulperia`)
//! - `PULPERIA_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 10)
//! - `PULPERIA_HISTORY_DEPTH` - Guest cart undo history depth (default: 10)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the backend REST API.
    pub api_base_url: Url,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Directory holding durable local state (guest cart, session keys).
    pub storage_dir: PathBuf,
    /// How many cart snapshots the guest undo history keeps.
    pub history_depth: usize,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("PULPERIA_API_URL")?
            .parse::<Url>()
            .map_err(|e| ConfigError::InvalidEnvVar("PULPERIA_API_URL".to_string(), e.to_string()))?;

        let timeout_secs = get_env_or_default("PULPERIA_HTTP_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PULPERIA_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        let storage_dir = PathBuf::from(get_env_or_default("PULPERIA_STORAGE_DIR", ".pulperia"));

        let history_depth = get_env_or_default("PULPERIA_HISTORY_DEPTH", "10")
            .parse::<usize>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PULPERIA_HISTORY_DEPTH".to_string(), e.to_string())
            })?;

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            storage_dir,
            history_depth,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
