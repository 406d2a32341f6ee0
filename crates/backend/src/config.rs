// =============================================================================
// Soy Risk Dashboard - Configuration
// =============================================================================

use std::env;
use std::path::PathBuf;

/// Process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1:8050")
    pub bind_address: String,

    /// Path to `dashboard.toml` naming the input files
    pub dashboard_config: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8050".into());
        if bind_address.trim().is_empty() {
            return Err(ConfigError::Empty("BIND_ADDRESS"));
        }

        Ok(Self {
            bind_address,
            dashboard_config: env::var("DASHBOARD_CONFIG")
                .unwrap_or_else(|_| "data/dashboard.toml".into())
                .into(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable {0} is set but empty")]
    Empty(&'static str),
}
