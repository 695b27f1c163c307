//! Configuration for the switchbridge engine
//!
//! Loaded from a TOML file with environment overrides applied by the CLI
//! layer. Validated before the engine starts; a bad token or secret is a
//! startup failure, not something to discover three retries into a sweep.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Default provider API base URL (v1.1)
pub const DEFAULT_BASE_URL: &str = "https://api.switch-bot.com/v1.1";

/// Minimum allowed poll interval
const MIN_POLL_INTERVAL_MS: u64 = 10_000;

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Long-lived API token issued by the provider
    pub token: String,

    /// Shared secret used to sign each request
    pub secret: String,

    /// Provider API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Status poll interval in milliseconds (minimum 10000)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-request wall-clock timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Minimum spacing between outbound call starts in milliseconds
    #[serde(default = "default_min_request_spacing_ms")]
    pub min_request_spacing_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_poll_interval_ms() -> u64 {
    60_000
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

const fn default_min_request_spacing_ms() -> u64 {
    1_000
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or validated
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid config file: {e}")))?;
        config.validated()
    }

    /// Validate the configuration, clamping the poll interval to its floor
    ///
    /// # Errors
    ///
    /// Returns error if token or secret is empty
    pub fn validated(mut self) -> Result<Self> {
        if self.token.trim().is_empty() {
            return Err(Error::Config("token must not be empty".into()));
        }
        if self.secret.trim().is_empty() {
            return Err(Error::Config("secret must not be empty".into()));
        }
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            tracing::warn!(
                configured_ms = self.poll_interval_ms,
                floor_ms = MIN_POLL_INTERVAL_MS,
                "poll interval below floor, clamping"
            );
            self.poll_interval_ms = MIN_POLL_INTERVAL_MS;
        }
        Ok(self)
    }

    /// Status poll interval
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Per-request timeout
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Minimum spacing between outbound call starts
    #[must_use]
    pub const fn min_request_spacing(&self) -> Duration {
        Duration::from_millis(self.min_request_spacing_ms)
    }
}
