//! Client configuration loaded from environment variables.

use crate::poll::PollConfig;

/// Default service base URL for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuration for the Verae service client.
///
/// All fields have defaults suitable for local development; override via
/// environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base HTTP URL of the analysis service, without a trailing slash.
    pub base_url: String,
    /// Timing policy for the polling state machine.
    pub poll: PollConfig,
}

impl ClientConfig {
    /// Configuration pointing at the given base URL, with default poll
    /// timing. A trailing slash on the URL is stripped.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            poll: PollConfig::default(),
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var         | Default                 |
    /// |-----------------|-------------------------|
    /// | `VERAE_API_URL` | `http://localhost:8000` |
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("VERAE_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
