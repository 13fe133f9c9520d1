//! Connection settings for the hazard API.

use std::time::Duration;

/// Base URL used when `HAZARD_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/hazards";

/// Where and how to reach the hazard API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Reads `HAZARD_API_URL` and `HAZARD_API_TIMEOUT_SECS`.
    ///
    /// A missing or unparseable timeout leaves requests unbounded.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("HAZARD_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout = std::env::var("HAZARD_API_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| match secs.parse::<u64>() {
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(e) => {
                    log::warn!("Ignoring HAZARD_API_TIMEOUT_SECS={secs:?}: {e}");
                    None
                }
            });

        Self::default().with_base_url(base_url).with_timeout(timeout)
    }

    /// Replaces the base URL, dropping any trailing slash.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
