//! Client configuration
//!
//! Transport-level settings for the dispatcher's pooled clients and the
//! scoped external client. Values come from the environment when set,
//! otherwise from the defaults in `arcadia_domain::constants`.

use std::time::Duration;

use arcadia_domain::constants::{
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_USER_AGENT, ENV_HTTP_TIMEOUT_SECS, ENV_USER_AGENT,
};

/// Transport configuration shared by all pooled clients
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent sent with every request
    pub user_agent: String,

    /// Whole-request timeout applied by the transport
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: std::env::var(ENV_USER_AGENT)
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_owned()),
            timeout: Duration::from_secs(
                std::env::var(ENV_HTTP_TIMEOUT_SECS)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
        }
    }
}

impl ClientConfig {
    /// Create config with a custom timeout (useful for testing)
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout, ..Self::default() }
    }

    /// Log configuration at startup
    pub fn log_config(&self) {
        tracing::info!(
            timeout_seconds = self.timeout.as_secs(),
            user_agent = %self.user_agent,
            "client configuration loaded"
        );
    }
}
