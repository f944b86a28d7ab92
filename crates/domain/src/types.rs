//! Shared domain types

use std::fmt;

/// Credentials a message requires before it may be dispatched.
///
/// Validation happens before any network call; the dispatcher attaches
/// whatever credentials the effective session actually holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// No credential preconditions; anonymous dispatch is allowed.
    #[default]
    None,
    /// A session cookie must be present.
    Cookie,
    /// An API key must be present, along with any permission the message
    /// declares.
    ApiKey,
    /// Both a session cookie and an API key must be present.
    CookieAndApiKey,
}

impl AuthMode {
    /// Whether this mode requires a session cookie.
    pub fn needs_cookie(self) -> bool {
        matches!(self, Self::Cookie | Self::CookieAndApiKey)
    }

    /// Whether this mode requires an API key.
    pub fn needs_api_key(self) -> bool {
        matches!(self, Self::ApiKey | Self::CookieAndApiKey)
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "anonymous",
            Self::Cookie => "cookie",
            Self::ApiKey => "api-key",
            Self::CookieAndApiKey => "cookie-and-api-key",
        };
        f.write_str(label)
    }
}
