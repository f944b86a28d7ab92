//! Error types used throughout the SDK

use thiserror::Error;

/// Main error type for Arcadia client operations
#[derive(Error, Debug)]
pub enum ArcadiaError {
    /// A request needed a session cookie that the effective session lacks.
    #[error("authentication required: {0}")]
    AuthRequired(String),

    /// A request needed an API key (or a key permission) that the effective
    /// session lacks.
    #[error("API key required: {0}")]
    ApiKeyRequired(String),

    /// The platform rejected the request with 429. The reset value comes
    /// from the rate-limit header when the platform sent one.
    #[error("platform rate limit hit{}", retry_after_suffix(.retry_after_seconds))]
    RateLimited { retry_after_seconds: Option<u64> },

    /// Any other failure status, with the message extracted from the
    /// platform's error envelope.
    #[error(
        "platform API error ({status}): {message}; \
         verify the credential's permissions, the request URL, and the HTTP method"
    )]
    Api { status: u16, message: String },

    /// The request never produced a response (connect, TLS, timeout).
    #[error("transport failure: {0}")]
    Transport(String),

    /// A response arrived but its body could not be decoded as requested.
    #[error("response decode failure: {0}")]
    Decode(String),

    /// Identity cache miss.
    #[error("no cached {kind} with id {id}")]
    KeyNotFound { kind: String, id: String },

    /// The message could not be turned into a valid HTTP request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Client construction or configuration failure.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ArcadiaError {
    /// Status code of a classified API failure, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Seconds until the platform's rate-limit window resets, when the
    /// platform reported them. Backoff is the caller's decision; the SDK
    /// never sleeps.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_seconds } => *retry_after_seconds,
            _ => None,
        }
    }
}

fn retry_after_suffix(retry_after_seconds: &Option<u64>) -> String {
    match retry_after_seconds {
        Some(seconds) => format!(" (retry after {seconds}s)"),
        None => String::new(),
    }
}

/// Result type alias for Arcadia client operations
pub type Result<T> = std::result::Result<T, ArcadiaError>;
