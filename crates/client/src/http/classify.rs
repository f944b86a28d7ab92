//! Response classification
//!
//! Turns a finished response into either the response itself or a typed
//! error. Rate limits carry the platform's reset header; everything else is
//! folded into `Api { status, message }` with the message taken from the
//! platform's error envelope when it parses, and from the status reason
//! phrase when it does not.

use arcadia_domain::constants::RATE_LIMIT_RESET_HEADER;
use arcadia_domain::{ArcadiaError, Result};
use reqwest::{Response, StatusCode};
use serde::Deserialize;

/// Error envelope the platform attaches to failure responses.
///
/// Decoded permissively: absent or malformed pieces fall back to the status
/// reason phrase instead of failing classification.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEntry {
    message: Option<String>,
    user_facing_message: Option<String>,
}

/// Pass a successful response through, raise a typed error otherwise.
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let reset = response
            .headers()
            .get(RATE_LIMIT_RESET_HEADER)
            .and_then(|value| value.to_str().ok());
        let retry_after_seconds = retry_after_seconds(reset);
        return Err(ArcadiaError::RateLimited { retry_after_seconds });
    }

    let fallback = status.canonical_reason().unwrap_or("unknown error");
    let message = match response.text().await {
        Ok(body) => error_message_from_body(&body, fallback),
        Err(_) => fallback.to_owned(),
    };

    Err(ArcadiaError::Api { status: status.as_u16(), message })
}

/// Parse the rate-limit reset header value into whole seconds.
fn retry_after_seconds(header: Option<&str>) -> Option<u64> {
    header.and_then(|value| value.trim().parse().ok())
}

/// First envelope message, then its user-facing variant, then the fallback.
fn error_message_from_body(body: &str, fallback: &str) -> String {
    let envelope: ErrorEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) => return fallback.to_owned(),
    };

    envelope
        .errors
        .into_iter()
        .next()
        .and_then(|entry| entry.message.or(entry.user_facing_message))
        .unwrap_or_else(|| fallback.to_owned())
}
