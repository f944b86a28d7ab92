//! Wire-level constants
//!
//! Centralized location for the header names, cookie names, and environment
//! variables the SDK exchanges with the Arcadia platform.

// Authentication headers
pub const SESSION_COOKIE_NAME: &str = ".ARCSECURITY";
pub const CSRF_TOKEN_HEADER: &str = "x-csrf-token";
pub const API_KEY_HEADER: &str = "x-api-key";

// Rate limiting
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

// Client configuration environment variables
pub const ENV_HTTP_TIMEOUT_SECS: &str = "ARCADIA_HTTP_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "ARCADIA_USER_AGENT";

// Client configuration defaults
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "arcadia-client/0.1";
