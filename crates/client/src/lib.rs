//! # Arcadia Client
//!
//! Request execution and resilience layer for the Arcadia platform REST API.
//!
//! This crate contains:
//! - [`Session`]: credential bundle (cookie, API key, rotating CSRF token)
//! - [`Message`]: one logical request with its auth and retry policy
//! - [`Dispatcher`]: pooled transport, precondition checks, CSRF retry,
//!   response classification
//! - [`IdentityCache`]: per-kind deduplication of remote entity instances
//! - [`ScopedClient`]: cookie-only escape hatch for hosts outside the
//!   platform API surface
//!
//! ## Architecture
//! - Depends on `arcadia-domain` for errors and wire constants
//! - All "impure" code (network I/O, shared state) lives here
//! - The SDK owns no runtime; every async fn runs on the caller's executor
//!
//! ## Example
//!
//! ```no_run
//! use arcadia_client::{AuthMode, ClientConfig, Dispatcher, Message, Session};
//!
//! # async fn run() -> arcadia_client::Result<()> {
//! let session = Session::builder().cookie("session-secret").build();
//! let dispatcher = Dispatcher::new(ClientConfig::default());
//!
//! let message = Message::post("https://users.arcadia.example/v1/users/42/status")
//!     .json(&serde_json::json!({ "status": "online" }))?
//!     .auth(AuthMode::Cookie)
//!     .named("set user status");
//!
//! let body: serde_json::Value = dispatcher.send_json(Some(&session), message).await?;
//! println!("updated: {body}");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod external;
pub mod http;
pub mod message;
pub mod session;

// Re-export commonly used items
pub use arcadia_domain::{ArcadiaError, AuthMode, Result};
pub use cache::{IdentityCache, SessionBound};
pub use config::ClientConfig;
pub use external::ScopedClient;
pub use http::{ClientPool, Dispatcher};
pub use message::{Message, Payload};
pub use session::{DefaultSessionProvider, Session, SessionBuilder, StaticSessionProvider};
