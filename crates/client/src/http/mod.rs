//! HTTP dispatch pipeline
//!
//! This module owns the path from a [`crate::Message`] to a classified
//! response:
//!
//! - [`pool`]: reusable transport clients, acquire-or-create
//! - [`dispatcher`]: precondition checks, header assembly, proxy rewrite,
//!   and the single-retry CSRF state machine
//! - `classify`: turns failure statuses into typed errors

mod classify;
pub mod dispatcher;
pub mod pool;

pub use dispatcher::Dispatcher;
pub use pool::ClientPool;
