//! # Arcadia Domain
//!
//! Domain types for the Arcadia platform client SDK.
//!
//! This crate contains:
//! - The error taxonomy and `Result` alias shared across the SDK
//! - Wire-level constants (cookie and header names)
//! - Authentication modes and their credential requirements
//!
//! ## Architecture
//! - No dependencies on other Arcadia crates
//! - No transport dependencies; HTTP errors are stringified at the call site
//! - Pure types only

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
