//! SQLite storage layer for igstore.
//!
//! Provides:
//! - Dedicated worker thread owning the only connection
//! - Schema identity/version checks and forward-only migrations

pub mod channel;
pub mod schema;

pub use channel::{Access, Channel};
pub use schema::{Version, APPLICATION_ID};
