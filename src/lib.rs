//! igstore: a local SQLite cache for trading-venue reference data.
//!
//! Markets, forex detail, developer applications and per-market price
//! history are kept in one SQLite file (or in memory), accessed through a
//! single worker thread.
//!
//! # Architecture
//!
//! - **Serialized**: one connection, one worker, operations in FIFO order
//! - **Versioned**: the file carries an application id and a schema version;
//!   migrations only move forward
//! - **Fixed-point**: decimals are stored as scaled integers
//!
//! # Modules
//!
//! - [`codec`]: Entity to row mapping and the fixed-point scale
//! - [`config`]: CLI and environment configuration
//! - [`database`]: Opening, migrating and closing a database
//! - [`error`]: Error types
//! - [`model`]: Venue entities and validated identifiers
//! - [`observability`]: Tracing setup
//! - [`request`]: Market, price and application requests
//! - [`storage`]: Worker channel and schema migrations
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> Result<(), igstore::DatabaseError> {
//! use igstore::{Database, DatabaseConfig};
//!
//! let database = Database::open(&DatabaseConfig::file("cache/ig.sqlite")).await?;
//! for market in database.markets().get_all().await? {
//!     println!("{} {}", market.epic, market.kind);
//! }
//! database.close().await
//! # }
//! ```

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // request::markets::Markets is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::missing_panics_doc,         // Panic docs can be verbose
    clippy::needless_raw_string_hashes, // r#""# is fine for SQL
    clippy::similar_names,              // bid/bids/base are fine
    clippy::too_many_lines              // Some functions are inherently long
)]

pub mod codec;
pub mod config;
pub mod database;
pub mod error;
pub mod model;
pub mod observability;
pub mod request;
pub mod storage;

pub use config::DatabaseConfig;
pub use database::{Database, Statistics};
pub use error::{DatabaseError, ValidationError};
