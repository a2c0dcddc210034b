//! Error types for the igstore persistence layer.
//!
//! Every SQLite failure is wrapped into one [`DatabaseError`] kind that keeps
//! the originating `rusqlite::Error` (and therefore the native result code).

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error used where the failure source is not a SQLite error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A value was rejected at the boundary, before anything touched the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid epic {0:?}: expected 6 to 30 characters of [A-Za-z0-9._]")]
    Epic(String),

    #[error("invalid currency code {0:?}: expected 3 uppercase ASCII letters")]
    Currency(String),

    #[error("invalid API key {0:?}: expected 40 alphanumeric characters")]
    ApiKey(String),

    #[error("market {epic} carries forex detail but is not classified as forex")]
    ForexMismatch { epic: String },

    #[error("forex market {epic} must have different base and counter currencies")]
    SameCurrencies { epic: String },

    #[error("timestamp {date} has a sub-second part; dates are stored with second precision")]
    SubsecondDate { date: String },
}

/// Failure raised by any database operation.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("failed to compile statement: {0}")]
    Compilation(#[source] rusqlite::Error),

    #[error("failed to bind parameter {position}: {source}")]
    Binding {
        position: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to query rows: {0}")]
    Query(#[source] rusqlite::Error),

    #[error("the requested row was not found")]
    NotFound,

    #[error("failed to store row: {0}")]
    Storage(#[source] rusqlite::Error),

    #[error("failed to decode column {column}: {source}")]
    Decode {
        column: usize,
        #[source]
        source: BoxError,
    },

    #[error("database schema version {found} is newer than the latest supported version {latest}")]
    UnsupportedVersion { found: i64, latest: i64 },

    #[error("database schema version {0} is invalid")]
    InvalidVersion(i64),

    #[error("database belongs to another application (identity {found:#x}, expected {expected:#x})")]
    IdentityMismatch { found: i32, expected: i32 },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("batch interrupted at position {position}: {source}")]
    BatchInterrupted {
        position: usize,
        #[source]
        source: Box<DatabaseError>,
    },

    #[error("database schema has not been migrated yet")]
    SchemaNotReady,

    #[error("database channel is closed")]
    ChannelClosed,

    #[error("database worker thread panicked")]
    WorkerPanicked,
}

impl DatabaseError {
    /// Wrap a failure that happened while opening the database file.
    pub fn open(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::Open {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Wrap a failure of the `position`-th (zero based) item of a batch.
    pub fn interrupted(position: usize, source: DatabaseError) -> Self {
        Self::BatchInterrupted {
            position,
            source: Box::new(source),
        }
    }

    /// SQLite extended result code carried by this error, if any.
    pub fn native_code(&self) -> Option<i32> {
        let source = match self {
            Self::Compilation(e) | Self::Query(e) | Self::Storage(e) => e,
            Self::Binding { source, .. } => source,
            Self::BatchInterrupted { source, .. } => return source.native_code(),
            _ => return None,
        };
        match source {
            rusqlite::Error::SqliteFailure(failure, _) => Some(failure.extended_code),
            _ => None,
        }
    }

    /// Whether the error means "no such row" rather than a malfunction.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
