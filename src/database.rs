//! The database instance: channel + migrated schema + request façades.

use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::DatabaseConfig;
use crate::error::DatabaseError;
use crate::model::Epic;
use crate::request::{Applications, Markets, Prices};
use crate::storage::schema::{self, Version};
use crate::storage::Channel;

/// Local cache of venue reference data and price history.
///
/// All operations are funnelled through one worker thread; the instance can
/// be shared (e.g. behind an `Arc`) by any number of tasks.
#[derive(Debug)]
pub struct Database {
    channel: Channel,
    config: DatabaseConfig,
}

/// Row counts and layout of an opened database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub version: i64,
    pub markets: u64,
    pub forex_markets: u64,
    pub applications: u64,
    pub price_tables: Vec<Epic>,
}

impl Database {
    /// Open (or create) the database and bring its schema up to date.
    ///
    /// Fails without returning an instance when the file cannot be opened,
    /// belongs to another application or was written by a newer build.
    #[tracing::instrument(skip(config), fields(location = ?config.location))]
    pub async fn open(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let connection = open_connection(config)?;
        let channel = Channel::spawn(connection, &config.label, config.queue_size)?;

        let durable = config.location.is_some();
        let version = channel
            .bootstrap(move |conn| {
                schema::inspect(conn)?;
                if durable {
                    schema::apply_file_pragmas(conn).map_err(DatabaseError::Storage)?;
                }
                schema::migrate(conn)
            })
            .await?;

        tracing::info!(version = version.marker(), "Database ready");
        Ok(Self {
            channel,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub(crate) fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn markets(&self) -> Markets<'_> {
        Markets::new(self)
    }

    pub fn prices(&self) -> Prices<'_> {
        Prices::new(self)
    }

    pub fn applications(&self) -> Applications<'_> {
        Applications::new(self)
    }

    /// Schema version recorded in the file.
    pub async fn version(&self) -> Result<Version, DatabaseError> {
        self.channel.read(|conn| schema::inspect(conn)).await
    }

    pub async fn statistics(&self) -> Result<Statistics, DatabaseError> {
        let price_tables = self.prices().tables().await?;
        self.channel
            .read(move |conn| {
                let count = |table: &str| -> Result<u64, DatabaseError> {
                    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                        .map_err(DatabaseError::Query)
                };
                Ok(Statistics {
                    version: schema::inspect(conn)?.marker(),
                    markets: count("Markets")?,
                    forex_markets: count("MarketsForex")?,
                    applications: count("Apps")?,
                    price_tables,
                })
            })
            .await
    }

    /// Run the queued operations, then close the connection.
    pub async fn close(self) -> Result<(), DatabaseError> {
        self.channel.shutdown().await?;
        tracing::info!("Database closed");
        Ok(())
    }
}

fn open_connection(config: &DatabaseConfig) -> Result<Connection, DatabaseError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    let (connection, location) = match config.path() {
        None => (
            Connection::open_in_memory_with_flags(flags),
            PathBuf::from(":memory:"),
        ),
        Some(path) => {
            let path = absolute(path).map_err(|e| DatabaseError::open(path, e))?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| DatabaseError::open(parent, e))?;
            }
            (Connection::open_with_flags(&path, flags), path)
        }
    };
    let connection = connection.map_err(|e| DatabaseError::open(&location, e))?;

    // SQLite opens lazily; touch the header so unreadable files fail here.
    connection
        .query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
        .and_then(|_| schema::apply_connection_pragmas(&connection))
        .map_err(|e| DatabaseError::open(&location, e))?;
    Ok(connection)
}

/// Anchor a relative path at the working directory.
///
/// SQLite may be built to read any name starting with `file:` as a URI; an
/// absolute path never does, so the location is always taken literally.
fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
