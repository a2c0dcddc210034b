//! Price history requests.
//!
//! Every market gets its own `Price_<epic>` table, created on the first write
//! and never dropped. The table name is interpolated into the SQL text, which
//! is only sound because [`Epic`] restricts its alphabet. The epic is escaped
//! so that epics differing only in case never share a table (see
//! [`price_table_name`]).

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use super::markets::excluded_assignments;
use crate::codec::price::PRICE_COLUMNS;
use crate::codec::{self, Binder};
use crate::error::DatabaseError;
use crate::model::{Epic, Price};
use crate::storage::schema::{
    create_price_table, epic_from_price_table, price_table, price_table_name, PRICE_TABLE_PREFIX,
};
use crate::Database;

/// Requests over the per-market price tables.
pub struct Prices<'db> {
    database: &'db Database,
}

impl<'db> Prices<'db> {
    pub(crate) fn new(database: &'db Database) -> Self {
        Self { database }
    }

    /// Candles of `epic` with `from <= date <= to`, ascending by date.
    ///
    /// A market without cached history yields an empty list.
    #[tracing::instrument(skip(self), fields(epic = %epic))]
    pub async fn get(
        &self,
        epic: &Epic,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Price>, DatabaseError> {
        let epic = epic.clone();
        let prices = self
            .database
            .channel()
            .read(move |conn| {
                if !table_exists(conn, &epic)? {
                    return Ok(Vec::new());
                }
                let sql = format!(
                    "SELECT {PRICE_COLUMNS} FROM {} WHERE date BETWEEN ?1 AND ?2 ORDER BY date ASC",
                    price_table(&epic)
                );
                let mut statement = conn.prepare_cached(&sql).map_err(DatabaseError::Compilation)?;
                Binder::new(&mut statement).date(&from)?.date(&to)?;
                codec::query_all(&mut statement)
            })
            .await?;
        tracing::debug!(rows = prices.len(), "Prices fetched");
        Ok(prices)
    }

    /// Most recent candle of `epic`, `NotFound` when nothing is cached.
    pub async fn latest(&self, epic: &Epic) -> Result<Price, DatabaseError> {
        let epic = epic.clone();
        self.database
            .channel()
            .read(move |conn| {
                if !table_exists(conn, &epic)? {
                    return Err(DatabaseError::NotFound);
                }
                let sql = format!(
                    "SELECT {PRICE_COLUMNS} FROM {} ORDER BY date DESC LIMIT 1",
                    price_table(&epic)
                );
                let mut statement = conn.prepare_cached(&sql).map_err(DatabaseError::Compilation)?;
                codec::query_one(&mut statement)
            })
            .await
    }

    /// Upsert candles of `epic` keyed by date, creating its table if needed.
    ///
    /// Every candle commits on its own; on failure the earlier ones stay
    /// stored and the error carries the failing position. Dates with a
    /// sub-second part are rejected before anything is written, and an
    /// empty batch creates no table.
    #[tracing::instrument(skip(self, prices), fields(epic = %epic, count = prices.len()))]
    pub async fn update(&self, prices: &[Price], epic: &Epic) -> Result<(), DatabaseError> {
        if prices.is_empty() {
            return Ok(());
        }
        for price in prices {
            price.validate()?;
        }
        let epic = epic.clone();
        let prices = prices.to_vec();
        self.database
            .channel()
            .write(move |conn| {
                let table = price_table(&epic);
                conn.execute_batch(&create_price_table(&table))
                    .map_err(DatabaseError::Storage)?;

                let sql = format!(
                    "INSERT INTO {table} ({PRICE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
                     ON CONFLICT(date) DO UPDATE SET {}",
                    excluded_assignments(PRICE_COLUMNS)
                );
                for (position, price) in prices.iter().enumerate() {
                    codec::execute(conn, &sql, price)
                        .map_err(|e| DatabaseError::interrupted(position, e))?;
                }
                Ok(())
            })
            .await
    }

    /// Markets that have a price table, ordered by epic.
    pub async fn tables(&self) -> Result<Vec<Epic>, DatabaseError> {
        self.database
            .channel()
            .read(|conn| {
                let mut statement = conn
                    .prepare_cached(
                        "SELECT name FROM sqlite_master \
                         WHERE type = 'table' AND substr(name, 1, ?1) = ?2",
                    )
                    .map_err(DatabaseError::Compilation)?;
                Binder::new(&mut statement)
                    .bind(PRICE_TABLE_PREFIX.len())?
                    .bind(PRICE_TABLE_PREFIX)?;
                let mut rows = statement.raw_query();
                let mut epics = Vec::new();
                while let Some(row) = rows.next().map_err(DatabaseError::Query)? {
                    let name: String = row.get(0).map_err(DatabaseError::Query)?;
                    match epic_from_price_table(&name) {
                        Some(epic) => epics.push(epic),
                        None => tracing::warn!(table = %name, "Skipping table with unexpected name"),
                    }
                }
                epics.sort();
                Ok(epics)
            })
            .await
    }
}

fn table_exists(conn: &Connection, epic: &Epic) -> Result<bool, DatabaseError> {
    let mut statement = conn
        .prepare_cached("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")
        .map_err(DatabaseError::Compilation)?;
    Binder::new(&mut statement).bind(price_table_name(epic))?;
    let mut rows = statement.raw_query();
    Ok(rows.next().map_err(DatabaseError::Query)?.is_some())
}
