//! Market (instrument) requests.

use rusqlite::Connection;
use std::collections::HashSet;

use crate::codec::market::{FOREX_COLUMNS, MARKET_COLUMNS};
use crate::codec::{self, Binder, Encode as _};
use crate::error::DatabaseError;
use crate::model::{Currency, Epic, Forex, Market, MarketDetail, MarketType};
use crate::Database;

/// Legacy SQLite limit on host parameters per statement.
const MAX_PARAMETERS: usize = 999;

const UPSERT_MARKET: &str = "INSERT INTO Markets (epic, type) VALUES (?1, ?2) \
    ON CONFLICT(epic) DO UPDATE SET type = excluded.type";

const DELETE_FOREX: &str = "DELETE FROM MarketsForex WHERE epic = ?1";

/// Requests over the `Markets` table. Borrows the database for one call chain.
pub struct Markets<'db> {
    database: &'db Database,
}

impl<'db> Markets<'db> {
    pub(crate) fn new(database: &'db Database) -> Self {
        Self { database }
    }

    /// Forex detail requests.
    pub fn forex(&self) -> ForexMarkets<'db> {
        ForexMarkets {
            database: self.database,
        }
    }

    /// Every stored market, ordered by epic.
    pub async fn get_all(&self) -> Result<Vec<Market>, DatabaseError> {
        self.database
            .channel()
            .read(|conn| {
                let sql = format!("SELECT {MARKET_COLUMNS} FROM Markets ORDER BY epic ASC");
                let mut statement = conn.prepare(&sql).map_err(DatabaseError::Compilation)?;
                codec::query_all(&mut statement)
            })
            .await
    }

    /// The market identified by `epic`, `NotFound` if it was never stored.
    pub async fn get(&self, epic: &Epic) -> Result<Market, DatabaseError> {
        let epic = epic.clone();
        self.database
            .channel()
            .read(move |conn| {
                let sql = format!("SELECT {MARKET_COLUMNS} FROM Markets WHERE epic = ?1");
                let mut statement = conn.prepare_cached(&sql).map_err(DatabaseError::Compilation)?;
                Binder::new(&mut statement).bind(&epic)?;
                codec::query_one(&mut statement)
            })
            .await
    }

    /// Classification of `epic`, `NotFound` if the market was never stored.
    #[tracing::instrument(skip(self), fields(epic = %epic))]
    pub async fn market_type(&self, epic: &Epic) -> Result<MarketType, DatabaseError> {
        let epic = epic.clone();
        self.database
            .channel()
            .read(move |conn| {
                let mut statement = conn
                    .prepare_cached("SELECT type FROM Markets WHERE epic = ?1")
                    .map_err(DatabaseError::Compilation)?;
                Binder::new(&mut statement).bind(&epic)?;
                codec::query_one(&mut statement)
            })
            .await
    }

    /// For every requested epic (in request order), whether it is stored.
    #[tracing::instrument(skip(self, epics), fields(count = epics.len()))]
    pub async fn contains(&self, epics: &[Epic]) -> Result<Vec<(Epic, bool)>, DatabaseError> {
        if epics.is_empty() {
            return Ok(Vec::new());
        }
        let epics = epics.to_vec();
        self.database
            .channel()
            .read(move |conn| {
                let mut found = HashSet::with_capacity(epics.len());
                for chunk in epics.chunks(MAX_PARAMETERS) {
                    found.extend(existing(conn, chunk)?);
                }
                Ok(epics
                    .into_iter()
                    .map(|epic| {
                        let stored = found.contains(epic.as_str());
                        (epic, stored)
                    })
                    .collect())
            })
            .await
    }

    /// Upsert markets (and their forex detail) one by one.
    ///
    /// Each market commits on its own. On failure the markets before it stay
    /// stored and the error carries the failing position.
    #[tracing::instrument(skip(self, details), fields(count = details.len()))]
    pub async fn update(&self, details: &[MarketDetail]) -> Result<(), DatabaseError> {
        for detail in details {
            detail.validate()?;
        }
        let details = details.to_vec();
        let written = self
            .database
            .channel()
            .write(move |conn| {
                for (position, detail) in details.iter().enumerate() {
                    upsert(conn, detail).map_err(|e| DatabaseError::interrupted(position, e))?;
                }
                Ok(details.len())
            })
            .await?;
        tracing::debug!(written, "Markets updated");
        Ok(())
    }
}

/// Epics of `chunk` present in `Markets`, via one disjunctive statement.
fn existing(conn: &Connection, chunk: &[Epic]) -> Result<Vec<String>, DatabaseError> {
    let clause = (1..=chunk.len())
        .map(|index| format!("epic = ?{index}"))
        .collect::<Vec<_>>()
        .join(" OR ");
    let sql = format!("SELECT epic FROM Markets WHERE {clause}");

    let mut statement = conn.prepare(&sql).map_err(DatabaseError::Compilation)?;
    let mut binder = Binder::new(&mut statement);
    for epic in chunk {
        binder.bind(epic)?;
    }
    let mut rows = statement.raw_query();
    let mut found = Vec::new();
    while let Some(row) = rows.next().map_err(DatabaseError::Query)? {
        found.push(row.get(0).map_err(DatabaseError::Query)?);
    }
    Ok(found)
}

/// Market row plus forex row in one transaction.
fn upsert(conn: &mut Connection, detail: &MarketDetail) -> Result<(), DatabaseError> {
    let tx = conn.transaction().map_err(DatabaseError::Storage)?;
    codec::execute(&tx, UPSERT_MARKET, &detail.market())?;
    match (&detail.forex, detail.kind) {
        (Some(forex), _) => {
            let sql = format!(
                "INSERT INTO MarketsForex ({FOREX_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14) \
                 ON CONFLICT(epic) DO UPDATE SET {}",
                excluded_assignments(FOREX_COLUMNS)
            );
            codec::execute(&tx, &sql, forex)?;
        }
        (None, MarketType::Forex) => {}
        (None, _) => {
            codec::execute(&tx, DELETE_FOREX, &[&detail.epic][..])?;
        }
    }
    tx.commit().map_err(DatabaseError::Storage)
}

/// `col = excluded.col` for every non-key column of `columns`.
pub(crate) fn excluded_assignments(columns: &str) -> String {
    columns
        .split(',')
        .map(str::trim)
        .skip(1)
        .map(|column| format!("{column} = excluded.{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Requests over the `MarketsForex` table.
pub struct ForexMarkets<'db> {
    database: &'db Database,
}

impl<'db> ForexMarkets<'db> {
    /// Every stored forex market, ordered by epic.
    pub async fn get_all(&self) -> Result<Vec<Forex>, DatabaseError> {
        self.select("ORDER BY epic ASC", Vec::new()).await
    }

    /// Forex detail of `epic`, `NotFound` if there is none.
    pub async fn get(&self, epic: &Epic) -> Result<Forex, DatabaseError> {
        let epic = epic.clone();
        self.database
            .channel()
            .read(move |conn| {
                let sql = format!("SELECT {FOREX_COLUMNS} FROM MarketsForex WHERE epic = ?1");
                let mut statement = conn.prepare_cached(&sql).map_err(DatabaseError::Compilation)?;
                Binder::new(&mut statement).bind(&epic)?;
                codec::query_one(&mut statement)
            })
            .await
    }

    /// Forex markets where `currency` is either the base or the counter.
    pub async fn get_with_currency(&self, currency: Currency) -> Result<Vec<Forex>, DatabaseError> {
        self.select(
            "WHERE base = ?1 OR counter = ?1 ORDER BY epic ASC",
            vec![currency],
        )
        .await
    }

    /// Forex markets trading exactly `base`/`counter`.
    pub async fn get_pair(&self, base: Currency, counter: Currency) -> Result<Vec<Forex>, DatabaseError> {
        self.select(
            "WHERE base = ?1 AND counter = ?2 ORDER BY epic ASC",
            vec![base, counter],
        )
        .await
    }

    async fn select(&self, filter: &'static str, currencies: Vec<Currency>) -> Result<Vec<Forex>, DatabaseError> {
        self.database
            .channel()
            .read(move |conn| {
                let sql = format!("SELECT {FOREX_COLUMNS} FROM MarketsForex {filter}");
                let mut statement = conn.prepare_cached(&sql).map_err(DatabaseError::Compilation)?;
                currencies[..].encode(&mut Binder::new(&mut statement))?;
                codec::query_all(&mut statement)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_assignments_skip_key_column() {
        assert_eq!(
            excluded_assignments("epic, base,\n    counter"),
            "base = excluded.base, counter = excluded.counter"
        );
        assert_eq!(excluded_assignments(MARKET_COLUMNS), "type = excluded.type");
    }
}
