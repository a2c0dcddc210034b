//! Schema versioning and forward-only migrations.
//!
//! The file carries two markers in SQLite's header slots:
//! - `PRAGMA application_id`: [`APPLICATION_ID`], proving the file is ours
//! - `PRAGMA user_version`: the last [`Version`] whose steps were applied
//!
//! Both markers are checked before anything is written, so a foreign file or
//! one written by a newer build is rejected untouched.

use rusqlite::{Connection, Transaction};

use crate::error::DatabaseError;
use crate::model::Epic;

/// Identity marker ("IGDB").
pub const APPLICATION_ID: i32 = 0x4947_4442;

/// Known schema versions, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    /// Brand-new file: no marker written yet.
    Unversioned = 0,
    /// Markets and applications.
    Initial = 1,
    /// Forex detail for currency-pair markets.
    Forex = 2,
}

impl Version {
    pub const LATEST: Version = Version::Forex;

    /// Every version in ascending order. Consecutive by construction.
    pub const ALL: [Version; 3] = [Version::Unversioned, Version::Initial, Version::Forex];

    pub fn marker(self) -> i64 {
        self as i64
    }

    /// Interpret a stored `user_version`.
    pub fn from_marker(marker: i64) -> Result<Self, DatabaseError> {
        if marker < 0 {
            return Err(DatabaseError::InvalidVersion(marker));
        }
        Self::ALL
            .into_iter()
            .find(|version| version.marker() == marker)
            .ok_or(DatabaseError::UnsupportedVersion {
                found: marker,
                latest: Self::LATEST.marker(),
            })
    }

    /// Versions still to apply after `self`, ascending.
    pub fn pending(self) -> impl Iterator<Item = Version> {
        Self::ALL.into_iter().filter(move |version| *version > self)
    }

    /// Statements bringing the schema from the previous version to this one.
    fn steps(self) -> &'static [&'static str] {
        match self {
            Version::Unversioned => &[],
            Version::Initial => &[CREATE_MARKETS, CREATE_APPS],
            Version::Forex => &[CREATE_FOREX, CREATE_FOREX_INDEX],
        }
    }
}

const CREATE_MARKETS: &str = r#"
CREATE TABLE IF NOT EXISTS Markets (
    epic TEXT    NOT NULL CHECK(length(epic) BETWEEN 6 AND 30),
    type INTEGER          CHECK(type > 0),
    PRIMARY KEY(epic)
) WITHOUT ROWID;
"#;

const CREATE_APPS: &str = r#"
CREATE TABLE IF NOT EXISTS Apps (
    key              TEXT    NOT NULL CHECK(length(key) = 40),
    name             TEXT    NOT NULL CHECK(length(name) > 0),
    status           INTEGER NOT NULL CHECK(status BETWEEN -1 AND 1),
    equity           INTEGER NOT NULL CHECK(equity BETWEEN 0 AND 1),
    quote            INTEGER NOT NULL CHECK(quote BETWEEN 0 AND 1),
    overallRequests  INTEGER NOT NULL CHECK(overallRequests >= 0),
    accountRequests  INTEGER NOT NULL CHECK(accountRequests >= 0),
    tradingRequests  INTEGER NOT NULL CHECK(tradingRequests >= 0),
    historicalPoints INTEGER NOT NULL CHECK(historicalPoints >= 0),
    subscriptions    INTEGER NOT NULL CHECK(subscriptions >= 0),
    created          TEXT    NOT NULL CHECK(created IS datetime(created)),
    updated          TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP CHECK(updated IS datetime(updated)),
    PRIMARY KEY(key)
) WITHOUT ROWID;
"#;

const CREATE_FOREX: &str = r#"
CREATE TABLE IF NOT EXISTS MarketsForex (
    epic                  TEXT    NOT NULL REFERENCES Markets(epic) ON UPDATE CASCADE ON DELETE CASCADE,
    base                  TEXT    NOT NULL CHECK(length(base) = 3),
    counter               TEXT    NOT NULL CHECK(length(counter) = 3),
    name                  TEXT    NOT NULL CHECK(length(name) > 0),
    marketId              TEXT    NOT NULL CHECK(length(marketId) > 0),
    chartId               TEXT,
    reutersId             TEXT    NOT NULL,
    contractSize          INTEGER NOT NULL CHECK(contractSize >= 0),
    pipValue              INTEGER NOT NULL,
    placeValue            INTEGER NOT NULL,
    marginFactor          INTEGER NOT NULL CHECK(marginFactor >= 0),
    slippageFactor        INTEGER NOT NULL,
    minDealSize           INTEGER NOT NULL CHECK(minDealSize >= 0),
    guaranteedStopPremium INTEGER,
    PRIMARY KEY(epic),
    CHECK(base <> counter)
) WITHOUT ROWID;
"#;

const CREATE_FOREX_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS MarketsForexCurrencies ON MarketsForex(base, counter);";

/// Per-connection settings; they do not touch the file.
pub fn apply_connection_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    Ok(())
}

/// Journal settings for file databases. Persisted in the file header, so only
/// applied once the markers have been validated.
pub fn apply_file_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    tracing::debug!(journal_mode = %mode, "Journal mode configured");
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

/// Read both markers and decide whether this file can be migrated.
pub fn inspect(conn: &Connection) -> Result<Version, DatabaseError> {
    let identity: i32 = conn
        .pragma_query_value(None, "application_id", |row| row.get(0))
        .map_err(DatabaseError::Query)?;
    let marker: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(DatabaseError::Query)?;

    let fresh = identity == 0 && marker == 0;
    if identity != APPLICATION_ID && !fresh {
        return Err(DatabaseError::IdentityMismatch {
            found: identity,
            expected: APPLICATION_ID,
        });
    }
    Version::from_marker(marker)
}

/// Bring the schema up to [`Version::LATEST`].
///
/// Each version's steps and its marker commit in one transaction; a failure
/// leaves the file at the last fully applied version.
pub fn migrate(conn: &mut Connection) -> Result<Version, DatabaseError> {
    let current = inspect(conn)?;
    for version in current.pending() {
        let tx = conn.transaction().map_err(DatabaseError::Storage)?;
        apply(&tx, version)?;
        tx.commit().map_err(DatabaseError::Storage)?;
        tracing::info!(version = version.marker(), "Applied schema migration");
    }
    Ok(Version::LATEST)
}

fn apply(tx: &Transaction<'_>, version: Version) -> Result<(), DatabaseError> {
    for step in version.steps() {
        tx.execute_batch(step).map_err(DatabaseError::Storage)?;
    }
    if version == Version::Initial {
        tx.pragma_update(None, "application_id", APPLICATION_ID)
            .map_err(DatabaseError::Storage)?;
    }
    tx.pragma_update(None, "user_version", version.marker())
        .map_err(DatabaseError::Storage)?;
    Ok(())
}

pub const PRICE_TABLE_PREFIX: &str = "Price_";

/// Unquoted name of the table holding the price history of `epic`.
///
/// SQLite matches table names case-insensitively, so the epic is escaped
/// into a form that stays unique under case folding: uppercase letters,
/// digits and `.` are kept, `_` becomes `__` and a lowercase letter `c`
/// becomes `_c`.
pub fn price_table_name(epic: &Epic) -> String {
    let mut name = String::with_capacity(PRICE_TABLE_PREFIX.len() + 2 * epic.as_str().len());
    name.push_str(PRICE_TABLE_PREFIX);
    for c in epic.as_str().chars() {
        match c {
            '_' => name.push_str("__"),
            c if c.is_ascii_lowercase() => {
                name.push('_');
                name.push(c);
            }
            c => name.push(c),
        }
    }
    name
}

/// Name of the table holding the price history of `epic`, quoted for SQL text.
///
/// The escaped name only contains `[A-Za-z0-9._]`, so quoting needs no escaping.
pub fn price_table(epic: &Epic) -> String {
    format!("\"{}\"", price_table_name(epic))
}

/// Epic whose price history lives in table `name`, `None` for any other table.
pub fn epic_from_price_table(name: &str) -> Option<Epic> {
    let escaped = name.strip_prefix(PRICE_TABLE_PREFIX)?;
    let mut epic = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        match c {
            '_' => match chars.next()? {
                '_' => epic.push('_'),
                c if c.is_ascii_lowercase() => epic.push(c),
                _ => return None,
            },
            c if c.is_ascii_lowercase() => return None,
            c => epic.push(c),
        }
    }
    Epic::new(epic).ok()
}

/// Statement creating the price table of one market.
pub fn create_price_table(table: &str) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {table} (
    date     TEXT    NOT NULL CHECK((date IS datetime(date)) AND (date <= CURRENT_TIMESTAMP)),
    openBid  INTEGER NOT NULL,
    openAsk  INTEGER NOT NULL,
    closeBid INTEGER NOT NULL,
    closeAsk INTEGER NOT NULL,
    lowBid   INTEGER NOT NULL,
    lowAsk   INTEGER NOT NULL,
    highBid  INTEGER NOT NULL,
    highAsk  INTEGER NOT NULL,
    volume   INTEGER          CHECK(volume >= 0),
    PRIMARY KEY(date)
) WITHOUT ROWID;"#
    )
}

/// Snapshot of the user schema, for comparisons.
pub fn schema_sql(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn
        .prepare("SELECT sql FROM sqlite_master WHERE sql IS NOT NULL ORDER BY type, name")
        .map_err(DatabaseError::Compilation)?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(DatabaseError::Query)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::Query)?;
    Ok(rows)
}
