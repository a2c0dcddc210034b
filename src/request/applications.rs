//! Developer application (API key) requests.

use crate::codec::application::APP_COLUMNS;
use crate::codec::{self, Binder};
use crate::error::DatabaseError;
use crate::model::{ApiKey, Application};
use crate::Database;

/// `created` keeps its first value; `updated` is stamped by SQLite.
const UPSERT_APP: &str = "INSERT INTO Apps (key, name, status, equity, quote, overallRequests, \
    accountRequests, tradingRequests, historicalPoints, subscriptions, created) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
    ON CONFLICT(key) DO UPDATE SET \
    name = excluded.name, \
    status = excluded.status, \
    equity = excluded.equity, \
    quote = excluded.quote, \
    overallRequests = excluded.overallRequests, \
    accountRequests = excluded.accountRequests, \
    tradingRequests = excluded.tradingRequests, \
    historicalPoints = excluded.historicalPoints, \
    subscriptions = excluded.subscriptions, \
    updated = CURRENT_TIMESTAMP";

/// Requests over the `Apps` table.
pub struct Applications<'db> {
    database: &'db Database,
}

impl<'db> Applications<'db> {
    pub(crate) fn new(database: &'db Database) -> Self {
        Self { database }
    }

    /// Every stored application, ordered by key.
    pub async fn get_all(&self) -> Result<Vec<Application>, DatabaseError> {
        self.database
            .channel()
            .read(|conn| {
                let sql = format!("SELECT {APP_COLUMNS} FROM Apps ORDER BY key ASC");
                let mut statement = conn.prepare_cached(&sql).map_err(DatabaseError::Compilation)?;
                codec::query_all(&mut statement)
            })
            .await
    }

    pub async fn get(&self, key: &ApiKey) -> Result<Application, DatabaseError> {
        let key = key.clone();
        self.database
            .channel()
            .read(move |conn| {
                let sql = format!("SELECT {APP_COLUMNS} FROM Apps WHERE key = ?1");
                let mut statement = conn.prepare_cached(&sql).map_err(DatabaseError::Compilation)?;
                Binder::new(&mut statement).bind(&key)?;
                codec::query_one(&mut statement)
            })
            .await
    }

    /// Upsert applications one by one, each in its own autocommit.
    ///
    /// On failure the earlier applications stay stored and the error carries
    /// the failing position. A `created` with a sub-second part is rejected
    /// before anything is written.
    #[tracing::instrument(skip(self, applications), fields(count = applications.len()))]
    pub async fn update(&self, applications: &[Application]) -> Result<(), DatabaseError> {
        for application in applications {
            application.validate()?;
        }
        let applications = applications.to_vec();
        self.database
            .channel()
            .write(move |conn| {
                for (position, application) in applications.iter().enumerate() {
                    codec::execute(conn, UPSERT_APP, application)
                        .map_err(|e| DatabaseError::interrupted(position, e))?;
                }
                Ok(())
            })
            .await
    }
}
