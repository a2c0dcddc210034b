//! Integration tests for opening, migrating and closing databases.

mod common;

use futures::future::join_all;
use igstore::model::{MarketDetail, MarketType};
use igstore::storage::{Version, APPLICATION_ID};
use igstore::{Database, DatabaseConfig, DatabaseError};
use rusqlite::Connection;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_fresh_file_is_migrated_to_latest() {
    let fixture = common::TestFixture::new();
    let db = fixture.open().await;
    assert_eq!(db.version().await.unwrap(), Version::LATEST);
    db.close().await.unwrap();

    let conn = Connection::open(&fixture.db_path).unwrap();
    let identity: i32 = conn
        .pragma_query_value(None, "application_id", |row| row.get(0))
        .unwrap();
    let version: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap();
    let journal: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .unwrap();
    assert_eq!(identity, APPLICATION_ID);
    assert_eq!(version, Version::LATEST.marker());
    assert_eq!(journal, "wal");
}

#[tokio::test]
async fn test_reopen_keeps_schema_and_rows() {
    let fixture = common::TestFixture::new();
    let db = fixture.open().await;
    db.markets()
        .update(&[MarketDetail::forex(common::forex("EUR", "USD"))])
        .await
        .unwrap();
    db.close().await.unwrap();

    let schema = {
        let conn = Connection::open(&fixture.db_path).unwrap();
        igstore::storage::schema::schema_sql(&conn).unwrap()
    };

    let db = fixture.open().await;
    let statistics = db.statistics().await.unwrap();
    assert_eq!(statistics.version, Version::LATEST.marker());
    assert_eq!(statistics.markets, 1);
    assert_eq!(statistics.forex_markets, 1);
    db.close().await.unwrap();

    let conn = Connection::open(&fixture.db_path).unwrap();
    assert_eq!(igstore::storage::schema::schema_sql(&conn).unwrap(), schema);
}

#[tokio::test]
async fn test_newer_file_is_rejected_untouched() {
    let fixture = common::TestFixture::new();
    std::fs::create_dir_all(fixture.db_path.parent().unwrap()).unwrap();
    {
        let conn = Connection::open(&fixture.db_path).unwrap();
        conn.pragma_update(None, "application_id", APPLICATION_ID).unwrap();
        conn.pragma_update(None, "user_version", 99).unwrap();
    }
    let before = std::fs::read(&fixture.db_path).unwrap();

    let error = assert_err!(Database::open(&fixture.config()).await);
    assert!(matches!(
        error,
        DatabaseError::UnsupportedVersion { found: 99, .. }
    ));
    assert_eq!(std::fs::read(&fixture.db_path).unwrap(), before);
}

#[tokio::test]
async fn test_foreign_file_is_rejected() {
    let fixture = common::TestFixture::new();
    std::fs::create_dir_all(fixture.db_path.parent().unwrap()).unwrap();
    {
        let conn = Connection::open(&fixture.db_path).unwrap();
        conn.pragma_update(None, "application_id", 0x5155_4954).unwrap();
        conn.execute_batch("CREATE TABLE notes (body TEXT)").unwrap();
    }

    let error = assert_err!(Database::open(&fixture.config()).await);
    assert!(matches!(
        error,
        DatabaseError::IdentityMismatch { found: 0x5155_4954, expected: APPLICATION_ID }
    ));
}

#[tokio::test]
async fn test_unopenable_location_fails_to_open() {
    let fixture = common::TestFixture::new();
    // A directory is not a database file.
    let config = DatabaseConfig::file(fixture.temp_dir.path());

    let error = assert_err!(Database::open(&config).await);
    assert!(matches!(error, DatabaseError::Open { .. }));
}

#[tokio::test]
async fn test_concurrent_callers_share_one_database() {
    let db = Arc::new(common::memory().await);

    let writers = (0..16).map(|n| {
        let db = Arc::clone(&db);
        tokio::spawn(async move {
            let epic = common::epic(&format!("IX.D.IDX{n:02}.DAILY.IP"));
            db.markets()
                .update(&[MarketDetail::new(epic.clone(), MarketType::Index)])
                .await?;
            db.prices()
                .update(&[common::candle(common::day(n), n)], &epic)
                .await
        })
    });
    for result in join_all(writers).await {
        assert_ok!(result.unwrap());
    }

    let statistics = db.statistics().await.unwrap();
    assert_eq!(statistics.markets, 16);
    assert_eq!(statistics.price_tables.len(), 16);

    let db = Arc::try_unwrap(db).ok().unwrap();
    db.close().await.unwrap();
}
