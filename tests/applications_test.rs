//! Integration tests for developer application requests.

mod common;

use chrono::{Duration, Timelike, Utc};
use igstore::model::{ApiKey, AppStatus};
use igstore::{DatabaseError, ValidationError};
use tokio_test::assert_err;

#[tokio::test]
async fn test_update_then_get() {
    let db = common::memory().await;
    let before = Utc::now() - Duration::seconds(1);
    let apps = vec![common::application('b', "charting"), common::application('a', "trading")];
    db.applications().update(&apps).await.unwrap();

    let stored = db.applications().get_all().await.unwrap();
    let names: Vec<&str> = stored.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["trading", "charting"]);

    let trading = db.applications().get(&apps[1].key).await.unwrap();
    assert_eq!(trading.allowance, apps[1].allowance);
    assert_eq!(trading.status, AppStatus::Enabled);
    assert_eq!(trading.created, apps[1].created);
    // Stamped by SQLite, not taken from the caller.
    assert!(trading.updated >= before);
}

#[tokio::test]
async fn test_upsert_keeps_creation_date() {
    let db = common::memory().await;
    let original = common::application('c', "scanner");
    db.applications().update(&[original.clone()]).await.unwrap();

    let mut revised = original.clone();
    revised.name = "scanner v2".into();
    revised.status = AppStatus::Revoked;
    revised.permission.quote_orders_allowed = true;
    revised.created = (Utc::now() - Duration::days(1)).with_nanosecond(0).unwrap();
    db.applications().update(&[revised]).await.unwrap();

    let stored = db.applications().get(&original.key).await.unwrap();
    assert_eq!(stored.name, "scanner v2");
    assert_eq!(stored.status, AppStatus::Revoked);
    assert!(stored.permission.quote_orders_allowed);
    assert_eq!(stored.created, original.created);
    assert_eq!(db.applications().get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_application_is_not_found() {
    let db = common::memory().await;
    let key = ApiKey::new("0".repeat(ApiKey::LEN)).unwrap();
    let error = assert_err!(db.applications().get(&key).await);
    assert!(matches!(error, DatabaseError::NotFound));
}

#[tokio::test]
async fn test_failed_batch_keeps_earlier_applications() {
    let db = common::memory().await;
    let nameless = common::application('e', "");
    let apps = vec![common::application('d', "first"), nameless, common::application('f', "third")];

    let error = assert_err!(db.applications().update(&apps).await);
    assert!(matches!(error, DatabaseError::BatchInterrupted { position: 1, .. }));

    let stored = db.applications().get_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "first");
}

#[tokio::test]
async fn test_subsecond_creation_date_is_rejected() {
    let db = common::memory().await;
    let mut app = common::application('g', "ticker");
    app.created += Duration::microseconds(1);

    let error = assert_err!(db.applications().update(&[common::application('h', "first"), app]).await);
    assert!(matches!(
        error,
        DatabaseError::Validation(ValidationError::SubsecondDate { .. })
    ));
    assert!(db.applications().get_all().await.unwrap().is_empty());
}
