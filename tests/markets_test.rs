//! Integration tests for market and forex requests.

mod common;

use igstore::model::{MarketDetail, MarketType};
use igstore::{DatabaseError, ValidationError};
use rust_decimal_macros::dec;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_update_then_get_all() {
    let db = common::memory().await;
    let details = vec![
        MarketDetail::new(common::epic("IX.D.FTSE.DAILY.IP"), MarketType::Index),
        MarketDetail::forex(common::forex("EUR", "USD")),
        MarketDetail::new(common::epic("CC.D.LCO.UNC.IP"), MarketType::Commodity),
    ];
    assert_ok!(db.markets().update(&details).await);

    let markets = db.markets().get_all().await.unwrap();
    let epics: Vec<&str> = markets.iter().map(|m| m.epic.as_str()).collect();
    assert_eq!(
        epics,
        vec!["CC.D.LCO.UNC.IP", "CS.D.EURUSD.CFD.IP", "IX.D.FTSE.DAILY.IP"]
    );
    assert_eq!(markets[1].kind, MarketType::Forex);

    db.close().await.unwrap();
}

#[tokio::test]
async fn test_repeated_upsert_keeps_latest_type() {
    let db = common::memory().await;
    let epic = common::epic("KA.D.VOD.CASH.IP");

    db.markets()
        .update(&[MarketDetail::new(epic.clone(), MarketType::Unknown)])
        .await
        .unwrap();
    assert_eq!(db.markets().market_type(&epic).await.unwrap(), MarketType::Unknown);

    db.markets()
        .update(&[MarketDetail::new(epic.clone(), MarketType::Share)])
        .await
        .unwrap();
    assert_eq!(db.markets().market_type(&epic).await.unwrap(), MarketType::Share);
    assert_eq!(db.markets().get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_market_is_not_found() {
    let db = common::memory().await;
    let epic = common::epic("IX.D.DAX.DAILY.IP");

    let error = assert_err!(db.markets().market_type(&epic).await);
    assert!(error.is_not_found());
    let error = assert_err!(db.markets().get(&epic).await);
    assert!(matches!(error, DatabaseError::NotFound));
}

#[tokio::test]
async fn test_contains_preserves_request_order() {
    let db = common::memory().await;
    db.markets()
        .update(&[
            MarketDetail::new(common::epic("IX.D.FTSE.DAILY.IP"), MarketType::Index),
            MarketDetail::new(common::epic("IX.D.DAX.DAILY.IP"), MarketType::Index),
        ])
        .await
        .unwrap();

    let request = vec![
        common::epic("IX.D.DAX.DAILY.IP"),
        common::epic("IX.D.NIKKEI.DAILY.IP"),
        common::epic("IX.D.FTSE.DAILY.IP"),
    ];
    let answer = db.markets().contains(&request).await.unwrap();
    assert_eq!(
        answer,
        vec![
            (request[0].clone(), true),
            (request[1].clone(), false),
            (request[2].clone(), true),
        ]
    );
    assert!(db.markets().contains(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_contains_spans_parameter_chunks() {
    let db = common::memory().await;
    let stored: Vec<MarketDetail> = (0..1500)
        .filter(|i| i % 3 == 0)
        .map(|i| MarketDetail::new(common::epic(&format!("KA.D.S{i:05}.CASH.IP")), MarketType::Share))
        .collect();
    db.markets().update(&stored).await.unwrap();

    let request: Vec<_> = (0..1500)
        .map(|i| common::epic(&format!("KA.D.S{i:05}.CASH.IP")))
        .collect();
    let answer = db.markets().contains(&request).await.unwrap();
    assert_eq!(answer.len(), 1500);
    for (index, (epic, stored)) in answer.iter().enumerate() {
        assert_eq!(epic, &request[index]);
        assert_eq!(*stored, index % 3 == 0);
    }
}

#[tokio::test]
async fn test_forex_queries() {
    let db = common::memory().await;
    db.markets()
        .update(&[
            MarketDetail::forex(common::forex("EUR", "USD")),
            MarketDetail::forex(common::forex("GBP", "USD")),
            MarketDetail::forex(common::forex("EUR", "GBP")),
            MarketDetail::new(common::epic("IX.D.FTSE.DAILY.IP"), MarketType::Index),
        ])
        .await
        .unwrap();

    let forex = db.markets().forex();
    assert_eq!(forex.get_all().await.unwrap().len(), 3);

    let eurusd = forex.get(&common::epic("CS.D.EURUSD.CFD.IP")).await.unwrap();
    assert_eq!(eurusd, common::forex("EUR", "USD"));
    assert_eq!(eurusd.pip_value, dec!(10));
    assert_eq!(eurusd.guaranteed_stop_premium, Some(dec!(0.8)));

    let with_usd = forex.get_with_currency(common::currency("USD")).await.unwrap();
    let epics: Vec<&str> = with_usd.iter().map(|f| f.epic.as_str()).collect();
    assert_eq!(epics, vec!["CS.D.EURUSD.CFD.IP", "CS.D.GBPUSD.CFD.IP"]);

    let pair = forex
        .get_pair(common::currency("EUR"), common::currency("GBP"))
        .await
        .unwrap();
    assert_eq!(pair.len(), 1);
    assert!(forex
        .get_pair(common::currency("GBP"), common::currency("EUR"))
        .await
        .unwrap()
        .is_empty());

    let error = assert_err!(forex.get(&common::epic("IX.D.FTSE.DAILY.IP")).await);
    assert!(error.is_not_found());
}

#[tokio::test]
async fn test_reclassified_market_loses_forex_detail() {
    let db = common::memory().await;
    let detail = MarketDetail::forex(common::forex("USD", "JPY"));
    let epic = detail.epic.clone();
    db.markets().update(&[detail]).await.unwrap();

    // Forex without fresh detail keeps the stored row.
    db.markets()
        .update(&[MarketDetail::new(epic.clone(), MarketType::Forex)])
        .await
        .unwrap();
    assert_ok!(db.markets().forex().get(&epic).await);

    db.markets()
        .update(&[MarketDetail::new(epic.clone(), MarketType::Index)])
        .await
        .unwrap();
    assert_eq!(db.markets().market_type(&epic).await.unwrap(), MarketType::Index);
    assert!(assert_err!(db.markets().forex().get(&epic).await).is_not_found());
}

#[tokio::test]
async fn test_inconsistent_detail_is_rejected_before_writing() {
    let db = common::memory().await;
    let mut mismatched = MarketDetail::forex(common::forex("EUR", "USD"));
    mismatched.kind = MarketType::Index;

    let details = vec![
        MarketDetail::new(common::epic("IX.D.FTSE.DAILY.IP"), MarketType::Index),
        mismatched,
    ];
    let error = assert_err!(db.markets().update(&details).await);
    assert!(matches!(
        error,
        DatabaseError::Validation(ValidationError::ForexMismatch { .. })
    ));
    assert!(db.markets().get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_batch_keeps_earlier_markets() {
    let db = common::memory().await;
    let mut broken = common::forex("AUD", "USD");
    broken.margin_factor = dec!(-1);

    let details = vec![
        MarketDetail::forex(common::forex("EUR", "USD")),
        MarketDetail::new(common::epic("IX.D.FTSE.DAILY.IP"), MarketType::Index),
        MarketDetail::forex(broken),
        MarketDetail::new(common::epic("IX.D.DAX.DAILY.IP"), MarketType::Index),
    ];
    let error = assert_err!(db.markets().update(&details).await);
    assert!(matches!(error, DatabaseError::BatchInterrupted { position: 2, .. }));
    assert_eq!(error.native_code(), Some(rusqlite::ffi::SQLITE_CONSTRAINT_CHECK));

    let epics: Vec<String> = db
        .markets()
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.epic.to_string())
        .collect();
    assert_eq!(epics, vec!["CS.D.EURUSD.CFD.IP", "IX.D.FTSE.DAILY.IP"]);
}
