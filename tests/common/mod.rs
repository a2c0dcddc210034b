//! Test utilities and fixtures for igstore tests.
//!
//! Provides:
//! - Temporary database directories
//! - Builders for markets, forex detail, candles and applications

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use igstore::model::{
    Allowance, ApiKey, AppStatus, Application, Currency, Epic, Forex, Point, Price,
};
use igstore::{Database, DatabaseConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test fixture that manages a temporary database directory.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory for test database
    pub temp_dir: TempDir,
    /// Path to the database file
    pub db_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with a temporary database directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("cache").join("ig.sqlite");
        Self { temp_dir, db_path }
    }

    pub fn config(&self) -> DatabaseConfig {
        DatabaseConfig::file(&self.db_path)
    }

    /// Open the fixture's file database.
    pub async fn open(&self) -> Database {
        Database::open(&self.config()).await.expect("failed to open database")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Fresh in-memory database.
pub async fn memory() -> Database {
    igstore::observability::tracing::init_test_tracing();
    Database::open(&DatabaseConfig::in_memory())
        .await
        .expect("failed to open in-memory database")
}

pub fn epic(value: &str) -> Epic {
    Epic::new(value).expect("invalid epic")
}

pub fn currency(value: &str) -> Currency {
    Currency::new(value).expect("invalid currency")
}

/// Forex detail for `base`/`counter` under the usual CFD epic.
pub fn forex(base: &str, counter: &str) -> Forex {
    Forex {
        epic: epic(&format!("CS.D.{base}{counter}.CFD.IP")),
        base: currency(base),
        counter: currency(counter),
        name: format!("{base}/{counter}"),
        market_id: format!("{base}{counter}"),
        chart_code: Some(format!("{base}{counter}")),
        reuters_code: format!("{base}{counter}="),
        contract_size: 100_000,
        pip_value: dec!(10),
        place_value: dec!(0.0001),
        margin_factor: dec!(3.33),
        slippage_factor: dec!(50),
        min_deal_size: dec!(0.5),
        guaranteed_stop_premium: Some(dec!(0.8)),
    }
}

/// Midnight UTC, `days` before 2024-06-01.
pub fn day(days: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() - Duration::days(days)
}

/// Candle dated `date` whose values derive from `seed`.
pub fn candle(date: DateTime<Utc>, seed: i64) -> Price {
    let base = Decimal::new(108_000 + seed, 5);
    let spread = dec!(0.00008);
    let point = |offset: Decimal| Point::new(base + offset, base + offset + spread);
    Price {
        date,
        open: point(Decimal::ZERO),
        close: point(dec!(0.0002)),
        lowest: point(dec!(-0.0011)),
        highest: point(dec!(0.00125)),
        volume: Some(1_000 + seed as u32),
    }
}

/// Application with a key made of `fill` repeated.
pub fn application(fill: char, name: &str) -> Application {
    let created = Utc.with_ymd_and_hms(2023, 1, 15, 9, 30, 0).unwrap();
    Application {
        key: ApiKey::new(fill.to_string().repeat(ApiKey::LEN)).expect("invalid key"),
        name: name.into(),
        status: AppStatus::Enabled,
        permission: Default::default(),
        allowance: Allowance {
            overall_requests: 60,
            account_requests: 30,
            trading_requests: 100,
            historical_data_points: 10_000,
            concurrent_subscriptions: 40,
        },
        created,
        updated: created,
    }
}
