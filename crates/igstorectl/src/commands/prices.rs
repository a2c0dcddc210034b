//! Prices command implementation.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use igstore::model::{Epic, Price};
use igstore::Database;
use serde::Serialize;

use crate::OutputFormat;

/// Window shown when `--from` is omitted.
const DEFAULT_WINDOW_DAYS: i64 = 30;

#[derive(Serialize)]
struct PricesOutput {
    epic: Epic,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    prices: Vec<Price>,
    total: usize,
}

#[derive(Serialize)]
struct TablesOutput {
    epics: Vec<Epic>,
    total: usize,
}

pub async fn show(
    database: &Database,
    epic: &Epic,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    format: OutputFormat,
) -> Result<()> {
    let to = to.unwrap_or_else(Utc::now);
    let from = from.unwrap_or(to - Duration::days(DEFAULT_WINDOW_DAYS));

    let prices = database
        .prices()
        .get(epic, from, to)
        .await
        .with_context(|| format!("failed to read prices of {}", epic))?;
    let output = PricesOutput {
        epic: epic.clone(),
        from,
        to,
        total: prices.len(),
        prices,
    };

    match format {
        OutputFormat::Text => {
            if output.prices.is_empty() {
                println!("No prices for {} in range.", output.epic);
            } else {
                println!(
                    "{:<20} {:>12} {:>12} {:>12} {:>12} {:>10}",
                    "DATE", "OPEN", "HIGH", "LOW", "CLOSE", "VOLUME"
                );
                println!("{}", "-".repeat(83));
                for price in &output.prices {
                    let volume = price
                        .volume
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<20} {:>12} {:>12} {:>12} {:>12} {:>10}",
                        price.date.format(igstore::codec::DATE_FORMAT),
                        price.open.mid(),
                        price.highest.mid(),
                        price.lowest.mid(),
                        price.close.mid(),
                        volume
                    );
                }
                println!();
                println!("Total: {} candle(s)", output.total);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub async fn tables(database: &Database, format: OutputFormat) -> Result<()> {
    let epics = database.prices().tables().await?;
    let output = TablesOutput {
        total: epics.len(),
        epics,
    };

    match format {
        OutputFormat::Text => {
            if output.epics.is_empty() {
                println!("No price history cached.");
            } else {
                for epic in &output.epics {
                    println!("{}", epic);
                }
                println!();
                println!("Total: {} market(s)", output.total);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
