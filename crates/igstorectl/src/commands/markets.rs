//! Markets command implementation.

use anyhow::Result;
use igstore::model::{Forex, Market};
use igstore::Database;
use serde::Serialize;

use crate::OutputFormat;

#[derive(Serialize)]
struct MarketsOutput {
    markets: Vec<Market>,
    total: usize,
}

#[derive(Serialize)]
struct ForexOutput {
    forex: Vec<Forex>,
    total: usize,
}

pub async fn list(database: &Database, format: OutputFormat) -> Result<()> {
    let markets = database.markets().get_all().await?;
    let output = MarketsOutput {
        total: markets.len(),
        markets,
    };

    match format {
        OutputFormat::Text => {
            if output.markets.is_empty() {
                println!("No markets found.");
            } else {
                println!("{:<32} {:>10}", "EPIC", "TYPE");
                println!("{}", "-".repeat(43));
                for market in &output.markets {
                    println!("{:<32} {:>10}", market.epic, market.kind);
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

pub async fn forex(database: &Database, format: OutputFormat) -> Result<()> {
    let forex = database.markets().forex().get_all().await?;
    let output = ForexOutput {
        total: forex.len(),
        forex,
    };

    match format {
        OutputFormat::Text => {
            if output.forex.is_empty() {
                println!("No forex markets found.");
            } else {
                println!(
                    "{:<32} {:<8} {:>12} {:>10} {:>10}",
                    "EPIC", "PAIR", "CONTRACT", "PIP", "MARGIN %"
                );
                println!("{}", "-".repeat(76));
                for pair in &output.forex {
                    println!(
                        "{:<32} {:<8} {:>12} {:>10} {:>10}",
                        pair.epic,
                        format!("{}/{}", pair.base, pair.counter),
                        pair.contract_size,
                        pair.pip_value,
                        pair.margin_factor
                    );
                }
                println!();
                println!("Total: {} forex market(s)", output.total);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
