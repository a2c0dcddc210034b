//! Info command implementation.

use anyhow::Result;
use igstore::Database;

use crate::OutputFormat;

pub async fn run(database: &Database, format: OutputFormat) -> Result<()> {
    let statistics = database.statistics().await?;

    match format {
        OutputFormat::Text => {
            let location = database
                .config()
                .path()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| ":memory:".to_string());
            println!("{:<16} {}", "Database:", location);
            println!("{:<16} {}", "Schema version:", statistics.version);
            println!("{:<16} {}", "Markets:", statistics.markets);
            println!("{:<16} {}", "Forex markets:", statistics.forex_markets);
            println!("{:<16} {}", "Applications:", statistics.applications);
            println!("{:<16} {}", "Price tables:", statistics.price_tables.len());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&statistics)?);
        }
    }

    Ok(())
}
