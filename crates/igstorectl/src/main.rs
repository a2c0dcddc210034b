//! igstorectl: Command-line inspector for igstore databases.
//!
//! Opens (and migrates, if needed) a database file and prints its markets,
//! applications and cached price history.

mod commands;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use igstore::model::Epic;
use igstore::{Database, DatabaseConfig};

/// Command-line inspector for igstore databases.
#[derive(Parser)]
#[command(name = "igstorectl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    database: DatabaseConfig,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    /// Emit logs as JSON lines on stderr
    #[arg(long, env = "IGSTORE_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show schema version and row counts
    Info,
    /// List markets or forex detail
    Markets {
        #[command(subcommand)]
        action: MarketsAction,
    },
    /// Show cached price history
    Prices {
        #[command(subcommand)]
        action: PricesAction,
    },
    /// List registered applications
    Apps {
        #[command(subcommand)]
        action: AppsAction,
    },
}

#[derive(Subcommand)]
enum MarketsAction {
    /// List all markets
    List,
    /// List forex markets with their detail
    Forex,
}

#[derive(Subcommand)]
enum PricesAction {
    /// Print candles of one market
    Show {
        /// Market epic (e.g. CS.D.EURUSD.CFD.IP)
        epic: Epic,
        /// First date, inclusive (YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS")
        #[arg(long, value_parser = parse_date)]
        from: Option<DateTime<Utc>>,
        /// Last date, inclusive (defaults to now)
        #[arg(long, value_parser = parse_date)]
        to: Option<DateTime<Utc>>,
    },
    /// List markets with cached history
    Tables,
}

#[derive(Subcommand)]
enum AppsAction {
    /// List all applications
    List,
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDateTime::parse_from_str(value, igstore::codec::DATE_FORMAT) {
        return Ok(date.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(|e| format!("invalid date '{}': {}", value, e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    igstore::observability::tracing::init_tracing("igstorectl", cli.log_json);

    tracing::debug!(location = ?cli.database.location, "Opening database");
    let database = Database::open(&cli.database)
        .await
        .context("failed to open database")?;

    let outcome = match cli.command {
        Commands::Info => commands::info::run(&database, cli.output).await,
        Commands::Markets { action } => match action {
            MarketsAction::List => commands::markets::list(&database, cli.output).await,
            MarketsAction::Forex => commands::markets::forex(&database, cli.output).await,
        },
        Commands::Prices { action } => match action {
            PricesAction::Show { epic, from, to } => {
                commands::prices::show(&database, &epic, from, to, cli.output).await
            }
            PricesAction::Tables => commands::prices::tables(&database, cli.output).await,
        },
        Commands::Apps { action } => match action {
            AppsAction::List => commands::apps::list(&database, cli.output).await,
        },
    };

    database.close().await.context("failed to close database")?;
    tracing::debug!(ok = outcome.is_ok(), "Command finished");
    outcome
}
