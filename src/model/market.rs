//! Instruments (markets) and their forex detail.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Currency, Epic};
use crate::error::ValidationError;

/// Classification of a market.
///
/// `Unknown` is stored as `NULL`: the classification may not be known until
/// the market detail has been fetched from the venue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    #[default]
    Unknown,
    Forex,
    Index,
    Commodity,
    Share,
    Rates,
    Crypto,
    Bond,
    Option,
    Sector,
}

impl MarketType {
    /// Integer stored in the `type` column (`None` maps to `NULL`).
    pub fn code(self) -> Option<i64> {
        match self {
            Self::Unknown => None,
            Self::Forex => Some(1),
            Self::Index => Some(2),
            Self::Commodity => Some(3),
            Self::Share => Some(4),
            Self::Rates => Some(5),
            Self::Crypto => Some(6),
            Self::Bond => Some(7),
            Self::Option => Some(8),
            Self::Sector => Some(9),
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        let kind = match code {
            1 => Self::Forex,
            2 => Self::Index,
            3 => Self::Commodity,
            4 => Self::Share,
            5 => Self::Rates,
            6 => Self::Crypto,
            7 => Self::Bond,
            8 => Self::Option,
            9 => Self::Sector,
            _ => return None,
        };
        Some(kind)
    }

    /// Map the venue's instrument type string (e.g. `CURRENCIES`).
    ///
    /// Unrecognised strings are not an error; they classify as `Unknown`.
    pub fn from_instrument_type(value: &str) -> Self {
        match value {
            "CURRENCIES" => Self::Forex,
            "INDICES" => Self::Index,
            "COMMODITIES" => Self::Commodity,
            "SHARES" => Self::Share,
            "RATES" => Self::Rates,
            "CRYPTOCURRENCIES" => Self::Crypto,
            "BONDS" => Self::Bond,
            "SECTORS" => Self::Sector,
            other if other.starts_with("OPT_") => Self::Option,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Forex => "forex",
            Self::Index => "index",
            Self::Commodity => "commodity",
            Self::Share => "share",
            Self::Rates => "rates",
            Self::Crypto => "crypto",
            Self::Bond => "bond",
            Self::Option => "option",
            Self::Sector => "sector",
        };
        f.pad(name)
    }
}

/// A row of the `Markets` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub epic: Epic,
    #[serde(rename = "type")]
    pub kind: MarketType,
}

impl Market {
    pub fn new(epic: Epic, kind: MarketType) -> Self {
        Self { epic, kind }
    }
}

/// Trading parameters of a currency-pair market (`MarketsForex` row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forex {
    pub epic: Epic,
    pub base: Currency,
    pub counter: Currency,
    pub name: String,
    pub market_id: String,
    pub chart_code: Option<String>,
    pub reuters_code: String,
    pub contract_size: u32,
    pub pip_value: Decimal,
    pub place_value: Decimal,
    pub margin_factor: Decimal,
    pub slippage_factor: Decimal,
    pub min_deal_size: Decimal,
    pub guaranteed_stop_premium: Option<Decimal>,
}

/// Fresh market data handed over by the venue client for storage.
///
/// `forex` is only allowed when `kind` is [`MarketType::Forex`]; a forex
/// market without detail keeps whatever detail row was stored before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDetail {
    pub epic: Epic,
    pub kind: MarketType,
    pub forex: Option<Forex>,
}

impl MarketDetail {
    pub fn new(epic: Epic, kind: MarketType) -> Self {
        Self {
            epic,
            kind,
            forex: None,
        }
    }

    pub fn forex(forex: Forex) -> Self {
        Self {
            epic: forex.epic.clone(),
            kind: MarketType::Forex,
            forex: Some(forex),
        }
    }

    /// Check the forex invariants before anything is written.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let Some(forex) = &self.forex else {
            return Ok(());
        };
        if self.kind != MarketType::Forex || forex.epic != self.epic {
            return Err(ValidationError::ForexMismatch {
                epic: self.epic.to_string(),
            });
        }
        if forex.base == forex.counter {
            return Err(ValidationError::SameCurrencies {
                epic: self.epic.to_string(),
            });
        }
        Ok(())
    }

    pub fn market(&self) -> Market {
        Market::new(self.epic.clone(), self.kind)
    }
}
