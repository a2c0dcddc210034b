//! Codecs for `Markets` and `MarketsForex` rows.

use rusqlite::types::{ToSql, ToSqlOutput, Value};

use super::{Binder, Decode, Encode, Reader};
use crate::error::DatabaseError;
use crate::model::{Currency, Epic, Forex, Market, MarketType};

/// Column order shared by every `Markets` select.
pub const MARKET_COLUMNS: &str = "epic, type";

/// Column order shared by every `MarketsForex` select and insert.
pub const FOREX_COLUMNS: &str = "epic, base, counter, name, marketId, chartId, reutersId, \
    contractSize, pipValue, placeValue, marginFactor, slippageFactor, minDealSize, \
    guaranteedStopPremium";

impl ToSql for Epic {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl ToSql for Currency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl ToSql for MarketType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self.code() {
            Some(code) => Value::Integer(code),
            None => Value::Null,
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

pub(crate) fn read_epic(reader: &mut Reader<'_, '_>) -> Result<Epic, DatabaseError> {
    reader.next::<String>().map(Epic::from_storage)
}

fn read_currency(reader: &mut Reader<'_, '_>) -> Result<Currency, DatabaseError> {
    reader.map(|code: String| Currency::new(&code).ok())
}

impl Encode for Market {
    fn encode(&self, binder: &mut Binder<'_, '_>) -> Result<(), DatabaseError> {
        binder.bind(&self.epic)?.bind(self.kind)?;
        Ok(())
    }
}

impl Decode for Market {
    fn decode(reader: &mut Reader<'_, '_>) -> Result<Self, DatabaseError> {
        let epic = read_epic(reader)?;
        let kind = MarketType::decode(reader)?;
        Ok(Market { epic, kind })
    }
}

/// `NULL` decodes to `Unknown`; an unrecognised code is corruption.
impl Decode for MarketType {
    fn decode(reader: &mut Reader<'_, '_>) -> Result<Self, DatabaseError> {
        reader.map(|code: Option<i64>| match code {
            None => Some(MarketType::Unknown),
            Some(code) => MarketType::from_code(code),
        })
    }
}

impl Encode for Forex {
    fn encode(&self, binder: &mut Binder<'_, '_>) -> Result<(), DatabaseError> {
        binder
            .bind(&self.epic)?
            .bind(self.base)?
            .bind(self.counter)?
            .bind(&self.name)?
            .bind(&self.market_id)?
            .bind(&self.chart_code)?
            .bind(&self.reuters_code)?
            .bind(self.contract_size)?
            .decimal(self.pip_value)?
            .decimal(self.place_value)?
            .decimal(self.margin_factor)?
            .decimal(self.slippage_factor)?
            .decimal(self.min_deal_size)?
            .optional_decimal(self.guaranteed_stop_premium)?;
        Ok(())
    }
}

impl Decode for Forex {
    fn decode(reader: &mut Reader<'_, '_>) -> Result<Self, DatabaseError> {
        Ok(Forex {
            epic: read_epic(reader)?,
            base: read_currency(reader)?,
            counter: read_currency(reader)?,
            name: reader.next()?,
            market_id: reader.next()?,
            chart_code: reader.next()?,
            reuters_code: reader.next()?,
            contract_size: reader.next()?,
            pip_value: reader.decimal()?,
            place_value: reader.decimal()?,
            margin_factor: reader.decimal()?,
            slippage_factor: reader.decimal()?,
            min_deal_size: reader.decimal()?,
            guaranteed_stop_premium: reader.optional_decimal()?,
        })
    }
}
