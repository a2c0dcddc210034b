//! Codec for `Apps` rows.

use rusqlite::types::{ToSql, ToSqlOutput};

use super::{Binder, Decode, Encode, Reader};
use crate::error::DatabaseError;
use crate::model::{Allowance, ApiKey, AppStatus, Application, Permission};

/// Columns read back from `Apps`; `updated` is written by SQL, never bound.
pub const APP_COLUMNS: &str = "key, name, status, equity, quote, overallRequests, \
    accountRequests, tradingRequests, historicalPoints, subscriptions, created, updated";

impl ToSql for ApiKey {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

/// Binds every column except `updated`.
impl Encode for Application {
    fn encode(&self, binder: &mut Binder<'_, '_>) -> Result<(), DatabaseError> {
        binder
            .bind(&self.key)?
            .bind(&self.name)?
            .bind(self.status.code())?
            .bind(self.permission.access_to_equity_prices)?
            .bind(self.permission.quote_orders_allowed)?
            .bind(self.allowance.overall_requests)?
            .bind(self.allowance.account_requests)?
            .bind(self.allowance.trading_requests)?
            .bind(self.allowance.historical_data_points)?
            .bind(self.allowance.concurrent_subscriptions)?
            .date(&self.created)?;
        Ok(())
    }
}

impl Decode for Application {
    fn decode(reader: &mut Reader<'_, '_>) -> Result<Self, DatabaseError> {
        Ok(Application {
            key: ApiKey::from_storage(reader.next()?),
            name: reader.next()?,
            status: reader.map(AppStatus::from_code)?,
            permission: Permission {
                access_to_equity_prices: reader.next()?,
                quote_orders_allowed: reader.next()?,
            },
            allowance: Allowance {
                overall_requests: reader.next()?,
                account_requests: reader.next()?,
                trading_requests: reader.next()?,
                historical_data_points: reader.next()?,
                concurrent_subscriptions: reader.next()?,
            },
            created: reader.date()?,
            updated: reader.date()?,
        })
    }
}
