//! Entity codecs: typed values to statement parameters and back.
//!
//! Each entity implements [`Encode`] (bind positions) and/or [`Decode`]
//! (result columns) through a positional cursor, so a column-order change
//! only touches that entity's codec and its `COLUMNS` list.
//!
//! Decimal values are persisted as scaled integers. The cursors carry the
//! [`Scale`] they apply: [`Scale::DEFAULT`] unless a codec opts into another
//! one with [`Binder::scaled`] / [`Reader::scaled`].

pub mod application;
pub mod market;
pub mod price;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::{FromSql, ToSql};
use rusqlite::{Connection, Row, Statement};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::DatabaseError;

/// Text layout of every stored timestamp. Matches SQLite's `CURRENT_TIMESTAMP`.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed-point scale: a decimal `p` is stored as `round(p * 10^exponent)`.
///
/// Encoding is lossy at the extremes: values whose scaled form does not fit
/// in an `i64` clamp to `i64::MIN` / `i64::MAX` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    exponent: u32,
}

impl Scale {
    pub const MAX_EXPONENT: u32 = 18;

    /// Engine-wide scale used by every stored decimal.
    pub const DEFAULT: Scale = Scale::new(5);

    pub const fn new(exponent: u32) -> Self {
        assert!(exponent <= Self::MAX_EXPONENT);
        Self { exponent }
    }

    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    fn factor(&self) -> Decimal {
        Decimal::from(10i64.pow(self.exponent))
    }

    pub fn encode(&self, value: Decimal) -> i64 {
        let clamp = || {
            if value.is_sign_negative() {
                i64::MIN
            } else {
                i64::MAX
            }
        };
        match value.checked_mul(self.factor()) {
            Some(scaled) => scaled
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
                .unwrap_or_else(clamp),
            None => clamp(),
        }
    }

    pub fn decode(&self, raw: i64) -> Decimal {
        Decimal::new(raw, self.exponent).normalize()
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Serialise a value into consecutive bind positions.
pub trait Encode {
    fn encode(&self, binder: &mut Binder<'_, '_>) -> Result<(), DatabaseError>;
}

/// Rebuild a value from consecutive result columns.
///
/// Failures here mean the file holds something this build never wrote.
pub trait Decode: Sized {
    fn decode(reader: &mut Reader<'_, '_>) -> Result<Self, DatabaseError>;
}

/// Cursor over the parameters of a prepared statement (1-based).
pub struct Binder<'s, 'c> {
    statement: &'s mut Statement<'c>,
    position: usize,
    scale: Scale,
}

impl<'s, 'c> Binder<'s, 'c> {
    pub fn new(statement: &'s mut Statement<'c>) -> Self {
        Self::scaled(statement, Scale::DEFAULT)
    }

    pub fn scaled(statement: &'s mut Statement<'c>, scale: Scale) -> Self {
        Self {
            statement,
            position: 0,
            scale,
        }
    }

    pub fn bind<T: ToSql>(&mut self, value: T) -> Result<&mut Self, DatabaseError> {
        self.position += 1;
        let position = self.position;
        self.statement
            .raw_bind_parameter(position, value)
            .map_err(|source| DatabaseError::Binding { position, source })?;
        Ok(self)
    }

    pub fn decimal(&mut self, value: Decimal) -> Result<&mut Self, DatabaseError> {
        let raw = self.scale.encode(value);
        self.bind(raw)
    }

    pub fn optional_decimal(&mut self, value: Option<Decimal>) -> Result<&mut Self, DatabaseError> {
        let raw = value.map(|v| self.scale.encode(v));
        self.bind(raw)
    }

    pub fn date(&mut self, value: &DateTime<Utc>) -> Result<&mut Self, DatabaseError> {
        self.bind(value.format(DATE_FORMAT).to_string())
    }

    /// Number of parameters bound so far.
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Cursor over the columns of a result row (0-based).
pub struct Reader<'r, 's> {
    row: &'r Row<'s>,
    column: usize,
    scale: Scale,
}

impl<'r, 's> Reader<'r, 's> {
    pub fn new(row: &'r Row<'s>) -> Self {
        Self::scaled(row, Scale::DEFAULT)
    }

    pub fn scaled(row: &'r Row<'s>, scale: Scale) -> Self {
        Self {
            row,
            column: 0,
            scale,
        }
    }

    pub fn next<T: FromSql>(&mut self) -> Result<T, DatabaseError> {
        let column = self.advance();
        self.row
            .get(column)
            .map_err(|e| DatabaseError::Decode {
                column,
                source: Box::new(e),
            })
    }

    /// Read a column and convert it, reporting conversion failures as corruption.
    pub fn map<T: FromSql, U>(
        &mut self,
        convert: impl FnOnce(T) -> Option<U>,
    ) -> Result<U, DatabaseError> {
        let column = self.column;
        let raw = self.next::<T>()?;
        convert(raw).ok_or_else(|| DatabaseError::Decode {
            column,
            source: "stored value is out of the expected domain".into(),
        })
    }

    pub fn decimal(&mut self) -> Result<Decimal, DatabaseError> {
        let raw: i64 = self.next()?;
        Ok(self.scale.decode(raw))
    }

    pub fn optional_decimal(&mut self) -> Result<Option<Decimal>, DatabaseError> {
        let raw: Option<i64> = self.next()?;
        Ok(raw.map(|r| self.scale.decode(r)))
    }

    pub fn date(&mut self) -> Result<DateTime<Utc>, DatabaseError> {
        let column = self.column;
        let text: String = self.next()?;
        NaiveDateTime::parse_from_str(&text, DATE_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|e| DatabaseError::Decode {
                column,
                source: Box::new(e),
            })
    }

    fn advance(&mut self) -> usize {
        let column = self.column;
        self.column += 1;
        column
    }
}

/// Prepare (cached), bind and execute one statement in its own autocommit.
pub(crate) fn execute<T: Encode + ?Sized>(
    connection: &Connection,
    sql: &str,
    value: &T,
) -> Result<usize, DatabaseError> {
    let mut statement = connection
        .prepare_cached(sql)
        .map_err(DatabaseError::Compilation)?;
    value.encode(&mut Binder::new(&mut statement))?;
    statement.raw_execute().map_err(DatabaseError::Storage)
}

/// Run a bound statement and decode every row it yields.
pub(crate) fn query_all<T: Decode>(statement: &mut Statement<'_>) -> Result<Vec<T>, DatabaseError> {
    let mut rows = statement.raw_query();
    let mut values = Vec::new();
    while let Some(row) = rows.next().map_err(DatabaseError::Query)? {
        values.push(T::decode(&mut Reader::new(row))?);
    }
    Ok(values)
}

/// Run a bound statement and decode its first row, `NotFound` if there is none.
pub(crate) fn query_one<T: Decode>(statement: &mut Statement<'_>) -> Result<T, DatabaseError> {
    let mut rows = statement.raw_query();
    match rows.next().map_err(DatabaseError::Query)? {
        Some(row) => T::decode(&mut Reader::new(row)),
        None => Err(DatabaseError::NotFound),
    }
}

/// Parameter lists bound through [`Encode`].
impl<T: ToSql> Encode for [T] {
    fn encode(&self, binder: &mut Binder<'_, '_>) -> Result<(), DatabaseError> {
        for value in self {
            binder.bind(value)?;
        }
        Ok(())
    }
}
