//! Historical price candles.

use chrono::{DateTime, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Reject dates that would lose their sub-second part when stored.
pub(crate) fn whole_seconds(date: &DateTime<Utc>) -> Result<(), ValidationError> {
    if date.nanosecond() == 0 {
        Ok(())
    } else {
        Err(ValidationError::SubsecondDate {
            date: date.to_rfc3339(),
        })
    }
}

/// A bid/ask pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub bid: Decimal,
    pub ask: Decimal,
}

impl Point {
    pub fn new(bid: Decimal, ask: Decimal) -> Self {
        Self { bid, ask }
    }

    /// Midpoint between bid and ask. Derived, never stored.
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }

    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }
}

/// One candle of a market's price history, keyed by `date`.
///
/// Dates are stored with second precision; a date with a sub-second part is
/// rejected rather than truncated, so two candles never merge silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub date: DateTime<Utc>,
    pub open: Point,
    pub close: Point,
    pub lowest: Point,
    pub highest: Point,
    pub volume: Option<u32>,
}

impl Price {
    pub fn validate(&self) -> Result<(), ValidationError> {
        whole_seconds(&self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_midpoint() {
        let point = Point::new(dec!(1.08341), dec!(1.08350));
        assert_eq!(point.mid(), dec!(1.083455));
        assert_eq!(point.spread(), dec!(0.00009));
    }

    #[test]
    fn test_subsecond_dates_are_rejected() {
        let point = Point::new(dec!(1.0), dec!(1.1));
        let mut price = Price {
            date: Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap(),
            open: point,
            close: point,
            lowest: point,
            highest: point,
            volume: None,
        };
        assert!(price.validate().is_ok());

        price.date += chrono::Duration::milliseconds(250);
        assert!(matches!(
            price.validate(),
            Err(ValidationError::SubsecondDate { .. })
        ));
    }
}
