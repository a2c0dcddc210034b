//! Codec for `Price_<epic>` rows.

use super::{Binder, Decode, Encode, Reader};
use crate::error::DatabaseError;
use crate::model::{Point, Price};

pub const PRICE_COLUMNS: &str =
    "date, openBid, openAsk, closeBid, closeAsk, lowBid, lowAsk, highBid, highAsk, volume";

fn bind_point(binder: &mut Binder<'_, '_>, point: &Point) -> Result<(), DatabaseError> {
    binder.decimal(point.bid)?.decimal(point.ask)?;
    Ok(())
}

fn read_point(reader: &mut Reader<'_, '_>) -> Result<Point, DatabaseError> {
    Ok(Point {
        bid: reader.decimal()?,
        ask: reader.decimal()?,
    })
}

impl Encode for Price {
    fn encode(&self, binder: &mut Binder<'_, '_>) -> Result<(), DatabaseError> {
        binder.date(&self.date)?;
        bind_point(binder, &self.open)?;
        bind_point(binder, &self.close)?;
        bind_point(binder, &self.lowest)?;
        bind_point(binder, &self.highest)?;
        binder.bind(self.volume)?;
        Ok(())
    }
}

impl Decode for Price {
    fn decode(reader: &mut Reader<'_, '_>) -> Result<Self, DatabaseError> {
        Ok(Price {
            date: reader.date()?,
            open: read_point(reader)?,
            close: read_point(reader)?,
            lowest: read_point(reader)?,
            highest: read_point(reader)?,
            volume: reader.next()?,
        })
    }
}
