//! Daily OHLCV rows, before and after they are tagged with a symbol.

use super::Symbol;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV row as returned by a price provider.
///
/// The date is optional because providers emit header-only or partial rows;
/// the merger drops anything without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPriceRow {
    pub date: Option<NaiveDate>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl RawPriceRow {
    /// True when every price and the volume are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }

    /// Tag with a symbol. Returns `None` for rows without a date.
    pub fn into_price_row(self, symbol: &Symbol) -> Option<PriceRow> {
        Some(PriceRow {
            symbol: symbol.clone(),
            date: self.date?,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }
}

/// One persisted row of the price series. Identity is `symbol|date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub symbol: Symbol,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceRow {
    /// Identity key `SYMBOL|YYYY-MM-DD`.
    pub fn key(&self) -> String {
        format!("{}|{}", self.symbol, self.date)
    }

    /// `date,open,high,low,close,volume` as rendered into prompts.
    pub fn csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.date, self.open, self.high, self.low, self.close, self.volume
        )
    }
}
