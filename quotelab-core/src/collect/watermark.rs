//! Per-symbol "last collected date", always derived from the price series.

use crate::domain::{PriceRow, Symbol};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Watermark used for symbols that have never been collected.
pub const EPOCH_WATERMARK: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(d) => d,
    None => panic!("invalid epoch watermark"),
};

/// Persisted watermark row (`symbol,last_date`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    pub symbol: Symbol,
    pub last_date: NaiveDate,
}

/// Watermarks for every symbol present in a series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watermarks(BTreeMap<Symbol, NaiveDate>);

impl Watermarks {
    /// Maximum date per symbol over `rows`.
    pub fn from_rows(rows: &[PriceRow]) -> Self {
        let mut map: BTreeMap<Symbol, NaiveDate> = BTreeMap::new();
        for row in rows {
            map.entry(row.symbol.clone())
                .and_modify(|d| *d = (*d).max(row.date))
                .or_insert(row.date);
        }
        Self(map)
    }

    /// Last collected date, or [`EPOCH_WATERMARK`] if the symbol is unknown.
    pub fn last_date(&self, symbol: &Symbol) -> NaiveDate {
        self.0.get(symbol).copied().unwrap_or(EPOCH_WATERMARK)
    }

    pub fn get(&self, symbol: &Symbol) -> Option<NaiveDate> {
        self.0.get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rows ordered by symbol, ready to persist.
    pub fn to_rows(&self) -> Vec<Watermark> {
        self.0
            .iter()
            .map(|(symbol, &last_date)| Watermark {
                symbol: symbol.clone(),
                last_date,
            })
            .collect()
    }
}
