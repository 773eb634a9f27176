//! Window Builder: the most recent `lookback` rows of one symbol.

use crate::domain::{PriceRow, Symbol};
use chrono::NaiveDate;
use serde::Serialize;

/// Most recent rows for one symbol, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceWindow {
    pub symbol: Symbol,
    /// Date of the newest row; `None` for an empty window.
    pub as_of: Option<NaiveDate>,
    pub rows: Vec<PriceRow>,
}

impl PriceWindow {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `as_of` as text, empty when the window is empty.
    pub fn as_of_text(&self) -> String {
        self.as_of.map(|d| d.to_string()).unwrap_or_default()
    }

    /// Mean of the `k` most recent closes, or `None` with fewer than `k` rows.
    pub fn sma(&self, k: usize) -> Option<f64> {
        if k == 0 || self.rows.len() < k {
            return None;
        }
        let sum: f64 = self.rows[..k].iter().map(|r| r.close).sum();
        Some(sum / k as f64)
    }
}

pub fn build_window(series: &[PriceRow], symbol: &Symbol, lookback: usize) -> PriceWindow {
    let mut rows: Vec<PriceRow> = series
        .iter()
        .filter(|r| &r.symbol == symbol)
        .cloned()
        .collect();
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    rows.truncate(lookback);

    PriceWindow {
        symbol: symbol.clone(),
        as_of: rows.first().map(|r| r.date),
        rows,
    }
}

/// Whether the series holds any row for `symbol`.
pub fn is_tracked(series: &[PriceRow], symbol: &Symbol) -> bool {
    series.iter().any(|r| &r.symbol == symbol)
}
