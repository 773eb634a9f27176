//! Price Merger: folds freshly fetched rows into the stored series.
//!
//! Rules, applied in order:
//! - fetched rows without a date, or with a non-finite field, are dropped
//! - fetched rows on or before the symbol's watermark are dropped
//! - survivors are tagged with the symbol and placed ahead of the existing rows
//! - duplicates by `symbol|date` keep the first occurrence (the fetched row)
//! - the result is sorted by `(symbol, date)` and the watermarks are re-derived
//!
//! The output is the whole table; callers persist it with a full rewrite.

use super::watermark::Watermarks;
use crate::domain::{PriceRow, RawPriceRow, Symbol};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Result of merging one symbol's fetch into the series.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub series: Vec<PriceRow>,
    pub watermarks: Watermarks,
    /// Fetched rows that made it into the series.
    pub added: usize,
    /// Fetched rows dropped as undated, non-finite, old, or duplicated.
    pub discarded: usize,
}

pub fn merge_prices(
    existing: Vec<PriceRow>,
    fetched: Vec<RawPriceRow>,
    symbol: &Symbol,
    watermarks: &Watermarks,
) -> MergeOutcome {
    let last_date = watermarks.last_date(symbol);
    let fetched_count = fetched.len();

    let mut seen: HashSet<String> = HashSet::with_capacity(existing.len() + fetched_count);
    let mut series: Vec<PriceRow> = Vec::with_capacity(existing.len() + fetched_count);

    for row in fetched
        .into_iter()
        .filter(RawPriceRow::is_finite)
        .filter_map(|raw| raw.into_price_row(symbol))
        .filter(|row| row.date > last_date)
    {
        if seen.insert(row.key()) {
            series.push(row);
        }
    }
    let added = series.len();

    for row in existing {
        if seen.insert(row.key()) {
            series.push(row);
        }
    }

    series.sort_by(compare_rows);
    let watermarks = Watermarks::from_rows(&series);

    MergeOutcome {
        series,
        watermarks,
        added,
        discarded: fetched_count - added,
    }
}

/// Storage order: symbol ascending, then date ascending.
pub fn compare_rows(a: &PriceRow, b: &PriceRow) -> Ordering {
    a.symbol.cmp(&b.symbol).then(a.date.cmp(&b.date))
}
