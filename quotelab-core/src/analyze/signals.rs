//! Signal Merger: one row per `symbol|type`, newest `created_at` wins.

use super::parse::AnalysisPayload;
use crate::domain::{SignalRow, Symbol};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;

/// Merge `incoming` into `existing`. The result replaces the stored log.
pub fn merge_signals(existing: Vec<SignalRow>, incoming: Vec<SignalRow>) -> Vec<SignalRow> {
    let mut rows: Vec<SignalRow> = incoming.into_iter().chain(existing).collect();
    // stable: incoming stays ahead of existing on equal timestamps
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut seen = HashSet::new();
    rows.retain(|row| seen.insert(row.key.clone()));

    rows.sort_by(|a, b| {
        a.symbol
            .cmp(&b.symbol)
            .then_with(|| a.kind.cmp(&b.kind))
    });
    rows
}

/// Build the log row for one analysis of `symbol`.
///
/// The date is the parsed `as_of`, else `window_as_of`, else the UTC date of
/// `created_at`.
pub fn signal_row(
    payload: &AnalysisPayload,
    symbol: &Symbol,
    kind: &str,
    window_as_of: Option<NaiveDate>,
    created_at: DateTime<Utc>,
) -> SignalRow {
    let date = if !payload.as_of.trim().is_empty() {
        payload.as_of.trim().to_string()
    } else {
        window_as_of
            .unwrap_or_else(|| created_at.date_naive())
            .to_string()
    };

    SignalRow {
        key: SignalRow::key_for(symbol, kind),
        symbol: symbol.clone(),
        kind: kind.to_string(),
        date,
        value: payload.signal,
        threshold: Some(payload.confidence),
        message: payload.summary.clone(),
        created_at,
    }
}
