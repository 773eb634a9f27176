//! Yahoo Finance collaborators.
//!
//! `YahooSearch` resolves company names through the public v1 search API;
//! `YahooChart` pulls a short daily history from the v8 chart API for
//! symbols that have not been collected yet.
//!
//! Yahoo has no official API and is subject to unannounced format changes,
//! so every field is optional on the wire.

use super::http::HttpClient;
use super::provider::{DataError, QuoteCandidate, RangeHint, RecentProvider, SymbolSearch};
use crate::domain::{RawPriceRow, Symbol};
use serde::Deserialize;
use tracing::debug;

const SEARCH_URL: &str = "https://query1.finance.yahoo.com/v1/finance/search";
const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<QuoteCandidate>,
}

/// Yahoo v1 search: `q` → list of quotes.
pub struct YahooSearch {
    http: HttpClient,
    quotes_count: u32,
}

impl YahooSearch {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            quotes_count: 5,
        }
    }

    fn parse(body: &str) -> Result<Vec<QuoteCandidate>, DataError> {
        let resp: SearchResponse = serde_json::from_str(body).map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse search response: {e}"))
        })?;
        Ok(resp.quotes)
    }
}

impl SymbolSearch for YahooSearch {
    fn search(&self, query: &str) -> Result<Vec<QuoteCandidate>, DataError> {
        let count = self.quotes_count.to_string();
        let body = self.http.get_text(
            SEARCH_URL,
            &[("q", query), ("quotesCount", &count), ("newsCount", "0")],
        )?;
        let quotes = Self::parse(&body)?;
        debug!(query, candidates = quotes.len(), "yahoo search");
        Ok(quotes)
    }
}

// ── Chart API ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

/// Yahoo v8 chart: recent daily bars for one symbol.
pub struct YahooChart {
    http: HttpClient,
}

impl YahooChart {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Yahoo lists U.S. listings without a suffix; other markets keep theirs.
    pub fn yahoo_ticker(symbol: &Symbol) -> &str {
        if symbol.suffix() == "US" {
            symbol.ticker()
        } else {
            symbol.as_str()
        }
    }

    fn parse(symbol: &Symbol, body: &str) -> Result<Vec<RawPriceRow>, DataError> {
        let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse chart for {symbol}: {e}"))
        })?;

        let Some(result) = resp.chart.result else {
            return match resp.chart.error {
                Some(err) if err.code == "Not Found" => Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                }),
                Some(err) => Err(DataError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                ))),
                None => Ok(Vec::new()),
            };
        };

        let Some(data) = result.into_iter().next() else {
            return Ok(Vec::new());
        };
        let timestamps = data.timestamp.unwrap_or_default();
        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

        let mut rows = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Holidays come back as all-null rows
            if open.is_none() && high.is_none() && low.is_none() && close.is_none() {
                continue;
            }

            rows.push(RawPriceRow {
                date: chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()),
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0.0),
            });
        }

        Ok(rows)
    }
}

impl RecentProvider for YahooChart {
    fn fetch_recent(
        &self,
        symbol: &Symbol,
        range: RangeHint,
    ) -> Result<Vec<RawPriceRow>, DataError> {
        let url = format!("{CHART_URL}/{}", Self::yahoo_ticker(symbol));
        let body = self.http.get_text(
            &url,
            &[("range", range.as_str()), ("interval", "1d"), ("events", "history")],
        )?;
        let rows = Self::parse(symbol, &body)?;
        debug!(%symbol, %range, rows = rows.len(), "yahoo chart");
        Ok(rows)
    }
}
