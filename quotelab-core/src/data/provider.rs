//! Provider traits and structured error types.
//!
//! The traits abstract over the remote services (Yahoo search, Stooq CSV,
//! Yahoo chart) so the resolver, collector and analyzer can be driven by
//! in-memory fakes in tests.

use super::http::HttpError;
use crate::domain::{RawPriceRow, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One quote returned by a name/ticker search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteCandidate {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, rename = "quoteType")]
    pub quote_type: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
}

impl QuoteCandidate {
    pub fn new(symbol: &str, quote_type: &str, exchange: &str) -> Self {
        Self {
            symbol: Some(symbol.to_string()),
            quote_type: Some(quote_type.to_string()),
            exchange: Some(exchange.to_string()),
        }
    }

    pub fn is_equity(&self) -> bool {
        self.quote_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("equity"))
    }

    /// Non-blank symbol, trimmed.
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Bar interval accepted by the history provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    pub fn code(&self) -> &'static str {
        match self {
            Interval::Daily => "d",
            Interval::Weekly => "w",
            Interval::Monthly => "m",
        }
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "d" | "daily" => Ok(Interval::Daily),
            "w" | "weekly" => Ok(Interval::Weekly),
            "m" | "monthly" => Ok(Interval::Monthly),
            other => Err(format!("unknown interval '{other}' (expected d, w or m)")),
        }
    }
}

impl TryFrom<String> for Interval {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(interval: Interval) -> Self {
        interval.code().to_string()
    }
}

/// How far back an on-demand fetch reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RangeHint {
    OneMonth,
    #[default]
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl RangeHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeHint::OneMonth => "1mo",
            RangeHint::ThreeMonths => "3mo",
            RangeHint::SixMonths => "6mo",
            RangeHint::OneYear => "1y",
        }
    }
}

impl fmt::Display for RangeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RangeHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1mo" => Ok(RangeHint::OneMonth),
            "3mo" => Ok(RangeHint::ThreeMonths),
            "6mo" => Ok(RangeHint::SixMonths),
            "1y" => Ok(RangeHint::OneYear),
            other => Err(format!("unknown range '{other}' (expected 1mo, 3mo, 6mo or 1y)")),
        }
    }
}

impl TryFrom<String> for RangeHint {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RangeHint> for String {
    fn from(range: RangeHint) -> Self {
        range.as_str().to_string()
    }
}

/// Structured error types for provider calls.
#[derive(Debug, Error)]
pub enum DataError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },
}

impl DataError {
    /// True for timeouts and connection failures, where the remote side may
    /// still be working on the request.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, DataError::Http(e) if e.is_connectivity())
    }
}

/// Name/ticker search. Zero results is not an error.
pub trait SymbolSearch: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<QuoteCandidate>, DataError>;
}

/// Full daily (or coarser) history for a symbol.
pub trait HistoryProvider: Send + Sync {
    fn name(&self) -> &str;

    fn fetch_history(&self, symbol: &Symbol, interval: Interval)
        -> Result<Vec<RawPriceRow>, DataError>;
}

/// Short on-demand history used when a symbol has no collected prices yet.
pub trait RecentProvider: Send + Sync {
    fn fetch_recent(&self, symbol: &Symbol, range: RangeHint)
        -> Result<Vec<RawPriceRow>, DataError>;
}
