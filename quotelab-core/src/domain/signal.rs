//! Trading signals and the persisted signal log row.

use super::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Categorical recommendation produced by an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Signal::Buy),
            "SELL" => Ok(Signal::Sell),
            "HOLD" => Ok(Signal::Hold),
            other => Err(format!("unknown signal '{other}'")),
        }
    }
}

/// One row of the signal log. At most one row per `key` is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    /// `symbol|type`
    pub key: String,
    pub symbol: Symbol,
    /// Tag of the analysis method that produced the row.
    #[serde(rename = "type")]
    pub kind: String,
    /// As-of date reported for the analysis (`YYYY-MM-DD`).
    pub date: String,
    pub value: Signal,
    /// Model confidence in 0..1; empty when unknown.
    pub threshold: Option<f64>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl SignalRow {
    pub fn key_for(symbol: &Symbol, kind: &str) -> String {
        format!("{symbol}|{kind}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_parses_case_insensitively() {
        assert_eq!("buy".parse::<Signal>(), Ok(Signal::Buy));
        assert_eq!(" Sell ".parse::<Signal>(), Ok(Signal::Sell));
        assert!("STRONG BUY".parse::<Signal>().is_err());
    }

    #[test]
    fn signal_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Signal::Hold).unwrap(), "\"HOLD\"");
    }

    #[test]
    fn key_joins_symbol_and_type() {
        let sym = Symbol::parse("TSLA.US").unwrap();
        assert_eq!(SignalRow::key_for(&sym, "gemini"), "TSLA.US|gemini");
    }
}
