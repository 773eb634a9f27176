//! Symbol: canonical `TICKER.SUFFIX` identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError {
    #[error("symbol '{0}' has no market suffix")]
    MissingSuffix(String),

    #[error("symbol '{0}' has an empty ticker")]
    EmptyTicker(String),
}

/// Exchange-qualified instrument identifier, e.g. `AAPL.US` or `005930.KS`.
///
/// Always uppercase and always carries a suffix. Construct through
/// [`Symbol::parse`] or the resolver; deserialization goes through the
/// same validation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse an already-qualified symbol. The input is trimmed and uppercased.
    pub fn parse(raw: &str) -> Result<Self, SymbolError> {
        let value = raw.trim().to_uppercase();
        match value.split_once('.') {
            None => Err(SymbolError::MissingSuffix(value)),
            Some((ticker, _)) if ticker.is_empty() => Err(SymbolError::EmptyTicker(value)),
            Some((_, suffix)) if suffix.is_empty() => Err(SymbolError::MissingSuffix(value)),
            Some(_) => Ok(Self(value)),
        }
    }

    /// Join a bare ticker and a market suffix.
    pub fn qualified(ticker: &str, suffix: &str) -> Result<Self, SymbolError> {
        Self::parse(&format!("{}.{}", ticker.trim(), suffix.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Portion before the first `.`.
    pub fn ticker(&self) -> &str {
        self.0.split_once('.').map(|(t, _)| t).unwrap_or(&self.0)
    }

    /// Portion after the first `.`.
    pub fn suffix(&self) -> &str {
        self.0.split_once('.').map(|(_, s)| s).unwrap_or("")
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
