//! Symbol resolution: free-form query → canonical `TICKER.SUFFIX`.
//!
//! Precedence, first decision wins:
//! 1. qualified input (contains `.`)
//! 2. alias table
//! 3. external search (first equity, else first quote)
//! 4. the raw query
//!
//! Candidates from steps 3 and 4 are uppercased and, when they carry no
//! suffix, get one from the exchange table or the caller's default.

pub mod strategy;
pub mod tables;

pub use strategy::{AliasTable, QualifiedInput, RawInput, Resolution, ResolveStep, SearchLookup};

use crate::data::SymbolSearch;
use crate::domain::{Symbol, SymbolError};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_SUFFIX: &str = "US";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("a symbol or company name is required")]
    EmptyQuery,

    #[error("cannot build a symbol from '{query}': {source}")]
    Malformed {
        query: String,
        #[source]
        source: SymbolError,
    },
}

/// Resolves queries, optionally consulting an external search.
pub struct Resolver<'a> {
    search: Option<&'a dyn SymbolSearch>,
}

impl<'a> Resolver<'a> {
    pub fn new(search: &'a dyn SymbolSearch) -> Self {
        Self {
            search: Some(search),
        }
    }

    /// Resolver that never calls out; bare tickers get the default suffix.
    pub fn offline() -> Self {
        Self { search: None }
    }

    /// The ordered decision list.
    pub fn steps(&self) -> Vec<Box<dyn ResolveStep + 'a>> {
        let mut steps: Vec<Box<dyn ResolveStep + 'a>> =
            vec![Box::new(QualifiedInput), Box::new(AliasTable)];
        if let Some(search) = self.search {
            steps.push(Box::new(SearchLookup::new(search)));
        }
        steps.push(Box::new(RawInput));
        steps
    }

    pub fn resolve(&self, query: &str, default_suffix: &str) -> Result<Symbol, ResolutionError> {
        // A trailing `.` ends a company name ("Alphabet Inc."), not a ticker.
        let query = query.trim().trim_end_matches('.').trim_end();
        if query.is_empty() {
            return Err(ResolutionError::EmptyQuery);
        }

        let (step, resolution) = self
            .steps()
            .iter()
            .find_map(|step| step.attempt(query).map(|r| (step.name(), r)))
            .unwrap_or_else(|| {
                (
                    "raw",
                    Resolution::Candidate {
                        value: query.to_string(),
                        exchange: None,
                    },
                )
            });

        let symbol = match resolution {
            Resolution::Final(value) => Symbol::parse(&value),
            Resolution::Candidate { value, exchange } => {
                qualify(&value, exchange.as_deref(), default_suffix)
            }
        }
        .map_err(|source| ResolutionError::Malformed {
            query: query.to_string(),
            source,
        })?;

        debug!(query, step, %symbol, "resolved symbol");
        Ok(symbol)
    }
}

/// Uppercase `value` and append a suffix unless it already has one.
pub fn qualify(
    value: &str,
    exchange: Option<&str>,
    default_suffix: &str,
) -> Result<Symbol, SymbolError> {
    let value = value.trim().to_uppercase();
    if value.contains('.') {
        return Symbol::parse(&value);
    }
    let suffix = match exchange.and_then(tables::suffix_for_exchange) {
        Some(mapped) => mapped,
        None => default_suffix_or_us(default_suffix),
    };
    Symbol::qualified(&value, suffix)
}

fn default_suffix_or_us(default_suffix: &str) -> &str {
    let trimmed = default_suffix.trim();
    if trimmed.is_empty() {
        DEFAULT_SUFFIX
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataError, HttpError, QuoteCandidate};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSearch {
        quotes: Vec<QuoteCandidate>,
        calls: AtomicUsize,
    }

    impl SymbolSearch for CountingSearch {
        fn search(&self, _query: &str) -> Result<Vec<QuoteCandidate>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.quotes.clone())
        }
    }

    struct DownSearch;

    impl SymbolSearch for DownSearch {
        fn search(&self, _query: &str) -> Result<Vec<QuoteCandidate>, DataError> {
            Err(HttpError::Unreachable("connection refused".into()).into())
        }
    }

    #[test]
    fn empty_query_is_an_error() {
        let r = Resolver::offline();
        assert_eq!(r.resolve("   ", "US"), Err(ResolutionError::EmptyQuery));
    }

    #[test]
    fn qualified_symbol_bypasses_lookup() {
        let search = CountingSearch::default();
        let r = Resolver::new(&search);
        assert_eq!(r.resolve("AAPL.US", "US").unwrap().as_str(), "AAPL.US");
        assert_eq!(r.resolve(" tsla.us ", "KS").unwrap().as_str(), "TSLA.US");
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn alias_beats_search() {
        let search = CountingSearch {
            quotes: vec![QuoteCandidate::new("SSNLF", "EQUITY", "PNK")],
            ..Default::default()
        };
        let r = Resolver::new(&search);
        assert_eq!(r.resolve("삼성전자", "US").unwrap().as_str(), "005930.KS");
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn search_result_gets_exchange_suffix() {
        let search = CountingSearch {
            quotes: vec![QuoteCandidate::new("247540", "EQUITY", "KOS")],
            ..Default::default()
        };
        let r = Resolver::new(&search);
        assert_eq!(r.resolve("ecopro bm", "US").unwrap().as_str(), "247540.KQ");
    }

    #[test]
    fn search_result_with_suffix_is_kept() {
        let search = CountingSearch {
            quotes: vec![QuoteCandidate::new("035720.ks", "EQUITY", "KSC")],
            ..Default::default()
        };
        let r = Resolver::new(&search);
        assert_eq!(r.resolve("kakao corp", "US").unwrap().as_str(), "035720.KS");
    }

    #[test]
    fn unknown_exchange_uses_default_suffix() {
        let search = CountingSearch {
            quotes: vec![QuoteCandidate::new("VOD", "EQUITY", "LSE")],
            ..Default::default()
        };
        let r = Resolver::new(&search);
        assert_eq!(r.resolve("vodafone", "ks").unwrap().as_str(), "VOD.KS");
    }

    #[test]
    fn failing_lookup_falls_back_to_query() {
        let r = Resolver::new(&DownSearch);
        assert_eq!(r.resolve("Apple", "US").unwrap().as_str(), "APPLE.US");
    }

    #[test]
    fn empty_lookup_falls_back_to_query() {
        let search = CountingSearch::default();
        let r = Resolver::new(&search);
        assert_eq!(r.resolve("Apple", "US").unwrap().as_str(), "APPLE.US");
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn blank_default_suffix_means_us() {
        assert_eq!(
            Resolver::offline().resolve("msft", "").unwrap().as_str(),
            "MSFT.US"
        );
    }

    #[test]
    fn malformed_qualified_input_is_rejected() {
        let err = Resolver::offline().resolve(".US", "US").unwrap_err();
        assert!(matches!(err, ResolutionError::Malformed { .. }));
    }

    #[test]
    fn trailing_dot_falls_through_to_search() {
        let search = CountingSearch {
            quotes: vec![QuoteCandidate::new("GOOGL", "EQUITY", "NMS")],
            ..Default::default()
        };
        let r = Resolver::new(&search);
        assert_eq!(r.resolve("Alphabet Inc.", "US").unwrap().as_str(), "GOOGL.US");
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            Resolver::offline().resolve("AAPL.", "US").unwrap().as_str(),
            "AAPL.US"
        );
        assert_eq!(Resolver::offline().resolve(" . ", "US"), Err(ResolutionError::EmptyQuery));
    }

    #[test]
    fn step_order_is_fixed() {
        let search = CountingSearch::default();
        let names: Vec<_> = Resolver::new(&search)
            .steps()
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(names, ["qualified", "alias", "search", "raw"]);
        let offline: Vec<_> = Resolver::offline().steps().iter().map(|s| s.name()).collect();
        assert_eq!(offline, ["qualified", "alias", "raw"]);
    }
}
