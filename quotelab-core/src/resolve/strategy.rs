//! Resolution steps, tried in priority order by the resolver.
//!
//! Each step either declines (`None`) or makes a decision. A decision is
//! either a finished symbol or a candidate value that still needs suffix
//! inference.

use super::tables;
use crate::data::SymbolSearch;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Use as-is (uppercased).
    Final(String),
    /// Still needs a market suffix unless it already carries one.
    Candidate {
        value: String,
        exchange: Option<String>,
    },
}

pub trait ResolveStep {
    fn name(&self) -> &'static str;

    /// `query` is already trimmed and non-empty.
    fn attempt(&self, query: &str) -> Option<Resolution>;
}

/// Input that already contains a `.` is a qualified symbol.
pub struct QualifiedInput;

impl ResolveStep for QualifiedInput {
    fn name(&self) -> &'static str {
        "qualified"
    }

    fn attempt(&self, query: &str) -> Option<Resolution> {
        query
            .contains('.')
            .then(|| Resolution::Final(query.to_string()))
    }
}

/// Fixed company-name alias table.
pub struct AliasTable;

impl ResolveStep for AliasTable {
    fn name(&self) -> &'static str {
        "alias"
    }

    fn attempt(&self, query: &str) -> Option<Resolution> {
        tables::alias_for(query).map(|target| Resolution::Final(target.to_string()))
    }
}

/// External name/ticker search.
///
/// Prefers the first equity quote, then the first quote of any kind. A
/// failing search is logged and treated as "no decision".
pub struct SearchLookup<'a> {
    search: &'a dyn SymbolSearch,
}

impl<'a> SearchLookup<'a> {
    pub fn new(search: &'a dyn SymbolSearch) -> Self {
        Self { search }
    }
}

impl ResolveStep for SearchLookup<'_> {
    fn name(&self) -> &'static str {
        "search"
    }

    fn attempt(&self, query: &str) -> Option<Resolution> {
        let quotes = match self.search.search(query) {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!(query, error = %e, "symbol lookup failed, falling back to raw input");
                return None;
            }
        };

        let chosen = quotes
            .iter()
            .find(|q| q.is_equity() && q.symbol().is_some())
            .or_else(|| quotes.first())?;

        Some(Resolution::Candidate {
            value: chosen.symbol().unwrap_or(query).to_string(),
            exchange: chosen.exchange.clone(),
        })
    }
}

/// Last resort: the query itself.
pub struct RawInput;

impl ResolveStep for RawInput {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn attempt(&self, query: &str) -> Option<Resolution> {
        Some(Resolution::Candidate {
            value: query.to_string(),
            exchange: None,
        })
    }
}
