//! In-memory collaborators shared by the runner integration tests.
#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use quotelab_core::data::{
    DataError, HistoryProvider, HttpError, Interval, QuoteCandidate, RangeHint, RecentProvider,
    SymbolSearch,
};
use quotelab_core::domain::{PriceRow, RawPriceRow, Symbol};
use quotelab_core::llm::{CompletionError, TextCompletion};
use std::collections::HashMap;
use std::sync::Mutex;

pub fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Duration::days(offset)
}

pub fn raw_rows(first: i64, count: i64, close: f64) -> Vec<RawPriceRow> {
    (first..first + count)
        .map(|d| RawPriceRow {
            date: Some(day(d)),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close: close + d as f64,
            volume: 1000.0,
        })
        .collect()
}

pub fn stored_rows(symbol: &str, first: i64, count: i64, close: f64) -> Vec<PriceRow> {
    let symbol = Symbol::parse(symbol).unwrap();
    raw_rows(first, count, close)
        .into_iter()
        .filter_map(|r| r.into_price_row(&symbol))
        .collect()
}

/// Search that knows a fixed set of names.
#[derive(Default)]
pub struct FakeSearch {
    pub quotes: HashMap<String, Vec<QuoteCandidate>>,
}

impl FakeSearch {
    pub fn with(mut self, query: &str, quotes: Vec<QuoteCandidate>) -> Self {
        self.quotes.insert(query.to_string(), quotes);
        self
    }
}

impl SymbolSearch for FakeSearch {
    fn search(&self, query: &str) -> Result<Vec<QuoteCandidate>, DataError> {
        Ok(self.quotes.get(query).cloned().unwrap_or_default())
    }
}

/// History keyed by symbol; symbols listed in `down` time out.
#[derive(Default)]
pub struct FakeHistory {
    pub rows: HashMap<String, Vec<RawPriceRow>>,
    pub down: Vec<String>,
    pub calls: Mutex<Vec<(String, Interval)>>,
}

impl FakeHistory {
    pub fn with(mut self, symbol: &str, rows: Vec<RawPriceRow>) -> Self {
        self.rows.insert(symbol.to_string(), rows);
        self
    }

    pub fn failing(mut self, symbol: &str) -> Self {
        self.down.push(symbol.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, Interval)> {
        self.calls.lock().unwrap().clone()
    }
}

impl HistoryProvider for FakeHistory {
    fn name(&self) -> &str {
        "fake"
    }

    fn fetch_history(&self, symbol: &Symbol, interval: Interval) -> Result<Vec<RawPriceRow>, DataError> {
        self.calls
            .lock()
            .unwrap()
            .push((symbol.to_string(), interval));
        if self.down.iter().any(|s| s == symbol.as_str()) {
            return Err(HttpError::Timeout(format!("history for {symbol}")).into());
        }
        Ok(self.rows.get(symbol.as_str()).cloned().unwrap_or_default())
    }
}

impl RecentProvider for FakeHistory {
    fn fetch_recent(&self, symbol: &Symbol, _range: RangeHint) -> Result<Vec<RawPriceRow>, DataError> {
        self.fetch_history(symbol, Interval::Daily)
    }
}

enum Reply {
    Text(String),
    Timeout,
    Status(u16),
}

/// Model that answers every prompt the same way and records what it saw.
pub struct FakeModel {
    reply: Reply,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl FakeModel {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Reply::Text(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn timing_out() -> Self {
        Self {
            reply: Reply::Timeout,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn status(code: u16) -> Self {
        Self {
            reply: Reply::Status(code),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<(String, String)> {
        self.prompts.lock().unwrap().last().cloned()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl TextCompletion for FakeModel {
    fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError> {
        self.prompts
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Timeout => Err(HttpError::Timeout("generateContent".into()).into()),
            Reply::Status(code) => Err(HttpError::Status {
                code: *code,
                url: "https://generativelanguage.googleapis.com".into(),
            }
            .into()),
        }
    }
}
