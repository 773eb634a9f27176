//! Analyzer request: resolve → window → prompt → model → parse → signal log.

use crate::config::AnalyzerConfig;
use chrono::{DateTime, Utc};
use quotelab_core::analyze::{
    build_prompt, build_window, is_tracked, merge_signals, parse_response, signal_row,
    PriceWindow,
};
use quotelab_core::collect::{merge_prices, Watermarks};
use quotelab_core::data::{DataError, HttpError, RangeHint, RecentProvider};
use quotelab_core::domain::{PriceRow, Signal, SignalRow, Symbol};
use quotelab_core::llm::{CompletionError, TextCompletion};
use quotelab_core::resolve::{ResolutionError, Resolver};
use quotelab_core::store::{rewrite, StoreError, TableStore};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("on-demand history: {0}")]
    Data(#[from] DataError),

    #[error("model call: {0}")]
    Completion(#[from] CompletionError),

    #[error("store: {0}")]
    Store(#[from] StoreError),
}

impl AnalyzeError {
    /// Timeout or connection failure: the remote side may still finish.
    pub fn is_connectivity(&self) -> bool {
        match self {
            AnalyzeError::Data(e) => e.is_connectivity(),
            AnalyzeError::Completion(e) => e.is_connectivity(),
            _ => false,
        }
    }

    /// Status code and URL when a remote call answered with a non-2xx status.
    pub fn http_status(&self) -> Option<(u16, &str)> {
        let http = match self {
            AnalyzeError::Data(DataError::Http(e)) => e,
            AnalyzeError::Completion(CompletionError::Http(e)) => e,
            _ => return None,
        };
        match http {
            HttpError::Status { code, url } => Some((*code, url.as_str())),
            _ => None,
        }
    }
}

/// One analysis invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub query: String,
    pub lookback: usize,
    pub model: String,
}

impl AnalysisRequest {
    /// Request with the configured lookback and model.
    pub fn new(query: impl Into<String>, config: &AnalyzerConfig) -> Self {
        Self {
            query: query.into(),
            lookback: config.lookback,
            model: config.model.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), AnalyzeError> {
        if self.lookback == 0 {
            return Err(AnalyzeError::InvalidRequest("lookback must be at least 1".into()));
        }
        if self.model.trim().is_empty() {
            return Err(AnalyzeError::InvalidRequest("model must not be empty".into()));
        }
        Ok(())
    }
}

/// What the caller gets back: the row written to the signal log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub symbol: Symbol,
    pub date: String,
    pub value: Signal,
    pub threshold: Option<f64>,
    pub message: String,
}

impl From<&SignalRow> for AnalysisOutcome {
    fn from(row: &SignalRow) -> Self {
        Self {
            symbol: row.symbol.clone(),
            date: row.date.clone(),
            value: row.value,
            threshold: row.threshold,
            message: row.message.clone(),
        }
    }
}

pub struct Analyzer<'a> {
    resolver: Resolver<'a>,
    recent: Option<&'a dyn RecentProvider>,
    model: &'a dyn TextCompletion,
    default_suffix: String,
    signal_type: String,
    recent_range: RangeHint,
}

impl<'a> Analyzer<'a> {
    pub fn new(
        resolver: Resolver<'a>,
        recent: Option<&'a dyn RecentProvider>,
        model: &'a dyn TextCompletion,
        config: &AnalyzerConfig,
        default_suffix: &str,
    ) -> Self {
        Self {
            resolver,
            recent,
            model,
            default_suffix: default_suffix.to_string(),
            signal_type: config.signal_type.clone(),
            recent_range: config.recent_range,
        }
    }

    pub fn analyze(
        &self,
        request: &AnalysisRequest,
        prices: &dyn TableStore<Row = PriceRow>,
        signals: &dyn TableStore<Row = SignalRow>,
    ) -> Result<AnalysisOutcome, AnalyzeError> {
        self.analyze_at(request, prices, signals, Utc::now())
    }

    /// [`Analyzer::analyze`] with an explicit creation time for the log row.
    pub fn analyze_at(
        &self,
        request: &AnalysisRequest,
        prices: &dyn TableStore<Row = PriceRow>,
        signals: &dyn TableStore<Row = SignalRow>,
        now: DateTime<Utc>,
    ) -> Result<AnalysisOutcome, AnalyzeError> {
        request.validate()?;
        let symbol = self.resolver.resolve(&request.query, &self.default_suffix)?;

        let series = prices.load()?;
        let window = self.window_for(&series, &symbol, request.lookback)?;
        if window.is_empty() {
            warn!(%symbol, "no price history, the model sees an empty window");
        }

        let prompt = build_prompt(&window);
        debug!(%symbol, rows = window.len(), chars = prompt.len(), "prompt built");
        let completion = self.model.complete(&request.model, &prompt)?;

        let payload = parse_response(&completion, &symbol, &window.as_of_text());
        compare_sma(&window, "sma20", 20, payload.sma20);
        compare_sma(&window, "sma60", 60, payload.sma60);
        if !payload.symbol.eq_ignore_ascii_case(symbol.as_str()) {
            debug!(%symbol, reported = %payload.symbol, "model reported a different symbol");
        }

        let row = signal_row(&payload, &symbol, &self.signal_type, window.as_of, now);
        let outcome = AnalysisOutcome::from(&row);
        rewrite(signals, |existing| (merge_signals(existing, vec![row]), ()))?;

        info!(
            %symbol,
            date = %outcome.date,
            signal = %outcome.value,
            confidence = outcome.threshold.unwrap_or_default(),
            "signal recorded"
        );
        Ok(outcome)
    }

    /// Run several requests; each result stands on its own.
    pub fn analyze_batch(
        &self,
        requests: &[AnalysisRequest],
        prices: &dyn TableStore<Row = PriceRow>,
        signals: &dyn TableStore<Row = SignalRow>,
    ) -> Vec<Result<AnalysisOutcome, AnalyzeError>> {
        requests
            .iter()
            .map(|request| {
                let result = self.analyze(request, prices, signals);
                if let Err(e) = &result {
                    warn!(query = %request.query, error = %e, "analysis failed");
                }
                result
            })
            .collect()
    }

    /// Window from the stored series, falling back once to an on-demand
    /// fetch for symbols the collector has never seen.
    fn window_for(
        &self,
        series: &[PriceRow],
        symbol: &Symbol,
        lookback: usize,
    ) -> Result<PriceWindow, AnalyzeError> {
        let window = build_window(series, symbol, lookback);
        if !window.is_empty() || is_tracked(series, symbol) {
            return Ok(window);
        }
        let Some(recent) = self.recent else {
            return Ok(window);
        };

        info!(%symbol, range = %self.recent_range, "symbol not collected yet, fetching recent history");
        let fetched = recent.fetch_recent(symbol, self.recent_range)?;
        let out = merge_prices(Vec::new(), fetched, symbol, &Watermarks::default());
        if out.discarded > 0 {
            debug!(%symbol, discarded = out.discarded, "dropped unusable on-demand rows");
        }
        Ok(build_window(&out.series, symbol, lookback))
    }
}

fn compare_sma(window: &PriceWindow, indicator: &str, k: usize, reported: Option<f64>) {
    let local = window.sma(k);
    match (local, reported) {
        (Some(local), Some(reported)) if (local - reported).abs() > local.abs() * 0.01 => {
            debug!(symbol = %window.symbol, indicator, local, reported, "model SMA differs from local SMA");
        }
        (None, Some(reported)) => {
            debug!(symbol = %window.symbol, indicator, reported, "model reported an SMA the window cannot support");
        }
        _ => {}
    }
}
