//! Collector run: resolve → fetch → merge for every watchlist entry, then
//! one full rewrite of the price series and the watermark report.
//!
//! Failures stay local to their entry: a symbol whose fetch fails keeps its
//! previous rows and watermark, and the other entries still merge.

use crate::config::{CollectorConfig, WatchlistEntry};
use quotelab_core::collect::{merge_prices, Watermark, Watermarks};
use quotelab_core::data::{HistoryProvider, Interval};
use quotelab_core::domain::{PriceRow, Symbol};
use quotelab_core::resolve::Resolver;
use quotelab_core::store::{rewrite, StoreError, TableStore};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("price store: {0}")]
    Prices(#[source] StoreError),

    #[error("watermark store: {0}")]
    State(#[source] StoreError),
}

/// What happened to one watchlist entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryOutcome {
    Merged { symbol: Symbol, added: usize },
    Skipped,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryReport {
    pub target: String,
    pub outcome: EntryOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionSummary {
    pub entries: Vec<EntryReport>,
    /// Rows in the series after the run.
    pub total_rows: usize,
    pub watermarks: Vec<Watermark>,
}

impl CollectionSummary {
    pub fn merged(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Merged { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Failed { .. }))
    }

    pub fn rows_added(&self) -> usize {
        self.entries
            .iter()
            .map(|e| match e.outcome {
                EntryOutcome::Merged { added, .. } => added,
                _ => 0,
            })
            .sum()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&EntryOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

/// Progress callback for collection runs.
pub trait CollectProgress {
    fn on_start(&self, target: &str, index: usize, total: usize);

    fn on_complete(&self, target: &str, index: usize, total: usize, outcome: &EntryOutcome);

    fn on_batch_complete(&self, summary: &CollectionSummary);
}

/// Reports progress through `tracing`.
pub struct LogProgress;

impl CollectProgress for LogProgress {
    fn on_start(&self, target: &str, index: usize, total: usize) {
        info!("[{}/{}] collecting {target}", index + 1, total);
    }

    fn on_complete(&self, target: &str, _index: usize, _total: usize, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Merged { symbol, added } => {
                info!(%symbol, added, "{target}: merged")
            }
            EntryOutcome::Skipped => info!("{target}: inactive, skipped"),
            EntryOutcome::Failed { reason } => warn!("{target}: FAILED: {reason}"),
        }
    }

    fn on_batch_complete(&self, summary: &CollectionSummary) {
        info!(
            merged = summary.merged(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            rows_added = summary.rows_added(),
            total_rows = summary.total_rows,
            "collection finished"
        );
    }
}

pub struct Collector<'a> {
    resolver: Resolver<'a>,
    history: &'a dyn HistoryProvider,
    default_suffix: String,
    default_interval: Interval,
}

impl<'a> Collector<'a> {
    pub fn new(
        resolver: Resolver<'a>,
        history: &'a dyn HistoryProvider,
        config: &CollectorConfig,
        default_suffix: &str,
    ) -> Self {
        Self {
            resolver,
            history,
            default_suffix: default_suffix.to_string(),
            default_interval: config.interval,
        }
    }

    /// Collect every entry of `watchlist` into `prices`, then rewrite `state`
    /// from the merged series.
    pub fn run(
        &self,
        watchlist: &[WatchlistEntry],
        prices: &dyn TableStore<Row = PriceRow>,
        state: &dyn TableStore<Row = Watermark>,
        progress: &dyn CollectProgress,
    ) -> Result<CollectionSummary, CollectError> {
        let total = watchlist.len();

        let (entries, marks, total_rows) = rewrite(prices, |mut series| {
            let mut marks = Watermarks::from_rows(&series);
            let mut entries = Vec::with_capacity(total);

            for (i, entry) in watchlist.iter().enumerate() {
                let target = entry.target().unwrap_or_default().to_string();
                progress.on_start(&target, i, total);

                let outcome = if entry.active {
                    match self.collect_entry(entry, &target, series, &marks) {
                        Ok((merged, next_marks, outcome)) => {
                            series = merged;
                            marks = next_marks;
                            outcome
                        }
                        Err((unchanged, outcome)) => {
                            series = unchanged;
                            outcome
                        }
                    }
                } else {
                    EntryOutcome::Skipped
                };

                progress.on_complete(&target, i, total, &outcome);
                entries.push(EntryReport { target, outcome });
            }

            let total_rows = series.len();
            (series, (entries, marks, total_rows))
        })
        .map_err(CollectError::Prices)?;

        let watermarks = marks.to_rows();
        state.save(&watermarks).map_err(CollectError::State)?;

        let summary = CollectionSummary {
            entries,
            total_rows,
            watermarks,
        };
        progress.on_batch_complete(&summary);
        Ok(summary)
    }

    /// Resolve, fetch and merge one entry. On failure the series is handed
    /// back untouched.
    #[allow(clippy::type_complexity)]
    fn collect_entry(
        &self,
        entry: &WatchlistEntry,
        target: &str,
        series: Vec<PriceRow>,
        marks: &Watermarks,
    ) -> Result<(Vec<PriceRow>, Watermarks, EntryOutcome), (Vec<PriceRow>, EntryOutcome)> {
        let failed = |reason: String| EntryOutcome::Failed { reason };

        let symbol = match self.resolver.resolve(target, &self.default_suffix) {
            Ok(symbol) => symbol,
            Err(e) => return Err((series, failed(e.to_string()))),
        };

        let interval = entry.interval.unwrap_or(self.default_interval);
        let fetched = match self.history.fetch_history(&symbol, interval) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(%symbol, provider = self.history.name(), error = %e, "fetch failed, symbol skipped");
                return Err((series, failed(format!("{symbol}: {e}"))));
            }
        };

        let out = merge_prices(series, fetched, &symbol, marks);
        if out.discarded > 0 {
            info!(%symbol, discarded = out.discarded, "rows at or before watermark ignored");
        }
        let outcome = EntryOutcome::Merged {
            symbol,
            added: out.added,
        };
        Ok((out.series, out.watermarks, outcome))
    }
}
