//! QuoteLab Runner: configuration plus the collector and analyzer jobs.
//!
//! This crate wires `quotelab-core` into the two jobs the system performs:
//! - Collection: watchlist → resolve → fetch → merge → rewrite prices and watermarks
//! - Analysis: query → window → prompt → model → parse → rewrite signal log

pub mod analyzer;
pub mod collector;
pub mod config;

pub use analyzer::{AnalysisOutcome, AnalysisRequest, AnalyzeError, Analyzer};
pub use collector::{
    CollectError, CollectProgress, CollectionSummary, Collector, EntryOutcome, EntryReport,
    LogProgress,
};
pub use config::{
    AnalyzerConfig, AppConfig, CollectorConfig, ConfigError, HttpConfig, ResolverConfig,
    StorageConfig, WatchlistEntry, DEFAULT_CONFIG_FILE,
};
