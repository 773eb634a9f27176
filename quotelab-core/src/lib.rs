//! QuoteLab Core: symbol resolution, price collection and LLM signal analysis.
//!
//! This crate holds everything that does not depend on configuration:
//! - Domain types (symbols, price rows, signals, signal log rows)
//! - Symbol Resolver with an ordered list of resolution steps
//! - Price Merger and Watermark Tracker for incremental collection
//! - Window Builder, Prompt Builder and Response Parser for analysis
//! - Signal Merger for the signal log
//! - Collaborator traits with HTTP implementations (Yahoo, Stooq, Gemini)
//! - Full-replace tabular stores (CSV, Parquet, in-memory)

pub mod analyze;
pub mod collect;
pub mod data;
pub mod domain;
pub mod llm;
pub mod resolve;
pub mod store;
