//! Incremental price collection: watermark filtering and series merging.

pub mod merge;
pub mod watermark;

pub use merge::{merge_prices, MergeOutcome};
pub use watermark::{Watermark, Watermarks, EPOCH_WATERMARK};
