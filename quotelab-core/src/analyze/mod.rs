//! Analysis path: price window → prompt → model → parsed signal → signal log.

pub mod parse;
pub mod prompt;
pub mod signals;
pub mod window;

pub use parse::{clean_response, parse_response, AnalysisPayload, SUMMARY_FALLBACK_CHARS};
pub use prompt::build_prompt;
pub use signals::{merge_signals, signal_row};
pub use window::{build_window, is_tracked, PriceWindow};
