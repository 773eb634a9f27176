//! Domain types shared by the collector and the analyzer.

pub mod price;
pub mod signal;
pub mod symbol;

pub use price::{PriceRow, RawPriceRow};
pub use signal::{Signal, SignalRow};
pub use symbol::{Symbol, SymbolError};
