//! Market-data collaborators: symbol search, daily history, recent history.

pub mod http;
pub mod provider;
pub mod stooq;
pub mod yahoo;

pub use http::{HttpClient, HttpError};
pub use provider::{
    DataError, HistoryProvider, Interval, QuoteCandidate, RangeHint, RecentProvider,
    SymbolSearch,
};
pub use stooq::StooqProvider;
pub use yahoo::{YahooChart, YahooSearch};
