//! Stooq daily history (CSV download endpoint).

use super::http::HttpClient;
use super::provider::{DataError, HistoryProvider, Interval};
use crate::domain::{RawPriceRow, Symbol};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

const HISTORY_URL: &str = "https://stooq.com/q/d/l/";

#[derive(Debug, Deserialize)]
struct StooqRow {
    #[serde(rename = "Date", default)]
    date: Option<String>,
    #[serde(rename = "Open", default)]
    open: Option<f64>,
    #[serde(rename = "High", default)]
    high: Option<f64>,
    #[serde(rename = "Low", default)]
    low: Option<f64>,
    #[serde(rename = "Close", default)]
    close: Option<f64>,
    #[serde(rename = "Volume", default)]
    volume: Option<f64>,
}

pub struct StooqProvider {
    http: HttpClient,
}

impl StooqProvider {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Parse the CSV body. Anything without a `Date` header (Stooq answers
    /// `No data` for unknown symbols) is an empty history.
    pub fn parse_csv(body: &str) -> Result<Vec<RawPriceRow>, DataError> {
        let body = body.trim_start_matches('\u{feff}');
        if !body.trim_start().starts_with("Date") {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let mut rows = Vec::new();
        for record in reader.deserialize::<StooqRow>() {
            let row = record.map_err(|e| {
                DataError::ResponseFormatChanged(format!("malformed stooq CSV row: {e}"))
            })?;
            let date = row
                .date
                .as_deref()
                .filter(|d| !d.is_empty())
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
            rows.push(RawPriceRow {
                date,
                open: row.open.unwrap_or(f64::NAN),
                high: row.high.unwrap_or(f64::NAN),
                low: row.low.unwrap_or(f64::NAN),
                close: row.close.unwrap_or(f64::NAN),
                volume: row.volume.unwrap_or(0.0),
            });
        }
        Ok(rows)
    }
}

impl HistoryProvider for StooqProvider {
    fn name(&self) -> &str {
        "stooq"
    }

    fn fetch_history(
        &self,
        symbol: &Symbol,
        interval: Interval,
    ) -> Result<Vec<RawPriceRow>, DataError> {
        let stooq_symbol = symbol.as_str().to_lowercase();
        let body = self.http.get_text(
            HISTORY_URL,
            &[("s", stooq_symbol.as_str()), ("i", interval.code())],
        )?;
        let rows = Self::parse_csv(&body)?;
        debug!(%symbol, interval = interval.code(), rows = rows.len(), "stooq history");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_daily_csv() {
        let body = "Date,Open,High,Low,Close,Volume\n\
                    2024-01-02,187.15,188.44,183.885,185.64,82488674\n\
                    2024-01-03,184.22,185.88,183.43,184.25,58414460\n";
        let rows = StooqProvider::parse_csv(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(rows[0].low, 183.885);
        assert_eq!(rows[1].volume, 58414460.0);
    }

    #[test]
    fn no_data_body_is_empty() {
        assert!(StooqProvider::parse_csv("No data").unwrap().is_empty());
        assert!(StooqProvider::parse_csv("").unwrap().is_empty());
    }

    #[test]
    fn missing_volume_column_defaults_to_zero() {
        let body = "Date,Open,High,Low,Close\n2024-01-02,1,2,0.5,1.5\n";
        let rows = StooqProvider::parse_csv(body).unwrap();
        assert_eq!(rows[0].volume, 0.0);
    }

    #[test]
    fn blank_date_is_kept_as_none() {
        let body = "Date,Open,High,Low,Close,Volume\n,1,2,0.5,1.5,10\n";
        let rows = StooqProvider::parse_csv(body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, None);
    }
}
