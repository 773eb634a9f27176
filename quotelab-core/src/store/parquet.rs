//! Parquet-backed price series with a JSON metadata sidecar.
//!
//! Layout: `{path}` holds every symbol's rows ordered by (symbol, date);
//! `{path stem}.meta.json` records what was written and a BLAKE3 hash of it.

use super::{write_atomic, StoreError, TableStore};
use crate::domain::{PriceRow, Symbol};
use chrono::{DateTime, NaiveDate, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const COLUMNS: [&str; 7] = ["symbol", "date", "open", "high", "low", "close", "volume"];

/// Metadata sidecar describing the last write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTableMeta {
    pub symbols: Vec<String>,
    pub row_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub data_hash: String,
    pub written_at: DateTime<Utc>,
}

impl PriceTableMeta {
    fn describe(rows: &[PriceRow]) -> Result<Self, serde_json::Error> {
        let symbols: BTreeSet<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
        Ok(Self {
            symbols: symbols.into_iter().map(str::to_string).collect(),
            row_count: rows.len(),
            first_date: rows.iter().map(|r| r.date).min(),
            last_date: rows.iter().map(|r| r.date).max(),
            data_hash: data_hash(rows)?,
            written_at: Utc::now(),
        })
    }
}

/// BLAKE3 of the JSON-serialized rows.
pub fn data_hash(rows: &[PriceRow]) -> Result<String, serde_json::Error> {
    Ok(blake3::hash(&serde_json::to_vec(rows)?).to_hex().to_string())
}

pub struct ParquetPriceTable {
    name: String,
    path: PathBuf,
}

impl ParquetPriceTable {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `prices.parquet` → `prices.meta.json`
    pub fn meta_path(&self) -> PathBuf {
        self.path.with_extension("meta.json")
    }

    /// Metadata of the last save, if any.
    pub fn meta(&self) -> Result<Option<PriceTableMeta>, StoreError> {
        let path = self.meta_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Meta {
                path,
                message: e.to_string(),
            })
    }

    fn parquet_err(&self, what: &str, e: impl std::fmt::Display) -> StoreError {
        StoreError::Parquet {
            path: self.path.clone(),
            message: format!("{what}: {e}"),
        }
    }

    fn meta_err(&self, e: impl std::fmt::Display) -> StoreError {
        StoreError::Meta {
            path: self.meta_path(),
            message: e.to_string(),
        }
    }

    fn frame_from_rows(&self, rows: &[PriceRow]) -> Result<DataFrame, StoreError> {
        let symbols: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
        let dates: Vec<i32> = rows.iter().map(|r| days_since_epoch(r.date)).collect();
        let opens: Vec<f64> = rows.iter().map(|r| r.open).collect();
        let highs: Vec<f64> = rows.iter().map(|r| r.high).collect();
        let lows: Vec<f64> = rows.iter().map(|r| r.low).collect();
        let closes: Vec<f64> = rows.iter().map(|r| r.close).collect();
        let volumes: Vec<f64> = rows.iter().map(|r| r.volume).collect();

        DataFrame::new(vec![
            Column::new("symbol".into(), symbols),
            Column::new("date".into(), dates)
                .cast(&DataType::Date)
                .map_err(|e| self.parquet_err("date cast", e))?,
            Column::new("open".into(), opens),
            Column::new("high".into(), highs),
            Column::new("low".into(), lows),
            Column::new("close".into(), closes),
            Column::new("volume".into(), volumes),
        ])
        .map_err(|e| self.parquet_err("dataframe creation", e))
    }

    fn rows_from_frame(&self, df: &DataFrame) -> Result<Vec<PriceRow>, StoreError> {
        for name in COLUMNS {
            if df.column(name).is_err() {
                return Err(self.parquet_err("missing column", name));
            }
        }
        let col = |name: &str| {
            df.column(name)
                .map_err(|e| self.parquet_err("column read", e))
        };

        let symbol_ca = col("symbol")?
            .str()
            .map_err(|e| self.parquet_err("symbol column type", e))?;
        let date_ca = col("date")?
            .date()
            .map_err(|e| self.parquet_err("date column type", e))?;
        let open_ca = col("open")?
            .f64()
            .map_err(|e| self.parquet_err("open column type", e))?;
        let high_ca = col("high")?
            .f64()
            .map_err(|e| self.parquet_err("high column type", e))?;
        let low_ca = col("low")?
            .f64()
            .map_err(|e| self.parquet_err("low column type", e))?;
        let close_ca = col("close")?
            .f64()
            .map_err(|e| self.parquet_err("close column type", e))?;
        let volume_ca = col("volume")?
            .f64()
            .map_err(|e| self.parquet_err("volume column type", e))?;

        let n = df.height();
        let mut rows = Vec::with_capacity(n);
        for i in 0..n {
            let raw_symbol = symbol_ca
                .get(i)
                .ok_or_else(|| self.parquet_err("null symbol", format!("row {i}")))?;
            let symbol =
                Symbol::parse(raw_symbol).map_err(|e| self.parquet_err("bad symbol", e))?;
            let days = date_ca
                .get(i)
                .ok_or_else(|| self.parquet_err("null date", format!("row {i}")))?;
            let date = date_from_days(days)
                .ok_or_else(|| self.parquet_err("date out of range", days))?;

            rows.push(PriceRow {
                symbol,
                date,
                open: open_ca.get(i).unwrap_or(f64::NAN),
                high: high_ca.get(i).unwrap_or(f64::NAN),
                low: low_ca.get(i).unwrap_or(f64::NAN),
                close: close_ca.get(i).unwrap_or(f64::NAN),
                volume: volume_ca.get(i).unwrap_or(0.0),
            });
        }
        Ok(rows)
    }
}

impl TableStore for ParquetPriceTable {
    type Row = PriceRow;

    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Vec<PriceRow>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let df = ParquetReader::new(file)
            .finish()
            .map_err(|e| self.parquet_err("read", e))?;
        let rows = self.rows_from_frame(&df)?;

        if let Ok(Some(meta)) = self.meta() {
            let hash = data_hash(&rows).map_err(|e| self.meta_err(e))?;
            if meta.data_hash != hash || meta.row_count != rows.len() {
                warn!(
                    table = %self.name,
                    path = %self.path.display(),
                    "price table does not match its metadata sidecar"
                );
            }
        }
        Ok(rows)
    }

    fn save(&self, rows: &[PriceRow]) -> Result<(), StoreError> {
        let mut df = self.frame_from_rows(rows)?;
        write_atomic(&self.path, |out| {
            ParquetWriter::new(out)
                .finish(&mut df)
                .map(|_| ())
                .map_err(|e| self.parquet_err("write", e))
        })?;

        let meta = PriceTableMeta::describe(rows).map_err(|e| self.meta_err(e))?;
        let json = serde_json::to_string_pretty(&meta).map_err(|e| self.meta_err(e))?;
        write_atomic(&self.meta_path(), |out| {
            use std::io::Write;
            out.write_all(json.as_bytes())
                .map_err(|e| StoreError::io(&self.meta_path(), e))
        })
    }
}

// NaiveDate::default() is 1970-01-01, the polars Date epoch.
fn days_since_epoch(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}

fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::default().checked_add_signed(chrono::Duration::days(days as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::rewrite;

    fn row(sym: &str, d: u32, close: f64) -> PriceRow {
        PriceRow {
            symbol: Symbol::parse(sym).unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            open: close - 1.0,
            high: close + 1.5,
            low: close - 2.25,
            close,
            volume: 1_000_000.0,
        }
    }

    fn table(dir: &Path) -> ParquetPriceTable {
        ParquetPriceTable::new("prices", dir.join("prices.parquet"))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let t = table(dir.path());
        assert!(t.load().unwrap().is_empty());
        assert!(t.meta().unwrap().is_none());
    }

    #[test]
    fn write_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let t = table(dir.path());
        let rows = vec![row("005930.KS", 2, 74300.0), row("AAPL.US", 2, 185.64), row("AAPL.US", 3, 184.25)];
        t.save(&rows).unwrap();
        assert_eq!(t.load().unwrap(), rows);
        assert!(!dir.path().join("prices.parquet.tmp").exists());
    }

    #[test]
    fn meta_sidecar_describes_rows() {
        let dir = tempfile::tempdir().unwrap();
        let t = table(dir.path());
        let rows = vec![row("MSFT.US", 4, 370.0), row("AAPL.US", 2, 185.0)];
        t.save(&rows).unwrap();

        assert_eq!(t.meta_path(), dir.path().join("prices.meta.json"));
        let meta = t.meta().unwrap().unwrap();
        assert_eq!(meta.symbols, ["AAPL.US", "MSFT.US"]);
        assert_eq!(meta.row_count, 2);
        assert_eq!(meta.first_date, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(meta.last_date, NaiveDate::from_ymd_opt(2024, 1, 4));
        assert_eq!(meta.data_hash, data_hash(&rows).unwrap());
    }

    #[test]
    fn rewrite_replaces_whole_table() {
        let dir = tempfile::tempdir().unwrap();
        let t = table(dir.path());
        t.save(&[row("AAPL.US", 2, 185.0)]).unwrap();
        rewrite(&t, |mut rows| {
            rows.push(row("AAPL.US", 3, 186.0));
            (rows, ())
        })
        .unwrap();
        assert_eq!(t.load().unwrap().len(), 2);
        assert_eq!(t.meta().unwrap().unwrap().row_count, 2);
    }

    #[test]
    fn empty_table_can_be_saved() {
        let dir = tempfile::tempdir().unwrap();
        let t = table(dir.path());
        t.save(&[]).unwrap();
        assert!(t.load().unwrap().is_empty());
        assert_eq!(t.meta().unwrap().unwrap().first_date, None);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let t = table(dir.path());
        fs::write(t.path(), b"not parquet").unwrap();
        assert!(matches!(t.load(), Err(StoreError::Parquet { .. })));
    }
}
