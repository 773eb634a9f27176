//! CSV-backed tables for the signal log and the watermark report.

use super::{write_atomic, StoreError, TableStore};
use crate::collect::Watermark;
use crate::domain::SignalRow;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A row type with a fixed CSV header, so empty tables still carry one.
pub trait TableRow: Serialize + DeserializeOwned {
    const COLUMNS: &'static [&'static str];
}

impl TableRow for SignalRow {
    const COLUMNS: &'static [&'static str] = &[
        "key",
        "symbol",
        "type",
        "date",
        "value",
        "threshold",
        "message",
        "created_at",
    ];
}

impl TableRow for Watermark {
    const COLUMNS: &'static [&'static str] = &["symbol", "last_date"];
}

pub struct CsvTable<R> {
    name: String,
    path: PathBuf,
    _row: PhantomData<fn() -> R>,
}

impl<R: TableRow> CsvTable<R> {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            _row: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn csv_err(&self, source: csv::Error) -> StoreError {
        StoreError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}

impl<R: TableRow> TableStore for CsvTable<R> {
    type Row = R;

    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Vec<R>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| self.csv_err(e))?;
        reader
            .deserialize()
            .collect::<Result<Vec<R>, _>>()
            .map_err(|e| self.csv_err(e))
    }

    fn save(&self, rows: &[R]) -> Result<(), StoreError> {
        write_atomic(&self.path, |file| {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            writer
                .write_record(R::COLUMNS)
                .map_err(|e| self.csv_err(e))?;
            for row in rows {
                writer.serialize(row).map_err(|e| self.csv_err(e))?;
            }
            writer.flush().map_err(|e| StoreError::io(&self.path, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Signal, Symbol};
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::fs;

    fn signal(message: &str, threshold: Option<f64>) -> SignalRow {
        let symbol = Symbol::parse("005930.KS").unwrap();
        SignalRow {
            key: SignalRow::key_for(&symbol, "gemini"),
            symbol,
            kind: "gemini".into(),
            date: "2024-05-02".into(),
            value: Signal::Buy,
            threshold,
            message: message.into(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let table: CsvTable<SignalRow> = CsvTable::new("signals", dir.path().join("signals.csv"));
        assert!(table.load().unwrap().is_empty());
    }

    #[test]
    fn empty_save_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.csv");
        let table: CsvTable<SignalRow> = CsvTable::new("signals", &path);
        table.save(&[]).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "key,symbol,type,date,value,threshold,message,created_at\n"
        );
        assert!(table.load().unwrap().is_empty());
    }

    #[test]
    fn signal_rows_survive_disk() {
        let dir = tempfile::tempdir().unwrap();
        let table: CsvTable<SignalRow> = CsvTable::new("signals", dir.path().join("signals.csv"));
        let rows = vec![
            signal("Holding above the 20-day average, with \"strong\" volume.", Some(0.8)),
            signal("", None),
        ];
        table.save(&rows).unwrap();
        assert_eq!(table.load().unwrap(), rows);
    }

    #[test]
    fn watermark_rows_use_plain_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.csv");
        let table: CsvTable<Watermark> = CsvTable::new("state", &path);
        table
            .save(&[Watermark {
                symbol: Symbol::parse("AAPL.US").unwrap(),
                last_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            }])
            .unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "symbol,last_date\nAAPL.US,2024-05-02\n"
        );
    }
}
