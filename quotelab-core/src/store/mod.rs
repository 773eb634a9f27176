//! Tabular persistence with full-replace semantics.
//!
//! Every table is loaded whole and saved whole. [`rewrite`] is the one
//! load → transform → replace path used by both the price series and the
//! signal log. File-backed tables write to a temporary file and rename it
//! into place, so a failed save leaves the previous table intact.

pub mod csv_table;
pub mod memory;
pub mod parquet;

pub use csv_table::{CsvTable, TableRow};
pub use memory::MemoryTable;
pub use parquet::{ParquetPriceTable, PriceTableMeta};

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv table {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("parquet table {}: {message}", .path.display())]
    Parquet { path: PathBuf, message: String },

    #[error("table metadata {}: {message}", .path.display())]
    Meta { path: PathBuf, message: String },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A named table of rows, loaded and saved as a whole.
pub trait TableStore {
    type Row;

    fn name(&self) -> &str;

    /// All rows in stored order. A table that was never written is empty.
    fn load(&self) -> Result<Vec<Self::Row>, StoreError>;

    /// Replace the whole table with `rows`.
    fn save(&self, rows: &[Self::Row]) -> Result<(), StoreError>;
}

/// Load `store`, hand its rows to `transform`, and save what comes back.
///
/// Nothing is written when loading fails. The value returned alongside the
/// new rows is passed through to the caller.
pub fn rewrite<S, T, F>(store: &S, transform: F) -> Result<T, StoreError>
where
    S: TableStore + ?Sized,
    F: FnOnce(Vec<S::Row>) -> (Vec<S::Row>, T),
{
    let rows = store.load()?;
    let before = rows.len();
    let (rows, out) = transform(rows);
    store.save(&rows)?;
    tracing::debug!(table = store.name(), before, after = rows.len(), "table rewritten");
    Ok(out)
}

/// Write `path` through a sibling temp file and rename it into place.
pub(crate) fn write_atomic<F>(path: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), StoreError>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let file = File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
    let mut out = BufWriter::new(file);
    let written = write(&mut out).and_then(|()| {
        out.flush().map_err(|e| StoreError::io(&tmp_path, e))?;
        out.get_ref()
            .sync_all()
            .map_err(|e| StoreError::io(&tmp_path, e))
    });
    drop(out);
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        StoreError::io(path, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_saves_transformed_rows() {
        let table = MemoryTable::new("numbers", vec![3, 1, 2]);
        let count = rewrite(&table, |mut rows| {
            rows.push(4);
            rows.sort();
            let n = rows.len();
            (rows, n)
        })
        .unwrap();
        assert_eq!(count, 4);
        assert_eq!(table.load().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("t.txt");
        write_atomic(&path, |w| {
            w.write_all(b"hello").map_err(|e| StoreError::io(&path, e))
        })
        .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
        assert!(!dir.path().join("nested").join("t.txt.tmp").exists());
    }

    #[test]
    fn failed_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        fs::write(&path, "old").unwrap();
        let result = write_atomic(&path, |_| {
            Err(StoreError::Meta {
                path: path.clone(),
                message: "boom".into(),
            })
        });
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        assert!(!dir.path().join("t.txt.tmp").exists());
    }
}
