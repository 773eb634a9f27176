//! In-process table for tests and dry runs.

use super::{StoreError, TableStore};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryTable<R> {
    name: String,
    rows: Mutex<Vec<R>>,
    saves: Mutex<usize>,
}

impl<R: Clone> MemoryTable<R> {
    pub fn new(name: impl Into<String>, rows: Vec<R>) -> Self {
        Self {
            name: name.into(),
            rows: Mutex::new(rows),
            saves: Mutex::new(0),
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Number of completed saves.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> Vec<R> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl<R: Clone> TableStore for MemoryTable<R> {
    type Row = R;

    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Vec<R>, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, rows: &[R]) -> Result<(), StoreError> {
        *self.rows.lock().unwrap_or_else(|e| e.into_inner()) = rows.to_vec();
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}
