// src/sink/memory.rs
//! In-memory table store.

use super::{TableBatch, TableSink};
use crate::error::AppError;
use indexmap::IndexMap;
use parking_lot::Mutex;

/// Keeps the last batch written to each table, in first-write order.
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: Mutex<IndexMap<&'static str, TableBatch>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<TableBatch> {
        self.tables.lock().get(name).cloned()
    }

    pub fn table_names(&self) -> Vec<&'static str> {
        self.tables.lock().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.tables.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.lock().is_empty()
    }
}

impl TableSink for MemorySink {
    fn overwrite(&self, batch: &TableBatch) -> Result<(), AppError> {
        self.tables.lock().insert(batch.name, batch.clone());
        Ok(())
    }
}
