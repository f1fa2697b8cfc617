// src/sink/types.rs
//! Batches handed to a sink and the report of a batch of writes.

use crate::records::{DetailRecord, FieldValue, StorageType, TableSchema};
use serde::Serialize;

/// One typed column of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchColumn {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub storage: StorageType,
}

/// The complete contents of one destination table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableBatch {
    #[serde(rename = "table")]
    pub name: &'static str,
    pub columns: Vec<BatchColumn>,
    /// Values in column order.
    pub rows: Vec<Vec<FieldValue>>,
}

impl TableBatch {
    /// Builds the batch for `table`. With no records the batch still
    /// carries the table's full column list.
    pub fn from_records(table: &'static TableSchema, records: &[DetailRecord]) -> Self {
        let columns = table
            .columns
            .iter()
            .map(|c| BatchColumn {
                name: c.name,
                storage: c.kind.storage_type(),
            })
            .collect();

        let rows = records
            .iter()
            .filter(|r| {
                let matches = std::ptr::eq(r.table(), table);
                if !matches {
                    log::warn!(
                        "Dropping a {} record handed to table {}",
                        r.table().name,
                        table.name
                    );
                }
                matches
            })
            .map(|r| r.values().cloned().collect())
            .collect();

        Self {
            name: table.name,
            columns,
            rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenTable {
    pub table: &'static str,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTable {
    pub table: &'static str,
    pub error: String,
}

/// Outcome of writing a stage's tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkReport {
    pub written: Vec<WrittenTable>,
    pub failed: Vec<FailedTable>,
}

impl SinkReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_written(mut self, table: &'static str, rows: usize) -> Self {
        self.written.push(WrittenTable { table, rows });
        self
    }

    pub fn with_failed(mut self, table: &'static str, error: impl Into<String>) -> Self {
        self.failed.push(FailedTable {
            table,
            error: error.into(),
        });
        self
    }

    pub fn merge(mut self, other: SinkReport) -> Self {
        self.written.extend(other.written);
        self.failed.extend(other.failed);
        self
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::schemas::{REPORT_PAGES, WORKSPACES};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_batch_keeps_the_column_set() {
        let batch = TableBatch::from_records(&REPORT_PAGES, &[]);
        assert!(batch.is_empty());
        let names: Vec<_> = batch.columns.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), REPORT_PAGES.columns.len());
        assert_eq!(batch.columns[6].storage, StorageType::Long);
    }

    #[test]
    fn foreign_records_are_dropped() {
        let mut page = REPORT_PAGES.template();
        page.set("PageName", "ReportSection1");
        let workspace = WORKSPACES.template();

        let batch = TableBatch::from_records(&REPORT_PAGES, &[page, workspace]);
        assert_eq!(batch.row_count(), 1);
        assert_eq!(batch.rows[0][4], FieldValue::Text("ReportSection1".to_string()));
    }
}
