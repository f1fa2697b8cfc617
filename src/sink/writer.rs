// src/sink/writer.rs
//! Writes record collections through a sink, one table at a time.

use super::{SinkReport, TableBatch, TableSink};
use crate::error::AppError;
use crate::records::{DetailRecord, TableSchema};
use std::time::Instant;

/// Replaces one table with `records`; an empty slice writes a schema-only table.
pub fn write_table(
    sink: &dyn TableSink,
    table: &'static TableSchema,
    records: &[DetailRecord],
) -> Result<usize, AppError> {
    let batch = TableBatch::from_records(table, records);
    if batch.is_empty() {
        log::info!("No data for {}, creating empty table with schema", table.name);
    } else {
        log::info!("Writing {} rows → {}", batch.row_count(), table.name);
    }

    sink.overwrite(&batch).map_err(|e| match e {
        AppError::Sink { .. } => e,
        other => AppError::Sink {
            table: table.name.to_string(),
            cause: other.to_string(),
        },
    })?;

    log::info!("✓ Wrote table: {}", table.name);
    Ok(batch.row_count())
}

/// Writes every table independently; a failed table is reported and skipped.
pub fn write_all<'a, I>(sink: &dyn TableSink, tables: I) -> SinkReport
where
    I: IntoIterator<Item = (&'static TableSchema, &'a [DetailRecord])>,
{
    let start = Instant::now();
    let mut report = SinkReport::new();

    for (table, records) in tables {
        report = match write_table(sink, table, records) {
            Ok(rows) => report.with_written(table.name, rows),
            Err(e) => {
                log::error!("Failed to write {}: {}", table.name, e);
                report.with_failed(table.name, e.to_string())
            }
        };
    }

    log::debug!(
        "Table writes complete: {} written, {} failed in {}ms",
        report.written.len(),
        report.failed.len(),
        start.elapsed().as_millis()
    );
    report
}
