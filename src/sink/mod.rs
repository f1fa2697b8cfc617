// src/sink/mod.rs
//! Destination table writes.
//!
//! Records are turned into a [`TableBatch`] (pure), then handed to a
//! [`TableSink`] that replaces the whole destination table (I/O). Every
//! write is a full overwrite; tables are written one at a time so a failed
//! table never affects its siblings.

mod directory;
mod memory;
mod types;
mod writer;

use crate::error::AppError;

pub use directory::DirectorySink;
pub use memory::MemorySink;
pub use types::{BatchColumn, FailedTable, SinkReport, TableBatch, WrittenTable};
pub use writer::{write_all, write_table};

/// A table store that replaces a table, rows and column set alike.
pub trait TableSink {
    fn overwrite(&self, batch: &TableBatch) -> Result<(), AppError>;
}
