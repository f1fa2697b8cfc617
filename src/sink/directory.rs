// src/sink/directory.rs
//! JSON table files on the local filesystem.

use super::{TableBatch, TableSink};
use crate::error::AppError;
use crate::types::SchemaName;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes each table to `<root>/<schema>/<Table>.json`.
///
/// The file holds `{"table", "columns", "rows"}`. It is written next to its
/// destination and renamed over it, so a reader sees either the previous
/// table or the new one.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl AsRef<Path>, schema: &SchemaName) -> Self {
        Self {
            dir: root.as_ref().join(schema.as_str()),
        }
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.json", table))
    }
}

impl TableSink for DirectorySink {
    fn overwrite(&self, batch: &TableBatch) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.table_path(batch.name);
        let staging = self.dir.join(format!(".{}.json.tmp", batch.name));
        let content = serde_json::to_vec_pretty(batch)?;

        log::debug!("Writing {} bytes to {}", content.len(), staging.display());
        fs::write(&staging, &content)?;
        fs::rename(&staging, &path).map_err(|e| {
            let _ = fs::remove_file(&staging);
            AppError::Sink {
                table: batch.name.to_string(),
                cause: format!("could not replace {}: {}", path.display(), e),
            }
        })?;

        Ok(())
    }
}
