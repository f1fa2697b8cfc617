//! Read-only introspection of report definitions.
//!
//! A [`ReportSession`] lists one kind of report element at a time as
//! tabular rows: JSON objects keyed by display column names such as
//! `"Page Name"` or `"Visual Filter Count"`. Detail fetchers map those rows
//! onto destination columns.

mod literals;
mod pbir_legacy;

pub use pbir_legacy::PbirLegacyInspector;

use crate::error::AppError;
use crate::types::{ParentRef, WorkspaceRef};
use serde_json::{Map, Value};

/// One listed report element, keyed by display column name.
pub type ReportRow = Map<String, Value>;

/// Opens report definitions for reading.
pub trait ReportInspector: Send + Sync {
    fn open(&self, workspace: &WorkspaceRef, report: &ParentRef) -> Result<Box<dyn ReportSession>, AppError>;
}

/// An open, read-only view over one report.
pub trait ReportSession {
    fn list_pages(&self) -> Result<Vec<ReportRow>, AppError>;
    fn list_visuals(&self) -> Result<Vec<ReportRow>, AppError>;
    fn list_bookmarks(&self) -> Result<Vec<ReportRow>, AppError>;
    fn list_custom_visuals(&self) -> Result<Vec<ReportRow>, AppError>;
    fn list_report_filters(&self) -> Result<Vec<ReportRow>, AppError>;
    fn list_page_filters(&self) -> Result<Vec<ReportRow>, AppError>;
    fn list_visual_filters(&self) -> Result<Vec<ReportRow>, AppError>;
    fn list_visual_objects(&self) -> Result<Vec<ReportRow>, AppError>;
    fn list_report_level_measures(&self) -> Result<Vec<ReportRow>, AppError>;
    fn list_visual_interactions(&self) -> Result<Vec<ReportRow>, AppError>;
}

/// Builds a row from a `json!` object literal; anything else is an empty row.
pub(crate) fn row(value: Value) -> ReportRow {
    match value {
        Value::Object(map) => map,
        _ => ReportRow::new(),
    }
}
