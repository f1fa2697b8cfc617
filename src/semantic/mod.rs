//! Read-only introspection of semantic models.
//!
//! A [`ModelInspector`] opens one model at a time; the returned
//! [`ModelSession`] exposes the model's object graph and a direct
//! dependency query for calculated objects.

mod dax;
mod tmsl;

pub use dax::{scan_references, DaxReference};
pub use tmsl::TmslModelInspector;

use crate::error::AppError;
use crate::types::{ParentRef, WorkspaceRef};
use std::fmt;

/// Opens semantic models for reading.
pub trait ModelInspector: Send + Sync {
    fn open(&self, workspace: &WorkspaceRef, dataset: &ParentRef) -> Result<Box<dyn ModelSession>, AppError>;
}

/// An open, read-only view over one model.
pub trait ModelSession {
    fn tables(&self) -> Result<Vec<ModelTable>, AppError>;
    fn relationships(&self) -> Result<Vec<Relationship>, AppError>;
    /// Direct upstream dependencies of one calculated object.
    fn depends_on(&self, object: &CalculatedObject) -> Result<Vec<Dependency>, AppError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelTable {
    pub name: String,
    pub description: String,
    pub is_hidden: bool,
    /// Storage mode of the first partition.
    pub storage_mode: String,
    pub columns: Vec<ModelColumn>,
    pub measures: Vec<Measure>,
    pub hierarchies: Vec<Hierarchy>,
    pub partitions: Vec<Partition>,
    /// Present when the table is a calculation group.
    pub calculation_items: Option<Vec<CalculationItem>>,
}

impl ModelTable {
    pub fn is_calculation_group(&self) -> bool {
        self.calculation_items.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelColumn {
    pub name: String,
    pub format_string: String,
    pub display_folder: String,
    pub description: String,
    pub is_hidden: bool,
    /// DAX expression of a calculated column.
    pub expression: Option<String>,
}

impl ModelColumn {
    pub fn is_calculated(&self) -> bool {
        self.expression.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Measure {
    pub name: String,
    pub expression: String,
    pub format_string: String,
    pub display_folder: String,
    pub description: String,
    pub is_hidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    pub name: String,
    pub display_folder: String,
    pub description: String,
    pub is_hidden: bool,
    pub levels: Vec<Level>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Level {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub name: String,
    pub description: String,
    pub mode: String,
    pub expression: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationItem {
    pub name: String,
    pub description: String,
    pub expression: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationship {
    pub name: String,
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub is_active: bool,
    pub from_cardinality: String,
    pub to_cardinality: String,
    pub cross_filtering_behavior: String,
}

/// Kinds of objects that carry a DAX expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculatedKind {
    Measure,
    CalculatedColumn,
    CalculationItem,
}

impl CalculatedKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CalculatedKind::Measure => "Measure",
            CalculatedKind::CalculatedColumn => "CalculatedColumn",
            CalculatedKind::CalculationItem => "CalculationItem",
        }
    }
}

/// A measure, calculated column or calculation item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatedObject {
    pub kind: CalculatedKind,
    pub table: String,
    pub name: String,
    pub expression: String,
}

/// Kinds of objects a calculation can depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    Table,
    Column,
    Measure,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DependencyKind::Table => "Table",
            DependencyKind::Column => "Column",
            DependencyKind::Measure => "Measure",
        };
        f.write_str(name)
    }
}

/// One direct upstream dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub kind: DependencyKind,
    pub table: String,
    /// Empty for table dependencies.
    pub name: String,
}

impl Dependency {
    /// `'Table'[Name]` for columns and measures, `'Table'` for tables.
    pub fn qualified_name(&self) -> String {
        match self.kind {
            DependencyKind::Table => format!("'{}'", self.table),
            DependencyKind::Column | DependencyKind::Measure => {
                format!("'{}'[{}]", self.table, self.name)
            }
        }
    }
}
