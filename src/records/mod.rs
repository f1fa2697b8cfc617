//! Flat destination records and their fixed table schemas.
//!
//! Every destination table is described once by a [`TableSchema`]. A
//! [`DetailRecord`] is always built from its table's schema, so every record
//! of a table carries exactly the schema's column set, in schema order.

mod normalize;
pub mod schemas;

pub use normalize::{
    flag_text, normalize, render_json, to_flag, to_float, to_integer, to_text, FieldMapping,
    FieldSource, RecordContext,
};

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// How a column's value is derived and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain text; absent values become `""`.
    Text,
    /// Whole number; absent values become `0`.
    Integer,
    /// Floating point; absent values become `0.0`.
    Float,
    /// Boolean rendered as `"True"` / `"False"`; absent values become `"False"`.
    Flag,
    /// Nested object serialized to JSON text; empty values become `""`.
    Json,
}

impl FieldKind {
    /// Storage type written by the sink.
    pub fn storage_type(self) -> StorageType {
        match self {
            FieldKind::Integer => StorageType::Long,
            FieldKind::Float => StorageType::Double,
            FieldKind::Text | FieldKind::Flag | FieldKind::Json => StorageType::String,
        }
    }

    /// Value a schema template carries for this column.
    pub fn empty_value(self) -> FieldValue {
        match self {
            FieldKind::Integer => FieldValue::Integer(0),
            FieldKind::Float => FieldValue::Float(0.0),
            FieldKind::Text | FieldKind::Flag | FieldKind::Json => FieldValue::Text(String::new()),
        }
    }

    /// Value used when a mapped source field is absent.
    pub fn missing_value(self) -> FieldValue {
        match self {
            FieldKind::Flag => FieldValue::Text(flag_text(false).to_string()),
            other => other.empty_value(),
        }
    }
}

/// Column storage type in a destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    String,
    Long,
    Double,
}

/// One column of a destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Column {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Integer,
        }
    }

    pub const fn float(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Float,
        }
    }

    pub const fn flag(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Flag,
        }
    }

    pub const fn json(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Json,
        }
    }
}

/// The fixed column contract of one destination table.
#[derive(Debug, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The schema template: every column present with its empty value.
    pub fn template(&'static self) -> DetailRecord {
        DetailRecord {
            table: self,
            fields: self
                .columns
                .iter()
                .map(|c| (c.name, c.kind.empty_value()))
                .collect(),
        }
    }
}

/// A scalar cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// One flat row destined for a specific table.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRecord {
    table: &'static TableSchema,
    fields: IndexMap<&'static str, FieldValue>,
}

impl DetailRecord {
    pub fn table(&self) -> &'static TableSchema {
        self.table
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    /// Text of a column, or `""` for non-text or unknown columns.
    pub fn text(&self, column: &str) -> &str {
        self.get(column).and_then(FieldValue::as_text).unwrap_or("")
    }

    /// Sets a column declared by the schema; unknown columns are ignored so
    /// the record never drifts from its table's column set.
    pub fn set(&mut self, column: &str, value: impl Into<FieldValue>) {
        if let Some(slot) = self.fields.get_mut(column) {
            *slot = value.into();
        } else {
            log::debug!(
                "Ignoring column '{}' not declared by table {}",
                column,
                self.table.name
            );
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.fields.values()
    }

    pub fn fields(&self) -> &IndexMap<&'static str, FieldValue> {
        &self.fields
    }
}

impl Serialize for DetailRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.fields.serialize(serializer)
    }
}
