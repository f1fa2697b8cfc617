//! Record normalization: one externally-shaped item into one flat record.
//!
//! Each source kind declares an explicit field-mapping table (source field →
//! destination column). The column's [`FieldKind`] decides conversion and
//! the value used when the source field is absent. Normalization is pure
//! and never fails.

use super::{DetailRecord, FieldKind, FieldValue, TableSchema};
use serde_json::Value;

/// Where a mapped column takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// A top-level key of the raw item.
    Key(&'static str),
    /// A fixed value, converted through the column's kind.
    Constant(&'static str),
}

/// One entry of a per-source-kind mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub column: &'static str,
    pub source: FieldSource,
}

impl FieldMapping {
    pub const fn key(column: &'static str, key: &'static str) -> Self {
        Self {
            column,
            source: FieldSource::Key(key),
        }
    }

    pub const fn constant(column: &'static str, value: &'static str) -> Self {
        Self {
            column,
            source: FieldSource::Constant(value),
        }
    }
}

/// Back-reference columns stamped on every record built under one parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordContext {
    fields: Vec<(&'static str, String)>,
}

impl RecordContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(c, v)| (*c, v.as_str()))
    }
}

/// Builds one record for `table` from `raw`, stamping `context` first.
///
/// Columns covered by neither the context nor a mapping keep the schema
/// template's empty value.
pub fn normalize(
    table: &'static TableSchema,
    raw: &Value,
    context: &RecordContext,
    mappings: &[FieldMapping],
) -> DetailRecord {
    let mut record = table.template();

    for (column, value) in context.iter() {
        record.set(column, value);
    }

    for mapping in mappings {
        let Some(column) = table.column(mapping.column) else {
            log::debug!(
                "Mapping targets unknown column {}.{}",
                table.name,
                mapping.column
            );
            continue;
        };
        let value = match mapping.source {
            FieldSource::Key(key) => match raw.get(key) {
                Some(v) if !v.is_null() => convert(v, column.kind),
                _ => column.kind.missing_value(),
            },
            FieldSource::Constant(text) => convert(&Value::String(text.to_string()), column.kind),
        };
        record.set(column.name, value);
    }

    record
}

fn convert(value: &Value, kind: FieldKind) -> FieldValue {
    match kind {
        FieldKind::Text => FieldValue::Text(to_text(value)),
        FieldKind::Integer => FieldValue::Integer(to_integer(value)),
        FieldKind::Float => FieldValue::Float(to_float(value)),
        FieldKind::Flag => FieldValue::Text(flag_text(to_flag(value)).to_string()),
        FieldKind::Json => FieldValue::Text(render_json(value)),
    }
}

/// Title-case boolean text used by the legacy report format.
pub fn flag_text(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Scalar text rendering; nested values become JSON, `null` becomes `""`.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => flag_text(*b).to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => render_json(value),
    }
}

pub fn to_integer(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

pub fn to_float(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Truthiness of a loosely-typed value.
///
/// Strings spelling a boolean (`"true"`, `"False"`, `"0"`, `"1"`) are read
/// as that boolean; any other non-empty string is true.
pub fn to_flag(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") || s == "1" {
                true
            } else if s.eq_ignore_ascii_case("false") || s == "0" {
                false
            } else {
                !s.is_empty()
            }
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// JSON text for a nested value; empty or falsy values become `""`.
pub fn render_json(value: &Value) -> String {
    let empty = match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    };
    if empty {
        String::new()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::schemas::{DATASETS, DATASET_SOURCES};
    use serde_json::json;

    const SOURCE_MAPPINGS: &[FieldMapping] = &[
        FieldMapping::key("DatasetDatasourceType", "datasourceType"),
        FieldMapping::key("DatasetDatasourceId", "datasourceId"),
        FieldMapping::key("DatasetDatasourceGatewayId", "gatewayId"),
        FieldMapping::key("DatasetDatasourceConnectionDetails", "connectionDetails"),
    ];

    fn context() -> RecordContext {
        RecordContext::new()
            .with("WorkspaceId", "ws-1")
            .with("WorkspaceName", "Sales")
            .with("DatasetId", "ds-1")
            .with("DatasetName", "Revenue")
    }

    #[test]
    fn nested_objects_become_json_text() {
        let raw = json!({
            "datasourceType": "Sql",
            "datasourceId": "src-1",
            "connectionDetails": {"server": "db.example.com", "database": "sales"}
        });
        let record = normalize(&DATASET_SOURCES, &raw, &context(), SOURCE_MAPPINGS);

        assert_eq!(record.text("WorkspaceName"), "Sales");
        assert_eq!(record.text("DatasetDatasourceType"), "Sql");
        assert_eq!(record.text("DatasetDatasourceGatewayId"), "");
        assert_eq!(
            record.text("DatasetDatasourceConnectionDetails"),
            r#"{"server":"db.example.com","database":"sales"}"#
        );
    }

    #[test]
    fn empty_nested_values_never_render_as_null_or_braces() {
        for empty in [json!(null), json!({}), json!([])] {
            let raw = json!({ "connectionDetails": empty });
            let record = normalize(&DATASET_SOURCES, &raw, &context(), SOURCE_MAPPINGS);
            assert_eq!(record.text("DatasetDatasourceConnectionDetails"), "");
        }
    }

    #[test]
    fn flags_are_title_case_and_default_false() {
        let mappings = &[FieldMapping::key("DatasetIsRefreshable", "isRefreshable")];
        let yes = normalize(&DATASETS, &json!({"isRefreshable": true}), &context(), mappings);
        let missing = normalize(&DATASETS, &json!({}), &context(), mappings);
        assert_eq!(yes.text("DatasetIsRefreshable"), "True");
        assert_eq!(missing.text("DatasetIsRefreshable"), "False");
    }

    #[test]
    fn every_record_matches_template_columns() {
        let record = normalize(&DATASETS, &json!({"unexpected": 1}), &context(), &[]);
        let template = DATASETS.template();
        assert!(record.column_names().eq(template.column_names()));
    }

    #[test]
    fn loose_numbers_are_coerced() {
        assert_eq!(to_integer(&json!("42")), 42);
        assert_eq!(to_integer(&json!(3.9)), 3);
        assert_eq!(to_float(&json!("1.5")), 1.5);
        assert_eq!(to_float(&json!(null)), 0.0);
        assert!(to_flag(&json!("True")));
        assert!(!to_flag(&json!("false")));
        assert_eq!(to_text(&json!(false)), "False");
    }
}
