//! Helpers for the report definition's embedded encodings: stringified JSON
//! members, expression literals (`'text'`, `true`, `10L`) and query field
//! references.

use serde_json::Value;
use std::collections::HashMap;

/// A member that may hold JSON serialized into a string.
pub(super) fn embedded_json(value: Option<&Value>) -> Value {
    match value {
        Some(Value::String(text)) if !text.trim().is_empty() => {
            serde_json::from_str(text).unwrap_or_else(|e| {
                log::debug!("Ignoring unparsable embedded JSON: {}", e);
                Value::Null
            })
        }
        Some(Value::String(_)) | None => Value::Null,
        Some(other) => other.clone(),
    }
}

/// Raw literal text of `{ "expr": { "Literal": { "Value": ... } } }`.
pub(super) fn literal(property: &Value) -> Option<&str> {
    property.pointer("/expr/Literal/Value").and_then(Value::as_str)
}

/// `'It''s'` → `It's`; other literals pass through.
pub(super) fn literal_text(raw: &str) -> String {
    raw.strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .map(|s| s.replace("''", "'"))
        .unwrap_or_else(|| raw.to_string())
}

pub(super) fn literal_bool(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

/// `10L`, `1.5D` and `3M` are numbers with a type suffix.
pub(super) fn literal_number(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_end_matches(['L', 'D', 'M'])
        .parse::<f64>()
        .ok()
}

/// Literal of `objects[object][0].properties[property]`.
pub(super) fn object_property<'a>(objects: &'a Value, object: &str, property: &str) -> Option<&'a str> {
    objects
        .get(object)
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
        .and_then(|entry| entry.pointer(&format!("/properties/{}", property)))
        .and_then(literal)
}

/// A model field named by a query or filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct FieldRef {
    pub table: String,
    pub object: String,
    /// `Column`, `Measure` or `Hierarchy`.
    pub object_type: &'static str,
    /// An aggregated column, i.e. an implicit measure.
    pub implicit_measure: bool,
}

/// Resolves a field expression. `aliases` maps query source aliases to
/// entity names; filter expressions name their entity directly.
pub(super) fn field_ref(expression: &Value, aliases: &HashMap<String, String>) -> Option<FieldRef> {
    if let Some(column) = expression.get("Column") {
        return Some(FieldRef {
            table: source_entity(column, aliases),
            object: text_of(column, "Property"),
            object_type: "Column",
            implicit_measure: false,
        });
    }
    if let Some(measure) = expression.get("Measure") {
        return Some(FieldRef {
            table: source_entity(measure, aliases),
            object: text_of(measure, "Property"),
            object_type: "Measure",
            implicit_measure: false,
        });
    }
    if let Some(aggregation) = expression.get("Aggregation") {
        let inner = aggregation.get("Expression")?;
        let mut field = field_ref(inner, aliases)?;
        field.implicit_measure = true;
        return Some(field);
    }
    if let Some(level) = expression.get("HierarchyLevel") {
        let hierarchy = level.pointer("/Expression/Hierarchy")?;
        return Some(FieldRef {
            table: source_entity(hierarchy, aliases),
            object: format!("{}.{}", text_of(hierarchy, "Hierarchy"), text_of(level, "Level")),
            object_type: "Hierarchy",
            implicit_measure: false,
        });
    }
    None
}

fn source_entity(node: &Value, aliases: &HashMap<String, String>) -> String {
    let Some(source) = node.pointer("/Expression/SourceRef") else {
        return String::new();
    };
    if let Some(entity) = source.get("Entity").and_then(Value::as_str) {
        return entity.to_string();
    }
    source
        .get("Source")
        .and_then(Value::as_str)
        .and_then(|alias| aliases.get(alias))
        .cloned()
        .unwrap_or_default()
}

fn text_of(node: &Value, key: &str) -> String {
    node.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Alias → entity map of a prototype query's `From` clause.
pub(super) fn query_aliases(query: &Value) -> HashMap<String, String> {
    query
        .get("From")
        .and_then(Value::as_array)
        .map(|sources| {
            sources
                .iter()
                .filter_map(|s| {
                    let alias = s.get("Name")?.as_str()?;
                    let entity = s.get("Entity")?.as_str()?;
                    Some((alias.to_string(), entity.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}
