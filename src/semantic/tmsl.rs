//! Model sessions backed by the TMSL model definition (`model.bim`).

use super::dax::{scan_references, DaxReference};
use super::{
    CalculatedKind, CalculatedObject, CalculationItem, Dependency, DependencyKind, Hierarchy, Level,
    Measure, ModelColumn, ModelInspector, ModelSession, ModelTable, Partition, Relationship,
};
use crate::api::{fetch_definition, find_part, MetadataApi};
use crate::error::AppError;
use crate::types::{ParentRef, WorkspaceRef};
use serde::Deserialize;
use std::collections::HashMap;

/// Opens models by fetching their TMSL definition.
pub struct TmslModelInspector<'a> {
    api: &'a dyn MetadataApi,
}

impl<'a> TmslModelInspector<'a> {
    pub fn new(api: &'a dyn MetadataApi) -> Self {
        Self { api }
    }
}

impl ModelInspector for TmslModelInspector<'_> {
    fn open(&self, workspace: &WorkspaceRef, dataset: &ParentRef) -> Result<Box<dyn ModelSession>, AppError> {
        let endpoint = format!(
            "v1/workspaces/{}/semanticModels/{}/getDefinition?format=TMSL",
            workspace.id, dataset.id
        );
        let parts = fetch_definition(self.api, &endpoint)?;
        let model = find_part(&parts, |path| path.ends_with("model.bim")).ok_or_else(|| {
            AppError::MalformedResponse(format!("definition of {} has no model.bim", dataset))
        })?;
        Ok(Box::new(TmslSession::parse(model.text()?)?))
    }
}

// ---------------------------------------------------------------------------
// TMSL document shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Database {
    #[serde(default)]
    model: RawModel,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawModel {
    default_mode: Option<String>,
    tables: Vec<RawTable>,
    relationships: Vec<RawRelationship>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawTable {
    name: String,
    description: Option<Text>,
    is_hidden: bool,
    columns: Vec<RawColumn>,
    measures: Vec<RawMeasure>,
    hierarchies: Vec<RawHierarchy>,
    partitions: Vec<RawPartition>,
    calculation_group: Option<RawCalculationGroup>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawColumn {
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    expression: Option<Text>,
    format_string: Option<String>,
    display_folder: Option<String>,
    description: Option<Text>,
    is_hidden: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawMeasure {
    name: String,
    expression: Option<Text>,
    format_string: Option<String>,
    display_folder: Option<String>,
    description: Option<Text>,
    is_hidden: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawHierarchy {
    name: String,
    display_folder: Option<String>,
    description: Option<Text>,
    is_hidden: bool,
    levels: Vec<RawLevel>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLevel {
    name: String,
    description: Option<Text>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPartition {
    name: String,
    description: Option<Text>,
    mode: Option<String>,
    source: Option<RawSource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSource {
    expression: Option<Text>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawCalculationGroup {
    calculation_items: Vec<RawCalculationItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCalculationItem {
    name: String,
    description: Option<Text>,
    expression: Option<Text>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawRelationship {
    name: String,
    from_table: String,
    from_column: String,
    to_table: String,
    to_column: String,
    is_active: Option<bool>,
    from_cardinality: Option<String>,
    to_cardinality: Option<String>,
    cross_filtering_behavior: Option<String>,
}

/// TMSL text properties are either a string or an array of lines.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Text {
    Single(String),
    Lines(Vec<String>),
}

impl Text {
    fn into_string(self) -> String {
        match self {
            Text::Single(s) => s,
            Text::Lines(lines) => lines.join("\n"),
        }
    }
}

fn text(value: Option<Text>) -> String {
    value.map(Text::into_string).unwrap_or_default()
}

/// `directQuery` → `DirectQuery`, matching the object model's enum names.
fn pascal_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A parsed model plus the name index used to resolve references.
#[derive(Debug)]
pub(super) struct TmslSession {
    tables: Vec<ModelTable>,
    relationships: Vec<Relationship>,
    /// Lowercased table name → declared table name.
    table_names: HashMap<String, String>,
    /// Lowercased measure name → owning table.
    measure_tables: HashMap<String, (String, String)>,
    /// (lowercased table, lowercased column) → declared column name.
    columns: HashMap<(String, String), String>,
}

impl TmslSession {
    pub(super) fn parse(document: &str) -> Result<Self, AppError> {
        let database: Database = serde_json::from_str(document.trim_start_matches('\u{feff}'))?;
        let model = database.model;
        let default_mode = model
            .default_mode
            .as_deref()
            .map(pascal_case)
            .unwrap_or_else(|| "Import".to_string());

        let tables: Vec<ModelTable> = model
            .tables
            .into_iter()
            .map(|t| convert_table(t, &default_mode))
            .collect();
        let relationships = model.relationships.into_iter().map(convert_relationship).collect();

        let mut table_names = HashMap::new();
        let mut measure_tables = HashMap::new();
        let mut columns = HashMap::new();
        for table in &tables {
            let table_key = table.name.to_lowercase();
            table_names.insert(table_key.clone(), table.name.clone());
            for column in &table.columns {
                columns.insert((table_key.clone(), column.name.to_lowercase()), column.name.clone());
            }
            for measure in &table.measures {
                measure_tables.insert(
                    measure.name.to_lowercase(),
                    (table.name.clone(), measure.name.clone()),
                );
            }
        }

        Ok(Self {
            tables,
            relationships,
            table_names,
            measure_tables,
            columns,
        })
    }

    fn column(&self, table: &str, name: &str) -> Option<Dependency> {
        let table_key = table.to_lowercase();
        let declared_table = self.table_names.get(&table_key)?;
        self.columns
            .get(&(table_key, name.to_lowercase()))
            .map(|declared| Dependency {
                kind: DependencyKind::Column,
                table: declared_table.clone(),
                name: declared.clone(),
            })
    }

    fn measure(&self, name: &str) -> Option<Dependency> {
        self.measure_tables
            .get(&name.to_lowercase())
            .map(|(table, declared)| Dependency {
                kind: DependencyKind::Measure,
                table: table.clone(),
                name: declared.clone(),
            })
    }

    fn table(&self, name: &str) -> Option<Dependency> {
        self.table_names.get(&name.to_lowercase()).map(|declared| Dependency {
            kind: DependencyKind::Table,
            table: declared.clone(),
            name: String::new(),
        })
    }

    fn resolve(&self, reference: &DaxReference, owner: &CalculatedObject) -> Option<Dependency> {
        match reference {
            DaxReference::Qualified { table, object } => {
                self.column(table, object).or_else(|| self.measure(object))
            }
            DaxReference::Unqualified { object } => {
                let own_column = self.column(&owner.table, object);
                if owner.kind == CalculatedKind::CalculatedColumn && own_column.is_some() {
                    own_column
                } else {
                    self.measure(object).or(own_column)
                }
            }
            DaxReference::Table { table } => self.table(table),
            DaxReference::Identifier { name } => self.table(name),
        }
    }

    fn is_self(dependency: &Dependency, owner: &CalculatedObject) -> bool {
        let same_kind = matches!(
            (dependency.kind, owner.kind),
            (DependencyKind::Measure, CalculatedKind::Measure)
                | (DependencyKind::Column, CalculatedKind::CalculatedColumn)
        );
        same_kind
            && dependency.table.eq_ignore_ascii_case(&owner.table)
            && dependency.name.eq_ignore_ascii_case(&owner.name)
    }
}

impl ModelSession for TmslSession {
    fn tables(&self) -> Result<Vec<ModelTable>, AppError> {
        Ok(self.tables.clone())
    }

    fn relationships(&self) -> Result<Vec<Relationship>, AppError> {
        Ok(self.relationships.clone())
    }

    fn depends_on(&self, object: &CalculatedObject) -> Result<Vec<Dependency>, AppError> {
        let mut dependencies: Vec<Dependency> = Vec::new();
        for reference in scan_references(&object.expression) {
            let Some(dependency) = self.resolve(&reference, object) else {
                continue;
            };
            if Self::is_self(&dependency, object) || dependencies.contains(&dependency) {
                continue;
            }
            dependencies.push(dependency);
        }
        Ok(dependencies)
    }
}

fn convert_table(raw: RawTable, default_mode: &str) -> ModelTable {
    let partitions: Vec<Partition> = raw
        .partitions
        .into_iter()
        .map(|p| Partition {
            name: p.name,
            description: text(p.description),
            mode: p
                .mode
                .as_deref()
                .filter(|m| !m.eq_ignore_ascii_case("default"))
                .map(pascal_case)
                .unwrap_or_else(|| default_mode.to_string()),
            expression: p.source.map(|s| text(s.expression)).unwrap_or_default(),
        })
        .collect();

    ModelTable {
        storage_mode: partitions.first().map(|p| p.mode.clone()).unwrap_or_default(),
        name: raw.name,
        description: text(raw.description),
        is_hidden: raw.is_hidden,
        columns: raw
            .columns
            .into_iter()
            .filter(|c| !c.kind.as_deref().is_some_and(|k| k.eq_ignore_ascii_case("rowNumber")))
            .map(|c| {
                let calculated = c.kind.as_deref().is_some_and(|k| k.eq_ignore_ascii_case("calculated"));
                ModelColumn {
                    name: c.name,
                    format_string: c.format_string.unwrap_or_default(),
                    display_folder: c.display_folder.unwrap_or_default(),
                    description: text(c.description),
                    is_hidden: c.is_hidden,
                    expression: calculated.then(|| text(c.expression)),
                }
            })
            .collect(),
        measures: raw
            .measures
            .into_iter()
            .map(|m| Measure {
                name: m.name,
                expression: text(m.expression),
                format_string: m.format_string.unwrap_or_default(),
                display_folder: m.display_folder.unwrap_or_default(),
                description: text(m.description),
                is_hidden: m.is_hidden,
            })
            .collect(),
        hierarchies: raw
            .hierarchies
            .into_iter()
            .map(|h| Hierarchy {
                name: h.name,
                display_folder: h.display_folder.unwrap_or_default(),
                description: text(h.description),
                is_hidden: h.is_hidden,
                levels: h
                    .levels
                    .into_iter()
                    .map(|l| Level {
                        name: l.name,
                        description: text(l.description),
                    })
                    .collect(),
            })
            .collect(),
        partitions,
        calculation_items: raw.calculation_group.map(|group| {
            group
                .calculation_items
                .into_iter()
                .map(|item| CalculationItem {
                    name: item.name,
                    description: text(item.description),
                    expression: text(item.expression),
                })
                .collect()
        }),
    }
}

fn convert_relationship(raw: RawRelationship) -> Relationship {
    Relationship {
        name: raw.name,
        from_table: raw.from_table,
        from_column: raw.from_column,
        to_table: raw.to_table,
        to_column: raw.to_column,
        is_active: raw.is_active.unwrap_or(true),
        from_cardinality: pascal_case(raw.from_cardinality.as_deref().unwrap_or("many")),
        to_cardinality: pascal_case(raw.to_cardinality.as_deref().unwrap_or("one")),
        cross_filtering_behavior: pascal_case(
            raw.cross_filtering_behavior.as_deref().unwrap_or("oneDirection"),
        ),
    }
}
