//! Semantic model fetch: the object graph flattened into `ModelDetail`, and
//! direct calculation dependencies into `ModelDependencies`.

use super::{subcall, FetchOutcome};
use crate::error::friendly_message;
use crate::records::schemas::{MODEL_DEPENDENCIES, MODEL_DETAIL};
use crate::records::{flag_text, DetailRecord, RecordContext};
use crate::semantic::{
    CalculatedKind, CalculatedObject, ModelInspector, ModelSession, ModelTable, Relationship,
};
use crate::types::{ParentRef, WorkspaceRef};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelMetadata {
    pub details: Vec<DetailRecord>,
    pub dependencies: Vec<DetailRecord>,
}

/// Opens one model and flattens it.
///
/// Sub-calls: `open model`, `tables` (every table-derived row kind),
/// `relationships`, `dependencies`. A model that cannot be opened yields a
/// single error and no rows.
pub fn fetch_model_metadata(
    inspector: &dyn ModelInspector,
    workspace: &WorkspaceRef,
    dataset: &ParentRef,
    report_date: &str,
) -> FetchOutcome<ModelMetadata> {
    let context = RecordContext::new()
        .with("ModelAsOfDate", report_date)
        .with("ModelName", dataset.name.as_str())
        .with("ModelID", dataset.id.as_str())
        .with("WorkspaceName", workspace.name.as_str());
    let mut errors = Vec::new();

    let session: Option<Box<dyn ModelSession>> = subcall("open model", &mut errors, || {
        inspector.open(workspace, dataset).map(Some)
    });
    let Some(session) = session else {
        if let Some(error) = errors.last() {
            log::warn!("    ERROR opening model {}: {}", dataset, error.cause);
        }
        return FetchOutcome {
            records: ModelMetadata::default(),
            errors,
        };
    };

    let tables = subcall("tables", &mut errors, || session.tables());
    let mut details = table_rows(&tables, &context);

    let relationships = subcall("relationships", &mut errors, || session.relationships());
    details.extend(relationships.iter().map(|r| relationship_row(r, &context)));

    let dependencies = subcall("dependencies", &mut errors, || {
        Ok(dependency_rows(session.as_ref(), &tables, &context, dataset))
    });

    log::debug!(
        "    {}: {} detail rows, {} dependencies",
        dataset,
        details.len(),
        dependencies.len()
    );

    FetchOutcome {
        records: ModelMetadata {
            details,
            dependencies,
        },
        errors,
    }
}

fn detail_row(context: &RecordContext, kind: &str, table: &str, name: &str) -> DetailRecord {
    let mut row = MODEL_DETAIL.template();
    for (column, value) in context.iter() {
        row.set(column, value);
    }
    row.set("Type", kind);
    row.set("Table", table);
    row.set("Name", name);
    row
}

/// Rows grouped by kind, in the order downstream reports expect: tables,
/// calculation groups and items, columns, calculated columns, measures,
/// hierarchies and levels, partitions.
fn table_rows(tables: &[ModelTable], context: &RecordContext) -> Vec<DetailRecord> {
    let mut rows = Vec::new();

    for table in tables {
        let mut row = detail_row(context, "Table", &table.name, &table.name);
        row.set("IsHidden", flag_text(table.is_hidden));
        row.set("TableStorageMode", table.storage_mode.as_str());
        rows.push(row);
    }

    for table in tables.iter().filter(|t| t.is_calculation_group()) {
        let mut row = detail_row(context, "CalculationGroup", &table.name, &table.name);
        row.set("Description", table.description.as_str());
        row.set("IsHidden", flag_text(table.is_hidden));
        rows.push(row);
    }

    for table in tables {
        for item in table.calculation_items.iter().flatten() {
            let mut row = detail_row(context, "CalculationItem", &table.name, &item.name);
            row.set("Description", item.description.as_str());
            row.set("Expression", item.expression.as_str());
            rows.push(row);
        }
    }

    for table in tables {
        for column in &table.columns {
            let mut row = detail_row(context, "Column", &table.name, &column.name);
            row.set("FormatString", column.format_string.as_str());
            row.set("DisplayFolder", column.display_folder.as_str());
            row.set("Description", column.description.as_str());
            row.set("IsHidden", flag_text(column.is_hidden));
            rows.push(row);
        }
    }

    for table in tables {
        for column in &table.columns {
            let Some(expression) = &column.expression else { continue };
            let mut row = detail_row(context, "CalculatedColumn", &table.name, &column.name);
            row.set("FormatString", column.format_string.as_str());
            row.set("DisplayFolder", column.display_folder.as_str());
            row.set("Description", column.description.as_str());
            row.set("IsHidden", flag_text(column.is_hidden));
            row.set("Expression", expression.as_str());
            rows.push(row);
        }
    }

    for table in tables {
        for measure in &table.measures {
            let mut row = detail_row(context, "Measure", &table.name, &measure.name);
            row.set("FormatString", measure.format_string.as_str());
            row.set("DisplayFolder", measure.display_folder.as_str());
            row.set("Description", measure.description.as_str());
            row.set("IsHidden", flag_text(measure.is_hidden));
            row.set("Expression", measure.expression.as_str());
            rows.push(row);
        }
    }

    for table in tables {
        for hierarchy in &table.hierarchies {
            let mut row = detail_row(context, "Hierarchy", &table.name, &hierarchy.name);
            row.set("DisplayFolder", hierarchy.display_folder.as_str());
            row.set("Description", hierarchy.description.as_str());
            row.set("IsHidden", flag_text(hierarchy.is_hidden));
            rows.push(row);
        }
    }

    for table in tables {
        for level in table.hierarchies.iter().flat_map(|h| &h.levels) {
            let mut row = detail_row(context, "Level", &table.name, &level.name);
            row.set("Description", level.description.as_str());
            rows.push(row);
        }
    }

    for table in tables {
        for partition in &table.partitions {
            let mut row = detail_row(context, "Partition", &table.name, &partition.name);
            row.set("Description", partition.description.as_str());
            row.set("TableStorageMode", partition.mode.as_str());
            row.set("Expression", partition.expression.as_str());
            rows.push(row);
        }
    }

    rows
}

fn relationship_row(relationship: &Relationship, context: &RecordContext) -> DetailRecord {
    let mut row = detail_row(
        context,
        "Relationship",
        &relationship.from_table,
        &relationship.from_column,
    );
    row.set("Expression", relationship.name.as_str());
    row.set("RelationshipFromTable", relationship.from_table.as_str());
    row.set("RelationshipFromColumn", relationship.from_column.as_str());
    row.set("RelationshipToTable", relationship.to_table.as_str());
    row.set("RelationshipToColumn", relationship.to_column.as_str());
    row.set("RelationshipStatus", flag_text(relationship.is_active));
    row.set("RelationshipFromCardinality", relationship.from_cardinality.as_str());
    row.set("RelationshipToCardinality", relationship.to_cardinality.as_str());
    row.set(
        "RelationshipCrossFilteringBehavior",
        relationship.cross_filtering_behavior.as_str(),
    );
    row
}

/// Measures, calculated columns and calculation items, in that order.
fn calculated_objects(tables: &[ModelTable]) -> Vec<CalculatedObject> {
    let object = |kind, table: &ModelTable, name: &str, expression: &str| CalculatedObject {
        kind,
        table: table.name.clone(),
        name: name.to_string(),
        expression: expression.to_string(),
    };

    let measures = tables.iter().flat_map(|t| {
        t.measures
            .iter()
            .map(move |m| object(CalculatedKind::Measure, t, &m.name, &m.expression))
    });
    let columns = tables.iter().flat_map(|t| {
        t.columns.iter().filter_map(move |c| {
            c.expression
                .as_deref()
                .map(|e| object(CalculatedKind::CalculatedColumn, t, &c.name, e))
        })
    });
    let items = tables.iter().flat_map(|t| {
        t.calculation_items
            .iter()
            .flatten()
            .map(move |i| object(CalculatedKind::CalculationItem, t, &i.name, &i.expression))
    });

    measures.chain(columns).chain(items).collect()
}

fn dependency_rows(
    session: &dyn ModelSession,
    tables: &[ModelTable],
    context: &RecordContext,
    dataset: &ParentRef,
) -> Vec<DetailRecord> {
    if tables.is_empty() {
        log::warn!("    Warning: Skipping dependencies - model has no tables");
        return Vec::new();
    }
    let objects = calculated_objects(tables);
    if objects.is_empty() {
        log::warn!("    Warning: Skipping dependencies - no calculated objects to analyze");
        return Vec::new();
    }

    let mut rows = Vec::new();
    for object in &objects {
        let dependencies = match session.depends_on(object) {
            Ok(dependencies) => dependencies,
            Err(e) => {
                log::warn!(
                    "      Warning: Could not get dependencies for {} {} in {}: {}",
                    object.kind.as_str(),
                    object.name,
                    dataset,
                    friendly_message(&e, "")
                );
                continue;
            }
        };
        for dependency in dependencies {
            let mut row = MODEL_DEPENDENCIES.template();
            for (column, value) in context.iter() {
                row.set(column, value);
            }
            row.set("ObjectName", object.name.as_str());
            row.set("ObjectType", object.kind.as_str());
            row.set("DependsOn", dependency.qualified_name());
            row.set("DependsOnType", dependency.kind.to_string());
            rows.push(row);
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::semantic::{
        CalculationItem, Dependency, DependencyKind, Measure, ModelColumn, Partition,
    };
    use pretty_assertions::assert_eq;

    struct FixedModel {
        tables: Vec<ModelTable>,
        fail_relationships: bool,
    }

    impl ModelSession for FixedModel {
        fn tables(&self) -> Result<Vec<ModelTable>, AppError> {
            Ok(self.tables.clone())
        }

        fn relationships(&self) -> Result<Vec<Relationship>, AppError> {
            if self.fail_relationships {
                return Err(AppError::MalformedResponse("relationships unavailable".into()));
            }
            Ok(vec![Relationship {
                name: "rel".into(),
                from_table: "Sales".into(),
                from_column: "DateKey".into(),
                to_table: "Date".into(),
                to_column: "DateKey".into(),
                is_active: false,
                from_cardinality: "Many".into(),
                to_cardinality: "One".into(),
                cross_filtering_behavior: "OneDirection".into(),
            }])
        }

        fn depends_on(&self, object: &CalculatedObject) -> Result<Vec<Dependency>, AppError> {
            Ok(vec![Dependency {
                kind: DependencyKind::Column,
                table: object.table.clone(),
                name: "Amount".into(),
            }])
        }
    }

    struct FixedInspector {
        tables: Vec<ModelTable>,
        fail_relationships: bool,
        fail_open: bool,
    }

    impl ModelInspector for FixedInspector {
        fn open(&self, _: &WorkspaceRef, _: &ParentRef) -> Result<Box<dyn ModelSession>, AppError> {
            if self.fail_open {
                return Err(AppError::ServiceStatus {
                    endpoint: "getDefinition".into(),
                    status: 403,
                });
            }
            Ok(Box::new(FixedModel {
                tables: self.tables.clone(),
                fail_relationships: self.fail_relationships,
            }))
        }
    }

    fn sales_table() -> ModelTable {
        ModelTable {
            name: "Sales".into(),
            storage_mode: "Import".into(),
            columns: vec![
                ModelColumn {
                    name: "Amount".into(),
                    ..ModelColumn::default()
                },
                ModelColumn {
                    name: "Net".into(),
                    expression: Some("[Amount] * 0.9".into()),
                    ..ModelColumn::default()
                },
            ],
            measures: vec![Measure {
                name: "Total".into(),
                expression: "SUM(Sales[Amount])".into(),
                ..Measure::default()
            }],
            partitions: vec![Partition {
                name: "p0".into(),
                mode: "Import".into(),
                ..Partition::default()
            }],
            ..ModelTable::default()
        }
    }

    fn inspector(tables: Vec<ModelTable>) -> FixedInspector {
        FixedInspector {
            tables,
            fail_relationships: false,
            fail_open: false,
        }
    }

    fn run(inspector: &FixedInspector) -> FetchOutcome<ModelMetadata> {
        fetch_model_metadata(
            inspector,
            &WorkspaceRef::new("ws", "Finance"),
            &ParentRef::new("m1", "Ledger"),
            "2026-10-19",
        )
    }

    #[test]
    fn rows_are_grouped_by_kind() {
        let outcome = run(&inspector(vec![sales_table()]));
        let kinds: Vec<_> = outcome.records.details.iter().map(|r| r.text("Type").to_string()).collect();
        assert_eq!(
            kinds,
            vec!["Table", "Column", "Column", "CalculatedColumn", "Measure", "Partition", "Relationship"]
        );
        let relationship = outcome.records.details.last().expect("relationship row");
        assert_eq!(relationship.text("RelationshipStatus"), "False");
        assert_eq!(relationship.text("Name"), "DateKey");
        assert_eq!(relationship.text("IsHidden"), "");
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn dependencies_cover_every_calculated_object() {
        let outcome = run(&inspector(vec![sales_table()]));
        let deps: Vec<_> = outcome
            .records
            .dependencies
            .iter()
            .map(|r| (r.text("ObjectName").to_string(), r.text("ObjectType").to_string(), r.text("DependsOn").to_string()))
            .collect();
        assert_eq!(
            deps,
            vec![
                ("Total".to_string(), "Measure".to_string(), "'Sales'[Amount]".to_string()),
                ("Net".to_string(), "CalculatedColumn".to_string(), "'Sales'[Amount]".to_string()),
            ]
        );
        assert_eq!(outcome.records.dependencies[0].text("ModelAsOfDate"), "2026-10-19");
    }

    #[test]
    fn calculation_groups_get_their_own_rows() {
        let group = ModelTable {
            name: "Time Intelligence".into(),
            description: "YTD and friends".into(),
            calculation_items: Some(vec![CalculationItem {
                name: "YTD".into(),
                expression: "CALCULATE(SELECTEDMEASURE(), DATESYTD('Date'[Date]))".into(),
                ..CalculationItem::default()
            }]),
            ..ModelTable::default()
        };
        let outcome = run(&inspector(vec![group]));
        let group_row = &outcome.records.details[1];
        assert_eq!(group_row.text("Type"), "CalculationGroup");
        assert_eq!(group_row.text("Description"), "YTD and friends");
        assert_eq!(outcome.records.details[2].text("Type"), "CalculationItem");
        assert_eq!(outcome.records.dependencies[0].text("ObjectType"), "CalculationItem");
    }

    #[test]
    fn failed_sub_call_keeps_siblings() {
        let mut failing = inspector(vec![sales_table()]);
        failing.fail_relationships = true;
        let outcome = run(&failing);

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].subcall, "relationships");
        assert!(outcome.records.details.iter().all(|r| r.text("Type") != "Relationship"));
        assert_eq!(outcome.records.dependencies.len(), 2);
    }

    #[test]
    fn unopenable_model_yields_one_error() {
        let mut failing = inspector(vec![sales_table()]);
        failing.fail_open = true;
        let outcome = run(&failing);

        assert_eq!(outcome.records, ModelMetadata::default());
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].subcall, "open model");
    }

    #[test]
    fn empty_model_skips_dependencies() {
        let outcome = run(&inspector(Vec::new()));
        assert!(outcome.records.dependencies.is_empty());
        assert!(outcome.errors.is_empty());
    }
}
