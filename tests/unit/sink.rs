// tests/unit/sink.rs
//! Whole-table replacement through the directory and memory sinks.

use fabric_governance::records::schemas::{APPS, WORKSPACES};
use fabric_governance::{
    normalize, write_all, write_table, DirectorySink, FieldMapping, MemorySink, RecordContext,
    SchemaName, TableSink,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;

fn workspace(id: &str, name: &str) -> fabric_governance::DetailRecord {
    normalize(
        &WORKSPACES,
        &json!({ "id": id, "name": name }),
        &RecordContext::new(),
        &[FieldMapping::key("WorkspaceId", "id"), FieldMapping::key("WorkspaceName", "name")],
    )
}

#[test]
fn empty_table_keeps_its_schema() {
    let dir = tempfile::tempdir().expect("temp dir");
    let sink = DirectorySink::new(dir.path(), &SchemaName::new("dbo").expect("valid schema"));

    let rows = write_table(&sink, &APPS, &[]).expect("write succeeds");
    assert_eq!(rows, 0);

    let written: Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("dbo").join("Apps.json")).expect("table file"),
    )
    .expect("valid JSON");
    assert_eq!(written["table"], "Apps");
    assert_eq!(written["rows"], json!([]));
    let columns: Vec<&str> = written["columns"]
        .as_array()
        .expect("column list")
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(columns, APPS.columns.iter().map(|c| c.name).collect::<Vec<_>>());
}

#[test]
fn rewriting_replaces_previous_rows() {
    let dir = tempfile::tempdir().expect("temp dir");
    let sink = DirectorySink::new(dir.path(), &SchemaName::new("gov").expect("valid schema"));

    write_table(&sink, &WORKSPACES, &[workspace("ws-1", "Finance"), workspace("ws-2", "Sales")])
        .expect("first write");
    write_table(&sink, &WORKSPACES, &[workspace("ws-3", "Ops")]).expect("second write");

    let written: Value = serde_json::from_str(
        &fs::read_to_string(sink.table_path("Workspaces")).expect("table file"),
    )
    .expect("valid JSON");
    assert_eq!(written["rows"], json!([["ws-3", "Ops", "", ""]]));
}

#[test]
fn memory_sink_reports_every_table() {
    let sink = MemorySink::new();
    let records = vec![workspace("ws-1", "Finance")];
    let report = write_all(
        &sink as &dyn TableSink,
        vec![(&WORKSPACES, records.as_slice()), (&APPS, &[][..])],
    );

    assert!(report.is_success());
    assert_eq!(report.written.len(), 2);
    assert_eq!(sink.table_names(), vec!["Workspaces", "Apps"]);
    assert_eq!(sink.table("Workspaces").map(|t| t.row_count()), Some(1));
}
