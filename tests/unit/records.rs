// tests/unit/records.rs
//! Normalization against the fixed table schemas.

use fabric_governance::fetch::schedule_rows;
use fabric_governance::records::schemas::{all_tables, DATASETS, DATASET_SOURCES};
use fabric_governance::{normalize, FieldMapping, LookupTable, Lookups, RecordContext};
use pretty_assertions::assert_eq;
use serde_json::json;

const DATASET_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("DatasetId", "id"),
    FieldMapping::key("DatasetName", "name"),
    FieldMapping::key("DatasetIsRefreshable", "isRefreshable"),
];

#[test]
fn there_are_twenty_eight_tables() {
    assert_eq!(all_tables().count(), 28);
}

#[test]
fn missing_fields_take_empty_defaults() {
    let record = normalize(
        &DATASETS,
        &json!({ "id": "ds-1" }),
        &RecordContext::new().with("WorkspaceName", "Finance"),
        DATASET_MAPPINGS,
    );

    assert_eq!(record.text("DatasetId"), "ds-1");
    assert_eq!(record.text("DatasetName"), "");
    assert_eq!(record.text("DatasetIsRefreshable"), "False");
    assert_eq!(record.text("WorkspaceName"), "Finance");
    assert_eq!(
        record.column_names().collect::<Vec<_>>(),
        DATASETS.columns.iter().map(|c| c.name).collect::<Vec<_>>()
    );
}

#[test]
fn nested_objects_become_json_text() {
    let mappings = &[FieldMapping::key("DatasetDatasourceConnectionDetails", "connectionDetails")];
    let present = normalize(
        &DATASET_SOURCES,
        &json!({ "connectionDetails": { "server": "sql01" } }),
        &RecordContext::new(),
        mappings,
    );
    let empty = normalize(
        &DATASET_SOURCES,
        &json!({ "connectionDetails": {} }),
        &RecordContext::new(),
        mappings,
    );

    assert!(present.text("DatasetDatasourceConnectionDetails").contains("sql01"));
    assert_eq!(empty.text("DatasetDatasourceConnectionDetails"), "");
}

#[test]
fn schedule_cross_product() {
    let context = RecordContext::new().with("DatasetId", "ds-1");

    let crossed = schedule_rows(
        &json!({ "enabled": true, "days": ["Monday", "Wednesday"], "times": ["08:00"] }),
        &context,
    );
    let days: Vec<_> = crossed.iter().map(|r| r.text("DatasetRefreshScheduleDay")).collect();
    assert_eq!(days, vec!["Monday", "Wednesday"]);
    assert!(crossed.iter().all(|r| r.text("DatasetRefreshScheduleTime") == "08:00"));

    let no_days = schedule_rows(&json!({ "enabled": false, "days": [], "times": ["08:00"] }), &context);
    assert_eq!(no_days.len(), 1);
    assert_eq!(no_days[0].text("DatasetRefreshScheduleDay"), "");
    assert_eq!(no_days[0].text("DatasetRefreshScheduleEnabled"), "False");
}

#[test]
fn lookups_fall_back_to_sentinels() {
    let lookups = Lookups::default();
    assert_eq!(lookups.datasets.resolve("missing"), "Unknown Dataset");
    assert_eq!(lookups.dataflows.resolve("missing"), "Unknown Dataflow");

    let mut table = LookupTable::new("Unknown Dataset");
    table.insert("ds-1", "Ledger");
    assert_eq!(table.resolve("ds-1"), "Ledger");
    assert_eq!(table.len(), 1);
}
