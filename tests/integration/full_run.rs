// tests/integration/full_run.rs
//! Every stage through the orchestrator into a sink.

use crate::common::{column, tenant, FakeApi};
use fabric_governance::records::schemas::all_tables;
use fabric_governance::{
    DirectorySink, ExtractionContext, ExtractionSummary, MemorySink, Orchestrator,
    PbirLegacyInspector, SchemaName, Stage, TableSink, TmslModelInspector, WorkerCount,
    WorkspaceFilter,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

fn run(api: &FakeApi, sink: &dyn TableSink, stages: &[Stage]) -> ExtractionSummary {
    let models = TmslModelInspector::new(api);
    let reports = PbirLegacyInspector::new(api);
    let context = ExtractionContext {
        api,
        workers: WorkerCount::new(4).expect("valid worker count"),
        report_date: "2026-10-19".to_string(),
        started: Instant::now(),
    };
    Orchestrator::new(context, &models, &reports, sink)
        .run(&WorkspaceFilter::All, stages)
        .expect("run completes")
}

#[test]
fn every_table_is_written_even_when_definitions_are_missing() {
    let api = tenant();
    let sink = MemorySink::new();

    let summary = run(&api, &sink, &Stage::ALL);

    assert_eq!(summary.workspaces, 2);
    assert_eq!(sink.len(), 28);
    assert_eq!(summary.rows_per_table.len(), 28);
    assert!(summary.sink.is_success());
    for table in all_tables() {
        let batch = sink.table(table.name).expect("table written");
        assert_eq!(batch.columns.len(), table.columns.len(), "{}", table.name);
    }

    // Neither report definition is served: one open failure each, no rows.
    assert_eq!(summary.stats.soft_errors, 2);
    assert_eq!(summary.rows_per_table["Connections"], 0);
    assert_eq!(summary.rows_per_table["Visuals"], 0);
}

#[test]
fn model_stage_flattens_the_served_definition() {
    let api = tenant();
    let sink = MemorySink::new();

    let summary = run(&api, &sink, &[Stage::Models]);

    assert_eq!(sink.table_names(), vec!["ModelDetail", "ModelDependencies"]);
    assert_eq!(summary.stats.soft_errors, 0);

    let detail = sink.table("ModelDetail").expect("model detail");
    let mut kinds = column(&detail, "Type");
    kinds.sort();
    assert_eq!(kinds, vec!["Column", "Measure", "Partition", "Table"]);
    assert!(column(&detail, "ModelName").iter().all(|name| name == "Ledger"));

    let dependencies = sink.table("ModelDependencies").expect("model dependencies");
    assert_eq!(column(&dependencies, "ObjectName"), vec!["Total"]);
    assert_eq!(column(&dependencies, "DependsOn"), vec!["'Sales'[Amount]"]);
    assert_eq!(column(&dependencies, "DependsOnType"), vec!["Column"]);
}

#[test]
fn stage_tables_land_as_json_files() {
    let api = tenant();
    let dir = tempfile::tempdir().expect("temp dir");
    let sink = DirectorySink::new(dir.path(), &SchemaName::new("governance").expect("valid schema"));

    let summary = run(&api, &sink, &[Stage::DataflowDetail]);

    assert_eq!(summary.tables_written(), 1);
    assert_eq!(summary.total_rows(), 3);
    let path = sink.table_path("DataflowDetail");
    assert!(path.starts_with(dir.path().join("governance")));
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).expect("table file")).expect("valid JSON");
    assert_eq!(written["rows"].as_array().map(Vec::len), Some(3));
}

#[test]
fn workspaces_are_listed_once_per_run() {
    let api = tenant();
    let sink = MemorySink::new();

    run(&api, &sink, &[Stage::Tenant, Stage::Reports]);

    let listings = api
        .calls()
        .iter()
        .filter(|endpoint| endpoint.as_str() == "v1.0/myorg/groups")
        .count();
    assert_eq!(listings, 1);
}

#[test]
fn report_with_binary_resources_is_still_read() {
    let report = json!({
        "config": "{}",
        "sections": [
            { "name": "ReportSection1", "displayName": "Summary", "ordinal": 0, "visualContainers": [] }
        ]
    })
    .to_string();
    let logo: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0xff, 0xd8];
    let api = tenant().with_binary_definition(
        "v1/workspaces/ws-1/reports/rep-1/getDefinition?format=PBIR-Legacy",
        &[
            ("report.json", report.as_bytes()),
            ("StaticResources/RegisteredResources/logo.png", logo),
        ],
    );
    let sink = MemorySink::new();

    let summary = run(&api, &sink, &[Stage::Reports]);

    // Only the orphan report, whose definition is not served, fails.
    assert_eq!(summary.stats.soft_errors, 1);
    assert_eq!(summary.rows_per_table["Connections"], 1);
    let pages = sink.table("Pages").expect("pages table");
    assert_eq!(column(&pages, "ReportID"), vec!["rep-1"]);
}

/// Two datasets whose source listings answer at different speeds.
fn two_datasets(slow_dataset: &str) -> FakeApi {
    tenant()
        .with_collection(
            "v1.0/myorg/groups/ws-1/datasets",
            json!([
                { "id": "ds-1", "name": "Ledger", "isRefreshable": true },
                { "id": "ds-3", "name": "Budget", "isRefreshable": false }
            ]),
        )
        .with_collection(
            "v1.0/myorg/groups/ws-1/datasets/ds-3/datasources",
            json!([{ "datasourceType": "File", "datasourceId": "src-3" }]),
        )
        .slow(
            &format!("v1.0/myorg/groups/ws-1/datasets/{}/datasources", slow_dataset),
            Duration::from_millis(150),
        )
}

fn written_files(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    fs::read_dir(dir.join("governance"))
        .expect("schema directory")
        .map(|entry| {
            let path = entry.expect("directory entry").path();
            let name = path.file_name().expect("file name").to_string_lossy().into_owned();
            (name, fs::read(&path).expect("table file"))
        })
        .collect()
}

#[test]
fn repeated_runs_write_identical_tables() {
    let schema = SchemaName::new("governance").expect("valid schema");
    let mut runs = Vec::new();
    for slow_dataset in ["ds-1", "ds-3"] {
        let api = two_datasets(slow_dataset);
        let dir = tempfile::tempdir().expect("temp dir");
        let sink = DirectorySink::new(dir.path(), &schema);
        run(&api, &sink, &[Stage::Tenant]);
        runs.push(written_files(dir.path()));
    }

    assert_eq!(runs[0].len(), 14);
    assert_eq!(runs[0], runs[1]);

    let sources: serde_json::Value =
        serde_json::from_slice(&runs[0]["DatasetSourcesInfo.json"]).expect("valid JSON");
    let dataset_ids: Vec<_> = sources["rows"]
        .as_array()
        .expect("rows")
        .iter()
        .map(|row| row[2].clone())
        .collect();
    assert_eq!(dataset_ids, vec![json!("ds-1"), json!("ds-3")]);
}
