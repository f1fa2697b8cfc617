// tests/integration/tenant_stage.rs
//! The tenant inventory stage against the canned tenant.

use crate::common::{tenant, FakeApi};
use fabric_governance::{
    extract_dataflow_detail, extract_tenant, list_workspaces, AppError, ConfigError,
    ExtractionContext, StageStats, TenantCatalog, WorkerCount, WorkspaceFilter,
};
use pretty_assertions::assert_eq;
use std::time::Instant;

fn finance_only() -> WorkspaceFilter {
    WorkspaceFilter::from_names(vec!["Finance".to_string()]).expect("valid filter")
}

fn extract_from(api: &FakeApi, workers: usize) -> (TenantCatalog, StageStats) {
    let listing = list_workspaces(api, &finance_only()).expect("workspaces listed");
    let ctx = ExtractionContext {
        api,
        workers: WorkerCount::new(workers).expect("valid worker count"),
        report_date: "2026-10-19".to_string(),
        started: Instant::now(),
    };
    extract_tenant(&ctx, &listing)
}

fn run_tenant(workers: usize) -> TenantCatalog {
    let (catalog, stats) = extract_from(&tenant(), workers);
    assert_eq!(stats.soft_errors, 0);
    assert_eq!(stats.listing_failures, 0);
    assert_eq!(stats.dispatch.failed, 0);
    catalog
}

#[test]
fn inventory_covers_the_filtered_workspace() {
    let catalog = run_tenant(3);

    assert_eq!(catalog.workspaces.len(), 1);
    assert_eq!(catalog.workspaces[0].text("WorkspaceCapacityId"), "cap-1");

    assert_eq!(catalog.datasets.len(), 1);
    assert_eq!(catalog.datasets[0].text("DatasetIsRefreshable"), "True");
    assert_eq!(catalog.dataset_sources.len(), 1);
    assert_eq!(catalog.dataset_sources[0].text("DatasetName"), "Ledger");
    assert_eq!(catalog.dataset_refresh_history.len(), 1);
    assert_eq!(catalog.dataset_refresh_schedule.len(), 2);

    assert_eq!(catalog.dataflows.len(), 1);
    assert!(catalog.dataflow_sources.is_empty());
    assert_eq!(catalog.dataflow_refresh_history.len(), 1);

    let item_types: Vec<_> = catalog.fabric_items.iter().map(|r| r.text("FabricItemType")).collect();
    assert_eq!(item_types, vec!["Lakehouse", "Dataflow"]);

    assert_eq!(catalog.report_pages.len(), 1);
    assert_eq!(catalog.report_pages[0].text("PageDisplayName"), "Summary");
}

#[test]
fn reports_and_lineage_resolve_names_through_lookups() {
    let catalog = run_tenant(1);

    let dataset_names: Vec<_> = catalog.reports.iter().map(|r| r.text("DatasetName")).collect();
    assert_eq!(dataset_names, vec!["Ledger", "Unknown Dataset"]);

    let lineage: Vec<_> = catalog
        .dataflow_lineage
        .iter()
        .map(|r| (r.text("DataflowName"), r.text("DatasetName")))
        .collect();
    assert_eq!(
        lineage,
        vec![("GL_Load", "Ledger"), ("Unknown Dataflow", "Ledger")]
    );
}

#[test]
fn apps_are_limited_to_listed_workspaces() {
    let catalog = run_tenant(2);

    assert_eq!(catalog.apps.len(), 1);
    assert_eq!(catalog.apps[0].text("WorkspaceName"), "Finance");
    assert_eq!(catalog.app_reports.len(), 1);
    assert_eq!(catalog.app_reports[0].text("AppName"), "Finance App");
    assert_eq!(catalog.app_reports[0].text("ReportId"), "rep-1");
    assert_eq!(catalog.app_reports[0].text("AppReportIsOwnedByMe"), "False");
}

#[test]
fn both_dataflow_generations_yield_queries() {
    let api = tenant();
    let listing = list_workspaces(&api, &finance_only()).expect("workspaces listed");
    let ctx = ExtractionContext {
        api: &api,
        workers: WorkerCount::new(2).expect("valid worker count"),
        report_date: "2026-10-19".to_string(),
        started: Instant::now(),
    };

    let (catalog, stats) = extract_dataflow_detail(&ctx, &listing.workspaces);
    assert_eq!(stats.dispatch.submitted, 2);

    let mut queries: Vec<_> = catalog
        .queries
        .iter()
        .map(|r| (r.text("DataflowName"), r.text("QueryName")))
        .collect();
    queries.sort();
    assert_eq!(
        queries,
        vec![
            ("Budget Flow", "Budget"),
            ("GL_Load", "Accounts"),
            ("GL_Load", "GL Lines"),
        ]
    );
    assert!(catalog
        .queries
        .iter()
        .all(|r| r.text("ReportDate") == "2026-10-19"));
}

#[test]
fn failed_family_listing_leaves_other_families_intact() {
    let api = tenant().unreachable("v1.0/myorg/groups/ws-1/dataflows");

    let (catalog, stats) = extract_from(&api, 2);

    assert_eq!(stats.listing_failures, 1);
    assert_eq!(stats.soft_errors, 0);
    assert!(catalog.dataflows.is_empty());
    assert!(catalog.dataflow_refresh_history.is_empty());

    assert_eq!(catalog.datasets.len(), 1);
    assert_eq!(catalog.dataset_sources.len(), 1);
    assert_eq!(catalog.reports.len(), 2);
    assert_eq!(catalog.apps.len(), 1);
    // Lineage still runs; with no dataflows listed every name is the sentinel.
    let names: Vec<_> = catalog.dataflow_lineage.iter().map(|r| r.text("DataflowName")).collect();
    assert_eq!(names, vec!["Unknown Dataflow", "Unknown Dataflow"]);
}

#[test]
fn failed_dataset_subcall_is_a_soft_error() {
    let api = tenant().unreachable("v1.0/myorg/groups/ws-1/datasets/ds-1/refreshes");

    let (catalog, stats) = extract_from(&api, 2);

    assert_eq!(stats.soft_errors, 1);
    assert_eq!(stats.listing_failures, 0);
    assert_eq!(stats.dispatch.failed, 0);
    assert!(catalog.dataset_refresh_history.is_empty());
    assert_eq!(catalog.dataset_sources.len(), 1);
    assert_eq!(catalog.dataset_refresh_schedule.len(), 2);
}

#[test]
fn unmatched_workspace_filter_is_a_configuration_error() {
    let api = tenant();
    let filter = WorkspaceFilter::from_names(vec!["Marketing".to_string()]).expect("valid filter");

    let result = list_workspaces(&api, &filter);
    assert!(matches!(
        result,
        Err(AppError::Configuration(ConfigError::NoMatchingWorkspaces { .. }))
    ));
}
