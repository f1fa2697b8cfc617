// src/extract/tenant.rs
//! Tenant inventory: workspaces, datasets, dataflows, Fabric items, reports,
//! apps and dataflow lineage.

use super::{text_field, Catalog, ExtractionContext, Lookups, StageStats, WorkspaceListing};
use crate::dispatch::TaskOutcome;
use crate::fetch::{fetch_dataflow_details, fetch_dataset_details, fetch_report_pages, list_items};
use crate::records::schemas::{
    APPS, APP_REPORTS, DATAFLOWS, DATAFLOW_LINEAGE, DATAFLOW_REFRESH_HISTORY, DATAFLOW_SOURCES,
    DATASETS, DATASET_REFRESH_HISTORY, DATASET_REFRESH_SCHEDULE, DATASET_SOURCES, FABRIC_ITEMS,
    REPORTS, REPORT_PAGES, WORKSPACES,
};
use crate::records::{normalize, DetailRecord, FieldMapping, RecordContext, TableSchema};
use crate::types::{ParentRef, WorkspaceRef};
use std::collections::HashMap;

const DATASET_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("DatasetId", "id"),
    FieldMapping::key("DatasetName", "name"),
    FieldMapping::key("DatasetDescription", "description"),
    FieldMapping::key("DatasetWebUrl", "webUrl"),
    FieldMapping::key("DatasetConfiguredBy", "configuredBy"),
    FieldMapping::key("DatasetIsRefreshable", "isRefreshable"),
    FieldMapping::key("DatasetTargetStorageMode", "targetStorageMode"),
    FieldMapping::key("DatasetCreatedDate", "createdDate"),
];

const DATAFLOW_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("DataflowId", "objectId"),
    FieldMapping::key("DataflowName", "name"),
    FieldMapping::key("DataflowDescription", "description"),
    FieldMapping::key("DataflowConfiguredBy", "configuredBy"),
    FieldMapping::key("DataflowModifiedBy", "modifiedBy"),
    FieldMapping::key("DataflowModifiedDateTime", "modifiedDateTime"),
    FieldMapping::key("DataflowJsonURL", "modelUrl"),
    FieldMapping::key("DataflowGeneration", "generation"),
];

const FABRIC_ITEM_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("FabricItemID", "id"),
    FieldMapping::key("FabricItemType", "type"),
    FieldMapping::key("FabricItemName", "displayName"),
    FieldMapping::key("FabricItemDescription", "description"),
];

const REPORT_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("ReportId", "id"),
    FieldMapping::key("ReportName", "name"),
    FieldMapping::key("ReportDescription", "description"),
    FieldMapping::key("ReportWebUrl", "webUrl"),
    FieldMapping::key("ReportEmbedUrl", "embedUrl"),
    FieldMapping::key("ReportType", "reportType"),
    FieldMapping::key("DatasetId", "datasetId"),
];

const APP_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("AppId", "id"),
    FieldMapping::key("AppName", "name"),
    FieldMapping::key("AppLastUpdate", "lastUpdate"),
    FieldMapping::key("AppDescription", "description"),
    FieldMapping::key("AppPublishedBy", "publishedBy"),
    FieldMapping::key("AppWorkspaceId", "workspaceId"),
];

const APP_REPORT_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("AppReportId", "id"),
    FieldMapping::key("AppReportType", "reportType"),
    FieldMapping::key("ReportName", "name"),
    FieldMapping::key("AppReportWebUrl", "webUrl"),
    FieldMapping::key("AppReportEmbedUrl", "embedUrl"),
    FieldMapping::key("AppReportIsOwnedByMe", "isOwnedByMe"),
    FieldMapping::key("AppReportDatasetId", "datasetId"),
    FieldMapping::key("ReportId", "originalReportObjectId"),
];

const LINEAGE_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("DataflowId", "dataflowObjectId"),
    FieldMapping::key("DatasetId", "datasetObjectId"),
];

/// Item types listed elsewhere in the inventory.
const EXCLUDED_ITEM_TYPES: [&str; 2] = ["Report", "SemanticModel"];

/// The 14 tenant tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenantCatalog {
    pub workspaces: Vec<DetailRecord>,
    pub fabric_items: Vec<DetailRecord>,
    pub datasets: Vec<DetailRecord>,
    pub dataset_sources: Vec<DetailRecord>,
    pub dataset_refresh_history: Vec<DetailRecord>,
    pub dataset_refresh_schedule: Vec<DetailRecord>,
    pub dataflows: Vec<DetailRecord>,
    pub dataflow_lineage: Vec<DetailRecord>,
    pub dataflow_sources: Vec<DetailRecord>,
    pub dataflow_refresh_history: Vec<DetailRecord>,
    pub reports: Vec<DetailRecord>,
    pub report_pages: Vec<DetailRecord>,
    pub apps: Vec<DetailRecord>,
    pub app_reports: Vec<DetailRecord>,
}

impl Catalog for TenantCatalog {
    fn tables(&self) -> Vec<(&'static TableSchema, &[DetailRecord])> {
        vec![
            (&WORKSPACES, self.workspaces.as_slice()),
            (&FABRIC_ITEMS, self.fabric_items.as_slice()),
            (&DATASETS, self.datasets.as_slice()),
            (&DATASET_SOURCES, self.dataset_sources.as_slice()),
            (&DATASET_REFRESH_HISTORY, self.dataset_refresh_history.as_slice()),
            (&DATASET_REFRESH_SCHEDULE, self.dataset_refresh_schedule.as_slice()),
            (&DATAFLOWS, self.dataflows.as_slice()),
            (&DATAFLOW_LINEAGE, self.dataflow_lineage.as_slice()),
            (&DATAFLOW_SOURCES, self.dataflow_sources.as_slice()),
            (&DATAFLOW_REFRESH_HISTORY, self.dataflow_refresh_history.as_slice()),
            (&REPORTS, self.reports.as_slice()),
            (&REPORT_PAGES, self.report_pages.as_slice()),
            (&APPS, self.apps.as_slice()),
            (&APP_REPORTS, self.app_reports.as_slice()),
        ]
    }
}

/// Builds the tenant inventory for the listed workspaces.
///
/// Workspaces are processed one after another; within a workspace the
/// dataset, dataflow and report detail fetches fan out. Apps and lineage run
/// last because they resolve names collected from every workspace.
pub fn extract_tenant(ctx: &ExtractionContext<'_>, listing: &WorkspaceListing) -> (TenantCatalog, StageStats) {
    let mut catalog = TenantCatalog {
        workspaces: listing.records.clone(),
        ..TenantCatalog::default()
    };
    let mut stats = StageStats::default();
    let mut lookups = Lookups::default();

    for workspace in &listing.workspaces {
        log::info!(
            "Processing workspace: {} | Elapsed: {:.2} min",
            workspace.name,
            ctx.elapsed_minutes()
        );
        collect_datasets(ctx, workspace, &mut lookups, &mut catalog, &mut stats);
        collect_dataflows(ctx, workspace, &mut lookups, &mut catalog, &mut stats);
        collect_fabric_items(ctx, workspace, &mut catalog, &mut stats);
        collect_reports(ctx, workspace, &lookups, &mut catalog, &mut stats);
        log::info!("✓ Finished workspace: {}", workspace.name);
    }

    collect_apps(ctx, &listing.workspaces, &mut catalog, &mut stats);
    collect_lineage(ctx, &listing.workspaces, &lookups, &mut catalog, &mut stats);

    (catalog, stats)
}

fn workspace_context(workspace: &WorkspaceRef) -> RecordContext {
    RecordContext::new()
        .with("WorkspaceId", workspace.id.as_str())
        .with("WorkspaceName", workspace.name.as_str())
}

fn collect_datasets(
    ctx: &ExtractionContext<'_>,
    workspace: &WorkspaceRef,
    lookups: &mut Lookups,
    catalog: &mut TenantCatalog,
    stats: &mut StageStats,
) {
    let api = ctx.api;
    let items = match list_items(api, &format!("v1.0/myorg/groups/{}/datasets", workspace.id)) {
        Ok(items) => items,
        Err(e) => return stats.record_listing_failure("datasets", &e),
    };
    log::info!("  Datasets found: {}", items.len());

    let context = workspace_context(workspace);
    let mut tasks = Vec::with_capacity(items.len());
    for item in &items {
        let record = normalize(&DATASETS, item, &context, DATASET_MAPPINGS);
        lookups.datasets.insert(record.text("DatasetId"), record.text("DatasetName"));
        tasks.push(ParentRef::new(record.text("DatasetId"), record.text("DatasetName")));
        catalog.datasets.push(record);
    }
    if tasks.is_empty() {
        return;
    }

    log::info!("  Fetching dataset details in parallel (max {} workers)...", ctx.workers);
    let dispatch = ctx.dispatcher().dispatch(
        tasks,
        |dataset| fetch_dataset_details(api, workspace, dataset),
        |dataset, outcome| {
            if let TaskOutcome::Success(outcome) = outcome {
                stats.record_warnings(&dataset.name, &outcome.errors);
                catalog.dataset_sources.extend(outcome.records.sources);
                catalog.dataset_refresh_history.extend(outcome.records.refresh_history);
                catalog.dataset_refresh_schedule.extend(outcome.records.refresh_schedule);
            }
        },
    );
    stats.absorb_dispatch(dispatch);
}

fn collect_dataflows(
    ctx: &ExtractionContext<'_>,
    workspace: &WorkspaceRef,
    lookups: &mut Lookups,
    catalog: &mut TenantCatalog,
    stats: &mut StageStats,
) {
    let api = ctx.api;
    let items = match list_items(api, &format!("v1.0/myorg/groups/{}/dataflows", workspace.id)) {
        Ok(items) => items,
        Err(e) => return stats.record_listing_failure("dataflows", &e),
    };
    log::info!("  Dataflows found: {}", items.len());

    let context = workspace_context(workspace);
    let mut tasks = Vec::with_capacity(items.len());
    for item in &items {
        let record = normalize(&DATAFLOWS, item, &context, DATAFLOW_MAPPINGS);
        lookups.dataflows.insert(record.text("DataflowId"), record.text("DataflowName"));
        tasks.push(ParentRef::new(record.text("DataflowId"), record.text("DataflowName")));
        catalog.dataflows.push(record);
    }
    if tasks.is_empty() {
        return;
    }

    log::info!("  Fetching dataflow details in parallel (max {} workers)...", ctx.workers);
    let dispatch = ctx.dispatcher().dispatch(
        tasks,
        |dataflow| fetch_dataflow_details(api, workspace, dataflow),
        |dataflow, outcome| {
            if let TaskOutcome::Success(outcome) = outcome {
                stats.record_warnings(&dataflow.name, &outcome.errors);
                catalog.dataflow_sources.extend(outcome.records.sources);
                catalog.dataflow_refresh_history.extend(outcome.records.refresh_history);
            }
        },
    );
    stats.absorb_dispatch(dispatch);
}

fn collect_fabric_items(
    ctx: &ExtractionContext<'_>,
    workspace: &WorkspaceRef,
    catalog: &mut TenantCatalog,
    stats: &mut StageStats,
) {
    let items = match list_items(ctx.api, &format!("v1/workspaces/{}/items", workspace.id)) {
        Ok(items) => items,
        Err(e) => return stats.record_listing_failure("Fabric items", &e),
    };

    let context = workspace_context(workspace);
    let before = catalog.fabric_items.len();
    catalog.fabric_items.extend(
        items
            .iter()
            .filter(|item| !EXCLUDED_ITEM_TYPES.contains(&text_field(item, "type")))
            .map(|item| normalize(&FABRIC_ITEMS, item, &context, FABRIC_ITEM_MAPPINGS)),
    );
    log::info!("  Fabric items found: {}", catalog.fabric_items.len() - before);
}

fn collect_reports(
    ctx: &ExtractionContext<'_>,
    workspace: &WorkspaceRef,
    lookups: &Lookups,
    catalog: &mut TenantCatalog,
    stats: &mut StageStats,
) {
    let api = ctx.api;
    let items = match list_items(api, &format!("v1.0/myorg/groups/{}/reports", workspace.id)) {
        Ok(items) => items,
        Err(e) => return stats.record_listing_failure("reports", &e),
    };
    log::info!("  Reports found: {}", items.len());

    let context = workspace_context(workspace);
    let mut tasks = Vec::with_capacity(items.len());
    for item in &items {
        let mut record = normalize(&REPORTS, item, &context, REPORT_MAPPINGS);
        let dataset_name = lookups.datasets.resolve(record.text("DatasetId")).to_string();
        record.set("DatasetName", dataset_name);
        tasks.push(ParentRef::new(record.text("ReportId"), record.text("ReportName")));
        catalog.reports.push(record);
    }
    if tasks.is_empty() {
        return;
    }

    let dispatch = ctx.dispatcher().dispatch(
        tasks,
        |report| fetch_report_pages(api, workspace, report),
        |report, outcome| {
            if let TaskOutcome::Success(outcome) = outcome {
                stats.record_warnings(&report.name, &outcome.errors);
                catalog.report_pages.extend(outcome.records);
            }
        },
    );
    stats.absorb_dispatch(dispatch);
}

fn collect_apps(
    ctx: &ExtractionContext<'_>,
    workspaces: &[WorkspaceRef],
    catalog: &mut TenantCatalog,
    stats: &mut StageStats,
) {
    log::info!("Fetching Apps and App Reports");
    let apps = match list_items(ctx.api, "v1.0/myorg/apps") {
        Ok(apps) => apps,
        Err(e) => return stats.record_listing_failure("apps", &e),
    };
    log::info!("Apps found: {}", apps.len());

    let workspace_names: HashMap<&str, &str> = workspaces
        .iter()
        .map(|w| (w.id.as_str(), w.name.as_str()))
        .collect();

    for app in &apps {
        let Some(&workspace_name) = workspace_names.get(text_field(app, "workspaceId")) else {
            continue;
        };
        let record = normalize(
            &APPS,
            app,
            &RecordContext::new().with("WorkspaceName", workspace_name),
            APP_MAPPINGS,
        );
        let app_id = record.text("AppId").to_string();
        let app_name = record.text("AppName").to_string();
        catalog.apps.push(record);

        match list_items(ctx.api, &format!("v1.0/myorg/apps/{}/reports", app_id)) {
            Ok(reports) => {
                let context = RecordContext::new()
                    .with("AppId", app_id.as_str())
                    .with("AppName", app_name.as_str())
                    .with("WorkspaceName", workspace_name);
                catalog.app_reports.extend(
                    reports
                        .iter()
                        .map(|report| normalize(&APP_REPORTS, report, &context, APP_REPORT_MAPPINGS)),
                );
            }
            Err(e) => {
                log::warn!("  ERROR fetching app reports for {}: {}", app_name, e);
                stats.soft_errors += 1;
            }
        }
    }
}

fn collect_lineage(
    ctx: &ExtractionContext<'_>,
    workspaces: &[WorkspaceRef],
    lookups: &Lookups,
    catalog: &mut TenantCatalog,
    stats: &mut StageStats,
) {
    log::info!("Fetching Dataflow Lineage");
    for workspace in workspaces {
        let endpoint = format!("v1.0/myorg/groups/{}/dataflows/upstreamDataflows", workspace.id);
        let items = match list_items(ctx.api, &endpoint) {
            Ok(items) => items,
            Err(e) => {
                log::warn!("  Could not fetch dataflow lineage for {}: {}", workspace.name, e);
                stats.listing_failures += 1;
                continue;
            }
        };

        let context = workspace_context(workspace);
        for item in &items {
            let mut record = normalize(&DATAFLOW_LINEAGE, item, &context, LINEAGE_MAPPINGS);
            let dataflow_name = lookups.dataflows.resolve(record.text("DataflowId")).to_string();
            let dataset_name = lookups.datasets.resolve(record.text("DatasetId")).to_string();
            record.set("DataflowName", dataflow_name);
            record.set("DatasetName", dataset_name);
            catalog.dataflow_lineage.push(record);
        }
    }
    log::info!("✓ Dataflow lineage collection complete");
}
