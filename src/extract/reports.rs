// src/extract/reports.rs
//! Report definition stage.

use super::{text_field, Catalog, ExtractionContext, StageStats};
use crate::dispatch::TaskOutcome;
use crate::fetch::{fetch_report_metadata, list_items, ReportMetadata};
use crate::records::schemas::{
    BOOKMARKS, CONNECTIONS, CUSTOM_VISUALS, PAGES, PAGE_FILTERS, REPORT_FILTERS, REPORT_LEVEL_MEASURES,
    VISUALS, VISUAL_FILTERS, VISUAL_INTERACTIONS, VISUAL_OBJECTS,
};
use crate::records::{DetailRecord, TableSchema};
use crate::report::ReportInspector;
use crate::types::{ParentRef, WorkspaceRef};

/// The eleven report tables for the whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportCatalog {
    pub metadata: ReportMetadata,
}

impl Catalog for ReportCatalog {
    fn tables(&self) -> Vec<(&'static TableSchema, &[DetailRecord])> {
        let m = &self.metadata;
        vec![
            (&CONNECTIONS, m.connections.as_slice()),
            (&PAGES, m.pages.as_slice()),
            (&VISUALS, m.visuals.as_slice()),
            (&BOOKMARKS, m.bookmarks.as_slice()),
            (&CUSTOM_VISUALS, m.custom_visuals.as_slice()),
            (&REPORT_FILTERS, m.report_filters.as_slice()),
            (&PAGE_FILTERS, m.page_filters.as_slice()),
            (&VISUAL_FILTERS, m.visual_filters.as_slice()),
            (&VISUAL_OBJECTS, m.visual_objects.as_slice()),
            (&REPORT_LEVEL_MEASURES, m.report_level_measures.as_slice()),
            (&VISUAL_INTERACTIONS, m.visual_interactions.as_slice()),
        ]
    }
}

/// Opens every report of every workspace and flattens its definition.
///
/// Each task carries the report's dataset id so `ModelID` can be filled.
pub fn extract_reports(
    ctx: &ExtractionContext<'_>,
    inspector: &dyn ReportInspector,
    workspaces: &[WorkspaceRef],
) -> (ReportCatalog, StageStats) {
    let mut catalog = ReportCatalog::default();
    let mut stats = StageStats::default();
    let report_date = ctx.report_date.as_str();

    for workspace in workspaces {
        log::info!(
            "Processing workspace: {} | Elapsed: {:.2} min",
            workspace.name,
            ctx.elapsed_minutes()
        );
        let items = match list_items(ctx.api, &format!("v1.0/myorg/groups/{}/reports", workspace.id)) {
            Ok(items) => items,
            Err(e) => {
                stats.record_listing_failure("reports", &e);
                continue;
            }
        };
        let tasks: Vec<ParentRef> = items
            .iter()
            .map(|item| {
                ParentRef::new(text_field(item, "id"), text_field(item, "name"))
                    .with_extra(text_field(item, "datasetId"))
            })
            .collect();
        log::info!("  Reports found: {}", tasks.len());

        let dispatch = ctx.dispatcher().dispatch(
            tasks,
            |report| fetch_report_metadata(inspector, workspace, report, report_date),
            |report, outcome| {
                if let TaskOutcome::Success(outcome) = outcome {
                    stats.record_warnings(&report.name, &outcome.errors);
                    catalog.metadata.absorb(outcome.records);
                }
            },
        );
        stats.absorb_dispatch(dispatch);
    }

    log::info!(
        "✓ Report metadata: {} reports opened, {} visuals",
        catalog.metadata.connections.len(),
        catalog.metadata.visuals.len()
    );
    (catalog, stats)
}
