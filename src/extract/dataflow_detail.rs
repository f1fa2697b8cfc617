// src/extract/dataflow_detail.rs
//! Dataflow query stage covering both dataflow generations.

use super::{text_field, Catalog, ExtractionContext, StageStats};
use crate::dispatch::TaskOutcome;
use crate::fetch::{fetch_dataflow_queries, list_items, DataflowGeneration, DataflowTarget};
use crate::records::schemas::DATAFLOW_DETAIL;
use crate::records::{DetailRecord, TableSchema};
use crate::types::{ParentRef, WorkspaceRef};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataflowDetailCatalog {
    pub queries: Vec<DetailRecord>,
}

impl Catalog for DataflowDetailCatalog {
    fn tables(&self) -> Vec<(&'static TableSchema, &[DetailRecord])> {
        vec![(&DATAFLOW_DETAIL, self.queries.as_slice())]
    }
}

pub fn extract_dataflow_detail(
    ctx: &ExtractionContext<'_>,
    workspaces: &[WorkspaceRef],
) -> (DataflowDetailCatalog, StageStats) {
    let mut catalog = DataflowDetailCatalog::default();
    let mut stats = StageStats::default();
    let api = ctx.api;
    let report_date = ctx.report_date.as_str();

    for workspace in workspaces {
        log::info!(
            "Processing workspace: {} | Elapsed: {:.2} min",
            workspace.name,
            ctx.elapsed_minutes()
        );
        let tasks = dataflow_targets(ctx, workspace, &mut stats);
        log::info!("  Dataflows found: {}", tasks.len());

        let dispatch = ctx.dispatcher().dispatch(
            tasks,
            |target| fetch_dataflow_queries(api, target, report_date),
            |target, outcome| {
                if let TaskOutcome::Success(outcome) = outcome {
                    stats.record_warnings(&target.dataflow.name, &outcome.errors);
                    catalog.queries.extend(outcome.records);
                }
            },
        );
        stats.absorb_dispatch(dispatch);
    }

    log::info!("✓ Dataflow detail: {} queries", catalog.queries.len());
    (catalog, stats)
}

/// Gen1 dataflows from the Power BI listing, Gen2 from the Fabric item list.
fn dataflow_targets(
    ctx: &ExtractionContext<'_>,
    workspace: &WorkspaceRef,
    stats: &mut StageStats,
) -> Vec<DataflowTarget> {
    let mut targets = Vec::new();
    let target = |dataflow: ParentRef, generation| DataflowTarget {
        workspace: workspace.clone(),
        dataflow,
        generation,
    };

    match list_items(ctx.api, &format!("v1.0/myorg/groups/{}/dataflows", workspace.id)) {
        Ok(items) => targets.extend(items.iter().map(|item| {
            target(
                ParentRef::new(text_field(item, "objectId"), text_field(item, "name")),
                DataflowGeneration::Gen1,
            )
        })),
        Err(e) => stats.record_listing_failure("dataflows", &e),
    }

    match list_items(ctx.api, &format!("v1/workspaces/{}/items", workspace.id)) {
        Ok(items) => targets.extend(
            items
                .iter()
                .filter(|item| text_field(item, "type") == "Dataflow")
                .map(|item| {
                    target(
                        ParentRef::new(text_field(item, "id"), text_field(item, "displayName")),
                        DataflowGeneration::Gen2,
                    )
                }),
        ),
        Err(e) => stats.record_listing_failure("Fabric dataflows", &e),
    }

    targets
}
