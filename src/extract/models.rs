// src/extract/models.rs
//! Semantic model stage: every dataset opened and flattened in parallel.

use super::{text_field, Catalog, ExtractionContext, StageStats};
use crate::dispatch::TaskOutcome;
use crate::fetch::{fetch_model_metadata, list_items, ModelMetadata};
use crate::records::schemas::{MODEL_DEPENDENCIES, MODEL_DETAIL};
use crate::records::{DetailRecord, TableSchema};
use crate::semantic::ModelInspector;
use crate::types::{ParentRef, WorkspaceRef};

/// `ModelDetail` and `ModelDependencies` rows for the whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelCatalog {
    pub metadata: ModelMetadata,
}

impl Catalog for ModelCatalog {
    fn tables(&self) -> Vec<(&'static TableSchema, &[DetailRecord])> {
        vec![
            (&MODEL_DETAIL, self.metadata.details.as_slice()),
            (&MODEL_DEPENDENCIES, self.metadata.dependencies.as_slice()),
        ]
    }
}

pub fn extract_models(
    ctx: &ExtractionContext<'_>,
    inspector: &dyn ModelInspector,
    workspaces: &[WorkspaceRef],
) -> (ModelCatalog, StageStats) {
    let mut catalog = ModelCatalog::default();
    let mut stats = StageStats::default();
    let report_date = ctx.report_date.as_str();

    for workspace in workspaces {
        log::info!(
            "Processing workspace: {} | Elapsed: {:.2} min",
            workspace.name,
            ctx.elapsed_minutes()
        );
        let items = match list_items(ctx.api, &format!("v1.0/myorg/groups/{}/datasets", workspace.id)) {
            Ok(items) => items,
            Err(e) => {
                stats.record_listing_failure("datasets", &e);
                continue;
            }
        };
        let tasks: Vec<ParentRef> = items
            .iter()
            .map(|item| ParentRef::new(text_field(item, "id"), text_field(item, "name")))
            .collect();
        log::info!("  Models found: {}", tasks.len());

        let dispatch = ctx.dispatcher().dispatch(
            tasks,
            |dataset| fetch_model_metadata(inspector, workspace, dataset, report_date),
            |dataset, outcome| {
                if let TaskOutcome::Success(outcome) = outcome {
                    stats.record_warnings(&dataset.name, &outcome.errors);
                    catalog.metadata.details.extend(outcome.records.details);
                    catalog.metadata.dependencies.extend(outcome.records.dependencies);
                }
            },
        );
        stats.absorb_dispatch(dispatch);
    }

    log::info!(
        "✓ Model metadata: {} detail rows, {} dependency rows",
        catalog.metadata.details.len(),
        catalog.metadata.dependencies.len()
    );
    (catalog, stats)
}
