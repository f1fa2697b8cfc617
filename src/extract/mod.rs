// src/extract/mod.rs
//! Extraction orchestrator.
//!
//! A run lists the in-scope workspaces once, then executes each selected
//! stage in turn. A stage enumerates its parents per workspace, fans their
//! detail fetches out through a fresh [`Dispatcher`], and returns an explicit
//! catalog of records. The catalog's tables are written as soon as the stage
//! finishes, so a later stage failing never loses an earlier stage's tables.

mod dataflow_detail;
mod lookups;
mod models;
mod reports;
mod tenant;

pub use dataflow_detail::{extract_dataflow_detail, DataflowDetailCatalog};
pub use lookups::{LookupTable, Lookups};
pub use models::{extract_models, ModelCatalog};
pub use reports::{extract_reports, ReportCatalog};
pub use tenant::{extract_tenant, TenantCatalog};

use crate::api::{get_collection, MetadataApi};
use crate::dispatch::{DispatchStats, Dispatcher};
use crate::error::{AppError, ConfigError, SubcallError};
use crate::records::schemas::WORKSPACES;
use crate::records::{normalize, DetailRecord, FieldMapping, RecordContext, TableSchema};
use crate::report::ReportInspector;
use crate::semantic::ModelInspector;
use crate::sink::{write_all, SinkReport, TableSink};
use crate::types::{WorkerCount, WorkspaceFilter, WorkspaceRef};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};

/// One extraction stage, each owning a family of destination tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Stage {
    /// Workspaces, datasets, dataflows, reports, apps and lineage (14 tables).
    Tenant,
    /// Semantic model objects and dependencies (2 tables).
    Models,
    /// Report definitions (11 tables).
    Reports,
    /// Dataflow M queries (1 table).
    DataflowDetail,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Tenant, Stage::Models, Stage::Reports, Stage::DataflowDetail];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Tenant => write!(f, "tenant metadata"),
            Stage::Models => write!(f, "model metadata"),
            Stage::Reports => write!(f, "report metadata"),
            Stage::DataflowDetail => write!(f, "dataflow detail"),
        }
    }
}

/// What every stage needs: the shared API handle and run-wide settings.
pub struct ExtractionContext<'a> {
    pub api: &'a dyn MetadataApi,
    pub workers: WorkerCount,
    pub report_date: String,
    pub started: Instant,
}

impl ExtractionContext<'_> {
    /// A fresh pool for one fan-out step.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.workers)
    }

    pub fn elapsed_minutes(&self) -> f64 {
        self.started.elapsed().as_secs_f64() / 60.0
    }
}

/// A stage's records grouped by destination table.
pub trait Catalog {
    fn tables(&self) -> Vec<(&'static TableSchema, &[DetailRecord])>;
}

/// Counters a stage reports back to the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageStats {
    pub dispatch: DispatchStats,
    pub soft_errors: usize,
    /// Listings that failed for a whole family in one workspace.
    pub listing_failures: usize,
}

impl StageStats {
    pub fn absorb_dispatch(&mut self, stats: DispatchStats) {
        self.dispatch.absorb(stats);
    }

    /// Logs one parent's soft errors and counts them.
    pub fn record_warnings(&mut self, parent: &str, errors: &[SubcallError]) {
        for error in errors {
            log::warn!("    Warning ({}): {}", parent, error);
        }
        self.soft_errors += errors.len();
    }

    pub fn record_listing_failure(&mut self, family: &str, error: &AppError) {
        log::error!("  ERROR fetching {}: {}", family, error);
        self.listing_failures += 1;
    }

    fn merge(&mut self, other: StageStats) {
        self.dispatch.absorb(other.dispatch);
        self.soft_errors += other.soft_errors;
        self.listing_failures += other.listing_failures;
    }
}

/// Workspaces selected for the run, with their `Workspaces` table rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceListing {
    pub workspaces: Vec<WorkspaceRef>,
    pub records: Vec<DetailRecord>,
}

const WORKSPACE_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("WorkspaceId", "id"),
    FieldMapping::key("WorkspaceName", "name"),
    FieldMapping::key("WorkspaceType", "type"),
    FieldMapping::key("WorkspaceCapacityId", "capacityId"),
];

/// Lists the caller's workspaces and applies `filter`.
///
/// Failing to list is fatal, and so is a named filter that matches nothing.
pub fn list_workspaces(api: &dyn MetadataApi, filter: &WorkspaceFilter) -> Result<WorkspaceListing, AppError> {
    const ENDPOINT: &str = "v1.0/myorg/groups";
    log::info!("Fetching workspaces...");

    let items = get_collection(api, ENDPOINT)?.ok_or_else(|| {
        AppError::MalformedResponse(format!("{} refused the workspace listing", ENDPOINT))
    })?;

    let mut listing = WorkspaceListing::default();
    for item in &items {
        let name = text_field(item, "name");
        if !filter.admits(name) {
            continue;
        }
        listing.workspaces.push(WorkspaceRef::new(text_field(item, "id"), name));
        listing
            .records
            .push(normalize(&WORKSPACES, item, &RecordContext::new(), WORKSPACE_MAPPINGS));
    }

    if let WorkspaceFilter::Named(names) = filter {
        if listing.workspaces.is_empty() {
            return Err(ConfigError::NoMatchingWorkspaces { names: names.clone() }.into());
        }
        log::info!("Filtering to workspaces: {}", filter);
    }
    log::info!("Workspace count: {}", listing.workspaces.len());
    Ok(listing)
}

pub(crate) fn text_field<'v>(item: &'v Value, key: &str) -> &'v str {
    item.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Totals of a whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionSummary {
    pub workspaces: usize,
    pub rows_per_table: IndexMap<&'static str, usize>,
    pub stats: StageStats,
    pub sink: SinkReport,
    pub elapsed: Duration,
}

impl ExtractionSummary {
    pub fn total_rows(&self) -> usize {
        self.rows_per_table.values().sum()
    }

    pub fn tables_written(&self) -> usize {
        self.sink.written.len()
    }

    fn absorb_stage(&mut self, catalog: &dyn Catalog, stats: StageStats, sink: SinkReport) {
        for (table, records) in catalog.tables() {
            self.rows_per_table.insert(table.name, records.len());
        }
        self.stats.merge(stats);
        self.sink = std::mem::take(&mut self.sink).merge(sink);
    }
}

/// Drives the selected stages and writes their tables.
pub struct Orchestrator<'a> {
    context: ExtractionContext<'a>,
    models: &'a dyn ModelInspector,
    reports: &'a dyn ReportInspector,
    sink: &'a dyn TableSink,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        context: ExtractionContext<'a>,
        models: &'a dyn ModelInspector,
        reports: &'a dyn ReportInspector,
        sink: &'a dyn TableSink,
    ) -> Self {
        Self {
            context,
            models,
            reports,
            sink,
        }
    }

    /// Runs `stages` in order over the workspaces admitted by `filter`.
    ///
    /// Only configuration problems and a failed workspace listing end the
    /// run early; everything else is logged and counted in the summary.
    pub fn run(&self, filter: &WorkspaceFilter, stages: &[Stage]) -> Result<ExtractionSummary, AppError> {
        let listing = list_workspaces(self.context.api, filter)?;
        let mut summary = ExtractionSummary {
            workspaces: listing.workspaces.len(),
            ..ExtractionSummary::default()
        };

        for stage in Stage::ALL.iter().filter(|s| stages.contains(s)) {
            log::info!("{}", "=".repeat(80));
            log::info!("Extracting {}", stage);
            log::info!("{}", "=".repeat(80));

            match stage {
                Stage::Tenant => {
                    let (catalog, stats) = extract_tenant(&self.context, &listing);
                    self.finish_stage(&mut summary, &catalog, stats);
                }
                Stage::Models => {
                    let (catalog, stats) = extract_models(&self.context, self.models, &listing.workspaces);
                    self.finish_stage(&mut summary, &catalog, stats);
                }
                Stage::Reports => {
                    let (catalog, stats) = extract_reports(&self.context, self.reports, &listing.workspaces);
                    self.finish_stage(&mut summary, &catalog, stats);
                }
                Stage::DataflowDetail => {
                    let (catalog, stats) = extract_dataflow_detail(&self.context, &listing.workspaces);
                    self.finish_stage(&mut summary, &catalog, stats);
                }
            }
        }

        summary.elapsed = self.context.started.elapsed();
        Ok(summary)
    }

    fn finish_stage(&self, summary: &mut ExtractionSummary, catalog: &dyn Catalog, stats: StageStats) {
        log::info!("Writing output ({:.2} min elapsed)", self.context.elapsed_minutes());
        let report = write_all(self.sink, catalog.tables());
        summary.absorb_stage(catalog, stats, report);
    }
}
