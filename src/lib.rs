// src/lib.rs
//! fabric-governance library: extracts Power BI and Fabric tenant, model,
//! report and dataflow metadata into flat governance tables.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ConfigError`, `SubcallError`
//! - **Configuration**: `CommandLineInput`, `ExtractionConfig`
//! - **Domain types**: `SchemaName`, `WorkerCount`, `WorkspaceFilter`, refs
//! - **API client**: `MetadataApi`, `FabricHttpClient`, collection helpers
//! - **Records**: `DetailRecord`, `TableSchema`, `normalize`, table schemas
//! - **Fetchers and dispatch**: per-parent detail fetchers, `Dispatcher`
//! - **Introspection**: model and report inspectors
//! - **Extraction**: `Orchestrator`, stages and catalogs
//! - **Sinks**: `TableSink`, `DirectorySink`, `MemorySink`

pub mod api;
mod config;
pub mod constants;
mod dispatch;
mod error;
mod extract;
pub mod fetch;
mod heartbeat;
pub mod mquery;
pub mod records;
pub mod report;
pub mod semantic;
mod sink;
mod sql_endpoint;
mod types;

// --- Error Handling ---
pub use crate::error::{friendly_message, AppError, ConfigError, SubcallError};

// --- Configuration ---
pub use crate::config::{CommandLineInput, ExtractionConfig};

// --- Domain Types ---
pub use crate::types::{AccessToken, ParentRef, SchemaName, WorkerCount, WorkspaceFilter, WorkspaceRef};

// --- API Client ---
pub use crate::api::{
    fetch_definition, find_part, get_collection, value_items, ApiResponse, DefinitionPart,
    FabricHttpClient, MetadataApi,
};

// --- Records ---
pub use crate::records::{
    normalize, DetailRecord, FieldKind, FieldMapping, FieldValue, RecordContext, StorageType,
    TableSchema,
};

// --- Fetchers and Dispatch ---
pub use crate::dispatch::{DispatchStats, Dispatcher, TaskOutcome};
pub use crate::fetch::FetchOutcome;

// --- Introspection ---
pub use crate::report::{PbirLegacyInspector, ReportInspector, ReportSession};
pub use crate::semantic::{ModelInspector, ModelSession, TmslModelInspector};

// --- Extraction ---
pub use crate::extract::{
    extract_dataflow_detail, extract_models, extract_reports, extract_tenant, list_workspaces,
    Catalog, DataflowDetailCatalog, ExtractionContext, ExtractionSummary, LookupTable, Lookups,
    ModelCatalog, Orchestrator, ReportCatalog, Stage, StageStats, TenantCatalog, WorkspaceListing,
};

// --- Sinks ---
pub use crate::sink::{
    write_all, write_table, BatchColumn, DirectorySink, FailedTable, MemorySink, SinkReport,
    TableBatch, TableSink, WrittenTable,
};

// --- Operational ---
pub use crate::heartbeat::HeartbeatGuard;
pub use crate::sql_endpoint::{refresh_sql_endpoints, EndpointRefresh};
