// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Remote API endpoints
// ---------------------------------------------------------------------------

/// Base URL for the Power BI REST API (`v1.0/myorg/...` endpoints).
pub const POWERBI_API_BASE_URL: &str = "https://api.powerbi.com/";

/// Base URL for the Fabric REST API (`v1/...` endpoints).
pub const FABRIC_API_BASE_URL: &str = "https://api.fabric.microsoft.com/";

/// Endpoint prefix routed to the Power BI base URL.
pub const POWERBI_ENDPOINT_PREFIX: &str = "v1.0/myorg/";

/// Environment variable carrying the bearer token for both APIs.
pub const ACCESS_TOKEN_ENV: &str = "FABRIC_ACCESS_TOKEN";

/// Maximum polls of a long-running `getDefinition` operation.
pub const DEFINITION_MAX_POLLS: u32 = 30;

/// Delay between long-running operation polls when the service sends no `Retry-After`.
pub const DEFINITION_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Maximum continuation pages followed for one Fabric collection.
pub const COLLECTION_MAX_PAGES: u32 = 500;

// ---------------------------------------------------------------------------
// Configuration boundaries
// ---------------------------------------------------------------------------

/// Smallest accepted worker pool.
pub const MIN_PARALLEL_WORKERS: usize = 1;

/// Largest accepted worker pool; higher values hit service throttling.
pub const MAX_PARALLEL_WORKERS: usize = 10;

/// Default worker pool size.
pub const DEFAULT_PARALLEL_WORKERS: usize = 5;

/// Largest explicit workspace allow-list.
pub const MAX_WORKSPACE_NAMES: usize = 10;

/// Workspace filter sentinel meaning "every accessible workspace".
pub const ALL_WORKSPACES: &str = "All";

/// Default destination schema.
pub const DEFAULT_SCHEMA_NAME: &str = "dbo";

// ---------------------------------------------------------------------------
// Lookup sentinels
// ---------------------------------------------------------------------------

pub const UNKNOWN_DATASET: &str = "Unknown Dataset";
pub const UNKNOWN_DATAFLOW: &str = "Unknown Dataflow";

// ---------------------------------------------------------------------------
// Liveness
// ---------------------------------------------------------------------------

/// How often the heartbeat reports elapsed time.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Date format for `ReportDate` / `ModelAsOfDate` columns.
pub const REPORT_DATE_FORMAT: &str = "%Y-%m-%d";
