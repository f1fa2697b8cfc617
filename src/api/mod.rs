// src/api/mod.rs
//! Remote metadata API interaction.
//!
//! Fetchers depend on the [`MetadataApi`] trait, never on HTTP details. The
//! concrete [`FabricHttpClient`] routes Power BI (`v1.0/myorg/...`) and
//! Fabric (`v1/...`) endpoints to their respective hosts.

pub mod client;
mod definition;
mod pagination;
mod responses;

use crate::error::AppError;
use serde_json::Value;

/// The ability to issue blocking calls against the metadata APIs.
///
/// Implementations are shared by reference across every worker of a
/// stage, so they must be safe for concurrent use.
pub trait MetadataApi: Send + Sync {
    /// GET an endpoint path or an absolute URL.
    fn get(&self, endpoint: &str) -> Result<ApiResponse, AppError>;

    /// POST a JSON body to an endpoint path or an absolute URL.
    fn post(&self, endpoint: &str, body: &Value) -> Result<ApiResponse, AppError>;
}

// Re-export the public interface
pub use client::FabricHttpClient;
pub use definition::{fetch_definition, find_part, DefinitionPart};
pub use pagination::get_collection;
pub use responses::{value_items, ApiResponse};
