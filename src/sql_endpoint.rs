// src/sql_endpoint.rs
//! SQL endpoint metadata refresh after the tables are written.

use crate::api::{get_collection, MetadataApi};
use crate::error::AppError;
use serde_json::{json, Value};

/// Counts from one refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndpointRefresh {
    pub found: usize,
    pub refreshed: usize,
}

/// Asks every SQL endpoint of `workspace_id` to re-sync its table metadata.
///
/// Never fails the run: every problem is logged as a warning.
pub fn refresh_sql_endpoints(api: &dyn MetadataApi, workspace_id: &str) -> EndpointRefresh {
    log::info!("Refreshing SQL endpoint metadata in workspace {}", workspace_id);
    match try_refresh(api, workspace_id) {
        Ok(outcome) => {
            log::info!(
                "✓ SQL endpoint metadata refresh completed ({}/{} refreshed)",
                outcome.refreshed,
                outcome.found
            );
            outcome
        }
        Err(e) => {
            log::warn!("SQL endpoint refresh failed: {}", e);
            log::warn!("This is not critical - tables are still written.");
            EndpointRefresh::default()
        }
    }
}

fn try_refresh(api: &dyn MetadataApi, workspace_id: &str) -> Result<EndpointRefresh, AppError> {
    let listing = format!("v1/workspaces/{}/sqlEndpoints", workspace_id);
    let endpoints = get_collection(api, &listing)?.ok_or_else(|| {
        AppError::MalformedResponse(format!("could not list SQL endpoints at {}", listing))
    })?;

    let mut outcome = EndpointRefresh {
        found: endpoints.len(),
        refreshed: 0,
    };
    if endpoints.is_empty() {
        log::warn!("  No SQL endpoints found in workspace");
        return Ok(outcome);
    }

    for endpoint in &endpoints {
        let name = endpoint.get("displayName").and_then(Value::as_str).unwrap_or("");
        let id = endpoint.get("id").and_then(Value::as_str).unwrap_or("");
        let url = format!("v1/workspaces/{}/sqlEndpoints/{}/refreshMetadata", workspace_id, id);

        match api.post(&url, &json!({})) {
            Ok(response) if matches!(response.status, 200 | 202) => {
                log::info!("  ✓ Refreshed SQL endpoint: {}", name);
                outcome.refreshed += 1;
            }
            Ok(response) => {
                log::warn!(
                    "  SQL endpoint '{}' refresh returned status {}: {}",
                    name,
                    response.status,
                    response.body
                );
            }
            Err(e) => log::warn!("  SQL endpoint '{}' refresh failed: {}", name, e),
        }
    }

    Ok(outcome)
}
