// src/api/pagination.rs
//! Collection listing across Fabric continuation pages.

use super::{value_items, MetadataApi};
use crate::constants::COLLECTION_MAX_PAGES;
use crate::error::AppError;
use serde_json::Value;

/// Fetches every item of a collection endpoint.
///
/// Follows `continuationUri` until the service stops sending one. Returns
/// `Ok(None)` when the first page is not a 2xx response; a failing later
/// page ends the listing with what was collected so far.
pub fn get_collection(api: &dyn MetadataApi, endpoint: &str) -> Result<Option<Vec<Value>>, AppError> {
    let first = api.get(endpoint)?;
    if !first.is_success() {
        log::debug!("{} returned HTTP {}", endpoint, first.status);
        return Ok(None);
    }

    let mut items = value_items(&first);
    let mut next = continuation_uri(&first.body);
    let mut pages_fetched = 1u32;

    while let Some(uri) = next {
        if pages_fetched >= COLLECTION_MAX_PAGES {
            log::warn!(
                "Stopped listing {} after {} pages",
                endpoint,
                COLLECTION_MAX_PAGES
            );
            break;
        }

        let page = api.get(&uri)?;
        if !page.is_success() {
            log::warn!(
                "Continuation page of {} returned HTTP {}; keeping {} items",
                endpoint,
                page.status,
                items.len()
            );
            break;
        }

        items.extend(value_items(&page));
        next = continuation_uri(&page.body);
        pages_fetched += 1;
    }

    Ok(Some(items))
}

fn continuation_uri(body: &Value) -> Option<String> {
    body.get("continuationUri")
        .and_then(Value::as_str)
        .filter(|uri| !uri.is_empty())
        .map(str::to_string)
}
