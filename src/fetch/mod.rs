//! Detail fetchers: one parent entity in, normalized record lists out.
//!
//! Every fetcher wraps each dependent call in its own failure boundary. A
//! failed sub-call contributes one [`SubcallError`] and an empty record
//! list; it never aborts its siblings and never escapes the fetcher.

mod dataflow_queries;
mod dataflows;
mod datasets;
mod models;
mod reports;

pub use dataflow_queries::{fetch_dataflow_queries, DataflowGeneration, DataflowTarget};
pub use dataflows::{fetch_dataflow_details, DataflowDetails};
pub use datasets::{fetch_dataset_details, schedule_rows, DatasetDetails};
pub use models::{fetch_model_metadata, ModelMetadata};
pub use reports::{fetch_report_metadata, fetch_report_pages, ReportMetadata};

use crate::api::{get_collection, MetadataApi};
use crate::error::{AppError, SubcallError};
use serde_json::Value;

/// Records gathered for one parent plus the soft errors met on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome<T> {
    pub records: T,
    pub errors: Vec<SubcallError>,
}

impl<T> FetchOutcome<T> {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Runs one sub-call inside its own failure boundary.
///
/// On failure the error is recorded under `name` and the default (empty)
/// value is returned.
pub(crate) fn subcall<T, F>(name: &'static str, errors: &mut Vec<SubcallError>, call: F) -> T
where
    T: Default,
    F: FnOnce() -> Result<T, AppError>,
{
    match call() {
        Ok(value) => value,
        Err(e) => {
            errors.push(SubcallError::new(name, e));
            T::default()
        }
    }
}

/// Items of a collection endpoint; a non-2xx response is "no data".
pub(crate) fn list_items(api: &dyn MetadataApi, endpoint: &str) -> Result<Vec<Value>, AppError> {
    Ok(get_collection(api, endpoint)?.unwrap_or_default())
}

/// Body of a single-object endpoint; a non-2xx response is "no data".
pub(crate) fn get_object(api: &dyn MetadataApi, endpoint: &str) -> Result<Option<Value>, AppError> {
    let response = api.get(endpoint)?;
    if response.is_success() {
        Ok(Some(response.body))
    } else {
        log::debug!("{} returned HTTP {}", endpoint, response.status);
        Ok(None)
    }
}
