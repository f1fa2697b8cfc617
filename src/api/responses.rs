// src/api/responses.rs
//! Response envelope shared by every metadata call.

use crate::error::AppError;
use serde_json::Value;
use std::time::Duration;

/// Status, decoded body and the headers the pipeline cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Decoded JSON body; `Null` when the body was empty or not JSON.
    pub body: Value,
    /// `Location` header of an accepted long-running operation.
    pub location: Option<String>,
    /// `Retry-After` header, when the service sent one.
    pub retry_after: Option<Duration>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            location: None,
            retry_after: None,
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body of a 2xx response, or a status error naming `endpoint`.
    pub fn into_success(self, endpoint: &str) -> Result<Value, AppError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(AppError::ServiceStatus {
                endpoint: endpoint.to_string(),
                status: self.status,
            })
        }
    }
}

/// Items of a collection response's `value` array (empty when absent).
pub fn value_items(response: &ApiResponse) -> Vec<Value> {
    response
        .body
        .get("value")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
