// src/api/definition.rs
//! Item definitions fetched through the `getDefinition` long-running operation.

use super::{ApiResponse, MetadataApi};
use crate::constants::{DEFINITION_MAX_POLLS, DEFINITION_POLL_INTERVAL};
use crate::error::AppError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use std::thread;

/// One decoded file of an item definition.
///
/// Payloads stay as bytes; definitions mix text files with binary resources
/// such as images, and only the part a caller selects is read as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionPart {
    pub path: String,
    pub payload: Vec<u8>,
}

impl DefinitionPart {
    /// The payload as UTF-8 text.
    pub fn text(&self) -> Result<&str, AppError> {
        std::str::from_utf8(&self.payload).map_err(|e| AppError::Decode(format!("{}: {}", self.path, e)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPart {
    path: String,
    #[serde(default)]
    payload: String,
    #[serde(default)]
    payload_type: Option<String>,
}

/// POSTs `endpoint` and returns the decoded definition parts.
///
/// A 200 carries the definition directly. A 202 names an operation in its
/// `Location` header, which is polled until it reports `Succeeded`; the
/// definition is then read from `<location>/result`.
pub fn fetch_definition(api: &dyn MetadataApi, endpoint: &str) -> Result<Vec<DefinitionPart>, AppError> {
    let response = api.post(endpoint, &json!({}))?;
    let body = match response.status {
        200 => response.body,
        202 => {
            let location = response.location.clone().ok_or_else(|| {
                AppError::MalformedResponse(format!("{} accepted without a Location header", endpoint))
            })?;
            await_operation(api, &location, &response)?
        }
        status => {
            return Err(AppError::ServiceStatus {
                endpoint: endpoint.to_string(),
                status,
            })
        }
    };
    decode_parts(&body)
}

fn await_operation(api: &dyn MetadataApi, location: &str, accepted: &ApiResponse) -> Result<Value, AppError> {
    let mut delay = accepted.retry_after.unwrap_or(DEFINITION_POLL_INTERVAL);

    for _ in 0..DEFINITION_MAX_POLLS {
        thread::sleep(delay);
        let state = api.get(location)?;
        if let Some(next) = state.retry_after {
            delay = next;
        }
        let status = state.body.get("status").and_then(Value::as_str).unwrap_or("");
        match status {
            "Succeeded" => {
                let result_url = format!("{}/result", location.trim_end_matches('/'));
                return api.get(&result_url)?.into_success(&result_url);
            }
            "Failed" | "Cancelled" => {
                let detail = state
                    .body
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .unwrap_or("no detail");
                return Err(AppError::OperationIncomplete(format!(
                    "{} ({})",
                    status, detail
                )));
            }
            _ if !state.is_success() => {
                return Err(AppError::ServiceStatus {
                    endpoint: location.to_string(),
                    status: state.status,
                })
            }
            _ => {}
        }
    }

    Err(AppError::OperationIncomplete(format!(
        "still running after {} polls",
        DEFINITION_MAX_POLLS
    )))
}

fn decode_parts(body: &Value) -> Result<Vec<DefinitionPart>, AppError> {
    let raw = body
        .pointer("/definition/parts")
        .cloned()
        .ok_or_else(|| AppError::MalformedResponse("definition has no parts".to_string()))?;
    let parts: Vec<RawPart> = serde_json::from_value(raw)?;

    parts
        .into_iter()
        .map(|part| -> Result<DefinitionPart, AppError> {
            let inline = part
                .payload_type
                .as_deref()
                .map_or(true, |t| t.eq_ignore_ascii_case("InlineBase64"));
            let payload = if inline {
                STANDARD.decode(part.payload.trim())?
            } else {
                part.payload.into_bytes()
            };
            Ok(DefinitionPart {
                path: part.path,
                payload,
            })
        })
        .collect()
}

/// First part whose path satisfies `matches`.
pub fn find_part<'a>(parts: &'a [DefinitionPart], matches: impl Fn(&str) -> bool) -> Option<&'a DefinitionPart> {
    parts.iter().find(|p| matches(&p.path))
}
