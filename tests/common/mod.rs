// tests/common/mod.rs
//! Shared fixtures: a canned metadata API and table readers.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use fabric_governance::{ApiResponse, AppError, MetadataApi, TableBatch};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::io;
use std::thread;
use std::time::Duration;

/// Answers registered endpoints; everything else is a 404.
#[derive(Default)]
pub struct FakeApi {
    responses: HashMap<String, ApiResponse>,
    unreachable: HashSet<String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a collection endpoint answering `{"value": items}`.
    pub fn with_collection(self, endpoint: &str, items: Value) -> Self {
        self.with_object(endpoint, json!({ "value": items }))
    }

    pub fn with_object(mut self, endpoint: &str, body: Value) -> Self {
        self.responses.insert(endpoint.to_string(), ApiResponse::ok(body));
        self
    }

    /// Registers a `getDefinition` endpoint answering inline parts.
    pub fn with_definition(self, endpoint: &str, parts: &[(&str, &str)]) -> Self {
        let parts: Vec<(&str, &[u8])> = parts.iter().map(|(path, text)| (*path, text.as_bytes())).collect();
        self.with_binary_definition(endpoint, &parts)
    }

    /// Like [`FakeApi::with_definition`], for parts that are not text.
    pub fn with_binary_definition(self, endpoint: &str, parts: &[(&str, &[u8])]) -> Self {
        let parts: Vec<Value> = parts
            .iter()
            .map(|(path, payload)| {
                json!({
                    "path": path,
                    "payload": STANDARD.encode(payload),
                    "payloadType": "InlineBase64",
                })
            })
            .collect();
        self.with_object(endpoint, json!({ "definition": { "parts": parts } }))
    }

    /// Calls to `endpoint` fail in transport, before any status arrives.
    pub fn unreachable(mut self, endpoint: &str) -> Self {
        self.unreachable.insert(endpoint.to_string());
        self
    }

    /// Calls to `endpoint` answer only after `delay`.
    pub fn slow(mut self, endpoint: &str, delay: Duration) -> Self {
        self.delays.insert(endpoint.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn answer(&self, endpoint: &str) -> Result<ApiResponse, AppError> {
        self.calls.lock().push(endpoint.to_string());
        if let Some(delay) = self.delays.get(endpoint) {
            thread::sleep(*delay);
        }
        if self.unreachable.contains(endpoint) {
            return Err(AppError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset by peer")));
        }
        Ok(self
            .responses
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| ApiResponse::new(404, Value::Null)))
    }
}

impl MetadataApi for FakeApi {
    fn get(&self, endpoint: &str) -> Result<ApiResponse, AppError> {
        self.answer(endpoint)
    }

    fn post(&self, endpoint: &str, _body: &Value) -> Result<ApiResponse, AppError> {
        self.answer(endpoint)
    }
}

/// Every cell of `column` in `batch`, rendered as text.
pub fn column(batch: &TableBatch, column: &str) -> Vec<String> {
    let index = batch
        .columns
        .iter()
        .position(|c| c.name == column)
        .unwrap_or_else(|| panic!("{} has no column {}", batch.name, column));
    batch.rows.iter().map(|row| row[index].to_string()).collect()
}

pub const SALES_MODEL: &str = r#"{
  "name": "Ledger",
  "model": {
    "tables": [
      {
        "name": "Sales",
        "columns": [
          { "name": "Amount", "dataType": "decimal", "formatString": "0.00" }
        ],
        "measures": [
          { "name": "Total", "expression": "SUM(Sales[Amount])" }
        ],
        "partitions": [
          { "name": "Sales", "mode": "import", "source": { "type": "m", "expression": "let s = 1 in s" } }
        ]
      }
    ]
  }
}"#;

/// A tenant with two workspaces. `Finance` holds one of everything;
/// `Sandbox` answers nothing.
pub fn tenant() -> FakeApi {
    FakeApi::new()
        .with_collection(
            "v1.0/myorg/groups",
            json!([
                { "id": "ws-1", "name": "Finance", "type": "Workspace", "capacityId": "cap-1" },
                { "id": "ws-2", "name": "Sandbox", "type": "Workspace" }
            ]),
        )
        .with_collection(
            "v1.0/myorg/groups/ws-1/datasets",
            json!([
                { "id": "ds-1", "name": "Ledger", "isRefreshable": true, "configuredBy": "ana@contoso.com" }
            ]),
        )
        .with_collection(
            "v1.0/myorg/groups/ws-1/datasets/ds-1/datasources",
            json!([
                { "datasourceType": "Sql", "datasourceId": "src-1", "connectionDetails": { "server": "sql01" } }
            ]),
        )
        .with_collection(
            "v1.0/myorg/groups/ws-1/datasets/ds-1/refreshes",
            json!([
                { "requestId": "req-1", "status": "Completed", "refreshType": "Scheduled" }
            ]),
        )
        .with_object(
            "v1.0/myorg/groups/ws-1/datasets/ds-1/refreshSchedule",
            json!({
                "enabled": true,
                "days": ["Monday", "Wednesday"],
                "times": ["08:00"],
                "localTimeZoneId": "UTC",
                "notifyOption": "MailOnFailure"
            }),
        )
        .with_collection(
            "v1.0/myorg/groups/ws-1/dataflows",
            json!([{ "objectId": "df-1", "name": "GL_Load", "configuredBy": "ana@contoso.com" }]),
        )
        .with_collection(
            "v1.0/myorg/groups/ws-1/dataflows/df-1/transactions",
            json!([{ "id": "tx-1", "status": "Success", "refreshType": "OnDemand" }]),
        )
        .with_object(
            "v1.0/myorg/groups/ws-1/dataflows/df-1",
            json!({
                "name": "GL_Load",
                "pbi:mashup": { "document": "section Section1;\nshared Accounts = let a = 1 in a;\nshared #\"GL Lines\" = let b = 2 in b;" }
            }),
        )
        .with_collection(
            "v1/workspaces/ws-1/items",
            json!([
                { "id": "rep-1", "type": "Report", "displayName": "GL Overview" },
                { "id": "ds-1", "type": "SemanticModel", "displayName": "Ledger" },
                { "id": "lh-1", "type": "Lakehouse", "displayName": "Bronze" },
                { "id": "df-2", "type": "Dataflow", "displayName": "Budget Flow" }
            ]),
        )
        .with_definition(
            "v1/workspaces/ws-1/dataflows/df-2/getDefinition",
            &[("mashup.pq", "section Section1;\nshared Budget = let c = 3 in c;")],
        )
        .with_collection(
            "v1.0/myorg/groups/ws-1/reports",
            json!([
                { "id": "rep-1", "name": "GL Overview", "datasetId": "ds-1", "reportType": "PowerBIReport" },
                { "id": "rep-2", "name": "Orphan", "datasetId": "ds-gone", "reportType": "PowerBIReport" }
            ]),
        )
        .with_collection(
            "v1.0/myorg/groups/ws-1/reports/rep-1/pages",
            json!([{ "name": "ReportSection1", "displayName": "Summary", "order": 0 }]),
        )
        .with_collection(
            "v1.0/myorg/apps",
            json!([
                { "id": "app-1", "name": "Finance App", "workspaceId": "ws-1", "publishedBy": "ana@contoso.com" },
                { "id": "app-2", "name": "Elsewhere", "workspaceId": "ws-other" }
            ]),
        )
        .with_collection(
            "v1.0/myorg/apps/app-1/reports",
            json!([{ "id": "ar-1", "name": "GL Overview", "originalReportObjectId": "rep-1", "isOwnedByMe": false }]),
        )
        .with_collection(
            "v1.0/myorg/groups/ws-1/dataflows/upstreamDataflows",
            json!([
                { "dataflowObjectId": "df-1", "datasetObjectId": "ds-1" },
                { "dataflowObjectId": "df-9", "datasetObjectId": "ds-1" }
            ]),
        )
        .with_definition(
            "v1/workspaces/ws-1/semanticModels/ds-1/getDefinition?format=TMSL",
            &[("definition.pbism", "{}"), ("model.bim", SALES_MODEL)],
        )
}
