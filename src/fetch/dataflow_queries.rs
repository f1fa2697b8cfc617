//! Dataflow query extraction: the M document of one dataflow, split into
//! its named queries.

use super::{get_object, subcall, FetchOutcome};
use crate::api::{fetch_definition, find_part, MetadataApi};
use crate::error::AppError;
use crate::mquery::{self, workspace_dataflow_label};
use crate::records::schemas::DATAFLOW_DETAIL;
use crate::records::{normalize, DetailRecord, RecordContext};
use crate::types::{ParentRef, WorkspaceRef};
use serde_json::Value;
use std::fmt;

/// Storage generation of a dataflow, which decides where its document lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataflowGeneration {
    /// Power BI dataflow; the document is embedded in the dataflow JSON.
    Gen1,
    /// Fabric dataflow item; the document is a `.pq` definition part.
    Gen2,
}

impl fmt::Display for DataflowGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataflowGeneration::Gen1 => write!(f, "Gen1"),
            DataflowGeneration::Gen2 => write!(f, "Gen2"),
        }
    }
}

/// One dataflow queued for query extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataflowTarget {
    pub workspace: WorkspaceRef,
    pub dataflow: ParentRef,
    pub generation: DataflowGeneration,
}

impl fmt::Display for DataflowTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} dataflow {} in {}", self.generation, self.dataflow, self.workspace.name)
    }
}

/// Fetches the dataflow's M document and returns one record per query.
///
/// A dataflow without a document, or whose document has no query section,
/// yields no records and no error.
pub fn fetch_dataflow_queries(
    api: &dyn MetadataApi,
    target: &DataflowTarget,
    report_date: &str,
) -> FetchOutcome<Vec<DetailRecord>> {
    let mut errors = Vec::new();

    let document = subcall("dataflow document", &mut errors, || match target.generation {
        DataflowGeneration::Gen1 => {
            let endpoint = format!(
                "v1.0/myorg/groups/{}/dataflows/{}",
                target.workspace.id, target.dataflow.id
            );
            Ok(get_object(api, &endpoint)?.and_then(|body| {
                body.pointer("/pbi:mashup/document")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            }))
        }
        DataflowGeneration::Gen2 => {
            let endpoint = format!(
                "v1/workspaces/{}/dataflows/{}/getDefinition",
                target.workspace.id, target.dataflow.id
            );
            let parts = match fetch_definition(api, &endpoint) {
                Ok(parts) => parts,
                Err(AppError::ServiceStatus { status, .. }) => {
                    log::debug!("    No definition for {} (HTTP {})", target, status);
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };
            find_part(&parts, |path| path.ends_with(".pq"))
                .map(|part| part.text().map(str::to_string))
                .transpose()
        }
    });

    let Some(document) = document else {
        return FetchOutcome {
            records: Vec::new(),
            errors,
        };
    };

    let context = RecordContext::new()
        .with("DataflowId", target.dataflow.id.as_str())
        .with("DataflowName", target.dataflow.name.as_str())
        .with("ReportDate", report_date)
        .with("WorkspaceName", target.workspace.name.as_str())
        .with(
            "WorkspaceNameDataflowName",
            workspace_dataflow_label(&target.workspace.name, &target.dataflow.name),
        );

    let records = mquery::parse(&document)
        .into_iter()
        .map(|block| {
            let mut record = normalize(&DATAFLOW_DETAIL, &Value::Null, &context, &[]);
            record.set("QueryName", block.name);
            record.set("Query", block.expression);
            record
        })
        .collect();

    FetchOutcome { records, errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiResponse;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const DOCUMENT: &str = "section Section1;\nshared Customers = let a = 1 in a;\nshared #\"Open Orders\" = let b = 2 in b;";

    struct Canned {
        get: Option<Value>,
        post: Option<Value>,
    }

    impl MetadataApi for Canned {
        fn get(&self, _endpoint: &str) -> Result<ApiResponse, AppError> {
            Ok(match &self.get {
                Some(body) => ApiResponse::ok(body.clone()),
                None => ApiResponse::new(403, Value::Null),
            })
        }

        fn post(&self, _endpoint: &str, _body: &Value) -> Result<ApiResponse, AppError> {
            Ok(match &self.post {
                Some(body) => ApiResponse::ok(body.clone()),
                None => ApiResponse::new(403, Value::Null),
            })
        }
    }

    /// Every call fails before an answer arrives.
    struct Unreachable;

    impl MetadataApi for Unreachable {
        fn get(&self, _endpoint: &str) -> Result<ApiResponse, AppError> {
            Err(AppError::Io(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset")))
        }

        fn post(&self, endpoint: &str, _body: &Value) -> Result<ApiResponse, AppError> {
            self.get(endpoint)
        }
    }

    fn target(generation: DataflowGeneration) -> DataflowTarget {
        DataflowTarget {
            workspace: WorkspaceRef::new("ws1", "Finance [EU]"),
            dataflow: ParentRef::new("df1", "GL_Load"),
            generation,
        }
    }

    #[test]
    fn gen1_document_is_split_into_queries() {
        let api = Canned {
            get: Some(json!({"name": "GL_Load", "pbi:mashup": {"document": DOCUMENT}})),
            post: None,
        };
        let outcome = fetch_dataflow_queries(&api, &target(DataflowGeneration::Gen1), "2026-10-19");

        assert!(!outcome.has_errors());
        let names: Vec<_> = outcome.records.iter().map(|r| r.text("QueryName")).collect();
        assert_eq!(names, vec!["Customers", "Open Orders"]);
        assert_eq!(outcome.records[0].text("Query"), "let a = 1 in a");
        assert_eq!(
            outcome.records[0].text("WorkspaceNameDataflowName"),
            "Finance (EU) ~ GL Load"
        );
        assert_eq!(outcome.records[1].text("ReportDate"), "2026-10-19");
    }

    #[test]
    fn gen2_reads_the_pq_part() {
        let api = Canned {
            get: None,
            post: Some(json!({"definition": {"parts": [
                {"path": "queryMetadata.json", "payload": STANDARD.encode("{}"), "payloadType": "InlineBase64"},
                {"path": "mashup.pq", "payload": STANDARD.encode(DOCUMENT), "payloadType": "InlineBase64"}
            ]}})),
        };
        let outcome = fetch_dataflow_queries(&api, &target(DataflowGeneration::Gen2), "2026-10-19");
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[1].text("DataflowId"), "df1");
    }

    #[test]
    fn refused_document_is_no_data_for_both_generations() {
        let api = Canned { get: None, post: None };
        for generation in [DataflowGeneration::Gen1, DataflowGeneration::Gen2] {
            let outcome = fetch_dataflow_queries(&api, &target(generation), "2026-10-19");
            assert!(outcome.records.is_empty(), "{}", generation);
            assert!(!outcome.has_errors(), "{}", generation);
        }
    }

    #[test]
    fn unreachable_document_is_one_error() {
        for generation in [DataflowGeneration::Gen1, DataflowGeneration::Gen2] {
            let outcome = fetch_dataflow_queries(&Unreachable, &target(generation), "2026-10-19");
            assert!(outcome.records.is_empty());
            assert_eq!(outcome.errors.len(), 1, "{}", generation);
            assert_eq!(outcome.errors[0].subcall, "dataflow document");
        }
    }
}
