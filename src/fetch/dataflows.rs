//! Dataflow detail fetch: sources, then refresh transactions.

use super::{list_items, subcall, FetchOutcome};
use crate::api::MetadataApi;
use crate::records::schemas::{DATAFLOW_REFRESH_HISTORY, DATAFLOW_SOURCES};
use crate::records::{normalize, DetailRecord, FieldMapping, RecordContext};
use crate::types::{ParentRef, WorkspaceRef};

const SOURCE_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("DataflowDatasourceType", "datasourceType"),
    FieldMapping::key("DataflowDatasourceId", "datasourceId"),
    FieldMapping::key("DataflowDatasourceGatewayId", "gatewayId"),
    FieldMapping::key("DataflowDatasourceConnectionDetails", "connectionDetails"),
];

const TRANSACTION_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("DataflowRefreshRequestId", "requestId"),
    FieldMapping::key("DataflowRefreshId", "id"),
    FieldMapping::key("DataflowRefreshStartTime", "startTime"),
    FieldMapping::key("DataflowRefreshEndTime", "endTime"),
    FieldMapping::key("DataflowRefreshStatus", "status"),
    FieldMapping::key("DataflowRefreshType", "refreshType"),
    FieldMapping::key("DataflowErrorInfo", "errorInfo"),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataflowDetails {
    pub sources: Vec<DetailRecord>,
    pub refresh_history: Vec<DetailRecord>,
}

pub fn fetch_dataflow_details(
    api: &dyn MetadataApi,
    workspace: &WorkspaceRef,
    dataflow: &ParentRef,
) -> FetchOutcome<DataflowDetails> {
    let base = format!("v1.0/myorg/groups/{}/dataflows/{}", workspace.id, dataflow.id);
    let context = RecordContext::new()
        .with("WorkspaceId", workspace.id.as_str())
        .with("WorkspaceName", workspace.name.as_str())
        .with("DataflowId", dataflow.id.as_str())
        .with("DataflowName", dataflow.name.as_str());
    let mut errors = Vec::new();

    let sources = subcall("datasources", &mut errors, || {
        Ok(list_items(api, &format!("{}/datasources", base))?
            .iter()
            .map(|item| normalize(&DATAFLOW_SOURCES, item, &context, SOURCE_MAPPINGS))
            .collect())
    });

    let refresh_history = subcall("refresh history", &mut errors, || {
        Ok(list_items(api, &format!("{}/transactions", base))?
            .iter()
            .map(|item| normalize(&DATAFLOW_REFRESH_HISTORY, item, &context, TRANSACTION_MAPPINGS))
            .collect())
    });

    FetchOutcome {
        records: DataflowDetails {
            sources,
            refresh_history,
        },
        errors,
    }
}
