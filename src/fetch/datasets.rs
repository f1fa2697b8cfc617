//! Dataset detail fetch: sources, refresh history, refresh schedule.

use super::{get_object, list_items, subcall, FetchOutcome};
use crate::api::MetadataApi;
use crate::records::schemas::{DATASET_REFRESH_HISTORY, DATASET_REFRESH_SCHEDULE, DATASET_SOURCES};
use crate::records::{normalize, to_text, DetailRecord, FieldMapping, RecordContext};
use crate::types::{ParentRef, WorkspaceRef};
use serde_json::Value;

const SOURCE_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("DatasetDatasourceType", "datasourceType"),
    FieldMapping::key("DatasetDatasourceId", "datasourceId"),
    FieldMapping::key("DatasetDatasourceGatewayId", "gatewayId"),
    FieldMapping::key("DatasetDatasourceConnectionDetails", "connectionDetails"),
];

const REFRESH_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("DatasetRefreshRequestId", "requestId"),
    FieldMapping::key("DatasetRefreshId", "id"),
    FieldMapping::key("DatasetRefreshStartTime", "startTime"),
    FieldMapping::key("DatasetRefreshEndTime", "endTime"),
    FieldMapping::key("DatasetRefreshStatus", "status"),
    FieldMapping::key("DatasetRefreshType", "refreshType"),
];

const SCHEDULE_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("DatasetRefreshScheduleEnabled", "enabled"),
    FieldMapping::key("DatasetRefreshScheduleLocalTimeZoneId", "localTimeZoneId"),
    FieldMapping::key("DatasetRefreshScheduleNotifyOption", "notifyOption"),
];

/// Detail tables produced per dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetDetails {
    pub sources: Vec<DetailRecord>,
    pub refresh_history: Vec<DetailRecord>,
    pub refresh_schedule: Vec<DetailRecord>,
}

/// Fetches sources, then refresh history, then refresh schedule.
pub fn fetch_dataset_details(
    api: &dyn MetadataApi,
    workspace: &WorkspaceRef,
    dataset: &ParentRef,
) -> FetchOutcome<DatasetDetails> {
    let base = format!("v1.0/myorg/groups/{}/datasets/{}", workspace.id, dataset.id);
    let context = RecordContext::new()
        .with("WorkspaceId", workspace.id.as_str())
        .with("WorkspaceName", workspace.name.as_str())
        .with("DatasetId", dataset.id.as_str())
        .with("DatasetName", dataset.name.as_str());
    let mut errors = Vec::new();

    let sources = subcall("datasources", &mut errors, || {
        let items = list_items(api, &format!("{}/datasources", base))?;
        Ok(items
            .iter()
            .map(|item| normalize(&DATASET_SOURCES, item, &context, SOURCE_MAPPINGS))
            .collect())
    });

    let refresh_history = subcall("refresh history", &mut errors, || {
        let items = list_items(api, &format!("{}/refreshes", base))?;
        Ok(items
            .iter()
            .map(|item| normalize(&DATASET_REFRESH_HISTORY, item, &context, REFRESH_MAPPINGS))
            .collect())
    });

    let refresh_schedule = subcall("refresh schedule", &mut errors, || {
        Ok(get_object(api, &format!("{}/refreshSchedule", base))?
            .map(|schedule| schedule_rows(&schedule, &context))
            .unwrap_or_default())
    });

    FetchOutcome {
        records: DatasetDetails {
            sources,
            refresh_history,
            refresh_schedule,
        },
        errors,
    }
}

/// One schedule row per (day × time) pair.
///
/// An empty or missing axis counts as a single blank entry, so a schedule
/// with no days or no times still yields its enabled/timezone/notify row.
pub fn schedule_rows(schedule: &Value, context: &RecordContext) -> Vec<DetailRecord> {
    let base = normalize(&DATASET_REFRESH_SCHEDULE, schedule, context, SCHEDULE_MAPPINGS);
    let days = axis(schedule, "days");
    let times = axis(schedule, "times");

    let mut rows = Vec::with_capacity(days.len() * times.len());
    for day in &days {
        for time in &times {
            let mut row = base.clone();
            row.set("DatasetRefreshScheduleDay", day.as_str());
            row.set("DatasetRefreshScheduleTime", time.as_str());
            rows.push(row);
        }
    }
    rows
}

fn axis(schedule: &Value, key: &str) -> Vec<String> {
    let entries: Vec<String> = schedule
        .get(key)
        .and_then(Value::as_array)
        .map(|values| values.iter().map(to_text).collect())
        .unwrap_or_default();
    if entries.is_empty() {
        vec![String::new()]
    } else {
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiResponse;
    use crate::error::AppError;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io;

    /// Answers by endpoint suffix; the refresh history call drops mid-flight.
    struct FlakyRefreshes;

    impl MetadataApi for FlakyRefreshes {
        fn get(&self, endpoint: &str) -> Result<ApiResponse, AppError> {
            if endpoint.ends_with("/refreshes") {
                return Err(AppError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")));
            }
            let body = if endpoint.ends_with("/datasources") {
                json!({"value": [{"datasourceType": "Sql", "datasourceId": "src-1"}]})
            } else {
                json!({"enabled": true, "days": ["Friday"], "times": ["06:00", "18:00"]})
            };
            Ok(ApiResponse::ok(body))
        }

        fn post(&self, endpoint: &str, _body: &Value) -> Result<ApiResponse, AppError> {
            self.get(endpoint)
        }
    }

    fn context() -> RecordContext {
        RecordContext::new()
            .with("WorkspaceId", "ws-1")
            .with("WorkspaceName", "Finance")
            .with("DatasetId", "ds-1")
            .with("DatasetName", "Ledger")
    }

    #[test]
    fn schedule_is_crossed_by_day_and_time() {
        let schedule = json!({
            "enabled": true,
            "localTimeZoneId": "UTC",
            "notifyOption": "MailOnFailure",
            "days": ["Monday", "Wednesday"],
            "times": ["08:00"]
        });
        let rows = schedule_rows(&schedule, &context());

        let pairs: Vec<_> = rows
            .iter()
            .map(|r| (r.text("DatasetRefreshScheduleDay"), r.text("DatasetRefreshScheduleTime")))
            .collect();
        assert_eq!(pairs, vec![("Monday", "08:00"), ("Wednesday", "08:00")]);
        assert!(rows.iter().all(|r| r.text("DatasetRefreshScheduleEnabled") == "True"));
    }

    #[test]
    fn empty_axis_keeps_the_base_row() {
        let schedule = json!({"enabled": false, "days": [], "times": ["08:00"]});
        let rows = schedule_rows(&schedule, &context());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("DatasetRefreshScheduleDay"), "");
        assert_eq!(rows[0].text("DatasetRefreshScheduleTime"), "08:00");
        assert_eq!(rows[0].text("DatasetRefreshScheduleEnabled"), "False");
        assert_eq!(rows[0].text("DatasetName"), "Ledger");
    }

    #[test]
    fn failed_refresh_history_leaves_siblings_intact() {
        let outcome = fetch_dataset_details(
            &FlakyRefreshes,
            &WorkspaceRef::new("ws-1", "Finance"),
            &ParentRef::new("ds-1", "Ledger"),
        );

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].subcall, "refresh history");
        assert!(outcome.records.refresh_history.is_empty());
        assert_eq!(outcome.records.sources.len(), 1);
        assert_eq!(outcome.records.sources[0].text("DatasetName"), "Ledger");
        let times: Vec<_> = outcome
            .records
            .refresh_schedule
            .iter()
            .map(|r| r.text("DatasetRefreshScheduleTime"))
            .collect();
        assert_eq!(times, vec!["06:00", "18:00"]);
    }
}
