//! Report fetches: the tenant-level page listing, and the full report
//! definition flattened into the eleven report metadata tables.

use super::{list_items, subcall, FetchOutcome};
use crate::api::MetadataApi;
use crate::error::{AppError, SubcallError};
use crate::records::schemas::{
    BOOKMARKS, CONNECTIONS, CUSTOM_VISUALS, PAGES, PAGE_FILTERS, REPORT_FILTERS,
    REPORT_LEVEL_MEASURES, REPORT_PAGES, VISUALS, VISUAL_FILTERS, VISUAL_INTERACTIONS,
    VISUAL_OBJECTS,
};
use crate::records::{normalize, DetailRecord, FieldMapping, RecordContext, TableSchema};
use crate::report::{ReportInspector, ReportRow, ReportSession};
use crate::types::{ParentRef, WorkspaceRef};
use serde_json::Value;

const REPORT_PAGE_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("PageName", "name"),
    FieldMapping::key("PageDisplayName", "displayName"),
    FieldMapping::key("PageOrder", "order"),
];

const PAGE_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("Id", "Page Name"),
    FieldMapping::key("Name", "Page Display Name"),
    FieldMapping::key("Number", "Page Number"),
    FieldMapping::key("Width", "Width"),
    FieldMapping::key("Height", "Height"),
    FieldMapping::key("HiddenFlag", "Hidden"),
    FieldMapping::key("VisualCount", "Visual Count"),
    FieldMapping::key("Type", "Display Option"),
    FieldMapping::key("DisplayOption", "Display Option"),
    FieldMapping::key("DataVisualCount", "Data Visual Count"),
    FieldMapping::key("VisibleVisualCount", "Visible Visual Count"),
    FieldMapping::key("PageFilterCount", "Page Filter Count"),
];

const VISUAL_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("PageName", "Page Display Name"),
    FieldMapping::key("PageId", "Page Name"),
    FieldMapping::key("Id", "Visual Name"),
    FieldMapping::key("Name", "Visual Name"),
    FieldMapping::key("Type", "Type"),
    FieldMapping::key("DisplayType", "Display Type"),
    FieldMapping::key("Title", "Title"),
    FieldMapping::key("SubTitle", "Sub Title"),
    FieldMapping::key("AltText", "Alt Text"),
    FieldMapping::key("TabOrder", "Tab Order"),
    FieldMapping::key("CustomVisualFlag", "Custom Visual"),
    FieldMapping::key("HiddenFlag", "Hidden"),
    FieldMapping::key("X", "X"),
    FieldMapping::key("Y", "Y"),
    FieldMapping::key("Z", "Z"),
    FieldMapping::key("Width", "Width"),
    FieldMapping::key("Height", "Height"),
    FieldMapping::key("ObjectCount", "Visual Object Count"),
    FieldMapping::key("VisualFilterCount", "Visual Filter Count"),
    FieldMapping::key("DataLimit", "Data Limit"),
    FieldMapping::key("Divider", "Divider"),
    FieldMapping::key("RowSubTotals", "Row Sub Totals"),
    FieldMapping::key("ColumnSubTotals", "Column Sub Totals"),
    FieldMapping::key("DataVisual", "Data Visual"),
    FieldMapping::key("HasSparkline", "Has Sparkline"),
    FieldMapping::key("ParentGroup", "Parent Group"),
];

const BOOKMARK_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("Name", "Bookmark Display Name"),
    FieldMapping::key("Id", "Bookmark Name"),
    FieldMapping::key("PageName", "Page Display Name"),
    FieldMapping::key("PageId", "Page Name"),
    FieldMapping::key("VisualId", "Visual Name"),
    FieldMapping::key("VisualHiddenFlag", "Visual Hidden"),
    FieldMapping::key("SuppressData", "Suppress Data"),
    FieldMapping::key("CurrentPageSelected", "Current Page Selected"),
    FieldMapping::key("ApplyVisualDisplayState", "Apply Visual Display State"),
    FieldMapping::key("ApplyToAllVisuals", "Apply To All Visuals"),
];

const CUSTOM_VISUAL_MAPPINGS: &[FieldMapping] =
    &[FieldMapping::key("Name", "Custom Visual Display Name")];

const REPORT_FILTER_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("displayName", "Filter Name"),
    FieldMapping::key("TableName", "Table Name"),
    FieldMapping::key("ObjectName", "Object Name"),
    FieldMapping::key("ObjectType", "Object Type"),
    FieldMapping::key("FilterType", "Type"),
    FieldMapping::key("HiddenFilter", "Hidden"),
    FieldMapping::key("LockedFilter", "Locked"),
    FieldMapping::key("HowCreated", "How Created"),
    FieldMapping::key("Used", "Used"),
];

const PAGE_FILTER_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("PageId", "Page Name"),
    FieldMapping::key("PageName", "Page Display Name"),
    FieldMapping::key("displayName", "Filter Name"),
    FieldMapping::key("TableName", "Table Name"),
    FieldMapping::key("ObjectName", "Object Name"),
    FieldMapping::key("ObjectType", "Object Type"),
    FieldMapping::key("FilterType", "Type"),
    FieldMapping::key("HiddenFilter", "Hidden"),
    FieldMapping::key("LockedFilter", "Locked"),
    FieldMapping::key("HowCreated", "How Created"),
    FieldMapping::key("Used", "Used"),
];

const VISUAL_FILTER_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("PageName", "Page Display Name"),
    FieldMapping::key("PageId", "Page Name"),
    FieldMapping::key("VisualId", "Visual Name"),
    FieldMapping::key("TableName", "Table Name"),
    FieldMapping::key("ObjectName", "Object Name"),
    FieldMapping::key("ObjectType", "Object Type"),
    FieldMapping::key("FilterType", "Type"),
    FieldMapping::key("HiddenFilter", "Hidden"),
    FieldMapping::key("LockedFilter", "Locked"),
    FieldMapping::key("displayName", "Filter Name"),
    FieldMapping::key("HowCreated", "How Created"),
    FieldMapping::key("Used", "Used"),
];

const VISUAL_OBJECT_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("PageName", "Page Display Name"),
    FieldMapping::key("PageId", "Page Name"),
    FieldMapping::key("VisualId", "Visual Name"),
    FieldMapping::key("VisualName", "Visual Name"),
    FieldMapping::key("VisualType", "Visual Type"),
    FieldMapping::constant("CustomVisualFlag", "False"),
    FieldMapping::key("TableName", "Table Name"),
    FieldMapping::key("ObjectName", "Object Name"),
    FieldMapping::key("ObjectType", "Object Type"),
    FieldMapping::key("displayName", "Object Display Name"),
    FieldMapping::key("ImplicitMeasure", "Implicit Measure"),
    FieldMapping::key("Sparkline", "Sparkline"),
    FieldMapping::key("VisualCalc", "Visual Calc"),
    FieldMapping::key("Format", "Format"),
];

const REPORT_MEASURE_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("TableName", "Table Name"),
    FieldMapping::key("ObjectName", "Measure Name"),
    FieldMapping::constant("ObjectType", "Measure"),
    FieldMapping::key("Expression", "Expression"),
    FieldMapping::constant("HiddenFlag", "False"),
    FieldMapping::key("FormatString", "Format String"),
    FieldMapping::key("DataType", "Data Type"),
    FieldMapping::key("DataCategory", "Data Category"),
];

const INTERACTION_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::key("PageName", "Page Display Name"),
    FieldMapping::key("PageId", "Page Name"),
    FieldMapping::key("SourceVisualID", "Source Visual Name"),
    FieldMapping::key("TargetVisualID", "Target Visual Name"),
    FieldMapping::key("SourceVisualName", "Source Visual Name"),
    FieldMapping::key("TargetVisualName", "Target Visual Name"),
    FieldMapping::key("TypeID", "Type ID"),
    FieldMapping::key("Type", "Type"),
];

/// Pages of one report as listed by the Power BI API.
pub fn fetch_report_pages(
    api: &dyn MetadataApi,
    workspace: &WorkspaceRef,
    report: &ParentRef,
) -> FetchOutcome<Vec<DetailRecord>> {
    let context = RecordContext::new()
        .with("WorkspaceId", workspace.id.as_str())
        .with("WorkspaceName", workspace.name.as_str())
        .with("ReportId", report.id.as_str())
        .with("ReportName", report.name.as_str());
    let mut errors = Vec::new();

    let records = subcall("pages", &mut errors, || {
        let endpoint = format!("v1.0/myorg/groups/{}/reports/{}/pages", workspace.id, report.id);
        Ok(list_items(api, &endpoint)?
            .iter()
            .map(|page| normalize(&REPORT_PAGES, page, &context, REPORT_PAGE_MAPPINGS))
            .collect())
    });

    FetchOutcome { records, errors }
}

/// The eleven report metadata tables for one report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportMetadata {
    pub connections: Vec<DetailRecord>,
    pub pages: Vec<DetailRecord>,
    pub visuals: Vec<DetailRecord>,
    pub bookmarks: Vec<DetailRecord>,
    pub custom_visuals: Vec<DetailRecord>,
    pub report_filters: Vec<DetailRecord>,
    pub page_filters: Vec<DetailRecord>,
    pub visual_filters: Vec<DetailRecord>,
    pub visual_objects: Vec<DetailRecord>,
    pub report_level_measures: Vec<DetailRecord>,
    pub visual_interactions: Vec<DetailRecord>,
}

impl ReportMetadata {
    /// Appends every record list of `other`.
    pub fn absorb(&mut self, other: ReportMetadata) {
        self.connections.extend(other.connections);
        self.pages.extend(other.pages);
        self.visuals.extend(other.visuals);
        self.bookmarks.extend(other.bookmarks);
        self.custom_visuals.extend(other.custom_visuals);
        self.report_filters.extend(other.report_filters);
        self.page_filters.extend(other.page_filters);
        self.visual_filters.extend(other.visual_filters);
        self.visual_objects.extend(other.visual_objects);
        self.report_level_measures.extend(other.report_level_measures);
        self.visual_interactions.extend(other.visual_interactions);
    }
}

/// Opens one report and flattens every element listing.
///
/// `report.extra` carries the model (dataset) id. The `Connections` row is
/// only written once the report opened; each listing then has its own
/// failure boundary.
pub fn fetch_report_metadata(
    inspector: &dyn ReportInspector,
    workspace: &WorkspaceRef,
    report: &ParentRef,
    report_date: &str,
) -> FetchOutcome<ReportMetadata> {
    let context = RecordContext::new()
        .with("ReportName", report.name.as_str())
        .with("ReportID", report.id.as_str())
        .with("ModelID", report.extra_or_empty())
        .with("ReportDate", report_date)
        .with("WorkspaceName", workspace.name.as_str());
    let mut errors = Vec::new();

    let session: Option<Box<dyn ReportSession>> = subcall("open report", &mut errors, || {
        inspector.open(workspace, report).map(Some)
    });
    let Some(session) = session else {
        return FetchOutcome {
            records: ReportMetadata::default(),
            errors,
        };
    };
    let session = session.as_ref();

    let records = ReportMetadata {
        connections: vec![normalize(&CONNECTIONS, &Value::Null, &context, &[])],
        pages: listed("pages", &mut errors, &PAGES, PAGE_MAPPINGS, &context, || session.list_pages()),
        visuals: listed("visuals", &mut errors, &VISUALS, VISUAL_MAPPINGS, &context, || {
            session.list_visuals()
        }),
        bookmarks: listed("bookmarks", &mut errors, &BOOKMARKS, BOOKMARK_MAPPINGS, &context, || {
            session.list_bookmarks()
        }),
        custom_visuals: listed(
            "custom visuals",
            &mut errors,
            &CUSTOM_VISUALS,
            CUSTOM_VISUAL_MAPPINGS,
            &context,
            || session.list_custom_visuals(),
        ),
        report_filters: listed(
            "report filters",
            &mut errors,
            &REPORT_FILTERS,
            REPORT_FILTER_MAPPINGS,
            &context,
            || session.list_report_filters(),
        ),
        page_filters: listed(
            "page filters",
            &mut errors,
            &PAGE_FILTERS,
            PAGE_FILTER_MAPPINGS,
            &context,
            || session.list_page_filters(),
        ),
        visual_filters: listed(
            "visual filters",
            &mut errors,
            &VISUAL_FILTERS,
            VISUAL_FILTER_MAPPINGS,
            &context,
            || session.list_visual_filters(),
        ),
        visual_objects: listed(
            "visual objects",
            &mut errors,
            &VISUAL_OBJECTS,
            VISUAL_OBJECT_MAPPINGS,
            &context,
            || session.list_visual_objects(),
        ),
        report_level_measures: listed(
            "report level measures",
            &mut errors,
            &REPORT_LEVEL_MEASURES,
            REPORT_MEASURE_MAPPINGS,
            &context,
            || session.list_report_level_measures(),
        ),
        visual_interactions: listed(
            "visual interactions",
            &mut errors,
            &VISUAL_INTERACTIONS,
            INTERACTION_MAPPINGS,
            &context,
            || session.list_visual_interactions(),
        ),
    };

    FetchOutcome { records, errors }
}

fn listed<F>(
    name: &'static str,
    errors: &mut Vec<SubcallError>,
    table: &'static TableSchema,
    mappings: &[FieldMapping],
    context: &RecordContext,
    list: F,
) -> Vec<DetailRecord>
where
    F: FnOnce() -> Result<Vec<ReportRow>, AppError>,
{
    subcall(name, errors, || {
        Ok(list()?
            .into_iter()
            .map(|row| normalize(table, &Value::Object(row), context, mappings))
            .collect())
    })
}
