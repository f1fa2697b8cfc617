//! Column contracts of the 28 destination tables.
//!
//! Column names and order are a stable external contract consumed by
//! downstream governance reports; do not rename.

use super::{Column, TableSchema};

// ---------------------------------------------------------------------------
// Tenant metadata
// ---------------------------------------------------------------------------

pub static WORKSPACES: TableSchema = TableSchema {
    name: "Workspaces",
    columns: &[
        Column::text("WorkspaceId"),
        Column::text("WorkspaceName"),
        Column::text("WorkspaceType"),
        Column::text("WorkspaceCapacityId"),
    ],
};

pub static FABRIC_ITEMS: TableSchema = TableSchema {
    name: "FabricItems",
    columns: &[
        Column::text("WorkspaceId"),
        Column::text("WorkspaceName"),
        Column::text("FabricItemID"),
        Column::text("FabricItemType"),
        Column::text("FabricItemName"),
        Column::text("FabricItemDescription"),
    ],
};

pub static DATASETS: TableSchema = TableSchema {
    name: "Datasets",
    columns: &[
        Column::text("WorkspaceId"),
        Column::text("WorkspaceName"),
        Column::text("DatasetId"),
        Column::text("DatasetName"),
        Column::text("DatasetDescription"),
        Column::text("DatasetWebUrl"),
        Column::text("DatasetConfiguredBy"),
        Column::flag("DatasetIsRefreshable"),
        Column::text("DatasetTargetStorageMode"),
        Column::text("DatasetCreatedDate"),
    ],
};

pub static DATASET_SOURCES: TableSchema = TableSchema {
    name: "DatasetSourcesInfo",
    columns: &[
        Column::text("WorkspaceId"),
        Column::text("WorkspaceName"),
        Column::text("DatasetId"),
        Column::text("DatasetName"),
        Column::text("DatasetDatasourceType"),
        Column::text("DatasetDatasourceId"),
        Column::text("DatasetDatasourceGatewayId"),
        Column::json("DatasetDatasourceConnectionDetails"),
    ],
};

pub static DATASET_REFRESH_HISTORY: TableSchema = TableSchema {
    name: "DatasetRefreshHistory",
    columns: &[
        Column::text("WorkspaceId"),
        Column::text("WorkspaceName"),
        Column::text("DatasetId"),
        Column::text("DatasetName"),
        Column::text("DatasetRefreshRequestId"),
        Column::text("DatasetRefreshId"),
        Column::text("DatasetRefreshStartTime"),
        Column::text("DatasetRefreshEndTime"),
        Column::text("DatasetRefreshStatus"),
        Column::text("DatasetRefreshType"),
    ],
};

pub static DATASET_REFRESH_SCHEDULE: TableSchema = TableSchema {
    name: "DatasetRefreshSchedule",
    columns: &[
        Column::text("WorkspaceId"),
        Column::text("WorkspaceName"),
        Column::text("DatasetId"),
        Column::text("DatasetName"),
        Column::flag("DatasetRefreshScheduleEnabled"),
        Column::text("DatasetRefreshScheduleLocalTimeZoneId"),
        Column::text("DatasetRefreshScheduleNotifyOption"),
        Column::text("DatasetRefreshScheduleDay"),
        Column::text("DatasetRefreshScheduleTime"),
    ],
};

pub static DATAFLOWS: TableSchema = TableSchema {
    name: "Dataflows",
    columns: &[
        Column::text("WorkspaceId"),
        Column::text("WorkspaceName"),
        Column::text("DataflowId"),
        Column::text("DataflowName"),
        Column::text("DataflowDescription"),
        Column::text("DataflowConfiguredBy"),
        Column::text("DataflowModifiedBy"),
        Column::text("DataflowModifiedDateTime"),
        Column::text("DataflowJsonURL"),
        Column::text("DataflowGeneration"),
    ],
};

pub static DATAFLOW_LINEAGE: TableSchema = TableSchema {
    name: "DataflowLineage",
    columns: &[
        Column::text("WorkspaceId"),
        Column::text("WorkspaceName"),
        Column::text("DataflowId"),
        Column::text("DataflowName"),
        Column::text("DatasetId"),
        Column::text("DatasetName"),
    ],
};

pub static DATAFLOW_SOURCES: TableSchema = TableSchema {
    name: "DataflowSourcesInfo",
    columns: &[
        Column::text("WorkspaceId"),
        Column::text("WorkspaceName"),
        Column::text("DataflowId"),
        Column::text("DataflowName"),
        Column::text("DataflowDatasourceType"),
        Column::text("DataflowDatasourceId"),
        Column::text("DataflowDatasourceGatewayId"),
        Column::json("DataflowDatasourceConnectionDetails"),
    ],
};

pub static DATAFLOW_REFRESH_HISTORY: TableSchema = TableSchema {
    name: "DataflowRefreshHistory",
    columns: &[
        Column::text("WorkspaceId"),
        Column::text("WorkspaceName"),
        Column::text("DataflowId"),
        Column::text("DataflowName"),
        Column::text("DataflowRefreshRequestId"),
        Column::text("DataflowRefreshId"),
        Column::text("DataflowRefreshStartTime"),
        Column::text("DataflowRefreshEndTime"),
        Column::text("DataflowRefreshStatus"),
        Column::text("DataflowRefreshType"),
        Column::json("DataflowErrorInfo"),
    ],
};

pub static REPORTS: TableSchema = TableSchema {
    name: "Reports",
    columns: &[
        Column::text("WorkspaceId"),
        Column::text("WorkspaceName"),
        Column::text("ReportId"),
        Column::text("ReportName"),
        Column::text("ReportDescription"),
        Column::text("ReportWebUrl"),
        Column::text("ReportEmbedUrl"),
        Column::text("ReportType"),
        Column::text("DatasetId"),
        Column::text("DatasetName"),
    ],
};

pub static REPORT_PAGES: TableSchema = TableSchema {
    name: "ReportPages",
    columns: &[
        Column::text("WorkspaceId"),
        Column::text("WorkspaceName"),
        Column::text("ReportId"),
        Column::text("ReportName"),
        Column::text("PageName"),
        Column::text("PageDisplayName"),
        Column::integer("PageOrder"),
    ],
};

pub static APPS: TableSchema = TableSchema {
    name: "Apps",
    columns: &[
        Column::text("AppId"),
        Column::text("AppName"),
        Column::text("AppLastUpdate"),
        Column::text("AppDescription"),
        Column::text("AppPublishedBy"),
        Column::text("AppWorkspaceId"),
        Column::text("WorkspaceName"),
    ],
};

pub static APP_REPORTS: TableSchema = TableSchema {
    name: "AppReports",
    columns: &[
        Column::text("AppId"),
        Column::text("AppName"),
        Column::text("AppReportId"),
        Column::text("AppReportType"),
        Column::text("ReportName"),
        Column::text("AppReportWebUrl"),
        Column::text("AppReportEmbedUrl"),
        Column::flag("AppReportIsOwnedByMe"),
        Column::text("AppReportDatasetId"),
        Column::text("ReportId"),
        Column::text("WorkspaceName"),
    ],
};

// ---------------------------------------------------------------------------
// Semantic model metadata
// ---------------------------------------------------------------------------

pub static MODEL_DETAIL: TableSchema = TableSchema {
    name: "ModelDetail",
    columns: &[
        Column::text("Type"),
        Column::text("Table"),
        Column::text("Name"),
        Column::text("FormatString"),
        Column::text("DisplayFolder"),
        Column::text("Description"),
        Column::text("IsHidden"),
        Column::text("TableStorageMode"),
        Column::text("Expression"),
        Column::text("ModelAsOfDate"),
        Column::text("ModelName"),
        Column::text("ModelID"),
        Column::text("WorkspaceName"),
        Column::text("RelationshipFromTable"),
        Column::text("RelationshipFromColumn"),
        Column::text("RelationshipToTable"),
        Column::text("RelationshipToColumn"),
        Column::text("RelationshipStatus"),
        Column::text("RelationshipFromCardinality"),
        Column::text("RelationshipToCardinality"),
        Column::text("RelationshipCrossFilteringBehavior"),
    ],
};

pub static MODEL_DEPENDENCIES: TableSchema = TableSchema {
    name: "ModelDependencies",
    columns: &[
        Column::text("ObjectName"),
        Column::text("ObjectType"),
        Column::text("DependsOn"),
        Column::text("DependsOnType"),
        Column::text("ModelAsOfDate"),
        Column::text("ModelName"),
        Column::text("ModelID"),
        Column::text("WorkspaceName"),
    ],
};

// ---------------------------------------------------------------------------
// Report metadata
// ---------------------------------------------------------------------------

pub static CONNECTIONS: TableSchema = TableSchema {
    name: "Connections",
    columns: &[
        Column::text("ReportID"),
        Column::text("ModelID"),
        Column::text("ReportDate"),
        Column::text("ReportName"),
        Column::text("Type"),
        Column::text("ServerName"),
        Column::text("WorkspaceName"),
    ],
};

pub static PAGES: TableSchema = TableSchema {
    name: "Pages",
    columns: &[
        Column::text("ReportName"),
        Column::text("ReportID"),
        Column::text("ModelID"),
        Column::text("Id"),
        Column::text("Name"),
        Column::integer("Number"),
        Column::integer("Width"),
        Column::integer("Height"),
        Column::flag("HiddenFlag"),
        Column::integer("VisualCount"),
        Column::text("Type"),
        Column::text("DisplayOption"),
        Column::integer("DataVisualCount"),
        Column::integer("VisibleVisualCount"),
        Column::integer("PageFilterCount"),
        Column::text("ReportDate"),
        Column::text("WorkspaceName"),
    ],
};

pub static VISUALS: TableSchema = TableSchema {
    name: "Visuals",
    columns: &[
        Column::text("ReportName"),
        Column::text("ReportID"),
        Column::text("ModelID"),
        Column::text("PageName"),
        Column::text("PageId"),
        Column::text("Id"),
        Column::text("Name"),
        Column::text("Type"),
        Column::text("DisplayType"),
        Column::text("Title"),
        Column::text("SubTitle"),
        Column::text("AltText"),
        Column::integer("TabOrder"),
        Column::flag("CustomVisualFlag"),
        Column::flag("HiddenFlag"),
        Column::float("X"),
        Column::float("Y"),
        Column::integer("Z"),
        Column::float("Width"),
        Column::float("Height"),
        Column::integer("ObjectCount"),
        Column::integer("VisualFilterCount"),
        Column::integer("DataLimit"),
        Column::flag("Divider"),
        Column::flag("RowSubTotals"),
        Column::flag("ColumnSubTotals"),
        Column::flag("DataVisual"),
        Column::flag("HasSparkline"),
        Column::text("ParentGroup"),
        Column::text("ReportDate"),
        Column::text("WorkspaceName"),
    ],
};

pub static BOOKMARKS: TableSchema = TableSchema {
    name: "Bookmarks",
    columns: &[
        Column::text("ReportName"),
        Column::text("ReportID"),
        Column::text("ModelID"),
        Column::text("Name"),
        Column::text("Id"),
        Column::text("PageName"),
        Column::text("PageId"),
        Column::text("VisualId"),
        Column::flag("VisualHiddenFlag"),
        Column::flag("SuppressData"),
        Column::flag("CurrentPageSelected"),
        Column::flag("ApplyVisualDisplayState"),
        Column::flag("ApplyToAllVisuals"),
        Column::text("ReportDate"),
        Column::text("WorkspaceName"),
    ],
};

pub static CUSTOM_VISUALS: TableSchema = TableSchema {
    name: "CustomVisuals",
    columns: &[
        Column::text("ReportName"),
        Column::text("ReportID"),
        Column::text("ModelID"),
        Column::text("Name"),
        Column::text("ReportDate"),
        Column::text("WorkspaceName"),
    ],
};

pub static REPORT_FILTERS: TableSchema = TableSchema {
    name: "ReportFilters",
    columns: &[
        Column::text("ReportName"),
        Column::text("ReportID"),
        Column::text("ModelID"),
        Column::text("displayName"),
        Column::text("TableName"),
        Column::text("ObjectName"),
        Column::text("ObjectType"),
        Column::text("FilterType"),
        Column::flag("HiddenFilter"),
        Column::flag("LockedFilter"),
        Column::text("HowCreated"),
        Column::flag("Used"),
        Column::text("ReportDate"),
        Column::text("WorkspaceName"),
    ],
};

pub static PAGE_FILTERS: TableSchema = TableSchema {
    name: "PageFilters",
    columns: &[
        Column::text("ReportName"),
        Column::text("ReportID"),
        Column::text("ModelID"),
        Column::text("PageId"),
        Column::text("PageName"),
        Column::text("displayName"),
        Column::text("TableName"),
        Column::text("ObjectName"),
        Column::text("ObjectType"),
        Column::text("FilterType"),
        Column::flag("HiddenFilter"),
        Column::flag("LockedFilter"),
        Column::text("HowCreated"),
        Column::flag("Used"),
        Column::text("ReportDate"),
        Column::text("WorkspaceName"),
    ],
};

pub static VISUAL_FILTERS: TableSchema = TableSchema {
    name: "VisualFilters",
    columns: &[
        Column::text("ReportName"),
        Column::text("ReportID"),
        Column::text("ModelID"),
        Column::text("PageName"),
        Column::text("PageId"),
        Column::text("VisualId"),
        Column::text("TableName"),
        Column::text("ObjectName"),
        Column::text("ObjectType"),
        Column::text("FilterType"),
        Column::flag("HiddenFilter"),
        Column::flag("LockedFilter"),
        Column::text("displayName"),
        Column::text("HowCreated"),
        Column::flag("Used"),
        Column::text("ReportDate"),
        Column::text("WorkspaceName"),
    ],
};

pub static VISUAL_OBJECTS: TableSchema = TableSchema {
    name: "VisualObjects",
    columns: &[
        Column::text("ReportName"),
        Column::text("ReportID"),
        Column::text("ModelID"),
        Column::text("PageName"),
        Column::text("PageId"),
        Column::text("VisualId"),
        Column::text("VisualName"),
        Column::text("VisualType"),
        Column::flag("CustomVisualFlag"),
        Column::text("TableName"),
        Column::text("ObjectName"),
        Column::text("ObjectType"),
        Column::text("Source"),
        Column::text("displayName"),
        Column::flag("ImplicitMeasure"),
        Column::flag("Sparkline"),
        Column::flag("VisualCalc"),
        Column::text("Format"),
        Column::text("ReportDate"),
        Column::text("WorkspaceName"),
    ],
};

pub static REPORT_LEVEL_MEASURES: TableSchema = TableSchema {
    name: "ReportLevelMeasures",
    columns: &[
        Column::text("ReportName"),
        Column::text("ReportID"),
        Column::text("ModelID"),
        Column::text("TableName"),
        Column::text("ObjectName"),
        Column::text("ObjectType"),
        Column::text("Expression"),
        Column::flag("HiddenFlag"),
        Column::text("FormatString"),
        Column::text("DataType"),
        Column::text("DataCategory"),
        Column::text("ReportDate"),
        Column::text("WorkspaceName"),
    ],
};

pub static VISUAL_INTERACTIONS: TableSchema = TableSchema {
    name: "VisualInteractions",
    columns: &[
        Column::text("ReportName"),
        Column::text("ReportID"),
        Column::text("ModelID"),
        Column::text("PageName"),
        Column::text("PageId"),
        Column::text("SourceVisualID"),
        Column::text("TargetVisualID"),
        Column::text("SourceVisualName"),
        Column::text("TargetVisualName"),
        Column::text("TypeID"),
        Column::text("Type"),
        Column::text("ReportDate"),
        Column::text("WorkspaceName"),
    ],
};

// ---------------------------------------------------------------------------
// Dataflow query detail
// ---------------------------------------------------------------------------

pub static DATAFLOW_DETAIL: TableSchema = TableSchema {
    name: "DataflowDetail",
    columns: &[
        Column::text("DataflowId"),
        Column::text("DataflowName"),
        Column::text("QueryName"),
        Column::text("Query"),
        Column::text("ReportDate"),
        Column::text("WorkspaceName"),
        Column::text("WorkspaceNameDataflowName"),
    ],
};

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

pub static TENANT_TABLES: [&TableSchema; 14] = [
    &WORKSPACES,
    &FABRIC_ITEMS,
    &DATASETS,
    &DATASET_SOURCES,
    &DATASET_REFRESH_HISTORY,
    &DATASET_REFRESH_SCHEDULE,
    &DATAFLOWS,
    &DATAFLOW_LINEAGE,
    &DATAFLOW_SOURCES,
    &DATAFLOW_REFRESH_HISTORY,
    &REPORTS,
    &REPORT_PAGES,
    &APPS,
    &APP_REPORTS,
];

pub static MODEL_TABLES: [&TableSchema; 2] = [&MODEL_DETAIL, &MODEL_DEPENDENCIES];

pub static REPORT_TABLES: [&TableSchema; 11] = [
    &CONNECTIONS,
    &PAGES,
    &VISUALS,
    &BOOKMARKS,
    &CUSTOM_VISUALS,
    &REPORT_FILTERS,
    &PAGE_FILTERS,
    &VISUAL_FILTERS,
    &VISUAL_OBJECTS,
    &REPORT_LEVEL_MEASURES,
    &VISUAL_INTERACTIONS,
];

pub static DATAFLOW_DETAIL_TABLES: [&TableSchema; 1] = [&DATAFLOW_DETAIL];

/// Every destination table, in write order.
pub fn all_tables() -> impl Iterator<Item = &'static TableSchema> {
    TENANT_TABLES
        .iter()
        .chain(MODEL_TABLES.iter())
        .chain(REPORT_TABLES.iter())
        .chain(DATAFLOW_DETAIL_TABLES.iter())
        .copied()
}

/// Looks up a destination table by name.
pub fn by_name(name: &str) -> Option<&'static TableSchema> {
    all_tables().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn twenty_eight_distinct_tables() {
        let names: HashSet<_> = all_tables().map(|t| t.name).collect();
        assert_eq!(names.len(), 28);
    }

    #[test]
    fn no_table_repeats_a_column() {
        for table in all_tables() {
            let unique: HashSet<_> = table.columns.iter().map(|c| c.name).collect();
            assert_eq!(unique.len(), table.columns.len(), "{}", table.name);
        }
    }

    #[test]
    fn model_detail_has_twenty_one_columns() {
        assert_eq!(MODEL_DETAIL.columns.len(), 21);
        assert_eq!(by_name("VisualObjects"), Some(&VISUAL_OBJECTS));
    }
}
