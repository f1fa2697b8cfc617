//! Report sessions backed by the PBIR-Legacy definition (`report.json`).
//!
//! The legacy layout nests stringified JSON: the report, every page and
//! every visual container carry `config` and `filters` members that hold
//! serialized documents rather than objects.

use super::literals::{
    embedded_json, field_ref, literal_bool, literal_number, literal_text, object_property,
    query_aliases,
};
use super::{row, ReportInspector, ReportRow, ReportSession};
use crate::api::{fetch_definition, find_part, MetadataApi};
use crate::error::AppError;
use crate::types::{ParentRef, WorkspaceRef};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

static NULL: Value = Value::Null;

/// Opens reports by fetching their PBIR-Legacy definition.
pub struct PbirLegacyInspector<'a> {
    api: &'a dyn MetadataApi,
}

impl<'a> PbirLegacyInspector<'a> {
    pub fn new(api: &'a dyn MetadataApi) -> Self {
        Self { api }
    }
}

impl ReportInspector for PbirLegacyInspector<'_> {
    fn open(&self, workspace: &WorkspaceRef, report: &ParentRef) -> Result<Box<dyn ReportSession>, AppError> {
        let endpoint = format!(
            "v1/workspaces/{}/reports/{}/getDefinition?format=PBIR-Legacy",
            workspace.id, report.id
        );
        let parts = fetch_definition(self.api, &endpoint)?;
        let document = find_part(&parts, |path| path.ends_with("report.json")).ok_or_else(|| {
            AppError::MalformedResponse(format!("definition of {} has no report.json", report))
        })?;
        Ok(Box::new(LegacyReport::parse(document.text()?)?))
    }
}

#[derive(Debug)]
struct Page {
    name: String,
    display_name: String,
    number: i64,
    width: f64,
    height: f64,
    display_option: i64,
    hidden: bool,
    filters: Vec<Value>,
    interactions: Vec<Value>,
    visuals: Vec<Visual>,
}

#[derive(Debug)]
struct Visual {
    name: String,
    visual_type: String,
    x: f64,
    y: f64,
    z: f64,
    width: f64,
    height: f64,
    tab_order: i64,
    parent_group: String,
    /// `singleVisual` member; `Null` for groups.
    single: Value,
    filters: Vec<Value>,
}

impl Visual {
    fn is_hidden(&self) -> bool {
        self.single.pointer("/display/mode").and_then(Value::as_str) == Some("hidden")
    }

    fn query(&self) -> &Value {
        self.single.get("prototypeQuery").unwrap_or(&NULL)
    }

    fn selects(&self) -> &[Value] {
        self.query()
            .get("Select")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn is_data_visual(&self) -> bool {
        !self.selects().is_empty()
    }

    fn has_sparkline(&self) -> bool {
        self.selects().iter().any(|s| s.get("SparklineData").is_some())
    }

    fn vc_text(&self, object: &str, property: &str) -> String {
        self.single
            .get("vcObjects")
            .and_then(|objects| object_property(objects, object, property))
            .map(literal_text)
            .unwrap_or_default()
    }

    fn object_flag(&self, group: &str, object: &str, property: &str) -> bool {
        self.single
            .get(group)
            .and_then(|objects| object_property(objects, object, property))
            .is_some_and(literal_bool)
    }

    fn data_limit(&self) -> i64 {
        self.single
            .get("objects")
            .and_then(|objects| object_property(objects, "dataLimit", "count"))
            .and_then(literal_number)
            .map_or(0, |n| n as i64)
    }
}

/// A parsed `report.json`.
#[derive(Debug)]
pub(super) struct LegacyReport {
    config: Value,
    filters: Vec<Value>,
    pages: Vec<Page>,
    custom_visuals: HashSet<String>,
}

impl LegacyReport {
    pub(super) fn parse(document: &str) -> Result<Self, AppError> {
        let root: Value = serde_json::from_str(document.trim_start_matches('\u{feff}'))?;
        let config = embedded_json(root.get("config"));
        let custom_visuals = config
            .get("publicCustomVisuals")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();

        let pages = root
            .get("sections")
            .and_then(Value::as_array)
            .map(|sections| sections.iter().enumerate().map(|(i, s)| parse_page(i, s)).collect())
            .unwrap_or_default();

        Ok(Self {
            filters: array_of(embedded_json(root.get("filters"))),
            config,
            pages,
            custom_visuals,
        })
    }

    fn is_custom(&self, visual_type: &str) -> bool {
        self.custom_visuals.contains(visual_type)
    }

    fn page_display_name(&self, page_name: &str) -> &str {
        self.pages
            .iter()
            .find(|p| p.name == page_name)
            .map_or("", |p| p.display_name.as_str())
    }
}

fn parse_page(index: usize, section: &Value) -> Page {
    let config = embedded_json(section.get("config"));
    let visuals = section
        .get("visualContainers")
        .and_then(Value::as_array)
        .map(|containers| containers.iter().map(parse_visual).collect())
        .unwrap_or_default();

    Page {
        name: str_of(section, "name"),
        display_name: str_of(section, "displayName"),
        number: section
            .get("ordinal")
            .and_then(Value::as_i64)
            .unwrap_or(index as i64),
        width: num_of(section, "width"),
        height: num_of(section, "height"),
        display_option: section.get("displayOption").and_then(Value::as_i64).unwrap_or(0),
        hidden: config.get("visibility").and_then(Value::as_i64) == Some(1),
        filters: array_of(embedded_json(section.get("filters"))),
        interactions: config
            .get("relationships")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        visuals,
    }
}

fn parse_visual(container: &Value) -> Visual {
    let config = embedded_json(container.get("config"));
    let position = config.pointer("/layouts/0/position").unwrap_or(&NULL);
    let single = config.get("singleVisual").cloned().unwrap_or(Value::Null);
    let visual_type = if config.get("singleVisualGroup").is_some() {
        "Group".to_string()
    } else {
        str_of(&single, "visualType")
    };
    let coordinate = |key: &str| {
        container
            .get(key)
            .and_then(Value::as_f64)
            .unwrap_or_else(|| num_of(position, key))
    };

    Visual {
        name: str_of(&config, "name"),
        visual_type,
        x: coordinate("x"),
        y: coordinate("y"),
        z: coordinate("z"),
        width: coordinate("width"),
        height: coordinate("height"),
        tab_order: position
            .get("tabOrder")
            .or_else(|| container.get("tabOrder"))
            .and_then(Value::as_i64)
            .unwrap_or(0),
        parent_group: str_of(&config, "parentGroupName"),
        single,
        filters: array_of(embedded_json(container.get("filters"))),
    }
}

fn str_of(node: &Value, key: &str) -> String {
    node.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn num_of(node: &Value, key: &str) -> f64 {
    node.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn array_of(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

fn display_option_name(code: i64) -> &'static str {
    match code {
        0 => "FitToPage",
        1 => "FitToWidth",
        2 => "ActualSize",
        3 => "ActualSizeTopLeft",
        _ => "",
    }
}

fn how_created_name(code: &Value) -> String {
    match code.as_i64() {
        Some(0) => "Auto".to_string(),
        Some(1) => "User".to_string(),
        Some(2) => "Drill".to_string(),
        Some(3) => "Include".to_string(),
        Some(4) => "Exclude".to_string(),
        Some(5) => "Drillthrough".to_string(),
        Some(other) => other.to_string(),
        None => code.as_str().unwrap_or_default().to_string(),
    }
}

fn interaction_name(code: i64) -> &'static str {
    match code {
        1 => "Filter",
        2 => "Highlight",
        3 => "NoFilter",
        _ => "Default",
    }
}

/// `clusteredBarChart` → `Clustered Bar Chart`.
fn display_type(visual_type: &str) -> String {
    let mut out = String::with_capacity(visual_type.len() + 4);
    for (i, ch) in visual_type.chars().enumerate() {
        if i == 0 {
            out.extend(ch.to_uppercase());
        } else {
            if ch.is_uppercase() {
                out.push(' ');
            }
            out.push(ch);
        }
    }
    out
}

/// Common columns of a filter row at any level.
fn filter_row(filter: &Value) -> ReportRow {
    let field = filter
        .get("expression")
        .and_then(|expr| field_ref(expr, &HashMap::new()));
    let name = filter
        .get("displayName")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| filter.get("name").and_then(Value::as_str))
        .unwrap_or_default();

    row(json!({
        "Filter Name": name,
        "Type": str_of(filter, "type"),
        "Table Name": field.as_ref().map_or("", |f| f.table.as_str()),
        "Object Name": field.as_ref().map_or("", |f| f.object.as_str()),
        "Object Type": field.as_ref().map_or("", |f| f.object_type),
        "Hidden": filter.get("isHiddenInViewMode").and_then(Value::as_bool).unwrap_or(false),
        "Locked": filter.get("isLockedInViewMode").and_then(Value::as_bool).unwrap_or(false),
        "How Created": filter.get("howCreated").map(how_created_name).unwrap_or_default(),
        "Used": filter.get("filter").is_some_and(|f| !f.is_null()),
    }))
}

fn with_page(mut row: ReportRow, page: &Page) -> ReportRow {
    row.insert("Page Name".into(), Value::String(page.name.clone()));
    row.insert("Page Display Name".into(), Value::String(page.display_name.clone()));
    row
}

impl ReportSession for LegacyReport {
    fn list_pages(&self) -> Result<Vec<ReportRow>, AppError> {
        Ok(self
            .pages
            .iter()
            .map(|page| {
                let data_visuals = page.visuals.iter().filter(|v| v.is_data_visual()).count();
                let visible = page.visuals.iter().filter(|v| !v.is_hidden()).count();
                with_page(
                    row(json!({
                        "Page Number": page.number,
                        "Hidden": page.hidden,
                        "Width": page.width,
                        "Height": page.height,
                        "Display Option": display_option_name(page.display_option),
                        "Visual Count": page.visuals.len(),
                        "Data Visual Count": data_visuals,
                        "Visible Visual Count": visible,
                        "Page Filter Count": page.filters.len(),
                    })),
                    page,
                )
            })
            .collect())
    }

    fn list_visuals(&self) -> Result<Vec<ReportRow>, AppError> {
        let mut rows = Vec::new();
        for page in &self.pages {
            for visual in &page.visuals {
                rows.push(with_page(
                    row(json!({
                        "Visual Name": visual.name,
                        "Type": visual.visual_type,
                        "Display Type": display_type(&visual.visual_type),
                        "Title": visual.vc_text("title", "text"),
                        "Sub Title": visual.vc_text("subTitle", "text"),
                        "Alt Text": visual.vc_text("general", "altText"),
                        "Tab Order": visual.tab_order,
                        "Custom Visual": self.is_custom(&visual.visual_type),
                        "Hidden": visual.is_hidden(),
                        "X": visual.x,
                        "Y": visual.y,
                        "Z": visual.z,
                        "Width": visual.width,
                        "Height": visual.height,
                        "Visual Object Count": visual.selects().len(),
                        "Visual Filter Count": visual.filters.len(),
                        "Data Limit": visual.data_limit(),
                        "Divider": visual.object_flag("vcObjects", "divider", "show"),
                        "Row Sub Totals": visual.object_flag("objects", "subTotals", "rowSubtotals"),
                        "Column Sub Totals": visual.object_flag("objects", "subTotals", "columnSubtotals"),
                        "Data Visual": visual.is_data_visual(),
                        "Has Sparkline": visual.has_sparkline(),
                        "Parent Group": visual.parent_group,
                    })),
                    page,
                ));
            }
        }
        Ok(rows)
    }

    fn list_bookmarks(&self) -> Result<Vec<ReportRow>, AppError> {
        let mut bookmarks = Vec::new();
        if let Some(entries) = self.config.get("bookmarks").and_then(Value::as_array) {
            flatten_bookmarks(entries, &mut bookmarks);
        }

        let mut rows = Vec::new();
        for bookmark in bookmarks {
            let options = bookmark.get("options").unwrap_or(&NULL);
            let option = |key: &str| options.get(key).and_then(Value::as_bool).unwrap_or(false);
            let base = json!({
                "Bookmark Name": str_of(bookmark, "name"),
                "Bookmark Display Name": str_of(bookmark, "displayName"),
                "Suppress Data": option("suppressData"),
                "Current Page Selected": !option("suppressActiveSection"),
                "Apply Visual Display State": !option("suppressDisplay"),
                "Apply To All Visuals": !option("applyOnlyToTargetVisuals"),
            });

            let state = bookmark.get("explorationState").unwrap_or(&NULL);
            let active = state.get("activeSection").and_then(Value::as_str).unwrap_or_default();
            let visuals: Vec<(String, String, bool)> = state
                .get("sections")
                .and_then(Value::as_object)
                .map(|sections| {
                    sections
                        .iter()
                        .flat_map(|(section, body)| {
                            body.get("visualContainers")
                                .and_then(Value::as_object)
                                .into_iter()
                                .flatten()
                                .map(move |(visual, container)| {
                                    let hidden = container
                                        .pointer("/singleVisual/display/mode")
                                        .and_then(Value::as_str)
                                        == Some("hidden");
                                    (section.clone(), visual.clone(), hidden)
                                })
                        })
                        .collect()
                })
                .unwrap_or_default();

            if visuals.is_empty() {
                let mut r = row(base);
                r.insert("Page Name".into(), Value::String(active.to_string()));
                r.insert("Page Display Name".into(), self.page_display_name(active).into());
                r.insert("Visual Name".into(), Value::String(String::new()));
                r.insert("Visual Hidden".into(), Value::Bool(false));
                rows.push(r);
                continue;
            }
            for (section, visual, hidden) in visuals {
                let mut r = row(base.clone());
                r.insert("Page Display Name".into(), self.page_display_name(&section).into());
                r.insert("Page Name".into(), Value::String(section));
                r.insert("Visual Name".into(), Value::String(visual));
                r.insert("Visual Hidden".into(), Value::Bool(hidden));
                rows.push(r);
            }
        }
        Ok(rows)
    }

    fn list_custom_visuals(&self) -> Result<Vec<ReportRow>, AppError> {
        let mut names: Vec<&String> = self.custom_visuals.iter().collect();
        names.sort();
        Ok(names
            .into_iter()
            .map(|name| {
                let used = self
                    .pages
                    .iter()
                    .flat_map(|p| &p.visuals)
                    .any(|v| &v.visual_type == name);
                row(json!({
                    "Custom Visual Name": name,
                    "Custom Visual Display Name": name,
                    "Used in Report": used,
                }))
            })
            .collect())
    }

    fn list_report_filters(&self) -> Result<Vec<ReportRow>, AppError> {
        Ok(self.filters.iter().map(filter_row).collect())
    }

    fn list_page_filters(&self) -> Result<Vec<ReportRow>, AppError> {
        Ok(self
            .pages
            .iter()
            .flat_map(|page| page.filters.iter().map(move |f| with_page(filter_row(f), page)))
            .collect())
    }

    fn list_visual_filters(&self) -> Result<Vec<ReportRow>, AppError> {
        let mut rows = Vec::new();
        for page in &self.pages {
            for visual in &page.visuals {
                for filter in &visual.filters {
                    let mut r = with_page(filter_row(filter), page);
                    r.insert("Visual Name".into(), Value::String(visual.name.clone()));
                    rows.push(r);
                }
            }
        }
        Ok(rows)
    }

    fn list_visual_objects(&self) -> Result<Vec<ReportRow>, AppError> {
        let mut rows = Vec::new();
        for page in &self.pages {
            for visual in &page.visuals {
                let aliases = query_aliases(visual.query());
                for select in visual.selects() {
                    let query_name = str_of(select, "Name");
                    let sparkline = select.get("SparklineData");
                    let visual_calc = select.get("NativeVisualCalculation");

                    let (table, object, object_type, implicit) = if let Some(calc) = visual_calc {
                        (String::new(), str_of(calc, "Name"), "Visual Calc", false)
                    } else {
                        let expr = sparkline.and_then(|s| s.get("Measure")).unwrap_or(select);
                        match field_ref(expr, &aliases) {
                            Some(f) => (f.table, f.object, f.object_type, f.implicit_measure),
                            None => continue,
                        }
                    };
                    let display = select
                        .get("NativeReferenceName")
                        .and_then(Value::as_str)
                        .unwrap_or(&query_name)
                        .to_string();
                    let format = visual
                        .single
                        .pointer(&format!("/columnProperties/{}/formatString", query_name.replace('/', "~1")))
                        .and_then(Value::as_str)
                        .unwrap_or_default();

                    let mut r = with_page(
                        row(json!({
                            "Visual Name": visual.name,
                            "Table Name": table,
                            "Object Name": object,
                            "Object Type": object_type,
                            "Object Display Name": display,
                            "Implicit Measure": implicit,
                            "Sparkline": sparkline.is_some(),
                            "Visual Calc": visual_calc.is_some(),
                            "Format": format,
                        })),
                        page,
                    );
                    r.insert("Visual Type".into(), Value::String(visual.visual_type.clone()));
                    rows.push(r);
                }
            }
        }
        Ok(rows)
    }

    fn list_report_level_measures(&self) -> Result<Vec<ReportRow>, AppError> {
        let mut rows = Vec::new();
        let extensions = self
            .config
            .get("modelExtensions")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for extension in extensions {
            let entities = extension.get("entities").and_then(Value::as_array).into_iter().flatten();
            for entity in entities {
                let measures = entity.get("measures").and_then(Value::as_array).into_iter().flatten();
                for measure in measures {
                    rows.push(row(json!({
                        "Table Name": str_of(entity, "name"),
                        "Measure Name": str_of(measure, "name"),
                        "Expression": str_of(measure, "expression"),
                        "Format String": str_of(measure, "formatString"),
                        "Data Type": measure.get("dataType").cloned().unwrap_or(Value::Null),
                        "Data Category": str_of(measure, "dataCategory"),
                    })));
                }
            }
        }
        Ok(rows)
    }

    fn list_visual_interactions(&self) -> Result<Vec<ReportRow>, AppError> {
        let mut rows = Vec::new();
        for page in &self.pages {
            for interaction in &page.interactions {
                let code = interaction.get("type").and_then(Value::as_i64).unwrap_or(0);
                rows.push(with_page(
                    row(json!({
                        "Source Visual Name": str_of(interaction, "source"),
                        "Target Visual Name": str_of(interaction, "target"),
                        "Type": interaction_name(code),
                        "Type ID": code,
                    })),
                    page,
                ));
            }
        }
        Ok(rows)
    }
}

fn flatten_bookmarks<'a>(entries: &'a [Value], out: &mut Vec<&'a Value>) {
    for entry in entries {
        match entry.get("children").and_then(Value::as_array) {
            Some(children) => flatten_bookmarks(children, out),
            None => out.push(entry),
        }
    }
}
