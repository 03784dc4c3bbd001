//! MobiiElite results scraper.
//!
//! The race page only carries two GUIDs: the race id in its path and a
//! display id in a `data-src` attribute. Column layout and results both come
//! from the JSON API behind `live.mobii.com`.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{CellValue, MobiiEliteConfig, ResultRow};
use crate::utils::http::{HttpFetch, fetch_document, fetch_json, post_json};
use crate::utils::url::origin;

use super::table;
use super::{Scraper, Site};

const GUID: &str =
    r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

static RACE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("/RaceID/({GUID})")).expect("race id regex"));
static DISPLAY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("DisplayId=({GUID})")).expect("display id regex"));

/// Upper bound on records requested in the single results call.
const MAX_RECORDS: u32 = 1_000_000;

/// Columns requested from the results engine.
const RESULT_COLUMNS: [&str; 14] = [
    "CourseName",
    "CoursePosition",
    "CategoryPosition",
    "CategoryName",
    "BibNumber",
    "FirstName",
    "LastName",
    "Gender",
    "GroupItem",
    "StartTime",
    "ResultTime",
    "OverallDifference",
    "Pace",
    "Speed",
];

/// One column of a display layout.
#[derive(Debug, Clone, Default, Deserialize)]
struct DisplayColumn {
    #[serde(rename = "JSONField", default)]
    json_field: Option<String>,
    #[serde(rename = "Field", default)]
    field: Option<String>,
    #[serde(rename = "Name", default)]
    name: Option<String>,
}

impl DisplayColumn {
    /// Output column name for a JSON field shown by this column.
    fn column_name<'c>(&'c self, json_field: &'c str) -> &'c str {
        if json_field == "gi" {
            return "Club";
        }
        self.field
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(json_field)
    }
}

#[derive(Debug, Deserialize)]
struct DisplayLayout {
    #[serde(rename = "Columns", default)]
    columns: Vec<DisplayColumn>,
}

/// Scraper for `mobiielite.com`.
pub struct MobiiEliteScraper<'a> {
    url: String,
    client: &'a dyn HttpFetch,
    config: MobiiEliteConfig,
}

impl<'a> MobiiEliteScraper<'a> {
    pub fn new(url: impl Into<String>, client: &'a dyn HttpFetch, config: MobiiEliteConfig) -> Self {
        Self {
            url: url.into(),
            client,
            config,
        }
    }

    fn scrape(&self) -> Result<Vec<ResultRow>> {
        let race_id = race_id(&self.url)
            .ok_or_else(|| AppError::malformed_url(&self.url, "Could not determine Race ID"))?;
        let main_url = main_page_url(&self.url, &race_id)?;

        let Some(document) = fetch_document(self.client, &main_url) else {
            return Ok(Vec::new());
        };
        let race_name = table::select_first(&document, "title")?
            .map(table::text_of)
            .unwrap_or_default();
        let display_id = display_id(&document)
            .ok_or_else(|| AppError::structure("Could not determine Display ID"))?;

        let api = Url::parse(&self.config.api_base_url)?;
        let Some(mut columns) = self.display_columns(&api, &display_id)? else {
            return Ok(Vec::new());
        };
        columns.push(DisplayColumn {
            json_field: Some("cn".to_string()),
            field: None,
            name: Some("EventName".to_string()),
        });

        let Some(records) = self.fetch_records(&api, &race_id)? else {
            return Ok(Vec::new());
        };
        let mut rows = parse_records(&columns, &records, self.config.include_all_fields);
        sort_rows(&mut rows);

        for row in &mut rows {
            row.insert("RaceName", race_name.as_str());
        }
        Ok(rows)
    }

    /// Columns of the first display layout, or `None` if the download failed.
    fn display_columns(&self, api: &Url, display_id: &str) -> Result<Option<Vec<DisplayColumn>>> {
        let url = api.join(&format!(
            "api/DisplayLayouts/GetDisplayLayoutsForDisplay?displayid={display_id}"
        ))?;
        let Some(value) = fetch_json(self.client, url.as_str()) else {
            return Ok(None);
        };
        let layouts: Vec<DisplayLayout> = serde_json::from_value(value)?;
        layouts
            .into_iter()
            .next()
            .map(|layout| Some(layout.columns))
            .ok_or_else(|| AppError::structure("empty display configuration"))
    }

    fn fetch_records(&self, api: &Url, race_id: &str) -> Result<Option<Vec<Value>>> {
        let url = api.join("api/Results/GetResults2")?;
        let body = results_request(race_id, &session_id());
        let Some(mut response) = post_json(self.client, url.as_str(), &body) else {
            return Ok(None);
        };
        match response.get_mut("Results").map(Value::take) {
            Some(Value::Array(records)) => Ok(Some(records)),
            _ => Err(AppError::structure("results response has no Results list")),
        }
    }
}

impl Scraper for MobiiEliteScraper<'_> {
    fn site(&self) -> Site {
        Site::MobiiElite
    }

    fn get_results(&self) -> Vec<ResultRow> {
        self.scrape().unwrap_or_else(|e| {
            log::error!("{}", e);
            Vec::new()
        })
    }
}

fn race_id(url: &str) -> Option<String> {
    RACE_ID.captures(url).map(|caps| caps[1].to_string())
}

fn main_page_url(url: &str, race_id: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| AppError::malformed_url(url, e))?;
    Ok(format!("{}/results/RaceID/{race_id}", origin(&parsed)))
}

/// Display id from the first results tab whose `data-src` names one.
fn display_id(document: &Html) -> Option<String> {
    let tabs = table::find_id(document, "myTabContent2")?;
    let data_src = table::select_all(tabs, "div[data-src]")
        .ok()?
        .into_iter()
        .filter_map(|div| div.value().attr("data-src"))
        .find(|src| src.contains("DisplayId"))?;
    DISPLAY_ID
        .captures(data_src)
        .map(|caps| caps[1].to_string())
}

/// Four lowercase hex digits identifying this client to the results API.
fn session_id() -> String {
    let n = fastrand::u32(..36u32.pow(4));
    format!("{:04x}", n % 0x1_0000)
}

fn results_request(race_id: &str, session_id: &str) -> Value {
    json!({
        "ResultType": 1,
        "CourseEntityType": 4,
        "ModifiedTicks": 0,
        "RaceId": race_id,
        "Index": 0,
        "Count": MAX_RECORDS,
        "GenderType": 0,
        "GroupItemId": null,
        "SessionId": session_id,
        "Columns": RESULT_COLUMNS,
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Convert one JSON field, parsing times for the fields that carry them.
fn cell_for(json_field: &str, value: &Value) -> CellValue {
    let millis = value.as_f64();
    let parsed = match (json_field, millis) {
        ("t" | "p", Some(ms)) => CellValue::duration_from_millis(ms),
        ("sti", Some(ms)) => CellValue::timestamp_from_millis(ms),
        _ => None,
    };
    parsed.unwrap_or_else(|| CellValue::from_json(value))
}

fn parse_records(columns: &[DisplayColumn], records: &[Value], include_all: bool) -> Vec<ResultRow> {
    records
        .iter()
        .filter_map(Value::as_object)
        .filter(|record| record.get("ia").is_some_and(is_truthy))
        .map(|record| parse_record(columns, record, include_all))
        .collect()
}

fn parse_record(columns: &[DisplayColumn], record: &Map<String, Value>, include_all: bool) -> ResultRow {
    let mut record = record.clone();
    for (alias, source) in [("csp", "cp"), ("ctp", "gp")] {
        if let Some(value) = record.get(source).cloned() {
            record.insert(alias.to_string(), value);
        }
    }

    let mut row = ResultRow::new();
    for column in columns {
        let Some(json_field) = column.json_field.as_deref() else {
            continue;
        };
        if let Some(value) = record.get(json_field) {
            row.insert(column.column_name(json_field), cell_for(json_field, value));
        }
    }

    if include_all {
        for (key, value) in &record {
            if key.ends_with("Key") || key.ends_with("id") {
                continue;
            }
            if columns.iter().any(|c| c.json_field.as_deref() == Some(key.as_str())) {
                continue;
            }
            row.insert(key.as_str(), CellValue::from_json(value));
        }
    }
    row
}

fn compare_column(a: &ResultRow, b: &ResultRow, key: &str) -> Ordering {
    match (a.get(key), b.get(key)) {
        (Some(x), Some(y)) => x.total_cmp(y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort by event, then course position.
fn sort_rows(rows: &mut [ResultRow]) {
    rows.sort_by(|a, b| {
        compare_column(a, b, "EventName").then_with(|| compare_column(a, b, "CoursePosition"))
    });
}
