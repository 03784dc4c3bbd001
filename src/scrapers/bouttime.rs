//! Bouttime results scraper.
//!
//! One ASP.NET page holds the whole table for a single distance.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::error::{AppError, Result};
use crate::models::ResultRow;
use crate::utils::http::{HttpFetch, fetch_document};

use super::table::{self, MOBILE_ONLY_CLASS};
use super::{Scraper, Site};

/// Hidden ASP.NET form-state elements removed before parsing.
const FORM_STATE_IDS: [&str; 3] = ["__VIEWSTATE", "__VIEWSTATEGENERATOR", "__EVENTVALIDATION"];

const RACE_NAME_ID: &str = "ContentPlaceHolder1_lblRaceName";
const DISTANCE_ID: &str = "ContentPlaceHolder1_lblDistance";
const TABLE_SELECTOR: &str = "div.container table";

/// `John Doe (AB123)`
static NAME_WITH_LICENSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)\s\((.*)\)").expect("name regex"));

/// Scraper for `bouttime.co.za`.
pub struct BouttimeScraper<'a> {
    url: String,
    client: &'a dyn HttpFetch,
}

impl<'a> BouttimeScraper<'a> {
    pub fn new(url: impl Into<String>, client: &'a dyn HttpFetch) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    fn scrape(&self) -> Result<Vec<ResultRow>> {
        let Some(mut document) = fetch_document(self.client, &self.url) else {
            return Ok(Vec::new());
        };
        strip_form_state(&mut document);
        parse_results(&document)
    }
}

impl Scraper for BouttimeScraper<'_> {
    fn site(&self) -> Site {
        Site::Bouttime
    }

    fn get_results(&self) -> Vec<ResultRow> {
        self.scrape().unwrap_or_else(|e| {
            log::error!("{}", e);
            Vec::new()
        })
    }
}

fn strip_form_state(document: &mut Html) {
    for id in FORM_STATE_IDS {
        let Ok(selector) = table::parse_selector(&format!("[id=\"{id}\"]")) else {
            continue;
        };
        let nodes: Vec<_> = document.select(&selector).map(|el| el.id()).collect();
        for node in nodes {
            if let Some(mut node) = document.tree.get_mut(node) {
                node.detach();
            }
        }
    }
}

fn parse_results(document: &Html) -> Result<Vec<ResultRow>> {
    let race_name = table::find_id(document, RACE_NAME_ID)
        .map(table::text_of)
        .unwrap_or_default();
    let distance_name = table::find_id(document, DISTANCE_ID)
        .map(table::text_of)
        .unwrap_or_default();

    let results_table = table::select_first(document, TABLE_SELECTOR)?
        .ok_or_else(|| AppError::structure("No results table found"))?;

    let rows = table::select_all(results_table, "tr")?;
    let Some((header_row, body)) = rows.split_first() else {
        return Ok(Vec::new());
    };
    let headers = table::header_map(*header_row, "th", Some(MOBILE_ONLY_CLASS))?;

    let mut results = Vec::with_capacity(body.len());
    for row in body {
        let mut result = ResultRow::new();
        result.stamp(&race_name, &distance_name);
        for (column, text) in table::labeled_cells(&headers, &table::row_cells(*row)) {
            if column == "Name" && text.contains('(') {
                if let Some((name, license)) = split_license(&text) {
                    result.insert("Name", name);
                    result.insert("LicenseNr", license);
                    continue;
                }
            }
            result.insert(column, text);
        }
        results.push(result);
    }
    Ok(results)
}

/// Split `name (license)` into its two parts.
fn split_license(text: &str) -> Option<(String, String)> {
    let caps = NAME_WITH_LICENSE.captures(text)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}
