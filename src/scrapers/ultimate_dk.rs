//! Ultimate.dk results scraper.
//!
//! Events are addressed by `eventid`; each distance's full table is fetched
//! in one request by asking for a start record past any real field size.

use scraper::Html;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{EventDescriptor, ResultRow};
use crate::utils::http::{HttpFetch, fetch_document};
use crate::utils::url::{origin, query_param};

use super::table;
use super::{Scraper, Site};

const RACE_NAME_SELECTOR: &str = "table:nth-last-child(3) td:nth-of-type(2)";
const DISTANCE_SELECT_ID: &str = "search_distance";
const RESULTS_TABLE_SELECTOR: &str = "table.search_result_table";

/// Distance used when the page offers no distance selector options.
const DEFAULT_DISTANCE_ID: u32 = 1;

/// Scraper for `live.ultimate.dk`.
pub struct UltimateDkScraper<'a> {
    url: String,
    client: &'a dyn HttpFetch,
}

impl<'a> UltimateDkScraper<'a> {
    pub fn new(url: impl Into<String>, client: &'a dyn HttpFetch) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    fn scrape(&self) -> Result<Vec<ResultRow>> {
        let (main_url, event_id) = main_page_url(&self.url)?;
        let Some(document) = fetch_document(self.client, main_url.as_str()) else {
            return Ok(Vec::new());
        };

        let race_name = race_name(&document).unwrap_or_else(|| {
            log::warn!("No race name found on {}", main_url);
            String::new()
        });

        let mut results = Vec::new();
        for distance in discover_distances(&document, &race_name) {
            log::debug!("Distance: {}", distance.name);
            let url = data_url(&event_id, &distance.target);
            match self.distance_results(&url) {
                Ok(rows) => {
                    for mut row in rows {
                        row.stamp(&race_name, &distance.name);
                        results.push(row);
                    }
                }
                Err(e) => log::error!("{}", e),
            }
        }
        Ok(results)
    }

    fn distance_results(&self, url: &str) -> Result<Vec<ResultRow>> {
        match fetch_document(self.client, url) {
            Some(document) => parse_results(&document),
            None => Ok(Vec::new()),
        }
    }
}

impl Scraper for UltimateDkScraper<'_> {
    fn site(&self) -> Site {
        Site::UltimateDk
    }

    fn get_results(&self) -> Vec<ResultRow> {
        self.scrape().unwrap_or_else(|e| {
            log::error!("{}", e);
            Vec::new()
        })
    }
}

/// Canonical event page and its event id.
///
/// The query string is matched case-insensitively, so `EventID=ABC` is read
/// as `eventid=abc`.
fn main_page_url(url: &str) -> Result<(Url, String)> {
    let parsed = Url::parse(url).map_err(|e| AppError::malformed_url(url, e))?;
    let mut lowered = parsed.clone();
    lowered.set_query(parsed.query().map(str::to_lowercase).as_deref());

    let event_id = query_param(&lowered, "eventid")
        .ok_or_else(|| AppError::malformed_url(url, "eventid is required"))?;

    let mut main = Url::parse(&origin(&parsed))?.join("/desktop/front/")?;
    main.query_pairs_mut().append_pair("eventid", &event_id);
    Ok((main, event_id))
}

/// Full-table data URL for one distance.
fn data_url(event_id: &str, distance_id: &str) -> String {
    format!(
        "https://live.ultimate.dk/desktop/front/data.php?results_startrecord=1000000&eventid={event_id}&mode=results&distance={distance_id}&category=&language=us"
    )
}

fn race_name(document: &Html) -> Option<String> {
    let screen = table::find_id(document, "main_screen")?;
    let cell = table::select_all(screen, RACE_NAME_SELECTOR)
        .ok()?
        .into_iter()
        .next()?;
    Some(table::text_of(cell))
}

/// Distances from the distance dropdown, or one implicit distance.
fn discover_distances(document: &Html, race_name: &str) -> Vec<EventDescriptor> {
    let mut distances = Vec::new();

    if let Some(select) = table::find_id(document, DISTANCE_SELECT_ID) {
        let options = table::select_all(select, "option").unwrap_or_default();
        for option in options {
            let value = option.value().attr("value").unwrap_or("").trim();
            if value.is_empty() {
                continue;
            }
            match value.parse::<u32>() {
                Ok(id) => {
                    distances.push(EventDescriptor::new(table::text_of(option), id.to_string()))
                }
                Err(e) => log::error!("Invalid distance id '{}': {}", value, e),
            }
        }
    }

    if distances.is_empty() {
        log::warn!("No distances found. Assuming only one distance.");
        distances.push(EventDescriptor::new(
            race_name,
            DEFAULT_DISTANCE_ID.to_string(),
        ));
    }
    distances
}

fn parse_results(document: &Html) -> Result<Vec<ResultRow>> {
    let results_table = table::select_first(document, RESULTS_TABLE_SELECTOR)?
        .ok_or_else(|| AppError::structure("No results table found"))?;

    let rows = table::select_all(results_table, "tr")?;
    let Some((header_row, body)) = rows.split_first() else {
        return Ok(Vec::new());
    };
    let headers = table::header_map(*header_row, "td", None)?;

    let mut results = Vec::with_capacity(body.len());
    for row in body {
        let cells = table::select_all(*row, "td")?;
        let mut result = ResultRow::new();
        for (column, text) in table::labeled_cells(&headers, &cells) {
            result.insert(column, text);
        }
        results.push(result);
    }
    Ok(results)
}
