//! Finishtime results scraper.
//!
//! Race pages are addressed by a `CId`/`RId` pair. Sub-events are listed as
//! anchors or in a dropdown, and each event's table is split across pages
//! reached through `PageNo`.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{EventDescriptor, ResultRow};
use crate::utils::http::{HttpFetch, fetch_document};
use crate::utils::resolve_url;
use crate::utils::url::{merge_query, query_param};

use super::table::{self, MOBILE_ONLY_CLASS};
use super::{Scraper, Site};

const RACE_NAME_ID: &str = "ctl00_lblRaceName";
const EVENT_LIST_ID: &str = "ctl00_Content_Main_divEvents";
const EVENT_DROPDOWN_ID: &str = "ctl00_Content_Main_cbEvent";
const FORM_ID: &str = "aspnetForm";
const PAGER_LABEL_ID: &str = "ctl00_Content_Main_lblTopPager";
const PAGER_TABLE_ID: &str = "ctl00_Content_Main_grdTopPager";
const GRID_ID: &str = "ctl00_Content_Main_divGrid";

static PAGER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*of (\d+)").expect("pager label regex"));
static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)").expect("leading number regex"));

/// Scraper for `results.finishtime.co.za`.
pub struct FinishtimeScraper<'a> {
    url: String,
    client: &'a dyn HttpFetch,
}

impl<'a> FinishtimeScraper<'a> {
    pub fn new(url: impl Into<String>, client: &'a dyn HttpFetch) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    fn scrape(&self) -> Result<Vec<ResultRow>> {
        let main_url = main_page_url(&self.url)?;
        let Some(document) = fetch_document(self.client, main_url.as_str()) else {
            return Ok(Vec::new());
        };

        let race_name = match table::find_id(&document, RACE_NAME_ID) {
            Some(el) => table::text_of(el),
            None => {
                log::warn!("No race name found on {}", main_url);
                String::new()
            }
        };

        let events = discover_events(&document, &main_url, &race_name);

        let mut results = Vec::new();
        for event in events {
            log::debug!("Event: {} - {}", event.name, event.target);
            for mut row in self.event_results(&event.target) {
                row.stamp(&race_name, &event.name);
                results.push(row);
            }
        }
        Ok(results)
    }

    /// Fetch every page of one event's table.
    fn event_results(&self, event_url: &str) -> Vec<ResultRow> {
        let Ok(event) = Url::parse(event_url) else {
            log::error!("Invalid event URL: {}", event_url);
            return Vec::new();
        };

        let pages = fetch_document(self.client, event_url)
            .map(|doc| page_count(&doc))
            .unwrap_or(0);
        log::debug!("Number of pages: {}", pages);

        let mut rows = Vec::new();
        for page in 1..=pages {
            let page_url = merge_query(
                &event,
                &[("dt", "0".to_string()), ("PageNo", page.to_string())],
            );
            log::debug!("Page URL: {}", page_url);

            let Some(document) = fetch_document(self.client, page_url.as_str()) else {
                continue;
            };
            match page_rows(&document) {
                Ok(page_rows) => rows.extend(page_rows),
                Err(e) => log::error!("Failed to parse {}: {}", page_url, e),
            }
        }
        rows
    }
}

impl Scraper for FinishtimeScraper<'_> {
    fn site(&self) -> Site {
        Site::Finishtime
    }

    fn get_results(&self) -> Vec<ResultRow> {
        self.scrape().unwrap_or_else(|e| {
            log::error!("{}", e);
            Vec::new()
        })
    }
}

/// Canonical race page: the input path with only `CId` and `RId` kept.
fn main_page_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| AppError::malformed_url(url, e))?;
    let (Some(cid), Some(rid)) = (query_param(&parsed, "CId"), query_param(&parsed, "RId")) else {
        return Err(AppError::malformed_url(url, "CId and RId are required"));
    };

    let mut main = parsed;
    main.set_fragment(None);
    main.set_query(None);
    main.query_pairs_mut()
        .append_pair("CId", &cid)
        .append_pair("RId", &rid);
    Ok(main)
}

/// Sub-events from the anchor list or the dropdown.
///
/// Falls back to one implicit event (the main page under the race name)
/// when neither yields anything.
fn discover_events(document: &Html, main_url: &Url, race_name: &str) -> Vec<EventDescriptor> {
    let events = match event_list(document, main_url) {
        Ok(events) => events,
        Err(e) => {
            log::error!("Failed to get events: {}", e);
            Vec::new()
        }
    };

    if events.is_empty() {
        log::warn!("No events found. Assuming only one event.");
        return vec![EventDescriptor::new(race_name, main_url.as_str())];
    }
    events
}

fn event_list(document: &Html, main_url: &Url) -> Result<Vec<EventDescriptor>> {
    if let Some(list) = table::find_id(document, EVENT_LIST_ID) {
        let mut events = Vec::new();
        for li in table::select_all(list, "li")? {
            let anchor = table::select_all(li, "a")?
                .into_iter()
                .next()
                .ok_or_else(|| AppError::structure("event list item without a link"))?;
            let href = anchor
                .value()
                .attr("href")
                .ok_or_else(|| AppError::structure("event link without href"))?;
            events.push(EventDescriptor::new(
                table::text_of(anchor),
                resolve_url(main_url, href),
            ));
        }
        return Ok(events);
    }

    // Sometimes the events are a dropdown posting back to the form action
    if let Some(dropdown) = table::find_id(document, EVENT_DROPDOWN_ID) {
        let action = table::find_id(document, FORM_ID)
            .and_then(|form| form.value().attr("action"))
            .ok_or_else(|| AppError::structure("event dropdown without a form action"))?;
        let race_url = main_url.join(action)?;

        let mut events = Vec::new();
        for option in table::select_all(dropdown, "option")? {
            let value = option
                .value()
                .attr("value")
                .ok_or_else(|| AppError::structure("event option without a value"))?;
            let event_url = merge_query(&race_url, &[("EId", value.to_string())]);
            events.push(EventDescriptor::new(table::text_of(option), event_url.to_string()));
        }
        return Ok(events);
    }

    Ok(Vec::new())
}

/// Number of result pages announced by the pager, or 0 if none is found.
fn page_count(document: &Html) -> u32 {
    if let Some(label) = table::find_id(document, PAGER_LABEL_ID) {
        let text = table::text_of(label);
        if let Some(n) = capture_number(&PAGER_LABEL, &text) {
            return n;
        }
    }

    let last_cell = table::find_id(document, PAGER_TABLE_ID)
        .and_then(|pager| table::select_all(pager, "td").ok())
        .and_then(|cells| cells.last().map(|cell| table::text_of(*cell)));
    if let Some(n) = last_cell.and_then(|text| capture_number(&LEADING_NUMBER, &text)) {
        return n;
    }

    log::warn!("No pager found, assuming no result pages");
    0
}

fn capture_number(pattern: &Regex, text: &str) -> Option<u32> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn page_rows(document: &Html) -> Result<Vec<ResultRow>> {
    let grid = table::find_id(document, GRID_ID)
        .ok_or_else(|| AppError::structure("results grid not found"))?;
    let rows = table::select_all(grid, "tr")?;
    let Some((header_row, body)) = rows.split_first() else {
        return Ok(Vec::new());
    };

    let headers = table::header_map(*header_row, "th", Some(MOBILE_ONLY_CLASS))?;
    Ok(body
        .iter()
        .map(|row| {
            let mut result = ResultRow::new();
            for (column, text) in table::labeled_cells(&headers, &table::row_cells(*row)) {
                result.insert(column, text);
            }
            result
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHttp;

    const BASE: &str = "https://results.finishtime.co.za/results.aspx";

    fn main_page(race: &str, events_html: &str) -> String {
        format!(
            r#"<html><body><form id="aspnetForm" action="./results.aspx?CId=35&amp;RId=1">
            <span id="ctl00_lblRaceName">{race}</span>{events_html}</form></body></html>"#
        )
    }

    fn pager_page(label: &str) -> String {
        format!(r#"<span id="ctl00_Content_Main_lblTopPager">{label}</span>"#)
    }

    fn grid_page(rows: &[(&str, &str, &str)]) -> String {
        let body: String = rows
            .iter()
            .map(|(p, n, t)| format!("<tr><th>{p}</th><td>{n}</td><td>{t}</td></tr>"))
            .collect();
        format!(
            r#"<div id="ctl00_Content_Main_divGrid"><table>
            <tr><th>Pos</th><th>Name</th><th>Time</th><th class="d-xs-table-cell">Fav</th></tr>
            {body}</table></div>"#
        )
    }

    #[test]
    fn test_main_page_url_keeps_only_ids() {
        let url = main_page_url(&format!("{BASE}?CId=35&RId=30321&EId=2&PageNo=4#top")).unwrap();
        assert_eq!(url.as_str(), format!("{BASE}?CId=35&RId=30321"));
    }

    #[test]
    fn test_main_page_url_requires_rid() {
        let err = main_page_url(&format!("{BASE}?CId=35")).unwrap_err();
        assert!(matches!(err, AppError::MalformedUrl { .. }));
    }

    #[test]
    fn missing_rid_returns_empty_without_fetching() {
        let http = FakeHttp::new();
        let scraper = FinishtimeScraper::new(format!("{BASE}?CId=35"), &http);
        assert!(scraper.get_results().is_empty());
        assert!(http.requests().is_empty());
    }

    #[test]
    fn unavailable_main_page_is_not_an_error() {
        let url = format!("{BASE}?CId=35&RId=30321");
        let http = FakeHttp::new().status(&url, 500, "");
        let scraper = FinishtimeScraper::new(url.clone(), &http);
        assert!(scraper.scrape().unwrap().is_empty());
        assert_eq!(http.requests(), vec![url]);
    }

    #[test]
    fn blank_ids_are_rejected_without_fetching() {
        for query in ["?CId=&RId=", "?CId=35&RId=", "?CId=&RId=30321"] {
            let url = format!("{BASE}{query}");
            assert!(matches!(
                main_page_url(&url),
                Err(AppError::MalformedUrl { .. })
            ));

            let http = FakeHttp::new();
            assert!(FinishtimeScraper::new(url, &http).get_results().is_empty());
            assert!(http.requests().is_empty(), "{query}");
        }
    }

    #[test]
    fn test_page_count_from_label() {
        let doc = Html::parse_document(&pager_page("Page 1 of 5"));
        assert_eq!(page_count(&doc), 5);
    }

    #[test]
    fn test_page_count_from_pager_table() {
        let doc = Html::parse_document(
            r#"<span id="ctl00_Content_Main_lblTopPager"></span>
            <table id="ctl00_Content_Main_grdTopPager"><tr><td>1</td><td>2</td><td>3</td></tr></table>"#,
        );
        assert_eq!(page_count(&doc), 3);
    }

    #[test]
    fn test_page_count_defaults_to_zero() {
        let doc = Html::parse_document("<p>nothing here</p>");
        assert_eq!(page_count(&doc), 0);
    }

    #[test]
    fn fetches_every_announced_page() {
        let main_url = format!("{BASE}?CId=35&RId=1");
        // The implicit event is the main page itself, so it also carries the pager.
        let mut http = FakeHttp::new().page(
            &main_url,
            &format!("{}{}", main_page("Two Oceans", ""), pager_page("Page 1 of 5")),
        );
        for page in 1..=5 {
            let pos = page.to_string();
            let name = format!("Runner {page}");
            http = http.page(
                &format!("{main_url}&dt=0&PageNo={page}"),
                &grid_page(&[(pos.as_str(), name.as_str(), "01:00:00")]),
            );
        }

        let scraper = FinishtimeScraper::new(format!("{main_url}&PageNo=3"), &http);
        let rows = scraper.get_results();

        let page_requests: Vec<String> = http
            .requests()
            .into_iter()
            .filter(|u| u.contains("PageNo="))
            .collect();
        assert_eq!(
            page_requests,
            (1..=5)
                .map(|p| format!("{main_url}&dt=0&PageNo={p}"))
                .collect::<Vec<_>>()
        );

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].text("Pos"), Some("1"));
        assert_eq!(rows[4].text("Name"), Some("Runner 5"));
        assert_eq!(rows[0].text("RaceName"), Some("Two Oceans"));
        assert_eq!(rows[0].text("EventName"), Some("Two Oceans"));
        assert!(!rows[0].contains_key("Fav"));
    }

    #[test]
    fn anchored_events_are_scraped_in_order() {
        let main_url = format!("{BASE}?CId=35&RId=1");
        let events = r#"<div id="ctl00_Content_Main_divEvents"><ul>
            <li><a href="results.aspx?CId=35&amp;RId=1&amp;EId=1">Marathon</a></li>
            <li><a href="results.aspx?CId=35&amp;RId=1&amp;EId=2">Half</a></li>
        </ul></div>"#;
        let marathon = format!("{BASE}?CId=35&RId=1&EId=1");
        let half = format!("{BASE}?CId=35&RId=1&EId=2");

        let http = FakeHttp::new()
            .page(&main_url, &main_page("Comrades", events))
            .page(&marathon, &pager_page("Page 1 of 1"))
            .page(&half, &pager_page("Page 1 of 1"))
            .page(
                &format!("{marathon}&dt=0&PageNo=1"),
                &grid_page(&[("1", "A", "05:00:00"), ("2", "B", "05:10:00")]),
            )
            .page(
                &format!("{half}&dt=0&PageNo=1"),
                &grid_page(&[("1", "C", "01:30:00")]),
            );

        let rows = FinishtimeScraper::new(&main_url, &http).get_results();
        let summary: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.text("EventName").unwrap(), r.text("Name").unwrap()))
            .collect();
        assert_eq!(
            summary,
            vec![("Marathon", "A"), ("Marathon", "B"), ("Half", "C")]
        );
    }

    #[test]
    fn dropdown_events_use_form_action() {
        let main_url = format!("{BASE}?CId=35&RId=1");
        let dropdown = r#"<select id="ctl00_Content_Main_cbEvent">
            <option value="7">10km</option></select>"#;
        let event_url = format!("{BASE}?CId=35&RId=1&EId=7");

        let http = FakeHttp::new()
            .page(&main_url, &main_page("Fun Run", dropdown))
            .page(&event_url, &pager_page("Page 1 of 1"))
            .page(
                &format!("{event_url}&dt=0&PageNo=1"),
                &grid_page(&[("1", "D", "00:40:00")]),
            );

        let rows = FinishtimeScraper::new(&main_url, &http).get_results();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("EventName"), Some("10km"));
        assert_eq!(rows[0].text("Time"), Some("00:40:00"));
    }

    #[test]
    fn failed_page_is_skipped() {
        let main_url = format!("{BASE}?CId=35&RId=1");
        let http = FakeHttp::new()
            .page(
                &main_url,
                &format!("{}{}", main_page("R", ""), pager_page("Page 1 of 2")),
            )
            .status(&format!("{main_url}&dt=0&PageNo=1"), 500, "")
            .page(
                &format!("{main_url}&dt=0&PageNo=2"),
                &grid_page(&[("11", "E", "02:00:00")]),
            );

        let rows = FinishtimeScraper::new(&main_url, &http).get_results();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("Pos"), Some("11"));
    }

    #[test]
    fn repeated_extraction_is_identical() {
        let main_url = format!("{BASE}?CId=35&RId=1");
        let http = FakeHttp::new()
            .page(
                &main_url,
                &format!("{}{}", main_page("R", ""), pager_page("Page 1 of 1")),
            )
            .page(
                &format!("{main_url}&dt=0&PageNo=1"),
                &grid_page(&[("1", "A", "1"), ("2", "B", "2")]),
            );

        let scraper = FinishtimeScraper::new(&main_url, &http);
        assert_eq!(scraper.get_results(), scraper.get_results());
    }
}
