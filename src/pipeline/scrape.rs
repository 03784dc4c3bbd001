// src/pipeline/scrape.rs

//! Scrape-and-export pipeline.

use std::path::Path;
use std::time::Instant;

use crate::error::Result;
use crate::export::export_results;
use crate::models::Config;
use crate::scrapers::scraper_for_url;
use crate::utils::http::{HttpClient, HttpFetch};

/// Scrape `url` with a live HTTP client and write the rows to `output`.
pub fn run_scrape(config: &Config, url: &str, output: &Path) -> Result<usize> {
    let client = HttpClient::new(&config.http)?;
    scrape_with(config, &client, url, output)
}

/// Scrape `url` through `client` and write the rows to `output`.
pub fn scrape_with(
    config: &Config,
    client: &dyn HttpFetch,
    url: &str,
    output: &Path,
) -> Result<usize> {
    let started = Instant::now();
    let scraper = scraper_for_url(url, client, config)?;
    log::info!("Scraping {} results from {}", scraper.site(), url);

    let rows = scraper.get_results();
    log::info!(
        "Collected {} rows in {:.1}s",
        rows.len(),
        started.elapsed().as_secs_f64()
    );

    export_results(&rows, output, &config.export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::testing::FakeHttp;
    use tempfile::tempdir;

    const URL: &str = "https://bouttime.co.za/results.aspx?RaceID=9";

    #[test]
    fn scrapes_and_writes_csv() {
        let page = r#"<html><body>
            <span id="ContentPlaceHolder1_lblRaceName">Argus</span>
            <span id="ContentPlaceHolder1_lblDistance">109km</span>
            <div class="container"><table>
              <tr><th>Pos</th><th>Name</th><th>Fav</th></tr>
              <tr><td>1</td><td>Jo Bloggs (X1)</td><td>*</td></tr>
            </table></div></body></html>"#;
        let http = FakeHttp::new().page(URL, page);
        let dir = tempdir().unwrap();
        let output = dir.path().join("results.csv");

        let written = scrape_with(&Config::default(), &http, URL, &output).unwrap();

        assert_eq!(written, 1);
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec!["RaceName,EventName,Pos,Name,LicenseNr", "Argus,109km,1,Jo Bloggs,X1"]
        );
    }

    #[test]
    fn unknown_host_fails_before_fetching() {
        let http = FakeHttp::new();
        let dir = tempdir().unwrap();
        let output = dir.path().join("results.csv");

        let err = scrape_with(&Config::default(), &http, "https://example.com/", &output);
        assert!(matches!(err, Err(AppError::UnrecognizedSource { .. })));
        assert!(http.requests().is_empty());
        assert!(!output.exists());
    }
}
