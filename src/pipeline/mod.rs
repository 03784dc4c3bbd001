//! Pipeline entry points.
//!
//! - `run_scrape`: select a scraper for a URL, collect its rows and export them

pub mod scrape;

pub use scrape::run_scrape;
