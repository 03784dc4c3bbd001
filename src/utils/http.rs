// src/utils/http.rs

//! HTTP client utilities.
//!
//! Scrapers talk to the network through [`HttpFetch`]. The `fetch_*`
//! functions on top of it never fail: a transport error, a non-200 status or
//! an unparseable body is logged and turned into `None`.

use std::time::Duration;

use reqwest::blocking::Client;
use scraper::Html;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// Raw response: status code and body text.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Blocking request backend.
pub trait HttpFetch {
    /// Issue a GET request.
    fn get(&self, url: &str) -> Result<HttpResponse>;

    /// Issue a POST request with a JSON-encoded body.
    fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse>;
}

/// Production backend over `reqwest`'s blocking client.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a configured HTTP client.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

impl HttpFetch for HttpClient {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self.client.get(url).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(HttpResponse { status, body })
    }

    fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse> {
        let response = self.client.post(url).json(body).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(HttpResponse { status, body })
    }
}

fn require_ok(url: &str, response: Result<HttpResponse>) -> Result<String> {
    let response = response?;
    if response.is_ok() {
        Ok(response.body)
    } else {
        Err(AppError::fetch(
            url,
            format!("status code {}", response.status),
        ))
    }
}

/// Fetch a page and parse it as HTML.
pub fn fetch_document(client: &dyn HttpFetch, url: &str) -> Option<Html> {
    log::debug!("Downloading {}", url);
    match require_ok(url, client.get(url)) {
        Ok(body) => Some(Html::parse_document(&body)),
        Err(e) => {
            log::error!("{}", e);
            None
        }
    }
}

/// Fetch a JSON document.
pub fn fetch_json(client: &dyn HttpFetch, url: &str) -> Option<Value> {
    log::debug!("Downloading {}", url);
    let parsed = require_ok(url, client.get(url))
        .and_then(|body| serde_json::from_str(&body).map_err(AppError::from));
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            log::error!("{}", e);
            None
        }
    }
}

/// POST a JSON body and parse the JSON response.
pub fn post_json(client: &dyn HttpFetch, url: &str, body: &Value) -> Option<Value> {
    log::debug!("Posting to {}", url);
    let parsed = require_ok(url, client.post_json(url, body))
        .and_then(|text| serde_json::from_str(&text).map_err(AppError::from));
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            log::error!("{}", e);
            None
        }
    }
}
