//! In-memory HTTP backend for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::utils::http::{HttpFetch, HttpResponse};

/// Serves canned responses keyed by exact URL and records every request.
#[derive(Default)]
pub struct FakeHttp {
    responses: HashMap<String, HttpResponse>,
    requested: RefCell<Vec<String>>,
    posted: RefCell<Vec<(String, Value)>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 at `url`.
    pub fn page(self, url: &str, body: &str) -> Self {
        self.status(url, 200, body)
    }

    /// Serve `body` with the given status at `url`.
    pub fn status(mut self, url: &str, status: u16, body: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            HttpResponse {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    /// Every URL requested so far, GET and POST, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }

    /// Every POST so far with its JSON body.
    pub fn posted(&self) -> Vec<(String, Value)> {
        self.posted.borrow().clone()
    }

    fn respond(&self, url: &str) -> Result<HttpResponse> {
        self.requested.borrow_mut().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::fetch(url, "connection refused"))
    }
}

impl HttpFetch for FakeHttp {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        self.respond(url)
    }

    fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse> {
        self.posted
            .borrow_mut()
            .push((url.to_string(), body.clone()));
        self.respond(url)
    }
}
