// src/error.rs

//! Unified error handling for the scraper application.

use std::fmt;

use thiserror::Error;

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// No scraper is registered for the URL's hostname
    #[error("Unknown scraper for URL: {url}")]
    UnrecognizedSource { url: String },

    /// A required query parameter or path segment is missing
    #[error("Malformed URL {url}: {reason}")]
    MalformedUrl { url: String, reason: String },

    /// Non-200 response or transport failure
    #[error("Failed to download {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Expected element, table or column not found
    #[error("Unexpected page structure: {0}")]
    Structure(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Output file extension has no writer
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

impl AppError {
    /// Create an unrecognized source error.
    pub fn unrecognized(url: impl Into<String>) -> Self {
        Self::UnrecognizedSource { url: url.into() }
    }

    /// Create a malformed URL error.
    pub fn malformed_url(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::MalformedUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a fetch error.
    pub fn fetch(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a structural mismatch error.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::Structure(message.into())
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
