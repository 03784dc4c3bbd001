// src/models/mod.rs

//! Domain models for the scraper application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod event;
mod row;

// Re-export all public types
pub use config::{Config, ExportConfig, HttpConfig, MobiiEliteConfig};
pub use event::{EventDescriptor, HeaderMap};
pub use row::{CellValue, ResultRow};
