// src/lib.rs

//! Race result scraper library

pub mod error;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod scrapers;
pub mod utils;

#[cfg(test)]
mod testing;
