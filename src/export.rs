// src/export.rs

//! Writes scraped rows to CSV or JSON.
//!
//! The output format follows the file extension. Columns are the union of
//! row keys in first-seen order, minus the configured drop list, with
//! `RaceName` and `EventName` moved to the front.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::models::{CellValue, ExportConfig, ResultRow};

/// Columns written as integers in JSON output when their text is all digits.
const NUMERIC_COLUMNS: [&str; 5] = ["Pos", "CatPos", "GenPos", "GenPts", "Rank"];

const LEADING_COLUMNS: [&str; 2] = ["RaceName", "EventName"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            _ => Err(AppError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Write `rows` to `path`, returning the number of rows written.
///
/// An empty row set writes nothing and returns `Ok(0)`.
pub fn export_results(rows: &[ResultRow], path: &Path, config: &ExportConfig) -> Result<usize> {
    let format = Format::from_path(path)?;
    if rows.is_empty() {
        log::error!("No results found, nothing written to {}", path.display());
        return Ok(0);
    }

    let columns = column_order(rows, &config.drop_columns);
    match format {
        Format::Csv => write_csv(rows, &columns, path)?,
        Format::Json => write_json(rows, &columns, path)?,
    }

    log::info!("Saved {} rows to {}", rows.len(), path.display());
    Ok(rows.len())
}

fn column_order(rows: &[ResultRow], drop: &[String]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for key in rows.iter().flat_map(ResultRow::keys) {
        if drop.iter().any(|d| d == key) || columns.iter().any(|c| c == key) {
            continue;
        }
        columns.push(key.to_string());
    }

    let has_leading = LEADING_COLUMNS
        .iter()
        .all(|lead| columns.iter().any(|c| c == lead));
    if has_leading {
        columns.retain(|c| !LEADING_COLUMNS.contains(&c.as_str()));
        let mut ordered: Vec<String> = LEADING_COLUMNS.iter().map(|c| c.to_string()).collect();
        ordered.append(&mut columns);
        columns = ordered;
    }
    columns
}

fn write_csv(rows: &[ResultRow], columns: &[String], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(columns)?;
    for row in rows {
        let record = columns
            .iter()
            .map(|c| row.get(c).map(ToString::to_string).unwrap_or_default());
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(rows: &[ResultRow], columns: &[String], path: &Path) -> Result<()> {
    let records: Vec<Value> = rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = columns
                .iter()
                .map(|c| (c.clone(), json_cell(c, row.get(c))))
                .collect();
            Value::Object(object)
        })
        .collect();

    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &records)?;
    Ok(())
}

fn json_cell(column: &str, cell: Option<&CellValue>) -> Value {
    let Some(cell) = cell else {
        return Value::Null;
    };
    if NUMERIC_COLUMNS.contains(&column) {
        if let Some(n) = cell.as_text().and_then(parse_digits) {
            return Value::from(n);
        }
    }
    serde_json::to_value(cell).unwrap_or(Value::Null)
}

fn parse_digits(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
