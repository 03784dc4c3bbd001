//! Result row and cell value types.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// A single cell of a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Elapsed time, e.g. a finish time or pace
    Duration(TimeDelta),
    /// Wall-clock time, e.g. a start time
    Timestamp(NaiveDateTime),
    Empty,
}

impl CellValue {
    /// Text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a raw JSON value into a cell.
    ///
    /// Arrays and objects are kept as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => CellValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// Build a duration from a millisecond count.
    pub fn duration_from_millis(millis: f64) -> Option<Self> {
        TimeDelta::try_milliseconds(millis.round() as i64).map(CellValue::Duration)
    }

    /// Build a UTC timestamp from epoch milliseconds.
    pub fn timestamp_from_millis(millis: f64) -> Option<Self> {
        chrono::DateTime::from_timestamp_millis(millis.round() as i64)
            .map(|dt| CellValue::Timestamp(dt.naive_utc()))
    }

    fn kind_rank(&self) -> u8 {
        match self {
            CellValue::Empty => 0,
            CellValue::Bool(_) => 1,
            CellValue::Integer(_) | CellValue::Float(_) => 2,
            CellValue::Duration(_) => 3,
            CellValue::Timestamp(_) => 4,
            CellValue::Text(_) => 5,
        }
    }

    /// Total ordering used when sorting rows.
    ///
    /// Values of different kinds order by kind; `Empty` sorts first.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        match (self, other) {
            (Text(a), Text(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Bool(a), Bool(b)) => a.cmp(b),
            (Duration(a), Duration(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(x) => write!(f, "{x}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Duration(d) => {
                let sign = if *d < TimeDelta::zero() { "-" } else { "" };
                let total_ms = d.num_milliseconds().unsigned_abs();
                let hours = total_ms / 3_600_000;
                let minutes = (total_ms / 60_000) % 60;
                let seconds = (total_ms / 1000) % 60;
                let millis = total_ms % 1000;
                write!(f, "{sign}{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
            }
            CellValue::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.3f")),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Integer(i) => serializer.serialize_i64(*i),
            CellValue::Float(x) => serializer.serialize_f64(*x),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Duration(_) | CellValue::Timestamp(_) => {
                serializer.collect_str(self)
            }
        }
    }
}

/// One result line: column name to cell, in insertion order.
///
/// Inserting an existing column replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    cells: Vec<(String, CellValue)>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, keeping its original position if already present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<CellValue>) {
        let key = key.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Text of a column, if present and textual.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(CellValue::as_text)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    /// Stamp race and event names so concatenated output stays attributable.
    pub fn stamp(&mut self, race_name: &str, event_name: &str) {
        self.insert("RaceName", race_name);
        self.insert("EventName", event_name);
    }
}

impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (key, value) in &self.cells {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
