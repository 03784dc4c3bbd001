//! Sub-event and table header structures.

use std::collections::BTreeMap;

/// A named subdivision of a race (distance, category) discovered on a main page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDescriptor {
    /// Display name used to stamp `EventName`
    pub name: String,

    /// Where the event's results live: a page URL or a site-specific id
    pub target: String,
}

impl EventDescriptor {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
        }
    }
}

/// Column index to normalized column name, built from a table's header row.
///
/// Cells whose index is missing from the map are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    columns: BTreeMap<usize, String>,
}

impl HeaderMap {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.columns.get(&index).map(String::as_str)
    }
}

impl FromIterator<(usize, String)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (usize, String)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}
