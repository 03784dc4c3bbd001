//! Shared HTML table parsing.
//!
//! All three HTML sites publish results as a `<table>` whose first row holds
//! the column titles. Titles are normalized once into a [`HeaderMap`] and
//! each body row is labeled through it.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::HeaderMap;

/// Class marking a duplicated mobile-only header cell.
pub const MOBILE_ONLY_CLASS: &str = "d-xs-table-cell";

/// Parse a CSS selector.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Find an element by its `id` attribute.
pub fn find_id<'a>(document: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    let selector = parse_selector(&format!("[id=\"{id}\"]")).ok()?;
    document.select(&selector).next()
}

/// First element in the document matching `css`.
pub fn select_first<'a>(document: &'a Html, css: &str) -> Result<Option<ElementRef<'a>>> {
    let selector = parse_selector(css)?;
    Ok(document.select(&selector).next())
}

/// All descendants of `scope` matching `css`, in document order.
pub fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Result<Vec<ElementRef<'a>>> {
    let selector = parse_selector(css)?;
    Ok(scope.select(&selector).collect())
}

/// Concatenated text of an element, trimmed.
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Capitalize each word and remove spaces: `"race  no"` becomes `"RaceNo"`.
pub fn propercase(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Build a header map from the `cell_tag` cells of a header row.
///
/// Indices count every cell, so a skipped cell leaves a gap and its column
/// is dropped from the body rows.
pub fn header_map(
    header_row: ElementRef<'_>,
    cell_tag: &str,
    skip_class: Option<&str>,
) -> Result<HeaderMap> {
    let headers = select_all(header_row, cell_tag)?
        .into_iter()
        .enumerate()
        .filter(|(_, cell)| match skip_class {
            Some(class) => !cell.value().classes().any(|c| c == class),
            None => true,
        })
        .map(|(index, cell)| (index, propercase(&cell.text().collect::<String>())))
        .collect();
    Ok(headers)
}

/// Direct `td`/`th` children of a row.
///
/// Some sites put `th` cells in body rows, so both count.
pub fn row_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .collect()
}

/// Pair each mapped cell with its column name, dropping unmapped cells.
pub fn labeled_cells<'h>(
    headers: &'h HeaderMap,
    cells: &[ElementRef<'_>],
) -> Vec<(&'h str, String)> {
    cells
        .iter()
        .enumerate()
        .filter_map(|(index, cell)| headers.get(index).map(|name| (name, text_of(*cell))))
        .collect()
}
