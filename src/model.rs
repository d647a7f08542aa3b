// Call record model - the canonical row shape shared by both load modes

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The four logical sources, in declared order.
/// Concatenation order and click-signal priority both follow this order.
pub const SHEET_NAMES: [&str; 4] = ["Kavitha", "Meenu", "Ajanya", "AJITH"];

/// Canonical column name for the calendar date.
pub const DATE_COLUMN: &str = "Date";

/// Canonical column name for the category, after header normalization.
pub const CATEGORY_COLUMN: &str = "Category";

/// Column carrying the source name in the remote single-grid layout.
pub const SHEET_COLUMN: &str = "Sheet";

/// Header spellings recognized as the category column, checked in order.
pub const CATEGORY_HEADER_VARIANTS: [&str; 3] = ["Category", "Category ", "Category:"];

/// Find the category column in a header row.
///
/// Returns the index of the first header matching a recognized spelling,
/// or `None` when the row has no recognized category header. Callers treat
/// `None` as a fatal load error for that source.
pub fn find_category_column(headers: &[String]) -> Option<usize> {
    CATEGORY_HEADER_VARIANTS
        .iter()
        .find_map(|variant| headers.iter().position(|h| h == variant))
}

/// One call-log entry.
///
/// `date`, `category`, and `sheet` are the fields the pipeline filters and
/// groups on; every other column from the input is copied through unchanged
/// in `extra` under its header name. Records are immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,

    #[serde(rename = "Category")]
    pub category: String,

    #[serde(rename = "Sheet")]
    pub sheet: String,

    #[serde(flatten)]
    pub extra: HashMap<String, String>,
}

impl CallRecord {
    /// Value for a named column, as rendered in tables and CSV export.
    pub fn column_value(&self, column: &str) -> String {
        match column {
            DATE_COLUMN => self.date.to_string(),
            CATEGORY_COLUMN => self.category.clone(),
            SHEET_COLUMN => self.sheet.clone(),
            _ => self.extra.get(column).cloned().unwrap_or_default(),
        }
    }
}

/// The ordered rows belonging to one named source, plus the normalized
/// header order of that source (used as the table schema when the
/// per-source dashboard has no active click).
#[derive(Debug, Clone, Serialize)]
pub struct SourceTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<CallRecord>,
}

/// One pie segment: a category and how many rows fell into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySlice {
    pub category: String,
    pub count: usize,
}
