// Consolidator - concatenates the per-source tables and derives the
// grouped category counts the pie charts render

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::model::{CallRecord, CategorySlice, SourceTable};

/// The tables built once at startup and shared read-only for the process
/// lifetime. The consolidated table is derived data, recomputable from the
/// source tables at any time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub sources: Vec<SourceTable>,
    pub consolidated: Vec<CallRecord>,
}

impl Snapshot {
    pub fn build(sources: Vec<SourceTable>) -> Self {
        let consolidated = consolidate(&sources);
        Snapshot {
            sources,
            consolidated,
        }
    }

    pub fn total_rows(&self) -> usize {
        self.consolidated.len()
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.consolidated.iter().map(|r| r.date).min()
    }

    /// Latest date present in the data; the consolidated dashboard's
    /// default selection.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.consolidated.iter().map(|r| r.date).max()
    }

    /// Column schema of the first declared source - the table schema used
    /// for the consolidated table and for the cleared per-source state.
    pub fn default_columns(&self) -> Vec<String> {
        self.sources
            .first()
            .map(|s| s.columns.clone())
            .unwrap_or_default()
    }
}

/// Concatenate the source tables into one, preserving source order and row
/// order within each source.
pub fn consolidate(sources: &[SourceTable]) -> Vec<CallRecord> {
    sources
        .iter()
        .flat_map(|source| source.rows.iter().cloned())
        .collect()
}

/// Count rows per category, emitting categories in first-seen order so the
/// chart legend is stable across recomputations.
pub fn group_counts<'a, I>(rows: I) -> Vec<CategorySlice>
where
    I: IntoIterator<Item = &'a CallRecord>,
{
    let mut slices: Vec<CategorySlice> = Vec::new();
    let mut seen: HashMap<&'a str, usize> = HashMap::new();

    for record in rows {
        match seen.get(record.category.as_str()) {
            Some(&idx) => slices[idx].count += 1,
            None => {
                seen.insert(&record.category, slices.len());
                slices.push(CategorySlice {
                    category: record.category.clone(),
                    count: 1,
                });
            }
        }
    }

    slices
}
