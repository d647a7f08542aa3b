// Workbook loader - one worksheet per source, header row first
// File-mode counterpart of the remote spreadsheet fetch in remote.rs

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;

use crate::model::{
    find_category_column, CallRecord, SourceTable, CATEGORY_COLUMN, DATE_COLUMN, SHEET_COLUMN,
    SHEET_NAMES,
};

/// Load all four source tables from a local workbook.
///
/// Each source name must exist as a worksheet of the same name. A worksheet
/// without a recognized category header aborts the whole load; there is no
/// partial startup.
pub fn load_workbook(path: &Path) -> Result<Vec<SourceTable>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

    let mut sources = Vec::with_capacity(SHEET_NAMES.len());

    for name in SHEET_NAMES {
        let range = workbook
            .worksheet_range(name)
            .with_context(|| format!("Worksheet '{}' not found in {}", name, path.display()))?;
        sources.push(sheet_from_range(name, &range)?);
    }

    Ok(sources)
}

/// Build one source table from a worksheet range.
fn sheet_from_range(name: &str, range: &Range<Data>) -> Result<SourceTable> {
    let mut rows = range.rows();

    let header_cells = rows
        .next()
        .with_context(|| format!("Worksheet '{}' is empty", name))?;
    let mut columns: Vec<String> = header_cells.iter().map(cell_to_string).collect();

    let category_idx = find_category_column(&columns)
        .with_context(|| format!("Category column not found in sheet '{}'", name))?;
    columns[category_idx] = CATEGORY_COLUMN.to_string();

    let date_idx = columns
        .iter()
        .position(|h| h == DATE_COLUMN)
        .with_context(|| format!("Date column not found in sheet '{}'", name))?;

    let mut records = Vec::new();
    for cells in rows {
        if let Some(record) = record_from_cells(name, &columns, date_idx, category_idx, cells) {
            records.push(record);
        }
    }

    Ok(SourceTable {
        name: name.to_string(),
        columns,
        rows: records,
    })
}

/// Build one record from a data row. Rows whose date cell cannot be read
/// as a calendar date are skipped.
fn record_from_cells(
    sheet: &str,
    columns: &[String],
    date_idx: usize,
    category_idx: usize,
    cells: &[Data],
) -> Option<CallRecord> {
    let date = cells.get(date_idx).and_then(cell_to_date)?;
    let category = cells.get(category_idx).map(cell_to_string).unwrap_or_default();

    let mut extra = HashMap::new();
    for (idx, column) in columns.iter().enumerate() {
        if idx == date_idx || idx == category_idx || column == SHEET_COLUMN {
            continue;
        }
        let value = cells.get(idx).map(cell_to_string).unwrap_or_default();
        extra.insert(column.clone(), value);
    }

    Some(CallRecord {
        date,
        category,
        sheet: sheet.to_string(),
        extra,
    })
}

pub(crate) fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => format!("{}", f),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({:?})", e),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

fn cell_to_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|dt| dt.date()),
        Data::DateTimeIso(s) => parse_date_str(s),
        Data::String(s) => parse_date_str(s),
        _ => None,
    }
}

/// Parse a calendar date from the formats the inputs actually carry:
/// ISO dates (optionally with a time part, as sent by the date picker)
/// and the `m/d/Y` spelling common in exported sheets.
pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let day = s.trim().split(['T', ' ']).next().unwrap_or("");

    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%m/%d/%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn range_from(rows: &[&[&str]]) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), Data::String(cell.to_string()));
            }
        }
        range
    }

    #[test]
    fn test_sheet_from_range_normalizes_colon_header() {
        let range = range_from(&[
            &["Date", "Category:", "Notes"],
            &["2024-01-03", "Follow Up", "call back"],
        ]);

        let table = sheet_from_range("Ajanya", &range).unwrap();

        assert_eq!(table.columns[1], "Category");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].category, "Follow Up");
        assert_eq!(table.rows[0].sheet, "Ajanya");
    }

    #[test]
    fn test_sheet_from_range_without_category_header_fails() {
        let range = range_from(&[&["Date", "Notes"], &["2024-01-03", "x"]]);

        let result = sheet_from_range("Meenu", &range);

        assert!(result.is_err());
        assert!(
            result.unwrap_err().to_string().contains("Meenu"),
            "Error names the offending sheet"
        );
    }

    #[test]
    fn test_parse_date_str_iso() {
        assert_eq!(
            parse_date_str("2024-01-03"),
            NaiveDate::from_ymd_opt(2024, 1, 3)
        );
    }

    #[test]
    fn test_parse_date_str_iso_with_time() {
        // Date pickers send the selected day with a time suffix
        assert_eq!(
            parse_date_str("2024-01-03T00:00:00"),
            NaiveDate::from_ymd_opt(2024, 1, 3)
        );
        assert_eq!(
            parse_date_str("2024-01-03 10:15:00"),
            NaiveDate::from_ymd_opt(2024, 1, 3)
        );
    }

    #[test]
    fn test_parse_date_str_us_format() {
        assert_eq!(
            parse_date_str("1/3/2024"),
            NaiveDate::from_ymd_opt(2024, 1, 3)
        );
    }

    #[test]
    fn test_parse_date_str_rejects_garbage() {
        assert_eq!(parse_date_str("not a date"), None);
        assert_eq!(parse_date_str(""), None);
    }

    #[test]
    fn test_record_from_cells_copies_extra_columns() {
        let cols = columns(&["Date", "Category", "Caller", "Notes"]);
        let cells = vec![
            Data::String("2024-01-03".to_string()),
            Data::String("Follow Up".to_string()),
            Data::String("Ravi".to_string()),
            Data::String("call back tomorrow".to_string()),
        ];

        let record = record_from_cells("Meenu", &cols, 0, 1, &cells).unwrap();

        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(record.category, "Follow Up");
        assert_eq!(record.sheet, "Meenu");
        assert_eq!(record.extra.get("Caller").unwrap(), "Ravi");
        assert_eq!(record.extra.get("Notes").unwrap(), "call back tomorrow");
        assert!(!record.extra.contains_key("Date"));
        assert!(!record.extra.contains_key("Category"));
    }

    #[test]
    fn test_record_from_cells_skips_unparseable_date() {
        let cols = columns(&["Date", "Category"]);
        let cells = vec![
            Data::String("pending".to_string()),
            Data::String("Follow Up".to_string()),
        ];

        assert!(record_from_cells("Meenu", &cols, 0, 1, &cells).is_none());
    }

    #[test]
    fn test_record_from_cells_short_row() {
        // Trailing blank cells are dropped by the reader; missing extras
        // become empty strings, a missing date drops the row
        let cols = columns(&["Date", "Category", "Notes"]);
        let cells = vec![
            Data::String("2024-01-03".to_string()),
            Data::String("New Lead".to_string()),
        ];

        let record = record_from_cells("Kavitha", &cols, 0, 1, &cells).unwrap();
        assert_eq!(record.extra.get("Notes").unwrap(), "");

        let no_date: Vec<Data> = Vec::new();
        assert!(record_from_cells("Kavitha", &cols, 0, 1, &no_date).is_none());
    }
}
