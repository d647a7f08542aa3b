// Call Dashboard - Core Library
// Exposes the loaders, consolidator, and filter engine for the CLI,
// the dashboard server, and tests

pub mod consolidate;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod remote;

// Re-export commonly used types
pub use consolidate::{consolidate, group_counts, Snapshot};
pub use export::write_csv;
pub use filter::{
    by_sheet_view, consolidated_view, resolve_first_click, rows_in_category, rows_on_date,
    BySheetView, ClickedSegment, ConsolidatedView, SheetChart,
};
pub use loader::{load_workbook, parse_date_str};
pub use model::{
    find_category_column, CallRecord, CategorySlice, SourceTable, CATEGORY_COLUMN,
    CATEGORY_HEADER_VARIANTS, DATE_COLUMN, SHEET_COLUMN, SHEET_NAMES,
};
pub use remote::{fetch_spreadsheet, partition_grid, StoredCredentials};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
