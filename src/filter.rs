// Filter engine - turns (selected date, click signal) into the chart and
// table data for the two dashboard variants.
//
// The two variants deliberately disagree on the no-click table: the
// consolidated dashboard shows every row for the date, the per-source
// dashboard clears the table down to an empty schema. Both behaviors are
// kept as-is, as two separate view functions.

use chrono::NaiveDate;
use serde::Serialize;

use crate::consolidate::{group_counts, Snapshot};
use crate::model::{CallRecord, CategorySlice};

/// Rows matching a calendar date exactly. A date absent from the data
/// yields an empty set, not an error.
pub fn rows_on_date(rows: &[CallRecord], date: NaiveDate) -> Vec<&CallRecord> {
    rows.iter().filter(|r| r.date == date).collect()
}

/// Narrow a row set to one category, exact label match.
pub fn rows_in_category<'a>(rows: &[&'a CallRecord], category: &str) -> Vec<&'a CallRecord> {
    rows.iter()
        .copied()
        .filter(|r| r.category == category)
        .collect()
}

/// Resolve the first active click across the per-source charts.
///
/// Signals are evaluated in declared source order; the first `Some` wins
/// and every later signal is ignored.
pub fn resolve_first_click(clicks: &[Option<String>]) -> Option<(usize, &str)> {
    clicks
        .iter()
        .enumerate()
        .find_map(|(idx, click)| click.as_deref().map(|category| (idx, category)))
}

/// The chart segment whose click is driving the table.
#[derive(Debug, Clone, Serialize)]
pub struct ClickedSegment {
    pub sheet: String,
    pub category: String,
}

/// Chart + table data for the consolidated dashboard.
#[derive(Debug, Serialize)]
pub struct ConsolidatedView {
    pub date: NaiveDate,
    pub clicked: Option<String>,
    /// All-dates distribution, for the static pie.
    pub overall: Vec<CategorySlice>,
    /// Distribution on the selected date. A click narrows the table below,
    /// never this chart.
    pub chart: Vec<CategorySlice>,
    pub columns: Vec<String>,
    pub rows: Vec<CallRecord>,
}

/// Per-source chart data on the selected date.
#[derive(Debug, Serialize)]
pub struct SheetChart {
    pub sheet: String,
    pub chart: Vec<CategorySlice>,
}

/// Charts + table data for the per-source dashboard.
#[derive(Debug, Serialize)]
pub struct BySheetView {
    pub date: NaiveDate,
    pub clicked: Option<ClickedSegment>,
    pub charts: Vec<SheetChart>,
    pub columns: Vec<String>,
    pub rows: Vec<CallRecord>,
}

/// Consolidated variant: the table holds every consolidated row on the
/// date, narrowed to the clicked category when a click is present.
pub fn consolidated_view(
    snapshot: &Snapshot,
    date: NaiveDate,
    clicked: Option<&str>,
) -> ConsolidatedView {
    let on_date = rows_on_date(&snapshot.consolidated, date);
    let chart = group_counts(on_date.iter().copied());

    let table = match clicked {
        Some(category) => rows_in_category(&on_date, category),
        None => on_date,
    };

    ConsolidatedView {
        date,
        clicked: clicked.map(|c| c.to_string()),
        overall: group_counts(&snapshot.consolidated),
        chart,
        columns: snapshot.default_columns(),
        rows: table.into_iter().cloned().collect(),
    }
}

/// Per-source variant: the first clicked chart (in declared source order)
/// picks the table's source, date, and category; no click clears the table
/// down to the first source's column schema.
pub fn by_sheet_view(
    snapshot: &Snapshot,
    date: NaiveDate,
    clicks: &[Option<String>],
) -> BySheetView {
    let charts = snapshot
        .sources
        .iter()
        .map(|source| SheetChart {
            sheet: source.name.clone(),
            chart: group_counts(rows_on_date(&source.rows, date)),
        })
        .collect();

    let winner = resolve_first_click(clicks)
        .and_then(|(idx, category)| snapshot.sources.get(idx).map(|source| (source, category)));

    match winner {
        Some((source, category)) => {
            let on_date = rows_on_date(&source.rows, date);
            let mut rows: Vec<&CallRecord> = rows_in_category(&on_date, category);
            rows.sort_by_key(|r| r.date);

            BySheetView {
                date,
                clicked: Some(ClickedSegment {
                    sheet: source.name.clone(),
                    category: category.to_string(),
                }),
                charts,
                columns: source.columns.clone(),
                rows: rows.into_iter().cloned().collect(),
            }
        }
        None => BySheetView {
            date,
            clicked: None,
            charts,
            columns: snapshot.default_columns(),
            rows: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceTable;
    use std::collections::HashMap;

    fn record(date: &str, category: &str, sheet: &str) -> CallRecord {
        CallRecord {
            date: date.parse().unwrap(),
            category: category.to_string(),
            sheet: sheet.to_string(),
            extra: HashMap::new(),
        }
    }

    fn source(name: &str, rows: Vec<CallRecord>) -> SourceTable {
        SourceTable {
            name: name.to_string(),
            columns: vec![
                "Date".to_string(),
                "Category".to_string(),
                format!("{} Notes", name),
            ],
            rows,
        }
    }

    fn four_sources() -> Snapshot {
        Snapshot::build(vec![
            source(
                "Kavitha",
                vec![
                    record("2024-01-01", "New Lead", "Kavitha"),
                    record("2024-01-03", "New Lead", "Kavitha"),
                ],
            ),
            source(
                "Meenu",
                vec![
                    record("2024-01-03", "Follow Up", "Meenu"),
                    record("2024-01-03", "Closed", "Meenu"),
                    record("2024-01-04", "Follow Up", "Meenu"),
                ],
            ),
            source("Ajanya", vec![record("2024-01-03", "Closed", "Ajanya")]),
            source("AJITH", vec![]),
        ])
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_rows_on_date_is_idempotent() {
        let snapshot = four_sources();

        let first = rows_on_date(&snapshot.consolidated, date("2024-01-03"));
        let second = rows_on_date(&snapshot.consolidated, date("2024-01-03"));

        assert_eq!(first, second, "Pure function, identical output both calls");
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_rows_on_absent_date_is_empty() {
        let snapshot = four_sources();
        assert!(rows_on_date(&snapshot.consolidated, date("2019-06-01")).is_empty());
    }

    #[test]
    fn test_consolidated_scenario() {
        // Rows: {1/1,A,S1}, {1/1,B,S2}, {1/2,A,S1}
        let snapshot = Snapshot::build(vec![
            source(
                "Kavitha",
                vec![
                    record("2024-01-01", "A", "Kavitha"),
                    record("2024-01-02", "A", "Kavitha"),
                ],
            ),
            source("Meenu", vec![record("2024-01-01", "B", "Meenu")]),
        ]);

        // No click: chart counts {A:1, B:1}, table holds both 1/1 rows
        let view = consolidated_view(&snapshot, date("2024-01-01"), None);
        assert_eq!(view.chart.len(), 2);
        assert!(view
            .chart
            .iter()
            .all(|slice| (slice.category == "A" || slice.category == "B") && slice.count == 1));
        assert_eq!(view.rows.len(), 2);

        // Click A: table narrows to the single 1/1 A row, chart unchanged
        let clicked = consolidated_view(&snapshot, date("2024-01-01"), Some("A"));
        assert_eq!(clicked.rows.len(), 1);
        assert_eq!(clicked.rows[0].category, "A");
        assert_eq!(clicked.chart, view.chart);
    }

    #[test]
    fn test_consolidated_overall_ignores_date() {
        let snapshot = four_sources();

        let view = consolidated_view(&snapshot, date("2024-01-01"), None);
        let total: usize = view.overall.iter().map(|c| c.count).sum();
        assert_eq!(total, snapshot.total_rows());
    }

    #[test]
    fn test_consolidated_click_on_absent_category_is_empty() {
        let snapshot = four_sources();

        let view = consolidated_view(&snapshot, date("2024-01-03"), Some("No Such"));
        assert!(view.rows.is_empty());
        assert!(!view.chart.is_empty(), "Chart still shows the date's counts");
    }

    #[test]
    fn test_resolve_first_click_priority() {
        let clicks = vec![
            None,
            Some("Follow Up".to_string()),
            Some("Closed".to_string()),
            None,
        ];

        let (idx, category) = resolve_first_click(&clicks).unwrap();
        assert_eq!(idx, 1, "First active signal wins, later ones are ignored");
        assert_eq!(category, "Follow Up");

        assert!(resolve_first_click(&[None, None, None, None]).is_none());
    }

    #[test]
    fn test_by_sheet_clicked_scenario() {
        let snapshot = four_sources();
        let clicks = vec![None, Some("Follow Up".to_string()), None, None];

        let view = by_sheet_view(&snapshot, date("2024-01-03"), &clicks);

        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].sheet, "Meenu");
        assert_eq!(view.rows[0].category, "Follow Up");
        assert_eq!(view.rows[0].date, date("2024-01-03"));
        assert_eq!(view.columns, snapshot.sources[1].columns);
        let clicked = view.clicked.unwrap();
        assert_eq!(clicked.sheet, "Meenu");
        assert_eq!(clicked.category, "Follow Up");
    }

    #[test]
    fn test_by_sheet_cleared_state() {
        let snapshot = four_sources();

        let view = by_sheet_view(&snapshot, date("2024-01-03"), &[None, None, None, None]);

        assert!(view.rows.is_empty(), "Cleared, not date-filtered");
        assert_eq!(
            view.columns, snapshot.sources[0].columns,
            "Schema comes from the first declared source"
        );
        assert!(view.clicked.is_none());
    }

    #[test]
    fn test_by_sheet_charts_are_per_source_and_date_filtered() {
        let snapshot = four_sources();

        let view = by_sheet_view(&snapshot, date("2024-01-03"), &[None, None, None, None]);

        assert_eq!(view.charts.len(), 4);
        assert_eq!(view.charts[0].sheet, "Kavitha");
        assert_eq!(view.charts[0].chart, vec![CategorySlice {
            category: "New Lead".to_string(),
            count: 1,
        }]);
        // Meenu has two rows on 1/3, one per category
        assert_eq!(view.charts[1].chart.len(), 2);
        // AJITH has no rows at all
        assert!(view.charts[3].chart.is_empty());
    }

    #[test]
    fn test_by_sheet_click_on_absent_category_is_empty() {
        let snapshot = four_sources();
        let clicks = vec![Some("Closed".to_string()), None, None, None];

        // Kavitha has no Closed rows on 1/3
        let view = by_sheet_view(&snapshot, date("2024-01-03"), &clicks);

        assert!(view.rows.is_empty());
        assert_eq!(view.columns, snapshot.sources[0].columns);
    }

    #[test]
    fn test_by_sheet_click_beats_other_sources_rows() {
        let snapshot = four_sources();
        // Both Kavitha and Ajanya clicked; Kavitha is declared first
        let clicks = vec![
            Some("New Lead".to_string()),
            None,
            Some("Closed".to_string()),
            None,
        ];

        let view = by_sheet_view(&snapshot, date("2024-01-03"), &clicks);

        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].sheet, "Kavitha");
    }
}
