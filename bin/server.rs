// Call Dashboard - Web Server
// Serves both dashboard variants over one snapshot loaded at startup

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use call_dashboard::{
    by_sheet_view, consolidated_view, fetch_spreadsheet, load_workbook, parse_date_str, write_csv,
    Snapshot,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    snapshot: Arc<Snapshot>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// Summary response - row counts and the date-picker bounds
#[derive(Serialize)]
struct SummaryResponse {
    total_rows: usize,
    sheets: Vec<SheetSummary>,
    earliest_date: Option<NaiveDate>,
    latest_date: Option<NaiveDate>,
    consolidated_default_date: Option<NaiveDate>,
    by_sheet_default_date: NaiveDate,
}

#[derive(Serialize)]
struct SheetSummary {
    sheet: String,
    rows: usize,
}

/// Resolve the effective selection date: an explicit parameter wins, then
/// the variant's fallback, then today.
fn selected_date(param: Option<&str>, fallback: Option<NaiveDate>) -> NaiveDate {
    param
        .and_then(parse_date_str)
        .or(fallback)
        .unwrap_or_else(|| Local::now().date_naive())
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/summary - Row counts per sheet and date bounds
async fn get_summary(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = &state.snapshot;

    let summary = SummaryResponse {
        total_rows: snapshot.total_rows(),
        sheets: snapshot
            .sources
            .iter()
            .map(|source| SheetSummary {
                sheet: source.name.clone(),
                rows: source.rows.len(),
            })
            .collect(),
        earliest_date: snapshot.earliest_date(),
        latest_date: snapshot.latest_date(),
        // The consolidated dashboard opens on the latest loaded date,
        // the per-sheet dashboard opens on today
        consolidated_default_date: snapshot.latest_date(),
        by_sheet_default_date: Local::now().date_naive(),
    };

    Json(ApiResponse::ok(summary))
}

#[derive(Deserialize)]
struct ConsolidatedParams {
    date: Option<String>,
    category: Option<String>,
}

/// GET /api/consolidated - Consolidated-chart dashboard data
async fn get_consolidated(
    State(state): State<AppState>,
    Query(params): Query<ConsolidatedParams>,
) -> impl IntoResponse {
    let date = selected_date(params.date.as_deref(), state.snapshot.latest_date());
    let view = consolidated_view(&state.snapshot, date, params.category.as_deref());

    Json(ApiResponse::ok(view))
}

/// One optional click signal per sheet, keyed by the chart that fired it
#[derive(Deserialize)]
struct BySheetParams {
    date: Option<String>,
    #[serde(rename = "Kavitha")]
    kavitha: Option<String>,
    #[serde(rename = "Meenu")]
    meenu: Option<String>,
    #[serde(rename = "Ajanya")]
    ajanya: Option<String>,
    #[serde(rename = "AJITH")]
    ajith: Option<String>,
}

/// GET /api/by-sheet - Per-sheet-chart dashboard data
async fn get_by_sheet(
    State(state): State<AppState>,
    Query(params): Query<BySheetParams>,
) -> impl IntoResponse {
    let date = selected_date(params.date.as_deref(), None);
    let clicks = [params.kavitha, params.meenu, params.ajanya, params.ajith];
    let view = by_sheet_view(&state.snapshot, date, &clicks);

    Json(ApiResponse::ok(view))
}

/// GET /api/export.csv - Current consolidated table rows as CSV
async fn export_csv(
    State(state): State<AppState>,
    Query(params): Query<ConsolidatedParams>,
) -> impl IntoResponse {
    let date = selected_date(params.date.as_deref(), state.snapshot.latest_date());
    let view = consolidated_view(&state.snapshot, date, params.category.as_deref());

    let mut buffer = Vec::new();
    match write_csv(&view.columns, &view.rows, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"call-entries.csv\"",
                ),
            ],
            buffer,
        )
            .into_response(),
        Err(e) => {
            eprintln!("Error exporting CSV: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "export failed").into_response()
        }
    }
}

// ============================================================================
// Pages
// ============================================================================

/// GET / - Consolidated dashboard page
async fn serve_consolidated() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

/// GET /by-sheet - Per-sheet dashboard page
async fn serve_by_sheet() -> impl IntoResponse {
    Html(include_str!("../web/by-sheet.html"))
}

// ============================================================================
// Main Server
// ============================================================================

fn load_snapshot(args: &[String]) -> anyhow::Result<Snapshot> {
    let sources = match args.first().map(String::as_str) {
        Some("--remote") => {
            if args.len() < 3 {
                anyhow::bail!("--remote needs <credentials.json> and <spreadsheet title>");
            }
            println!("🌐 Fetching '{}' from the spreadsheet service...", args[2]);
            fetch_spreadsheet(Path::new(&args[1]), &args[2])?
        }
        Some(path) => {
            println!("📂 Loading workbook {}...", path);
            load_workbook(Path::new(path))?
        }
        None => anyhow::bail!("No input given"),
    };

    Ok(Snapshot::build(sources))
}

fn main() {
    println!("📞 Call Dashboard - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // All loading happens here, before the server is reachable; a load
    // failure means no dashboard at all
    let args: Vec<String> = std::env::args().skip(1).collect();
    let snapshot = match load_snapshot(&args) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("❌ Failed to load call entries: {:#}", e);
            eprintln!("   Usage: call-server <workbook.xlsx>");
            eprintln!("          call-server --remote <credentials.json> <spreadsheet title>");
            std::process::exit(1);
        }
    };

    println!(
        "✓ Loaded {} call entries across {} sheets",
        snapshot.total_rows(),
        snapshot.sources.len()
    );

    // Create shared state - read-only after this point
    let state = AppState {
        snapshot: Arc::new(snapshot),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/summary", get(get_summary))
        .route("/consolidated", get(get_consolidated))
        .route("/by-sheet", get(get_by_sheet))
        .route("/export.csv", get(export_csv))
        .with_state(state.clone());

    // Build main router
    let app = Router::new()
        .route("/", get(serve_consolidated))
        .route("/by-sheet", get(serve_by_sheet))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("web"))
        .layer(CorsLayer::permissive());

    // Start server
    let runtime = tokio::runtime::Runtime::new().expect("Failed to start async runtime");
    runtime.block_on(async move {
        let addr = "0.0.0.0:3000";
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind to address");

        println!("\n🚀 Server running on http://localhost:3000");
        println!("   Consolidated dashboard: http://localhost:3000/");
        println!("   Per-sheet dashboard:    http://localhost:3000/by-sheet");
        println!("\n   Press Ctrl+C to stop\n");

        axum::serve(listener, app)
            .await
            .expect("Failed to start server");
    });
}
