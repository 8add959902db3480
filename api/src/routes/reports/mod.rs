//! `/reports` route group: dashboard statistics and document exports. Admin only.

use axum::{Router, routing::get};
use util::state::AppState;

pub mod get;

use get::{executive_pdf, export_spreadsheet, summary};

/// - `GET /reports/summary`   → `summary` (JSON)
/// - `GET /reports/executive` → `executive_pdf`
/// - `GET /reports/export`    → `export_spreadsheet` (CSV)
pub fn reports_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route("/executive", get(executive_pdf))
        .route("/export", get(export_spreadsheet))
}
