use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{attachment, forbidden, internal_error};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use db::access::{Action, authorize};
use reports::{ReportSettings, Summary};
use sea_orm::DatabaseConnection;
use util::{config, state::AppState};

async fn build_summary(db: &DatabaseConnection) -> Result<Summary, Response> {
    let rows = reports::load_rows(db)
        .await
        .map_err(|e| internal_error("Failed to load tickets", e))?;
    let technicians = reports::load_technicians(db)
        .await
        .map_err(|e| internal_error("Failed to load technicians", e))?;

    Ok(reports::summarize(
        &rows,
        &technicians,
        Utc::now(),
        &ReportSettings::from_config(),
    ))
}

/// GET /reports/summary
///
/// Dashboard statistics.
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "generated_at": "2026-01-05T10:00:00Z",
///     "counts": { "total": 12, "open": 3, "in_progress": 4, "closed": 5, "overdue": 2 },
///     "technicians": [
///       { "technician_id": 3, "username": "tomas", "assigned": 6, "closed": 4, "effectiveness": 66.66 }
///     ],
///     "overdue_alert": false,
///     "narrative": ["..."]
///   },
///   "message": "Report summary generated"
/// }
/// ```
pub async fn summary(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    if let Err(denied) = authorize(&user.viewer(), Action::ViewReports) {
        return forbidden(denied);
    }

    match build_summary(app_state.db()).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(ApiResponse::success(summary, "Report summary generated")),
        )
            .into_response(),
        Err(response) => response,
    }
}

/// GET /reports/executive
///
/// Executive summary PDF with narrative, state chart and technician table.
pub async fn executive_pdf(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    if let Err(denied) = authorize(&user.viewer(), Action::ViewReports) {
        return forbidden(denied);
    }

    let summary = match build_summary(app_state.db()).await {
        Ok(summary) => summary,
        Err(response) => return response,
    };

    let pdf = reports::pdf::executive_summary(&config::project_name(), &summary);
    tracing::info!(
        user_id = user.0.sub,
        overdue_alert = summary.overdue_alert,
        "Executive summary generated"
    );

    let filename = format!("executive_summary_{}.pdf", summary.generated_at.format("%Y%m%d"));
    attachment("application/pdf", &filename, pdf)
}

/// GET /reports/export
///
/// Every ticket as one spreadsheet row (CSV with a UTF-8 BOM so Excel opens it cleanly).
pub async fn export_spreadsheet(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    if let Err(denied) = authorize(&user.viewer(), Action::ViewReports) {
        return forbidden(denied);
    }

    let rows = match reports::load_rows(app_state.db()).await {
        Ok(rows) => rows,
        Err(e) => return internal_error("Failed to load tickets", e),
    };

    match reports::spreadsheet::export_csv(&rows) {
        Ok(bytes) => {
            tracing::info!(user_id = user.0.sub, rows = rows.len(), "Ticket spreadsheet exported");
            let filename = format!("tickets_{}.csv", Utc::now().format("%Y%m%d"));
            attachment("text/csv; charset=utf-8", &filename, bytes)
        }
        Err(e) => internal_error("Failed to build spreadsheet", e),
    }
}
