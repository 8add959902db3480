use super::common::{TicketResponse, load_visible};
use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{attachment, error_response, format_validation_errors, internal_error};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::ticket::{Model as TicketModel, TicketQuery, TicketStatus};
use serde::{Deserialize, Serialize};
use util::{config, paths::ticket_photo_path, state::AppState};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ListTicketsQuery {
    /// `open`, `in_progress` or `closed`.
    pub status: Option<String>,

    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u64>,

    #[validate(range(min = 1, max = 100, message = "Per page must be between 1 and 100"))]
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct TicketListResponse {
    pub tickets: Vec<TicketResponse>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

/// GET /tickets
///
/// Lists the tickets visible to the caller, newest first: clients get their own,
/// technicians the ones assigned to them, admins everything.
///
/// ### Query Parameters
/// - `status` (optional): `open`, `in_progress` or `closed`
/// - `page` (optional, default 1)
/// - `per_page` (optional, default 20, max 100)
///
/// ### Responses
/// - `200 OK` with `{ tickets, page, per_page, total }`
/// - `400 Bad Request` for an unknown status or out-of-range paging
pub async fn list_tickets(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListTicketsQuery>,
) -> Response {
    if let Err(e) = params.validate() {
        return error_response(StatusCode::BAD_REQUEST, format_validation_errors(&e));
    }

    let status = match params.status.as_deref().map(str::parse::<TicketStatus>) {
        None => None,
        Some(Ok(status)) => Some(status),
        Some(Err(_)) => return error_response(StatusCode::BAD_REQUEST, "Invalid status"),
    };

    let defaults = TicketQuery::default();
    let query = TicketQuery {
        status,
        page: params.page.unwrap_or(defaults.page),
        per_page: params.per_page.unwrap_or(defaults.per_page),
    };

    match TicketModel::list_visible(app_state.db(), &user.viewer(), &query).await {
        Ok((tickets, total)) => {
            let body = TicketListResponse {
                tickets: tickets.into_iter().map(TicketResponse::from).collect(),
                page: query.page,
                per_page: query.per_page,
                total,
            };
            (
                StatusCode::OK,
                Json(ApiResponse::success(body, "Tickets retrieved successfully")),
            )
                .into_response()
        }
        Err(e) => internal_error("Failed to list tickets", e),
    }
}

/// GET /tickets/{ticket_id}
///
/// Ticket detail including the visit report once the ticket has been resolved.
///
/// ### Responses
/// - `200 OK`
/// - `404 Not Found` when the ticket does not exist or is not visible to the caller
pub async fn get_ticket(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ticket_id): Path<i64>,
) -> Response {
    let db = app_state.db();
    let ticket = match load_visible(db, &user, ticket_id).await {
        Ok(ticket) => ticket,
        Err(response) => return response,
    };

    match ticket.visit_report(db).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                TicketResponse::with_report(ticket, report),
                "Ticket retrieved successfully",
            )),
        )
            .into_response(),
        Err(e) => internal_error("Failed to load visit report", e),
    }
}

/// GET /tickets/{ticket_id}/pdf
///
/// Downloads the ticket report as `ticket_{id}.pdf`.
pub async fn download_ticket_pdf(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ticket_id): Path<i64>,
) -> Response {
    let db = app_state.db();
    let ticket = match load_visible(db, &user, ticket_id).await {
        Ok(ticket) => ticket,
        Err(response) => return response,
    };

    let row = match reports::load_ticket_row(db, ticket).await {
        Ok(row) => row,
        Err(e) => return internal_error("Failed to load ticket report data", e),
    };

    let pdf = reports::pdf::ticket_report(&config::project_name(), &row);
    tracing::info!(ticket_id, user_id = user.0.sub, "Ticket PDF generated");

    attachment("application/pdf", &format!("ticket_{ticket_id}.pdf"), pdf)
}

/// GET /tickets/{ticket_id}/photo
///
/// Downloads the photo attached to the visit report.
///
/// ### Responses
/// - `200 OK` with the image bytes
/// - `404 Not Found` when the ticket is not visible, has no photo, or the file is gone
pub async fn download_ticket_photo(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ticket_id): Path<i64>,
) -> Response {
    let db = app_state.db();
    let ticket = match load_visible(db, &user, ticket_id).await {
        Ok(ticket) => ticket,
        Err(response) => return response,
    };

    let stored_name = match ticket.visit_report(db).await {
        Ok(Some(report)) => match report.photo_filename {
            Some(name) => name,
            None => return error_response(StatusCode::NOT_FOUND, "No photo for this ticket"),
        },
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "No photo for this ticket"),
        Err(e) => return internal_error("Failed to load visit report", e),
    };

    let path = ticket_photo_path(&stored_name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            attachment(mime.essence_str(), &stored_name, bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(ticket_id, path = %path.display(), "Photo missing on disk");
            error_response(StatusCode::NOT_FOUND, "Photo missing on disk")
        }
        Err(e) => internal_error("Failed to read photo", e),
    }
}
