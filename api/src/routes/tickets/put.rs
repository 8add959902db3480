use super::common::{TicketResponse, load_visible, ticket_error};
use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::forbidden;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::access::{Action, authorize};
use db::models::ticket::Model as TicketModel;
use serde::Deserialize;
use util::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    /// Technician to assign, or `null` to unassign.
    pub technician_id: Option<i64>,
}

/// PUT /tickets/{ticket_id}/assign
///
/// Assigns a technician (ticket moves to In Progress) or clears the assignment
/// with `null` (ticket moves back to Open). Admin only.
///
/// ### Request Body
/// ```json
/// { "technician_id": 7 }
/// ```
///
/// ### Responses
/// - `200 OK` with the updated ticket
/// - `400 Bad Request` when the user does not exist or is not a technician
/// - `403 Forbidden` for non-admins
/// - `404 Not Found` when the ticket is not visible
/// - `409 Conflict` when the ticket is already closed
pub async fn assign_ticket(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ticket_id): Path<i64>,
    Json(req): Json<AssignRequest>,
) -> Response {
    let db = app_state.db();

    let ticket = match load_visible(db, &user, ticket_id).await {
        Ok(ticket) => ticket,
        Err(response) => return response,
    };

    if let Err(denied) = authorize(&user.viewer(), Action::AssignTicket(&ticket)) {
        return forbidden(denied);
    }

    match TicketModel::assign(db, ticket_id, req.technician_id).await {
        Ok(updated) => {
            tracing::info!(
                ticket_id,
                technician_id = ?req.technician_id,
                status = %updated.status,
                "Ticket assignment changed"
            );
            let message = match req.technician_id {
                Some(_) => "Technician assigned successfully",
                None => "Technician unassigned successfully",
            };
            (
                StatusCode::OK,
                Json(ApiResponse::success(TicketResponse::from(updated), message)),
            )
                .into_response()
        }
        Err(e) => ticket_error(e),
    }
}
