use super::common::{load_visible, remove_photo, ticket_error};
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
use util::state::AppState;

/// DELETE /tickets/{ticket_id}
///
/// Hard-deletes the ticket with its visit report and stored photo. Admin only.
///
/// ### Responses
/// - `200 OK`
/// - `403 Forbidden` for non-admins
/// - `404 Not Found` when the ticket is not visible
pub async fn delete_ticket(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ticket_id): Path<i64>,
) -> Response {
    let db = app_state.db();

    let ticket = match load_visible(db, &user, ticket_id).await {
        Ok(ticket) => ticket,
        Err(response) => return response,
    };

    if let Err(denied) = authorize(&user.viewer(), Action::DeleteTicket(&ticket)) {
        return forbidden(denied);
    }

    match TicketModel::delete(db, ticket_id).await {
        Ok(photo) => {
            if let Some(name) = photo {
                remove_photo(&name).await;
            }
            tracing::info!(ticket_id, user_id = user.0.sub, "Ticket deleted");
            (
                StatusCode::OK,
                Json(ApiResponse::<()>::success((), "Ticket deleted successfully")),
            )
                .into_response()
        }
        Err(e) => ticket_error(e),
    }
}
