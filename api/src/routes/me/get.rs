use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::internal_error;
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::ticket::Model as TicketModel;
use serde::Serialize;
use util::state::AppState;

#[derive(Debug, Serialize)]
pub struct PendingCountResponse {
    pub count: u64,
}

/// GET /me/pending-count
///
/// Number of tickets visible to the caller that are not closed yet. Clients
/// poll this to drive a badge.
///
/// ```json
/// { "success": true, "data": { "count": 3 }, "message": "Pending count retrieved" }
/// ```
pub async fn pending_count(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    match TicketModel::count_pending(app_state.db(), &user.viewer()).await {
        Ok(count) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                PendingCountResponse { count },
                "Pending count retrieved",
            )),
        )
            .into_response(),
        Err(e) => internal_error("Failed to count pending tickets", e),
    }
}
