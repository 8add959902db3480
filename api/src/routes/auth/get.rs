use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{UserResponse, error_response, internal_error};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::User;
use sea_orm::EntityTrait;
use util::state::AppState;

/// GET /auth/me
///
/// Returns the user bound to the current session.
///
/// ### Responses
/// - `200 OK` with `{ id, username, role, created_at, updated_at }`
/// - `401 Unauthorized` without an active session
/// - `404 Not Found` if the account was removed after login
pub async fn get_me(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Response {
    match User::find_by_id(claims.sub).one(app_state.db()).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                UserResponse::from(user),
                "User data retrieved successfully",
            )),
        )
            .into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => internal_error("Failed to load user", e),
    }
}
