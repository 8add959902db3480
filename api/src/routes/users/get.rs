use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{UserResponse, forbidden, internal_error};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::access::{Action, authorize};
use db::models::user::{Model as UserModel, Role};
use util::state::AppState;

/// GET /users/technicians
///
/// Technicians ordered by username, for the assignment picker. Admin only.
pub async fn list_technicians(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    if let Err(denied) = authorize(&user.viewer(), Action::ListTechnicians) {
        return forbidden(denied);
    }

    match UserModel::find_by_role(app_state.db(), Role::Technician).await {
        Ok(users) => {
            let data: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
            (
                StatusCode::OK,
                Json(ApiResponse::success(data, "Technicians retrieved successfully")),
            )
                .into_response()
        }
        Err(e) => internal_error("Failed to list technicians", e),
    }
}
