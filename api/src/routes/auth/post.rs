use crate::auth::{decode_jwt, generate_jwt};
use crate::response::ApiResponse;
use crate::routes::common::{error_response, format_validation_errors, internal_error};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use db::models::user::{Model as UserModel, Role, UserError};
use serde::{Deserialize, Serialize};
use util::state::AppState;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters"))]
    pub username: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// `client`, `technician` or `admin`; defaults to `client`.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Default)]
pub struct AuthResponse {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub token: String,
    pub expires_at: String,
}

fn session_response(user: UserModel, status: StatusCode, message: &str) -> Response {
    match generate_jwt(user.id, &user.username, user.role) {
        Ok(issued) => {
            let body = AuthResponse {
                id: user.id,
                username: user.username,
                role: user.role.to_string(),
                token: issued.token,
                expires_at: issued.expires_at,
            };
            (status, Json(ApiResponse::success(body, message))).into_response()
        }
        Err(e) => internal_error("Failed to issue session token", e),
    }
}

/// POST /auth/register
///
/// ### Request Body
/// ```json
/// { "username": "ana", "password": "strongpassword", "role": "client" }
/// ```
///
/// ### Responses
/// - `201 Created` with `{ id, username, role, token, expires_at }`
/// - `400 Bad Request` on validation failure or unknown role
/// - `409 Conflict` "Username already taken"
///
/// The requested role is honoured as given, admin included.
pub async fn register(
    State(app_state): State<AppState>,
    Json(mut req): Json<RegisterRequest>,
) -> Response {
    req.username = req.username.trim().to_owned();
    if let Err(validation_errors) = req.validate() {
        return error_response(
            StatusCode::BAD_REQUEST,
            format_validation_errors(&validation_errors),
        );
    }

    let role = match req.role.as_deref().map(str::parse::<Role>) {
        None => Role::Client,
        Some(Ok(role)) => role,
        Some(Err(_)) => return error_response(StatusCode::BAD_REQUEST, "Invalid role"),
    };

    match UserModel::register(app_state.db(), &req.username, &req.password, role).await {
        Ok(user) => {
            if user.role == Role::Admin {
                tracing::warn!(user_id = user.id, username = %user.username, "Self-registered admin account");
            } else {
                tracing::info!(user_id = user.id, role = %user.role, "User registered");
            }
            session_response(user, StatusCode::CREATED, "User registered successfully")
        }
        Err(UserError::DuplicateUsername) => {
            error_response(StatusCode::CONFLICT, UserError::DuplicateUsername.to_string())
        }
        Err(UserError::InvalidUsername) => {
            error_response(StatusCode::BAD_REQUEST, UserError::InvalidUsername.to_string())
        }
        Err(e) => internal_error("Failed to register user", e),
    }
}

/// POST /auth/login
///
/// ### Request Body
/// ```json
/// { "username": "ana", "password": "strongpassword" }
/// ```
///
/// ### Responses
/// - `200 OK` with `{ id, username, role, token, expires_at }`
/// - `401 Unauthorized` "Invalid username or password", for unknown users and wrong passwords alike
pub async fn login(State(app_state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    if let Err(validation_errors) = req.validate() {
        return error_response(
            StatusCode::BAD_REQUEST,
            format_validation_errors(&validation_errors),
        );
    }

    match UserModel::verify(app_state.db(), &req.username, &req.password).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, "Login succeeded");
            session_response(user, StatusCode::OK, "Login successful")
        }
        Err(UserError::InvalidCredentials) => {
            tracing::info!(username = %req.username.trim(), "Login failed");
            error_response(
                StatusCode::UNAUTHORIZED,
                UserError::InvalidCredentials.to_string(),
            )
        }
        Err(e) => internal_error("Failed to verify credentials", e),
    }
}

/// POST /auth/logout
///
/// Revokes the presented session. Always answers `200 OK`, also when the token
/// is missing, malformed or already expired.
pub async fn logout(State(app_state): State<AppState>, headers: HeaderMap) -> Response {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if let Some(claims) = token.and_then(|t| decode_jwt(t).ok()) {
        app_state
            .sessions()
            .revoke(&claims.jti, claims.exp as i64)
            .await;
        tracing::info!(user_id = claims.sub, "Session revoked");
    }

    (
        StatusCode::OK,
        Json(ApiResponse::<()>::success((), "Logged out")),
    )
        .into_response()
}
