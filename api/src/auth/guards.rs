use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use util::state::AppState;

#[derive(serde::Serialize, Default)]
pub struct Empty;

type GuardRejection = (StatusCode, Json<ApiResponse<Empty>>);

fn unauthorized() -> GuardRejection {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::error("Authentication required")),
    )
}

/// Requires a valid, unexpired and unrevoked session token.
///
/// On success the `AuthUser` is inserted into the request extensions for handlers
/// to pick up with `Extension<AuthUser>`. Role checks happen in the handlers
/// through `db::access::authorize`.
pub async fn allow_authenticated(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| unauthorized())?;

    if app_state.sessions().is_revoked(&user.0.jti).await {
        return Err(unauthorized());
    }

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
