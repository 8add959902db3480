//! `/auth` route group.
//!
//! - `post.rs`: register, login, logout (public)
//! - `get.rs`: current identity (authenticated)

pub mod get;
pub mod post;

use crate::auth::guards::allow_authenticated;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use util::state::AppState;

use get::get_me;
use post::{login, logout, register};

/// - `POST /auth/register` → `register`
/// - `POST /auth/login` → `login`
/// - `POST /auth/logout` → `logout`
/// - `GET /auth/me` → `get_me`
pub fn auth_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route(
            "/me",
            get(get_me).route_layer(from_fn_with_state(app_state, allow_authenticated)),
        )
}
