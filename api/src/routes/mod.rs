//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness probe (public)
//! - `/auth` → register, login, logout (public) and `me` (authenticated)
//! - `/tickets` → ticket lifecycle, PDF and photo downloads (authenticated)
//! - `/me` → per-user polling endpoints (authenticated)
//! - `/users` → technician directory (authenticated, admin policy)
//! - `/reports` → dashboard statistics and exports (authenticated, admin policy)
//!
//! The guard only establishes identity. What each role may do is decided in the
//! handlers by `db::access::authorize`.

use crate::auth::guards::allow_authenticated;
use crate::routes::{
    auth::auth_routes, health::health_routes, me::me_routes, reports::reports_routes,
    tickets::tickets_routes, users::users_routes,
};
use axum::{Router, middleware::from_fn_with_state};
use util::state::AppState;

pub mod auth;
pub mod common;
pub mod health;
pub mod me;
pub mod reports;
pub mod tickets;
pub mod users;

/// Builds the router mounted under `/api`, with its state already supplied.
pub fn routes(app_state: AppState) -> Router {
    let authenticated = || from_fn_with_state(app_state.clone(), allow_authenticated);

    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes(app_state.clone()))
        .nest("/tickets", tickets_routes().route_layer(authenticated()))
        .nest("/me", me_routes().route_layer(authenticated()))
        .nest("/users", users_routes().route_layer(authenticated()))
        .nest("/reports", reports_routes().route_layer(authenticated()))
        .with_state(app_state)
}
