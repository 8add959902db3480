//! `/me` route group: data scoped to the calling user.

use axum::{Router, routing::get};
use util::state::AppState;

pub mod get;

use get::pending_count;

/// - `GET /me/pending-count` → `pending_count`
pub fn me_routes() -> Router<AppState> {
    Router::new().route("/pending-count", get(pending_count))
}
