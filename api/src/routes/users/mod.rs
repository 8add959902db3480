use axum::{Router, routing::get};
use util::state::AppState;

pub mod get;

use get::list_technicians;

/// - `GET /users/technicians` → `list_technicians` (admin)
pub fn users_routes() -> Router<AppState> {
    Router::new().route("/technicians", get(list_technicians))
}
