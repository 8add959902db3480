//! `/tickets` route group: the ticket lifecycle plus document downloads.
//!
//! Every handler runs behind `allow_authenticated`. Reads go through the
//! visibility filter; mutations additionally pass `db::access::authorize`.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use util::{config, state::AppState};

pub mod common;
pub mod delete;
pub mod get;
pub mod post;
pub mod put;

use delete::delete_ticket;
use get::{download_ticket_pdf, download_ticket_photo, get_ticket, list_tickets};
use post::{create_ticket, resolve_ticket};
use put::assign_ticket;

/// - `GET    /tickets`                      → `list_tickets`
/// - `POST   /tickets`                      → `create_ticket`
/// - `GET    /tickets/{ticket_id}`          → `get_ticket`
/// - `DELETE /tickets/{ticket_id}`          → `delete_ticket`
/// - `PUT    /tickets/{ticket_id}/assign`   → `assign_ticket`
/// - `POST   /tickets/{ticket_id}/resolve`  → `resolve_ticket` (multipart, body limit `MAX_UPLOAD_BYTES`)
/// - `GET    /tickets/{ticket_id}/pdf`      → `download_ticket_pdf`
/// - `GET    /tickets/{ticket_id}/photo`    → `download_ticket_photo`
pub fn tickets_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tickets).post(create_ticket))
        .route("/{ticket_id}", get(get_ticket).delete(delete_ticket))
        .route("/{ticket_id}/assign", put(assign_ticket))
        .route(
            "/{ticket_id}/resolve",
            post(resolve_ticket).layer(DefaultBodyLimit::max(config::max_upload_bytes())),
        )
        .route("/{ticket_id}/pdf", get(download_ticket_pdf))
        .route("/{ticket_id}/photo", get(download_ticket_photo))
}
