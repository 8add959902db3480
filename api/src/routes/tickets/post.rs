use super::common::{StagedPhoto, TicketResponse, load_visible, remove_photo, ticket_error};
use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{error_response, forbidden, format_validation_errors, internal_error};
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use db::access::{Action, authorize};
use db::models::ticket::{Model as TicketModel, NewTicket, Resolution, TicketPriority};
use serde::Deserialize;
use util::paths::ticket_photo_filename;
use util::state::AppState;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    pub location: Option<String>,

    /// `high`, `medium` or `low`.
    pub priority: Option<String>,
}

/// POST /tickets
///
/// Files a new ticket owned by the calling client. It starts Open and unassigned.
///
/// ### Request Body
/// ```json
/// {
///   "title": "Printer down",
///   "description": "Tray 2 jams on every job",
///   "location": "Office 2B",
///   "priority": "high"
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with the ticket
/// - `400 Bad Request` on validation failure or unknown priority
/// - `403 Forbidden` for technicians and admins
pub async fn create_ticket(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateTicketRequest>,
) -> Response {
    if let Err(denied) = authorize(&user.viewer(), Action::CreateTicket) {
        return forbidden(denied);
    }

    if let Err(e) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, format_validation_errors(&e));
    }

    let priority = match req.priority.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        None => None,
        Some(raw) => match raw.parse::<TicketPriority>() {
            Ok(priority) => Some(priority),
            Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid priority"),
        },
    };

    let new_ticket = NewTicket {
        title: req.title,
        description: req.description,
        location: req.location,
        priority,
    };

    match TicketModel::create(app_state.db(), user.0.sub, new_ticket).await {
        Ok(ticket) => {
            tracing::info!(ticket_id = ticket.id, client_id = user.0.sub, "Ticket created");
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    TicketResponse::from(ticket),
                    "Ticket created successfully",
                )),
            )
                .into_response()
        }
        Err(e) => ticket_error(e),
    }
}

/// Accepts RFC 3339 or the `YYYY-MM-DDTHH:MM[:SS]` form sent by HTML datetime inputs (read as UTC).
fn parse_visited_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

struct ResolveForm {
    work_performed: String,
    materials_used: Option<String>,
    visited_at: Option<DateTime<Utc>>,
    photo: Option<(String, Vec<u8>)>,
}

async fn read_resolve_form(mut multipart: Multipart) -> Result<ResolveForm, Response> {
    let bad_body = |_| error_response(StatusCode::BAD_REQUEST, "Invalid multipart body");

    let mut form = ResolveForm {
        work_performed: String::new(),
        materials_used: None,
        visited_at: None,
        photo: None,
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_body)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "work_performed" => form.work_performed = field.text().await.map_err(bad_body)?,
            "materials_used" => form.materials_used = Some(field.text().await.map_err(bad_body)?),
            "visited_at" => {
                let raw = field.text().await.map_err(bad_body)?;
                if !raw.trim().is_empty() {
                    form.visited_at = Some(parse_visited_at(&raw).ok_or_else(|| {
                        error_response(StatusCode::BAD_REQUEST, "Invalid visited_at")
                    })?);
                }
            }
            "photo" => {
                if form.photo.is_some() {
                    return Err(error_response(
                        StatusCode::BAD_REQUEST,
                        "Only one photo may be uploaded per request",
                    ));
                }
                let original = field.file_name().unwrap_or("photo").to_string();
                let bytes = field.bytes().await.map_err(bad_body)?;
                // Browsers send an empty part when no file was chosen.
                if !bytes.is_empty() {
                    form.photo = Some((original, bytes.to_vec()));
                }
            }
            _ => continue,
        }
    }

    Ok(form)
}

/// POST /tickets/{ticket_id}/resolve
///
/// Closes the ticket and records the visit report. Resolving an already closed
/// ticket edits its report. A new photo replaces the previous one.
///
/// ### Multipart Body (form-data)
/// - `work_performed` (required, text)
/// - `materials_used` (optional, text)
/// - `visited_at` (optional, RFC 3339 or `YYYY-MM-DDTHH:MM`; defaults to now on first resolution)
/// - `photo` (optional, file)
///
/// ### Responses
/// - `200 OK` with the ticket and its visit report
/// - `400 Bad Request` when `work_performed` is blank or the body is malformed
/// - `403 Forbidden` unless the caller is an admin or the assigned technician
/// - `404 Not Found` when the ticket is not visible
pub async fn resolve_ticket(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(ticket_id): Path<i64>,
    multipart: Multipart,
) -> Response {
    let db = app_state.db();

    let ticket = match load_visible(db, &user, ticket_id).await {
        Ok(ticket) => ticket,
        Err(response) => return response,
    };

    if let Err(denied) = authorize(&user.viewer(), Action::ResolveTicket(&ticket)) {
        return forbidden(denied);
    }

    let form = match read_resolve_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    if form.work_performed.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "work_performed must not be empty");
    }

    let mut staged = None;
    if let Some((original, bytes)) = form.photo {
        match StagedPhoto::write(ticket_photo_filename(ticket_id, &original), &bytes).await {
            Ok(photo) => staged = Some(photo),
            Err(e) => return internal_error("Failed to save photo", e),
        }
    }

    let resolution = Resolution {
        work_performed: form.work_performed,
        materials_used: form.materials_used,
        visited_at: form.visited_at,
        photo_filename: staged.as_ref().map(|p| p.stored_name().to_owned()),
    };

    let resolved = match TicketModel::resolve(db, ticket_id, resolution).await {
        Ok(resolved) => resolved,
        Err(e) => {
            if let Some(photo) = staged {
                photo.discard().await;
            }
            return ticket_error(e);
        }
    };

    if let Some(photo) = staged {
        if let Err(e) = photo.commit().await {
            return internal_error("Failed to store photo", e);
        }
    }
    if let Some(old) = &resolved.replaced_photo {
        remove_photo(old).await;
    }

    tracing::info!(ticket_id, user_id = user.0.sub, "Ticket resolved");
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            TicketResponse::with_report(resolved.ticket, Some(resolved.report)),
            "Ticket resolved successfully",
        )),
    )
        .into_response()
}
