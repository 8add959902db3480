use crate::auth::AuthUser;
use crate::routes::common::{error_response, internal_error};
use axum::{http::StatusCode, response::Response};
use db::access::{Action, authorize};
use db::models::ticket::{Model as TicketModel, TicketError, TicketPriority, TicketStatus};
use db::models::visit_report::Model as VisitReportModel;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::path::PathBuf;
use util::paths::{ensure_dir, ticket_photo_path, ticket_photo_staging_path, ticket_photos_dir};

#[derive(Debug, Serialize)]
pub struct VisitReportResponse {
    pub id: i64,
    pub visited_at: String,
    pub work_performed: String,
    pub materials_used: String,
    pub photo_filename: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<VisitReportModel> for VisitReportResponse {
    fn from(report: VisitReportModel) -> Self {
        Self {
            id: report.id,
            visited_at: report.visited_at.to_rfc3339(),
            work_performed: report.work_performed,
            materials_used: report.materials_used,
            photo_filename: report.photo_filename,
            created_at: report.created_at.to_rfc3339(),
            updated_at: report.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub priority: Option<TicketPriority>,
    pub status: TicketStatus,
    pub client_id: i64,
    pub technician_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_report: Option<VisitReportResponse>,
}

impl TicketResponse {
    pub fn with_report(ticket: TicketModel, report: Option<VisitReportModel>) -> Self {
        let mut response = Self::from(ticket);
        response.visit_report = report.map(VisitReportResponse::from);
        response
    }
}

impl From<TicketModel> for TicketResponse {
    fn from(ticket: TicketModel) -> Self {
        Self {
            id: ticket.id,
            title: ticket.title,
            description: ticket.description,
            location: ticket.location,
            priority: ticket.priority,
            status: ticket.status,
            client_id: ticket.client_id,
            technician_id: ticket.technician_id,
            created_at: ticket.created_at.to_rfc3339(),
            updated_at: ticket.updated_at.to_rfc3339(),
            visit_report: None,
        }
    }
}

/// Loads a ticket the caller may see.
///
/// Missing and invisible tickets both yield `404`, so ids of other users'
/// tickets cannot be probed.
pub async fn load_visible(
    db: &DatabaseConnection,
    user: &AuthUser,
    ticket_id: i64,
) -> Result<TicketModel, Response> {
    let viewer = user.viewer();
    let ticket = TicketModel::find_visible(db, &viewer, ticket_id)
        .await
        .map_err(|e| internal_error("Failed to load ticket", e))?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Ticket not found"))?;

    authorize(&viewer, Action::ViewTicket(&ticket))
        .map_err(|_| error_response(StatusCode::NOT_FOUND, "Ticket not found"))?;

    Ok(ticket)
}

/// Maps lifecycle failures onto HTTP statuses.
pub fn ticket_error(err: TicketError) -> Response {
    match err {
        TicketError::NotFound => error_response(StatusCode::NOT_FOUND, "Ticket not found"),
        TicketError::EmptyField(_)
        | TicketError::UserNotFound(_)
        | TicketError::NotATechnician(_) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
        TicketError::Closed => error_response(StatusCode::CONFLICT, err.to_string()),
        TicketError::Db(e) => internal_error("Database error", e),
    }
}

/// Removes a stored photo. Failures are logged and otherwise ignored.
pub async fn remove_photo(stored_name: &str) {
    let path = ticket_photo_path(stored_name);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed ticket photo"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(error = %e, path = %path.display(), "Failed to remove ticket photo"),
    }
}

/// An uploaded photo held under a staging name until the database update that
/// references it has committed. A failed update leaves any photo already on
/// disk under the final name untouched.
#[derive(Debug)]
pub struct StagedPhoto {
    stored_name: String,
    staging: PathBuf,
}

impl StagedPhoto {
    pub async fn write(stored_name: String, bytes: &[u8]) -> std::io::Result<Self> {
        ensure_dir(ticket_photos_dir())?;
        let staging = ticket_photo_staging_path(&stored_name);
        tokio::fs::write(&staging, bytes).await?;
        Ok(Self {
            stored_name,
            staging,
        })
    }

    pub fn stored_name(&self) -> &str {
        &self.stored_name
    }

    /// Moves the upload to its final name, replacing any file already there.
    pub async fn commit(self) -> std::io::Result<()> {
        tokio::fs::rename(&self.staging, ticket_photo_path(&self.stored_name)).await
    }

    pub async fn discard(self) {
        if let Err(e) = tokio::fs::remove_file(&self.staging).await {
            tracing::warn!(error = %e, path = %self.staging.display(), "Failed to remove staged photo");
        }
    }
}
