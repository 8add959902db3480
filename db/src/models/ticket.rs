use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, TransactionTrait};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::user::{self, Role};
use super::visit_report;
use crate::access::Viewer;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub location: Option<String>,
    pub priority: Option<TicketPriority>,

    pub status: TicketStatus,

    /// Client who filed the ticket.
    pub client_id: i64,
    /// Set exactly while the ticket is (or was, once closed) being worked on.
    pub technician_id: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ticket_status")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TicketStatus {
    #[sea_orm(string_value = "open")]
    Open,

    #[sea_orm(string_value = "in_progress")]
    InProgress,

    #[sea_orm(string_value = "closed")]
    Closed,
}

impl TicketStatus {
    /// Human readable name used in exported documents.
    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Closed => "Closed",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ticket_priority")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TicketPriority {
    #[sea_orm(string_value = "high")]
    High,

    #[sea_orm(string_value = "medium")]
    Medium,

    #[sea_orm(string_value = "low")]
    Low,
}

impl TicketPriority {
    pub fn label(&self) -> &'static str {
        match self {
            TicketPriority::High => "High",
            TicketPriority::Medium => "Medium",
            TicketPriority::Low => "Low",
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ClientId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Client,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TechnicianId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Technician,

    #[sea_orm(has_one = "super::visit_report::Entity")]
    VisitReport,
}

impl Related<super::visit_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VisitReport.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("Ticket not found")]
    NotFound,

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("User {0} is not a technician")]
    NotATechnician(i64),

    #[error("Ticket is already closed")]
    Closed,

    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Fields a client supplies when filing a ticket.
#[derive(Debug, Clone, Default)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub priority: Option<TicketPriority>,
}

/// Visit details submitted when a ticket is resolved.
///
/// `None` fields keep whatever an earlier resolution stored.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub work_performed: String,
    pub materials_used: Option<String>,
    pub visited_at: Option<DateTime<Utc>>,
    pub photo_filename: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Resolved {
    pub ticket: Model,
    pub report: visit_report::Model,
    /// Photo that the new upload replaced; the caller owns removing the file.
    pub replaced_photo: Option<String>,
}

/// Listing options. `page` is 1-based.
#[derive(Debug, Clone)]
pub struct TicketQuery {
    pub status: Option<TicketStatus>,
    pub page: u64,
    pub per_page: u64,
}

impl Default for TicketQuery {
    fn default() -> Self {
        Self {
            status: None,
            page: 1,
            per_page: 20,
        }
    }
}

fn non_empty(value: &str, field: &'static str) -> Result<String, TicketError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(TicketError::EmptyField(field))
    } else {
        Ok(trimmed.to_owned())
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl Model {
    /// Files a new ticket for `client_id`. Tickets always start Open.
    pub async fn create(
        db: &DatabaseConnection,
        client_id: i64,
        new: NewTicket,
    ) -> Result<Model, TicketError> {
        let now = Utc::now();

        let active_model = ActiveModel {
            title: Set(non_empty(&new.title, "title")?),
            description: Set(non_empty(&new.description, "description")?),
            location: Set(optional_text(new.location)),
            priority: Set(new.priority),
            status: Set(TicketStatus::Open),
            client_id: Set(client_id),
            technician_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(active_model.insert(db).await?)
    }

    /// Tickets `viewer` may see, newest first, paginated. Returns the page and the total.
    pub async fn list_visible(
        db: &DatabaseConnection,
        viewer: &Viewer,
        query: &TicketQuery,
    ) -> Result<(Vec<Model>, u64), DbErr> {
        let mut select = Entity::find().filter(viewer.ticket_condition());

        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(db, query.per_page.max(1));

        let total = paginator.num_items().await?;
        let tickets = paginator.fetch_page(query.page.saturating_sub(1)).await?;

        Ok((tickets, total))
    }

    /// Fetches a ticket only if it falls inside `viewer`'s visibility.
    pub async fn find_visible(
        db: &DatabaseConnection,
        viewer: &Viewer,
        ticket_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(ticket_id)
            .filter(viewer.ticket_condition())
            .one(db)
            .await
    }

    /// Number of visible tickets that are not closed yet.
    pub async fn count_pending(db: &DatabaseConnection, viewer: &Viewer) -> Result<u64, DbErr> {
        Entity::find()
            .filter(viewer.ticket_condition())
            .filter(Column::Status.ne(TicketStatus::Closed))
            .count(db)
            .await
    }

    /// Sets or clears the technician.
    ///
    /// Setting moves the ticket to In Progress, clearing moves it back to Open.
    /// The assignee must be a technician and closed tickets cannot be reassigned.
    pub async fn assign(
        db: &DatabaseConnection,
        ticket_id: i64,
        technician_id: Option<i64>,
    ) -> Result<Model, TicketError> {
        let ticket = Entity::find_by_id(ticket_id)
            .one(db)
            .await?
            .ok_or(TicketError::NotFound)?;

        if ticket.status == TicketStatus::Closed {
            return Err(TicketError::Closed);
        }

        if let Some(tech_id) = technician_id {
            let technician = user::Entity::find_by_id(tech_id)
                .one(db)
                .await?
                .ok_or(TicketError::UserNotFound(tech_id))?;
            if technician.role != Role::Technician {
                return Err(TicketError::NotATechnician(tech_id));
            }
        }

        let status = match technician_id {
            Some(_) => TicketStatus::InProgress,
            None => TicketStatus::Open,
        };

        tracing::info!(
            ticket_id,
            from = %ticket.status,
            to = %status,
            technician_id = ?technician_id,
            "Ticket assignment changed"
        );

        let mut active_model: ActiveModel = ticket.into();
        active_model.technician_id = Set(technician_id);
        active_model.status = Set(status);
        active_model.updated_at = Set(Utc::now());

        Ok(active_model.update(db).await?)
    }

    /// Closes the ticket and writes its visit report in one transaction.
    ///
    /// A ticket that is already closed stays closed; its report is updated.
    pub async fn resolve(
        db: &DatabaseConnection,
        ticket_id: i64,
        resolution: Resolution,
    ) -> Result<Resolved, TicketError> {
        let work_performed = non_empty(&resolution.work_performed, "work_performed")?;
        let now = Utc::now();

        let txn = db.begin().await?;

        let ticket = Entity::find_by_id(ticket_id)
            .one(&txn)
            .await?
            .ok_or(TicketError::NotFound)?;

        let mut replaced_photo = None;
        let report = match visit_report::Model::find_by_ticket(&txn, ticket_id).await? {
            Some(existing) => {
                let previous_photo = existing.photo_filename.clone();
                let mut active: visit_report::ActiveModel = existing.into();
                active.work_performed = Set(work_performed);
                if let Some(materials) = resolution.materials_used {
                    active.materials_used = Set(materials.trim().to_owned());
                }
                if let Some(visited_at) = resolution.visited_at {
                    active.visited_at = Set(visited_at);
                }
                if let Some(photo) = resolution.photo_filename {
                    if previous_photo.as_deref() != Some(photo.as_str()) {
                        replaced_photo = previous_photo;
                    }
                    active.photo_filename = Set(Some(photo));
                }
                active.updated_at = Set(now);
                active.update(&txn).await?
            }
            None => {
                visit_report::ActiveModel {
                    ticket_id: Set(ticket_id),
                    visited_at: Set(resolution.visited_at.unwrap_or(now)),
                    work_performed: Set(work_performed),
                    materials_used: Set(resolution
                        .materials_used
                        .map(|m| m.trim().to_owned())
                        .unwrap_or_default()),
                    photo_filename: Set(resolution.photo_filename),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        tracing::info!(
            ticket_id,
            from = %ticket.status,
            report_id = report.id,
            "Ticket closed with visit report"
        );

        let mut active_ticket: ActiveModel = ticket.into();
        active_ticket.status = Set(TicketStatus::Closed);
        active_ticket.updated_at = Set(now);
        let ticket = active_ticket.update(&txn).await?;

        txn.commit().await?;

        Ok(Resolved {
            ticket,
            report,
            replaced_photo,
        })
    }

    /// Hard-deletes a ticket and its visit report.
    ///
    /// Returns the stored photo name, if any, so the caller can remove the file.
    pub async fn delete(
        db: &DatabaseConnection,
        ticket_id: i64,
    ) -> Result<Option<String>, TicketError> {
        let txn = db.begin().await?;

        Entity::find_by_id(ticket_id)
            .one(&txn)
            .await?
            .ok_or(TicketError::NotFound)?;

        let photo = visit_report::Model::find_by_ticket(&txn, ticket_id)
            .await?
            .and_then(|report| report.photo_filename);

        visit_report::Entity::delete_many()
            .filter(visit_report::Column::TicketId.eq(ticket_id))
            .exec(&txn)
            .await?;
        Entity::delete_by_id(ticket_id).exec(&txn).await?;

        txn.commit().await?;
        tracing::info!(ticket_id, "Ticket deleted");
        Ok(photo)
    }

    pub async fn visit_report(
        &self,
        db: &DatabaseConnection,
    ) -> Result<Option<visit_report::Model>, DbErr> {
        visit_report::Model::find_by_ticket(db, self.id).await
    }
}
