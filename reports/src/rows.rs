use std::collections::HashMap;

use chrono::{DateTime, Utc};
use db::models::{
    Ticket, User, VisitReport,
    ticket::{self, TicketPriority, TicketStatus},
    user::{self, Role},
    visit_report,
};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryOrder};
use serde::Serialize;

/// One ticket with owner and technician names and its visit report flattened in.
#[derive(Debug, Clone, Serialize)]
pub struct TicketRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub priority: Option<TicketPriority>,
    pub status: TicketStatus,
    pub client: String,
    pub technician_id: Option<i64>,
    pub technician: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub visited_at: Option<DateTime<Utc>>,
    pub work_performed: Option<String>,
    pub materials_used: Option<String>,
    pub photo_filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Technician {
    pub id: i64,
    pub username: String,
}

impl TicketRow {
    fn from_parts(
        ticket: ticket::Model,
        usernames: &HashMap<i64, String>,
        report: Option<visit_report::Model>,
    ) -> Self {
        let name_of = |id: i64| {
            usernames
                .get(&id)
                .cloned()
                .unwrap_or_else(|| format!("#{id}"))
        };

        Self {
            client: name_of(ticket.client_id),
            technician: ticket.technician_id.map(name_of),
            technician_id: ticket.technician_id,
            id: ticket.id,
            title: ticket.title,
            description: ticket.description,
            location: ticket.location,
            priority: ticket.priority,
            status: ticket.status,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
            visited_at: report.as_ref().map(|r| r.visited_at),
            work_performed: report.as_ref().map(|r| r.work_performed.clone()),
            materials_used: report.as_ref().map(|r| r.materials_used.clone()),
            photo_filename: report.and_then(|r| r.photo_filename),
        }
    }
}

async fn usernames(db: &DatabaseConnection) -> Result<HashMap<i64, String>, DbErr> {
    Ok(User::find()
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect())
}

/// Every ticket in id order, with names and visit reports joined in memory.
pub async fn load_rows(db: &DatabaseConnection) -> Result<Vec<TicketRow>, DbErr> {
    let tickets = Ticket::find()
        .order_by_asc(ticket::Column::Id)
        .all(db)
        .await?;
    let usernames = usernames(db).await?;
    let mut reports: HashMap<i64, visit_report::Model> = VisitReport::find()
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.ticket_id, r))
        .collect();

    let rows: Vec<TicketRow> = tickets
        .into_iter()
        .map(|t| {
            let report = reports.remove(&t.id);
            TicketRow::from_parts(t, &usernames, report)
        })
        .collect();

    tracing::debug!(rows = rows.len(), "Loaded report rows");
    Ok(rows)
}

/// Row for a single ticket the caller has already fetched and authorized.
pub async fn load_ticket_row(
    db: &DatabaseConnection,
    ticket: ticket::Model,
) -> Result<TicketRow, DbErr> {
    let usernames = usernames(db).await?;
    let report = ticket.visit_report(db).await?;
    Ok(TicketRow::from_parts(ticket, &usernames, report))
}

pub async fn load_technicians(db: &DatabaseConnection) -> Result<Vec<Technician>, DbErr> {
    Ok(user::Model::find_by_role(db, Role::Technician)
        .await?
        .into_iter()
        .map(|u| Technician {
            id: u.id,
            username: u.username,
        })
        .collect())
}
