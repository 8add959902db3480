//! Role-based visibility and permission rules.
//!
//! Every ticket query goes through [`Viewer::ticket_condition`], and every
//! state-changing operation is checked with [`authorize`] before it runs.

use sea_orm::{ColumnTrait, Condition};

use crate::models::ticket::{self, Column as TicketColumn};
use crate::models::user::Role;

/// The authenticated user on whose behalf a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: i64,
    pub role: Role,
}

impl Viewer {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Filter restricting a ticket query to what this viewer may see.
    ///
    /// Clients see tickets they filed, technicians see tickets assigned to them,
    /// admins see everything.
    pub fn ticket_condition(&self) -> Condition {
        match self.role {
            Role::Admin => Condition::all(),
            Role::Client => Condition::all().add(TicketColumn::ClientId.eq(self.user_id)),
            Role::Technician => {
                Condition::all().add(TicketColumn::TechnicianId.eq(self.user_id))
            }
        }
    }

    /// In-memory counterpart of [`Viewer::ticket_condition`].
    pub fn can_see(&self, ticket: &ticket::Model) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Client => ticket.client_id == self.user_id,
            Role::Technician => ticket.technician_id == Some(self.user_id),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    CreateTicket,
    ViewTicket(&'a ticket::Model),
    AssignTicket(&'a ticket::Model),
    ResolveTicket(&'a ticket::Model),
    DeleteTicket(&'a ticket::Model),
    ViewReports,
    ListTechnicians,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct AccessDenied(pub &'static str);

/// Decides whether `viewer` may perform `action`.
pub fn authorize(viewer: &Viewer, action: Action<'_>) -> Result<(), AccessDenied> {
    match (viewer.role, action) {
        (Role::Client, Action::CreateTicket) => Ok(()),
        (_, Action::CreateTicket) => Err(AccessDenied("Only clients can open tickets")),

        (_, Action::ViewTicket(t)) if viewer.can_see(t) => Ok(()),
        (_, Action::ViewTicket(_)) => Err(AccessDenied("Ticket not visible")),

        (Role::Admin, Action::AssignTicket(_)) => Ok(()),
        (_, Action::AssignTicket(_)) => Err(AccessDenied("Only admins can assign tickets")),

        (Role::Admin, Action::ResolveTicket(_)) => Ok(()),
        (Role::Technician, Action::ResolveTicket(t))
            if t.technician_id == Some(viewer.user_id) =>
        {
            Ok(())
        }
        (_, Action::ResolveTicket(_)) => Err(AccessDenied(
            "Only the assigned technician or an admin can resolve this ticket",
        )),

        (Role::Admin, Action::DeleteTicket(_)) => Ok(()),
        (_, Action::DeleteTicket(_)) => Err(AccessDenied("Only admins can delete tickets")),

        (Role::Admin, Action::ViewReports) => Ok(()),
        (_, Action::ViewReports) => Err(AccessDenied("Only admins can view reports")),

        (Role::Admin, Action::ListTechnicians) => Ok(()),
        (_, Action::ListTechnicians) => Err(AccessDenied("Only admins can list technicians")),
    }
}
