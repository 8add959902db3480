//! Read-only reporting over the ticket store.
//!
//! The store is queried once into flat [`TicketRow`]s; every statistic is a pure
//! function of those rows and an explicit `now`. Encoders turn rows and
//! summaries into CSV and PDF bytes.

pub mod aggregate;
pub mod pdf;
pub mod rows;
pub mod spreadsheet;

pub use aggregate::{ReportSettings, StateCounts, Summary, TechnicianStats, summarize};
pub use rows::{Technician, TicketRow, load_rows, load_technicians, load_ticket_row};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),

    #[error("spreadsheet encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet buffer error: {0}")]
    Io(#[from] std::io::Error),
}
