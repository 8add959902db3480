pub mod ticket;
pub mod user;
pub mod visit_report;

pub use ticket::Entity as Ticket;
pub use user::Entity as User;
pub use visit_report::Entity as VisitReport;
