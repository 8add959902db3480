pub mod m202601050001_create_users;
pub mod m202601050002_create_tickets;
pub mod m202601050003_create_visit_reports;
