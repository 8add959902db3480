pub mod tickets;
pub mod user;
