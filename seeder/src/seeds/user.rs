use crate::seed::{SeedError, SeedFuture, Seeder};
use db::models::user::{Model, Role, UserError};
use sea_orm::DatabaseConnection;

pub const DEMO_PASSWORD: &str = "password123";

const ACCOUNTS: [(&str, Role); 5] = [
    ("admin", Role::Admin),
    ("tomas", Role::Technician),
    ("lucia", Role::Technician),
    ("ana", Role::Client),
    ("bruno", Role::Client),
];

pub struct UserSeeder;

impl Seeder for UserSeeder {
    fn seed<'a>(&'a self, db: &'a DatabaseConnection) -> SeedFuture<'a> {
        Box::pin(async move {
            for (username, role) in ACCOUNTS {
                match Model::register(db, username, DEMO_PASSWORD, role).await {
                    Ok(_) | Err(UserError::DuplicateUsername) => {}
                    Err(e) => return Err(SeedError::from(e)),
                }
            }
            Ok(())
        })
    }
}
