//! Application state container shared across Axum route handlers.
//!
//! Holds the database connection and the session registry. Cloning is cheap; both
//! members are reference counted internally.

use crate::sessions::SessionRegistry;
use sea_orm::DatabaseConnection;

/// Central application state shared across the server.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    sessions: SessionRegistry,
}

impl AppState {
    /// Creates a new `AppState` with the given database connection and an empty
    /// session registry.
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            sessions: SessionRegistry::new(),
        }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Returns the registry of revoked sessions.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}
