//! Server-side registry of revoked sessions.
//!
//! Session tokens are self-contained JWTs, so logging out cannot delete anything on
//! the client. Instead the session id (`jti`) is remembered here until the token
//! would have expired anyway, and the auth guard rejects any token whose id is listed.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    revoked: Arc<RwLock<HashMap<String, i64>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a session as revoked until `expires_at` (unix seconds).
    ///
    /// Entries whose expiry already passed are purged on every call.
    pub async fn revoke(&self, session_id: &str, expires_at: i64) {
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp > now);
        if expires_at > now {
            revoked.insert(session_id.to_owned(), expires_at);
        }
    }

    pub async fn is_revoked(&self, session_id: &str) -> bool {
        self.revoked.read().await.contains_key(session_id)
    }

    pub async fn len(&self) -> usize {
        self.revoked.read().await.len()
    }
}
