use db::access::Viewer;
use db::models::user::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub role: Role,
    /// Session id; logout revokes it.
    pub jti: String,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn viewer(&self) -> Viewer {
        Viewer::new(self.0.sub, self.0.role)
    }
}
