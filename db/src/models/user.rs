use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Set, SqlErr};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use strum::{Display, EnumString};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;

/// Represents a user in the `users` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Primary key ID (auto-incremented).
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique login name.
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2 PHC string, never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Helpdesk role. Backed by a `user_role` enum in the database.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Deserialize,
    Serialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    #[sea_orm(string_value = "client")]
    Client,

    #[sea_orm(string_value = "technician")]
    Technician,

    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Username already taken")]
    DuplicateUsername,

    #[error("Username must be 3 to 50 characters")]
    InvalidUsername,

    /// Unknown user and wrong password are deliberately the same variant.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Db(#[from] DbErr),
}

impl Model {
    /// Creates a user with a freshly salted password hash.
    ///
    /// The role is stored as supplied; callers decide whether self-registration
    /// for privileged roles is acceptable.
    pub async fn register(
        db: &DatabaseConnection,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<Self, UserError> {
        let username = username.trim();
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&username.chars().count()) {
            return Err(UserError::InvalidUsername);
        }

        if Self::find_by_username(db, username).await?.is_some() {
            return Err(UserError::DuplicateUsername);
        }

        let now = Utc::now();
        let active = ActiveModel {
            username: Set(username.to_owned()),
            password_hash: Set(Self::hash_password(password)?),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        // A concurrent registration can still win the race between the lookup and the insert.
        active.insert(db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => UserError::DuplicateUsername,
            _ => UserError::Db(e),
        })
    }

    /// Looks up `username` and checks `password` against the stored hash.
    ///
    /// Unknown usernames are checked against a dummy hash so both failures cost
    /// one argon2 verification.
    pub async fn verify(
        db: &DatabaseConnection,
        username: &str,
        password: &str,
    ) -> Result<Self, UserError> {
        match Self::find_by_username(db, username.trim()).await? {
            Some(user) if user.verify_password(password) => Ok(user),
            Some(_) => Err(UserError::InvalidCredentials),
            None => {
                verify_hash(dummy_hash(), password);
                Err(UserError::InvalidCredentials)
            }
        }
    }

    pub async fn find_by_username(
        db: &DatabaseConnection,
        username: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::Username.eq(username))
            .one(db)
            .await
    }

    pub async fn find_by_role(db: &DatabaseConnection, role: Role) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::Role.eq(role))
            .order_by_asc(Column::Username)
            .all(db)
            .await
    }

    pub fn hash_password(password: &str) -> Result<String, UserError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::Hashing(e.to_string()))
    }

    pub fn verify_password(&self, password: &str) -> bool {
        verify_hash(&self.password_hash, password)
    }
}

fn verify_hash(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| Model::hash_password("no-such-user").unwrap_or_default())
}
