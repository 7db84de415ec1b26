//! Data models for the keyword alert backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod auth;
pub use auth::*;

/// User model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub nickname: String,
    pub email: String,
    pub hashed_password: String,
    pub auth_level: AuthLevel,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            nickname: user.nickname,
            is_active: user.is_active,
            auth_level: user.auth_level,
        }
    }
}

/// Authorization level
///
/// An ordered rank rather than a set of flags. Only the exact
/// [`AuthLevel::ADMIN`] rank may use administrative operations; other
/// values, higher ones included, are treated as ordinary users.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct AuthLevel(i16);

impl AuthLevel {
    pub const USER: AuthLevel = AuthLevel(1);
    pub const ADMIN: AuthLevel = AuthLevel(9);

    pub fn new(rank: i16) -> Self {
        AuthLevel(rank)
    }

    pub fn rank(self) -> i16 {
        self.0
    }

    pub fn is_admin(self) -> bool {
        self == AuthLevel::ADMIN
    }
}

impl Default for AuthLevel {
    fn default() -> Self {
        AuthLevel::USER
    }
}
