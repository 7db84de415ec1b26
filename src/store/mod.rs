//! Persistence seams for the authentication core
//!
//! [`UserStore`] covers user rows; [`SessionStore`] covers the single-slot
//! refresh-token association per user. Both are single-row lookups or
//! updates, and an absent row is `Ok(None)` rather than an error.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::password::PasswordRecord;
use crate::models::User;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Column with a uniqueness constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Nickname,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::Email => f.write_str("email"),
            UniqueField::Nickname => f.write_str("nickname"),
        }
    }
}

/// Store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Duplicate {0}")]
    Duplicate(UniqueField),
}

/// Fields required to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub nickname: String,
    pub hashed_password: PasswordRecord,
}

/// User row persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new active user at the default authorization level
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Returns `false` when no user has this id
    async fn update_active_status(&self, id: Uuid, is_active: bool) -> Result<bool, StoreError>;
}

/// Refresh-token association, one slot per user
///
/// Only digests of refresh values are handed to the store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Overwrite (or clear, with `None`) the user's refresh-token digest
    async fn update_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Swap `current` for `next` only if `current` is still the stored digest
    ///
    /// Returns `false` when the slot holds something else, which is how a
    /// refresh value that was already redeemed gets turned away.
    async fn replace_refresh_token(
        &self,
        user_id: Uuid,
        current: &str,
        next: &str,
    ) -> Result<bool, StoreError>;

    async fn find_user_by_refresh_token(&self, token_hash: &str)
        -> Result<Option<Uuid>, StoreError>;
}
