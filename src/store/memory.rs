//! In-memory store
//!
//! Backs the test suites and the development server when no `DATABASE_URL`
//! is configured. Enforces the same uniqueness rules as the `users` table.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewUser, SessionStore, StoreError, UniqueField, UserStore};
use crate::models::{AuthLevel, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<Uuid, String>,
}

/// Shared in-memory implementation of [`UserStore`] and [`SessionStore`]
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Change a user's authorization level (admin bootstrap, tests)
    pub async fn set_auth_level(&self, id: Uuid, level: AuthLevel) -> bool {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&id) {
            Some(user) => {
                user.auth_level = level;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Stored refresh digest for a user
    pub async fn refresh_token_hash(&self, id: Uuid) -> Option<String> {
        self.tables.read().await.refresh_tokens.get(&id).cloned()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.check()?;
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.nickname == nickname).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        if tables.users.values().any(|u| u.nickname == new_user.nickname) {
            return Err(StoreError::Duplicate(UniqueField::Nickname));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            nickname: new_user.nickname,
            email: new_user.email,
            hashed_password: new_user.hashed_password.into_string(),
            auth_level: AuthLevel::USER,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_active_status(&self, id: Uuid, is_active: bool) -> Result<bool, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&id) {
            Some(user) => {
                user.is_active = is_active;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn update_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: Option<&str>,
    ) -> Result<(), StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        match token_hash {
            Some(hash) => {
                tables.refresh_tokens.insert(user_id, hash.to_string());
            }
            None => {
                tables.refresh_tokens.remove(&user_id);
            }
        }
        Ok(())
    }

    async fn replace_refresh_token(
        &self,
        user_id: Uuid,
        current: &str,
        next: &str,
    ) -> Result<bool, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        match tables.refresh_tokens.get_mut(&user_id) {
            Some(stored) if stored.as_str() == current => {
                *stored = next.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_user_by_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables
            .refresh_tokens
            .iter()
            .find(|(_, stored)| stored.as_str() == token_hash)
            .map(|(user_id, _)| *user_id))
    }
}
