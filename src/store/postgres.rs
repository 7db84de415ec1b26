//! PostgreSQL store
//!
//! Users and their refresh-token digest share the `users` table; see
//! `migrations/0001_create_users.sql`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{NewUser, SessionStore, StoreError, UniqueField, UserStore};
use crate::models::{AuthLevel, User};

/// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let field = match db_err.constraint() {
                    Some(name) if name.contains("nickname") => UniqueField::Nickname,
                    _ => UniqueField::Email,
                };
                return StoreError::Duplicate(field);
            }
        }
        StoreError::Unavailable(e.to_string())
    }
}

/// sqlx-backed implementation of [`UserStore`] and [`SessionStore`]
#[derive(Clone)]
pub struct PgStore {
    db_pool: PgPool,
}

impl PgStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, nickname, email, hashed_password, auth_level, is_active, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, nickname, email, hashed_password, auth_level, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, StoreError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, nickname, email, hashed_password, auth_level, is_active, created_at, updated_at
            FROM users
            WHERE nickname = $1
            "#,
        )
        .bind(nickname)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, nickname, email, hashed_password, auth_level, is_active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING id, nickname, email, hashed_password, auth_level, is_active, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.nickname)
        .bind(&new_user.email)
        .bind(new_user.hashed_password.as_str())
        .bind(AuthLevel::USER)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn update_active_status(&self, id: Uuid, is_active: bool) -> Result<bool, StoreError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE users
            SET is_active = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(is_active)
        .bind(id)
        .execute(&self.db_pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn update_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }

    async fn replace_refresh_token(
        &self,
        user_id: Uuid,
        current: &str,
        next: &str,
    ) -> Result<bool, StoreError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $1, updated_at = NOW()
            WHERE id = $2 AND refresh_token_hash = $3
            "#,
        )
        .bind(next)
        .bind(user_id)
        .bind(current)
        .execute(&self.db_pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn find_user_by_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM users WHERE refresh_token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user_id)
    }
}
