//! PostgreSQL store tests

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use uuid::Uuid;

    use keyword_alert_server::auth::PasswordRecord;
    use keyword_alert_server::db;
    use keyword_alert_server::store::{
        NewUser, PgStore, SessionStore, StoreError, UniqueField, UserStore,
    };

    /// Helper to create a migrated test database pool
    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/keyword_alert_test".to_string());

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    /// Unique user so tests can share one database
    fn new_user() -> NewUser {
        let tag = Uuid::new_v4().simple().to_string();
        NewUser {
            email: format!("{}@test.local", tag),
            nickname: tag[..20].to_string(),
            hashed_password: PasswordRecord::from_stored("$2b$10$placeholder"),
        }
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_create_and_lookup() {
        let store = PgStore::new(setup_test_db().await);
        let new = new_user();
        let email = new.email.clone();

        let user = store.create(new).await.unwrap();
        assert!(user.is_active);

        let found = store.find_by_email(&email).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_unique_violation_maps_to_duplicate() {
        let store = PgStore::new(setup_test_db().await);
        let first = store.create(new_user()).await.unwrap();

        let mut clash = new_user();
        clash.nickname = first.nickname.clone();

        assert_eq!(
            store.create(clash).await.unwrap_err(),
            StoreError::Duplicate(UniqueField::Nickname)
        );
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_refresh_token_rotation() {
        let store = PgStore::new(setup_test_db().await);
        let user = store.create(new_user()).await.unwrap();
        let current = format!("digest-{}", Uuid::new_v4());
        let next = format!("digest-{}", Uuid::new_v4());

        store
            .update_refresh_token(user.id, Some(&current))
            .await
            .unwrap();
        assert_eq!(
            store.find_user_by_refresh_token(&current).await.unwrap(),
            Some(user.id)
        );

        assert!(store
            .replace_refresh_token(user.id, &current, &next)
            .await
            .unwrap());
        assert!(!store
            .replace_refresh_token(user.id, &current, &next)
            .await
            .unwrap());

        store.update_refresh_token(user.id, None).await.unwrap();
        assert_eq!(store.find_user_by_refresh_token(&next).await.unwrap(), None);
    }
}
