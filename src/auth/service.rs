//! Authentication service
//!
//! Core business logic for password authentication: registration, login,
//! logout, refresh-token redemption and access-token verification.

use rand::{rngs::OsRng, RngCore};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{AuthConfig, RefreshStrategy};
use crate::models::{AuthLevel, LoginResponse, User, UserResponse};
use crate::notify::{LogNotifier, Notifier};
use crate::store::{NewUser, SessionStore, StoreError, UniqueField, UserStore};

use super::codec;
use super::jwt::{self, AccessClaims, JwtError, RefreshClaims};
use super::password::{self, PasswordRecord};

/// Size of an opaque refresh value (256 bits)
const REFRESH_TOKEN_BYTES: usize = 32;

/// Auth service errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid token format")]
    InvalidFormat,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token type")]
    InvalidTokenType,

    #[error("Invalid credentials")]
    CredentialMismatch,

    #[error("User account is not active")]
    AccountInactive,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already registered")]
    AlreadyExists(UniqueField),

    #[error("Admin privileges required")]
    InsufficientPrivileges,

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::InvalidFormat => AuthError::InvalidFormat,
            JwtError::InvalidSignature => AuthError::InvalidSignature,
            JwtError::Expired => AuthError::Expired,
            JwtError::EncodingFailed(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => AuthError::StorageFailure(msg),
            StoreError::Duplicate(field) => AuthError::AlreadyExists(field),
        }
    }
}

/// Credential used to obtain new access tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshArtifact {
    /// Random value whose digest is stored server-side
    Opaque(String),
    /// Self-contained signed token with `type=refresh`
    Signed(String),
}

impl RefreshArtifact {
    pub fn as_str(&self) -> &str {
        match self {
            RefreshArtifact::Opaque(value) | RefreshArtifact::Signed(value) => value,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            RefreshArtifact::Opaque(value) | RefreshArtifact::Signed(value) => value,
        }
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub response: LoginResponse,
    /// Delivered out of band (cookie), never in the response body
    pub refresh: RefreshArtifact,
}

/// Result of a successful refresh
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub response: LoginResponse,
    /// Replacement artifact when the strategy rotates on use
    pub rotated: Option<RefreshArtifact>,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    config: AuthConfig,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            sessions,
            notifier: Arc::new(LogNotifier),
            config,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn refresh_strategy(&self) -> RefreshStrategy {
        self.config.refresh_strategy
    }

    /// Register a new account at the default authorization level
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        nickname: &str,
    ) -> Result<UserResponse, AuthError> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::AlreadyExists(UniqueField::Email));
        }

        if self.users.find_by_nickname(nickname).await?.is_some() {
            return Err(AuthError::AlreadyExists(UniqueField::Nickname));
        }

        let hashed_password = self.hash_password(password).await?;

        // The store re-checks uniqueness, covering concurrent registrations
        let user = self
            .users
            .create(NewUser {
                email: email.to_string(),
                nickname: nickname.to_string(),
                hashed_password,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        if let Err(e) = self.notifier.user_registered(&user).await {
            tracing::warn!(user_id = %user.id, error = %e, "Registration notification failed");
        }

        Ok(user.into())
    }

    /// Verify a credential and issue an access token plus refresh artifact
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::NotFound("User"))?;

        if !self.check_password(password, &user.hashed_password).await? {
            tracing::warn!(user_id = %user.id, "Login rejected: password mismatch");
            return Err(AuthError::CredentialMismatch);
        }

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        let access_token = self.issue_access_token(&user)?;
        let refresh = self.issue_refresh(&user).await?;

        tracing::info!(
            user_id = %user.id,
            strategy = self.config.refresh_strategy.as_str(),
            "User logged in"
        );

        Ok(LoginOutcome {
            response: LoginResponse {
                access_token,
                user_id: user.id,
            },
            refresh,
        })
    }

    /// Drop the user's refresh artifact
    ///
    /// Idempotent. Signed refresh tokens cannot be withdrawn and stay
    /// redeemable until they expire.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AuthError> {
        match self.config.refresh_strategy {
            RefreshStrategy::Stateful => {
                self.sessions.update_refresh_token(user_id, None).await?;
                tracing::info!(user_id = %user_id, "Refresh token cleared");
            }
            RefreshStrategy::Stateless => {
                tracing::debug!(user_id = %user_id, "Stateless refresh tokens, nothing to revoke");
            }
        }
        Ok(())
    }

    /// Exchange a refresh artifact for a new access token
    pub async fn refresh(&self, artifact: &str) -> Result<RefreshOutcome, AuthError> {
        match self.config.refresh_strategy {
            RefreshStrategy::Stateful => self.redeem_opaque(artifact).await,
            RefreshStrategy::Stateless => self.redeem_signed(artifact).await,
        }
    }

    async fn redeem_opaque(&self, value: &str) -> Result<RefreshOutcome, AuthError> {
        let current_hash = hash_token(value);

        let user_id = self
            .sessions
            .find_user_by_refresh_token(&current_hash)
            .await?
            .ok_or(AuthError::NotFound("Refresh token"))?;

        let user = self.active_user(user_id).await?;
        let access_token = self.issue_access_token(&user)?;

        // Rotate: the presented value is single use
        let next = generate_refresh_value();
        let swapped = self
            .sessions
            .replace_refresh_token(user.id, &current_hash, &hash_token(&next))
            .await?;
        if !swapped {
            tracing::warn!(user_id = %user.id, "Refresh token redeemed concurrently");
            return Err(AuthError::NotFound("Refresh token"));
        }

        tracing::info!(user_id = %user.id, "Refresh token rotated");

        Ok(RefreshOutcome {
            response: LoginResponse {
                access_token,
                user_id: user.id,
            },
            rotated: Some(RefreshArtifact::Opaque(next)),
        })
    }

    async fn redeem_signed(&self, token: &str) -> Result<RefreshOutcome, AuthError> {
        let claims: Map<String, Value> = jwt::verify_token(token, self.secret())?;
        if !jwt::is_refresh_token(&claims) {
            return Err(AuthError::InvalidTokenType);
        }

        let claims: RefreshClaims =
            serde_json::from_value(Value::Object(claims)).map_err(|_| AuthError::InvalidFormat)?;

        let user = self.active_user(claims.user_id).await?;
        let access_token = self.issue_access_token(&user)?;

        tracing::info!(user_id = %user.id, "Access token refreshed");

        Ok(RefreshOutcome {
            response: LoginResponse {
                access_token,
                user_id: user.id,
            },
            rotated: None,
        })
    }

    /// Check signature, expiry and token type of an access token
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let claims: Map<String, Value> = jwt::verify_token(token, self.secret())?;

        if jwt::is_refresh_token(&claims) {
            return Err(AuthError::InvalidTokenType);
        }

        serde_json::from_value(Value::Object(claims)).map_err(|_| AuthError::InvalidFormat)
    }

    /// Full bearer check: valid access token for an existing, active account
    pub async fn authenticate(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let claims = self.verify_access_token(token)?;
        self.active_user(claims.user_id).await?;
        Ok(claims)
    }

    /// Admin gate, applied after [`AuthService::authenticate`]
    pub fn authorize_admin(&self, auth_level: AuthLevel) -> Result<(), AuthError> {
        if auth_level.is_admin() {
            Ok(())
        } else {
            Err(AuthError::InsufficientPrivileges)
        }
    }

    /// Get a user's public profile
    pub async fn get_me(&self, user_id: Uuid) -> Result<UserResponse, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::NotFound("User"))?;
        Ok(user.into())
    }

    /// Activate or deactivate an account
    pub async fn set_active_status(&self, user_id: Uuid, is_active: bool) -> Result<(), AuthError> {
        if !self.users.update_active_status(user_id, is_active).await? {
            return Err(AuthError::NotFound("User"));
        }
        tracing::info!(user_id = %user_id, is_active, "Account status updated");
        Ok(())
    }

    async fn active_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::NotFound("User"))?;

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }
        Ok(user)
    }

    fn issue_access_token(&self, user: &User) -> Result<String, AuthError> {
        Ok(jwt::generate_access_token(
            user,
            self.secret(),
            self.config.access_token_ttl_seconds,
        )?)
    }

    async fn issue_refresh(&self, user: &User) -> Result<RefreshArtifact, AuthError> {
        match self.config.refresh_strategy {
            RefreshStrategy::Stateful => {
                let value = generate_refresh_value();
                self.sessions
                    .update_refresh_token(user.id, Some(&hash_token(&value)))
                    .await?;
                Ok(RefreshArtifact::Opaque(value))
            }
            RefreshStrategy::Stateless => {
                let token = jwt::generate_refresh_token(
                    user,
                    self.secret(),
                    self.config.refresh_token_ttl_seconds,
                )?;
                Ok(RefreshArtifact::Signed(token))
            }
        }
    }

    async fn hash_password(&self, plain: &str) -> Result<PasswordRecord, AuthError> {
        let plain = plain.to_string();
        let cost = self.config.bcrypt_cost;

        tokio::task::spawn_blocking(move || password::hash_password(&plain, cost))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    async fn check_password(&self, plain: &str, stored: &str) -> Result<bool, AuthError> {
        let plain = plain.to_string();
        let record = PasswordRecord::from_stored(stored);

        tokio::task::spawn_blocking(move || password::verify_password(&plain, &record))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    fn secret(&self) -> &[u8] {
        self.config.jwt_secret.as_bytes()
    }
}

/// Generate an opaque refresh value from OS randomness
fn generate_refresh_value() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    codec::encode(bytes)
}

/// Hash a refresh value for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_values_are_random_and_256_bit() {
        let first = generate_refresh_value();
        let second = generate_refresh_value();

        assert_ne!(first, second);
        assert_eq!(codec::decode(&first).unwrap().len(), REFRESH_TOKEN_BYTES);
    }

    #[test]
    fn test_hash_token_is_stable_hex_sha256() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_jwt_errors_map_one_to_one() {
        assert_eq!(AuthError::from(JwtError::InvalidFormat), AuthError::InvalidFormat);
        assert_eq!(
            AuthError::from(JwtError::InvalidSignature),
            AuthError::InvalidSignature
        );
        assert_eq!(AuthError::from(JwtError::Expired), AuthError::Expired);
    }

    #[test]
    fn test_store_errors_map_to_auth_errors() {
        assert_eq!(
            AuthError::from(StoreError::Duplicate(UniqueField::Nickname)),
            AuthError::AlreadyExists(UniqueField::Nickname)
        );
        assert!(matches!(
            AuthError::from(StoreError::Unavailable("down".to_string())),
            AuthError::StorageFailure(_)
        ));
    }

    #[test]
    fn test_refresh_artifact_accessors() {
        let artifact = RefreshArtifact::Opaque("abc".to_string());
        assert_eq!(artifact.as_str(), "abc");
        assert_eq!(artifact.into_string(), "abc");
    }
}
