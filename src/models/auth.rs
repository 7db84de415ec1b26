//! Authentication request/response models

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::AuthLevel;

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 50))]
    pub nickname: String,
}

/// Login credential
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Login / refresh response body
///
/// The refresh artifact travels out of band as a cookie.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoginResponse {
    pub access_token: String,
    pub user_id: Uuid,
}

/// User response (sanitized for API)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub is_active: bool,
    pub auth_level: AuthLevel,
}

/// Logout response
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Admin request to activate or deactivate an account
#[derive(Debug, Deserialize)]
pub struct UpdateActiveStatusRequest {
    pub is_active: bool,
}
