//! Authentication middleware
//!
//! Extractors for bearer token verification and user extraction.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthError, AuthService};
use crate::error::ApiError;
use crate::models::AuthLevel;

/// Authenticated user extracted from an access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub auth_level: AuthLevel,
}

/// Error response for authentication failures
#[derive(Debug, Serialize)]
struct AuthRejection {
    #[serde(skip)]
    status: StatusCode,
    error: AuthRejectionDetails,
}

#[derive(Debug, Serialize)]
struct AuthRejectionDetails {
    code: String,
    message: String,
}

impl AuthRejection {
    fn new(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            error: AuthRejectionDetails {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }

    fn unauthorized(code: &str, message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Turn a failed check into a response; store and internal failures keep
/// their server-error status
fn reject(err: AuthError) -> Response {
    let rejection = match err {
        AuthError::Expired => AuthRejection::unauthorized("TOKEN_EXPIRED", "Token has expired"),
        AuthError::InvalidTokenType => {
            AuthRejection::unauthorized("INVALID_TOKEN_TYPE", "Expected access token")
        }
        AuthError::AccountInactive => {
            AuthRejection::unauthorized("ACCOUNT_INACTIVE", "User account is not active")
        }
        AuthError::InvalidFormat | AuthError::InvalidSignature | AuthError::NotFound(_) => {
            AuthRejection::unauthorized("INVALID_TOKEN", "Invalid token")
        }
        AuthError::InsufficientPrivileges => {
            AuthRejection::new(StatusCode::FORBIDDEN, "FORBIDDEN", "Admin access required")
        }
        other => return ApiError::from(other).into_response(),
    };
    rejection.into_response()
}

/// Extractor for authenticated users
///
/// Verifies the bearer token from the Authorization header, rejects refresh
/// tokens, and checks that the account still exists and is active.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, user {}", user.user_id)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AuthRejection::unauthorized(
                        "MISSING_TOKEN",
                        "Authorization header with Bearer token required",
                    )
                    .into_response()
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims = auth_service.authenticate(bearer.token()).await.map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            reject(e)
        })?;

        Ok(AuthenticatedUser {
            user_id: claims.user_id,
            email: claims.email,
            auth_level: claims.auth_level,
        })
    }
}

/// Extractor requiring an administrator
pub struct AdminUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        let auth_service = Arc::<AuthService>::from_ref(state);
        auth_service.authorize_admin(user.auth_level).map_err(|e| {
            tracing::warn!(user_id = %user.user_id, "Admin route refused");
            reject(e)
        })?;

        Ok(AdminUser(user))
    }
}
