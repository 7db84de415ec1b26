//! Authentication HTTP handlers
//!
//! Login, logout and refresh. The refresh artifact never appears in a
//! response body; it travels in the `refresh_token` cookie.

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::models::{LoginRequest, LoginResponse, LogoutResponse};
use crate::state::{AppState, CookieSettings};

/// Name of the cookie carrying the refresh artifact
pub const REFRESH_COOKIE: &str = "refresh_token";

fn refresh_cookie(value: String, settings: CookieSettings) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, value))
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::None)
        .path("/")
        .max_age(time::Duration::seconds(settings.max_age_seconds))
        .build()
}

/// POST /api/user/v1/login - Verify credentials and issue tokens
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    req.validate()?;

    let outcome = state.auth_service.login(&req.email, &req.password).await?;
    let jar = jar.add(refresh_cookie(outcome.refresh.into_string(), state.cookie));

    Ok((jar, Json(outcome.response)))
}

/// POST /api/user/v1/logout - Revoke the refresh artifact and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<LogoutResponse>), ApiError> {
    state.auth_service.logout(user.user_id).await?;

    // CookieJar::remove emits nothing unless the request carried the cookie
    let mut removal = refresh_cookie(String::new(), state.cookie);
    removal.make_removal();
    let jar = jar.add(removal);

    Ok((
        jar,
        Json(LogoutResponse {
            message: "Successfully logged out".to_string(),
        }),
    ))
}

/// POST /api/user/v1/token/refresh - Exchange the refresh cookie for a new access token
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| ApiError::Unauthorized("Refresh token cookie missing".to_string()))?;

    let outcome = state.auth_service.refresh(&presented).await?;

    let jar = match outcome.rotated {
        Some(next) => jar.add(refresh_cookie(next.into_string(), state.cookie)),
        None => jar,
    };

    Ok((jar, Json(outcome.response)))
}
