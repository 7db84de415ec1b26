//! User-related API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::{AdminUser, AuthenticatedUser};
use crate::error::ApiError;
use crate::models::{RegisterRequest, UpdateActiveStatusRequest, UserResponse};
use crate::state::AppState;

/// POST /api/user/v1/ - Register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    req.validate()?;

    let user = state
        .auth_service
        .register(&req.email, &req.password, &req.nickname)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/user/v1/me - Get the current user's profile
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserResponse>, ApiError> {
    let profile = state.auth_service.get_me(user.user_id).await?;
    Ok(Json(profile))
}

/// PATCH /api/user/v1/:id/active - Activate or deactivate an account
pub async fn set_active_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateActiveStatusRequest>,
) -> Result<StatusCode, ApiError> {
    tracing::info!(admin_id = %admin.user_id, target = %user_id, "Changing account status");

    state
        .auth_service
        .set_active_status(user_id, req.is_active)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
