//! User route definitions

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers::user::{get_me, register, set_active_status};
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/v1/", post(register))
        .route("/api/user/v1/me", get(get_me))
        .route("/api/user/v1/:id/active", patch(set_active_status))
}
