//! Authentication routes

use axum::{routing::post, Router};

use crate::handlers::auth;
use crate::middleware::no_store_layer;
use crate::state::AppState;

/// Create authentication routes
///
/// Every response here may carry a token, so none of them are cacheable.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/v1/login", post(auth::login))
        .route("/api/user/v1/logout", post(auth::logout))
        .route("/api/user/v1/token/refresh", post(auth::refresh_token))
        .layer(no_store_layer())
}
