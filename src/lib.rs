//! Keyword Alert Backend Library
//!
//! Authentication core for the keyword alert server: account registration,
//! password login, signed access tokens and refresh-token handling, plus the
//! axum surface that exposes them.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod routes;
pub mod state;
pub mod store;

use axum::Router;
use sqlx::PgPool;

use state::AppState;

/// Assemble the application router
pub fn build_router(app_state: AppState, db_pool: Option<PgPool>) -> Router {
    Router::new()
        .merge(routes::health_routes(db_pool))
        .merge(routes::user_routes())
        .merge(routes::auth_routes())
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
}
