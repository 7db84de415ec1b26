//! Health check route

use axum::{routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;

use crate::db;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: String,
    version: &'static str,
}

/// Health check endpoint; reports the in-memory store when no pool is configured
pub fn health_routes<S>(pool: Option<PgPool>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(move || health_check(pool.clone())))
}

async fn health_check(pool: Option<PgPool>) -> Json<HealthResponse> {
    let (status, database) = match pool {
        Some(pool) => match db::check_health(&pool).await {
            Ok(()) => ("healthy", "connected".to_string()),
            Err(e) => ("unhealthy", format!("error: {}", e)),
        },
        None => ("healthy", "in-memory".to_string()),
    };

    Json(HealthResponse {
        status,
        database,
        version: env!("CARGO_PKG_VERSION"),
    })
}
