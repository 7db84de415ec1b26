//! Keyword Alert Backend Server
//!
//! Serves the user account and authentication API: registration, login,
//! logout, token refresh and account administration.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

use keyword_alert_server::auth::AuthService;
use keyword_alert_server::config::Config;
use keyword_alert_server::state::{AppState, CookieSettings};
use keyword_alert_server::store::{MemoryStore, PgStore, SessionStore, UserStore};
use keyword_alert_server::{build_router, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match Config::from_env().await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_line_number(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        refresh_strategy = config.auth.refresh_strategy.as_str(),
        "Starting keyword alert server"
    );

    // Pick the persistence backend
    let users: Arc<dyn UserStore>;
    let sessions: Arc<dyn SessionStore>;
    let db_pool = if config.database_url.is_some() {
        let pool = db::create_pool(&config).await?;
        db::run_migrations(&pool).await?;
        let store = Arc::new(PgStore::new(pool.clone()));
        users = store.clone();
        sessions = store;
        Some(pool)
    } else {
        tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
        let store = Arc::new(MemoryStore::new());
        users = store.clone();
        sessions = store;
        None
    };

    let auth_service = Arc::new(AuthService::new(users, sessions, config.auth.clone()));
    let app_state = AppState::new(auth_service, CookieSettings::from_config(&config));

    let app = build_router(app_state, db_pool);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
