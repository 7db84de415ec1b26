//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthService;
use crate::config::Config;

/// Refresh cookie attributes
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age_seconds: i64,
}

impl CookieSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            secure: config.cookie_secure,
            max_age_seconds: config.auth.refresh_token_ttl_seconds,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub cookie: CookieSettings,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>, cookie: CookieSettings) -> Self {
        Self {
            auth_service,
            cookie,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}
