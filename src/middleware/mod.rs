//! Middleware for the keyword alert API
//!
//! This module provides middleware for request tracing, response headers,
//! and authentication.

pub mod auth;
mod security;
mod tracing;

pub use auth::{AdminUser, AuthenticatedUser};
pub use security::{no_store_layer, security_headers};
pub use tracing::request_tracing;
