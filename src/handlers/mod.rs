//! API handlers for the keyword alert backend

pub mod auth;
pub mod user;

pub use auth::*;
pub use user::*;

// Re-export extractors from middleware for handler use
pub use crate::middleware::auth::{AdminUser, AuthenticatedUser};
