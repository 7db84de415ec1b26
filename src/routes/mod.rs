//! Route definitions for the keyword alert API

mod auth;
mod health;
mod user;

pub use auth::auth_routes;
pub use health::health_routes;
pub use user::user_routes;
