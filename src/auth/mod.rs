//! Authentication module
//!
//! Password-based authentication with hand-assembled HS256 tokens.
//! - base64url codec and HMAC-SHA256 signer
//! - Compact token issuance and verification
//! - bcrypt password hashing
//! - Refresh tokens, either opaque and rotated or signed and stateless

pub mod codec;
pub mod jwt;
pub mod password;
mod service;
pub mod signer;

pub use jwt::{verify_token, AccessClaims, JwtError, RefreshClaims};
pub use password::{hash_password, verify_password, PasswordRecord};
pub use service::{AuthError, AuthService, LoginOutcome, RefreshArtifact, RefreshOutcome};
