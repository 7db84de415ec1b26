//! JWT token generation and validation
//!
//! Compact HS256 tokens are assembled here from the base64url codec and the
//! HMAC signer. Only `HS256` is issued or accepted.

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::{codec, signer};
use crate::models::{AuthLevel, User};

/// The only header this service emits
const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

const ALGORITHM: &str = "HS256";

/// Value of the `type` claim carried by refresh tokens
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// JWT-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("Invalid token format")]
    InvalidFormat,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),
}

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

/// Claims carried by access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    /// Subject (user ID)
    pub user_id: Uuid,
    pub email: String,
    pub auth_level: AuthLevel,
    /// Issued at (Unix timestamp), set at issuance
    #[serde(default)]
    pub iat: i64,
    /// Expiration (Unix timestamp), set at issuance
    #[serde(default)]
    pub exp: i64,
}

impl AccessClaims {
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            auth_level: user.auth_level,
            iat: 0,
            exp: 0,
        }
    }
}

/// Claims carried by stateless refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    pub user_id: Uuid,
    pub email: String,
    #[serde(rename = "type")]
    pub token_type: String,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub exp: i64,
}

/// Current Unix time in seconds
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Sign `payload` as a compact token valid for `ttl_seconds` from now
///
/// `iat` and `exp` are always set here, replacing any values in `payload`.
pub fn issue_token<T: Serialize>(
    payload: &T,
    secret: &[u8],
    ttl_seconds: i64,
) -> Result<String, JwtError> {
    issue_token_at(payload, secret, ttl_seconds, now())
}

/// [`issue_token`] with an explicit issuance time
pub fn issue_token_at<T: Serialize>(
    payload: &T,
    secret: &[u8],
    ttl_seconds: i64,
    now: i64,
) -> Result<String, JwtError> {
    let mut claims = match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(JwtError::EncodingFailed(
                "payload must serialize to a JSON object".to_string(),
            ))
        }
        Err(e) => return Err(JwtError::EncodingFailed(e.to_string())),
    };

    let exp = now
        .checked_add(ttl_seconds)
        .ok_or_else(|| JwtError::EncodingFailed(format!("ttl {} overflows exp", ttl_seconds)))?;

    claims.insert("iat".to_string(), Value::from(now));
    claims.insert("exp".to_string(), Value::from(exp));

    let payload_json =
        serde_json::to_vec(&claims).map_err(|e| JwtError::EncodingFailed(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        codec::encode(HEADER_JSON),
        codec::encode(payload_json)
    );
    let signature = signer::sign(&signing_input, secret);

    Ok(format!("{}.{}", signing_input, signature))
}

/// Verify a compact token and decode its payload
///
/// Checks run in a fixed order: segment count, signature, header and
/// payload decoding, then expiry. A bad signature is therefore reported
/// before anything about the payload is looked at.
pub fn verify_token<T: DeserializeOwned>(token: &str, secret: &[u8]) -> Result<T, JwtError> {
    verify_token_at(token, secret, now())
}

/// [`verify_token`] against an explicit current time
pub fn verify_token_at<T: DeserializeOwned>(
    token: &str,
    secret: &[u8],
    now: i64,
) -> Result<T, JwtError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(JwtError::InvalidFormat);
    };

    let signing_input = &token[..header.len() + 1 + payload.len()];
    if !signer::verify(signing_input, signature, secret) {
        return Err(JwtError::InvalidSignature);
    }

    let header: Header = decode_segment(header)?;
    if header.alg != ALGORITHM {
        return Err(JwtError::InvalidFormat);
    }

    let claims: Map<String, Value> = decode_segment(payload)?;
    let exp = claims
        .get("exp")
        .and_then(Value::as_i64)
        .ok_or(JwtError::InvalidFormat)?;

    if now >= exp {
        return Err(JwtError::Expired);
    }

    serde_json::from_value(Value::Object(claims)).map_err(|_| JwtError::InvalidFormat)
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, JwtError> {
    let bytes = codec::decode(segment).map_err(|_| JwtError::InvalidFormat)?;
    serde_json::from_slice(&bytes).map_err(|_| JwtError::InvalidFormat)
}

/// Whether a verified payload is marked as a refresh token
pub fn is_refresh_token(claims: &Map<String, Value>) -> bool {
    claims.get("type").and_then(Value::as_str) == Some(REFRESH_TOKEN_TYPE)
}

/// Generate an access token for a user
pub fn generate_access_token(
    user: &User,
    secret: &[u8],
    ttl_seconds: i64,
) -> Result<String, JwtError> {
    issue_token(&AccessClaims::for_user(user), secret, ttl_seconds)
}

/// Generate a stateless refresh token for a user
pub fn generate_refresh_token(
    user: &User,
    secret: &[u8],
    ttl_seconds: i64,
) -> Result<String, JwtError> {
    let claims = RefreshClaims {
        user_id: user.id,
        email: user.email.clone(),
        token_type: REFRESH_TOKEN_TYPE.to_string(),
        iat: 0,
        exp: 0,
    };
    issue_token(&claims, secret, ttl_seconds)
}
