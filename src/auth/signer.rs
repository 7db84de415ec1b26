//! HMAC-SHA256 signing
//!
//! Signatures are the raw 32-byte MAC, base64url-encoded.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::codec;

type HmacSha256 = Hmac<Sha256>;

fn keyed(secret: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(secret).expect("HMAC can accept any key length")
}

/// Sign a message with the given secret
pub fn sign(message: &str, secret: &[u8]) -> String {
    let mut mac = keyed(secret);
    mac.update(message.as_bytes());
    codec::encode(mac.finalize().into_bytes())
}

/// Check a base64url signature against a message in constant time
///
/// A signature that is not valid base64url is treated as a mismatch.
pub fn verify(message: &str, signature: &str, secret: &[u8]) -> bool {
    let Ok(provided) = codec::decode(signature) else {
        return false;
    };

    let mut mac = keyed(secret);
    mac.update(message.as_bytes());
    mac.verify_slice(&provided).is_ok()
}
