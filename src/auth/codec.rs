//! Base64url codec
//!
//! URL-safe base64 without padding, as used by every segment of a compact
//! token. Decoding accepts unpadded input and re-pads it before decoding.

use base64::{engine::general_purpose::URL_SAFE, engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use thiserror::Error;

/// Decoding errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid base64url input: {0}")]
    Malformed(String),
}

/// Encode bytes as unpadded base64url text
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded (or padded) base64url text
pub fn decode(text: &str) -> Result<Vec<u8>, CodecError> {
    let mut padded = String::with_capacity(text.len() + 3);
    padded.push_str(text);
    while padded.len() % 4 != 0 {
        padded.push('=');
    }

    URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| CodecError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uses_url_safe_alphabet() {
        // 0xfb 0xff encodes to "+/8=" in the standard alphabet
        let encoded = encode([0xfb, 0xff]);
        assert_eq!(encoded, "-_8");
        assert!(!encoded.contains('='));
    }

    #[test]
    fn test_round_trip_with_nul_bytes() {
        let raw = b"\x00header\x00\x00payload\xff\x00";
        let decoded = decode(&encode(raw)).unwrap();
        assert_eq!(decoded, raw);
    }

    #[test]
    fn test_round_trip_every_padding_length() {
        for len in 0..8usize {
            let raw: Vec<u8> = (0..len as u8).collect();
            assert_eq!(decode(&encode(&raw)).unwrap(), raw);
        }
    }

    #[test]
    fn test_decode_accepts_padded_input() {
        assert_eq!(decode("aGk=").unwrap(), b"hi");
        assert_eq!(decode("aGk").unwrap(), b"hi");
    }

    #[test]
    fn test_decode_rejects_standard_alphabet() {
        assert!(matches!(decode("+/8"), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_decode_rejects_impossible_length() {
        // A single trailing sextet cannot encode a whole byte
        assert!(decode("abcde").is_err());
    }
}
