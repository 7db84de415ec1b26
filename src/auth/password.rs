//! Password hashing and verification
//!
//! bcrypt with a per-call random salt. The cost is embedded in each record,
//! so records hashed under an older cost keep verifying after it changes.

use std::fmt;

/// Lowest accepted bcrypt cost
pub const MIN_BCRYPT_COST: u32 = 10;

/// Default bcrypt cost
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// A salted bcrypt hash as stored in `users.hashed_password`
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordRecord(String);

impl PasswordRecord {
    /// Wrap a hash loaded from storage
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for PasswordRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordRecord(..)")
    }
}

/// Hash a password at the given cost
pub fn hash_password(plain: &str, cost: u32) -> Result<PasswordRecord, bcrypt::BcryptError> {
    let cost = cost.max(MIN_BCRYPT_COST);
    bcrypt::hash(plain, cost).map(PasswordRecord)
}

/// Verify a password against a stored record
///
/// Malformed records never verify.
pub fn verify_password(plain: &str, record: &PasswordRecord) -> bool {
    bcrypt::verify(plain, record.as_str()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let record = hash_password("pw123456", MIN_BCRYPT_COST).unwrap();
        assert!(verify_password("pw123456", &record));
        assert!(!verify_password("pw1234567", &record));
        assert!(!verify_password("", &record));
    }

    #[test]
    fn test_hash_is_salted_per_call() {
        let first = hash_password("same-password", MIN_BCRYPT_COST).unwrap();
        let second = hash_password("same-password", MIN_BCRYPT_COST).unwrap();

        assert_ne!(first, second);
        assert!(verify_password("same-password", &first));
        assert!(verify_password("same-password", &second));
    }

    #[test]
    fn test_cost_is_clamped_to_minimum() {
        let record = hash_password("pw", 4).unwrap();
        assert!(record.as_str().starts_with("$2b$10$"));
    }

    #[test]
    fn test_unsalted_sha256_record_does_not_verify() {
        // hex SHA-256 of "password"
        let legacy = PasswordRecord::from_stored(
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8",
        );
        assert!(!verify_password("password", &legacy));
    }

    #[test]
    fn test_debug_does_not_leak_hash() {
        let record = PasswordRecord::from_stored("$2b$10$abcdef");
        assert_eq!(format!("{:?}", record), "PasswordRecord(..)");
    }
}
