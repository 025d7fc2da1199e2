//! Security Utilities
//!
//! Password hashing, one-time code generation, token hashing, and related
//! helpers shared by the auth and payment flows.

use bcrypt::{hash, verify, DEFAULT_COST};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

/// Default bcrypt cost for password hashing
pub const DEFAULT_BCRYPT_COST: u32 = DEFAULT_COST;

/// Generate a cryptographically secure random alphanumeric string
pub fn generate_secure_token(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Generate a 6-digit numeric one-time code
pub fn generate_otp_code() -> String {
    rand::thread_rng().gen_range(100000..=999999).to_string()
}

/// Hash a password with a given bcrypt cost
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}

/// Verify a password against its bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, hash)
}

/// SHA-256 hash of sensitive data for storage (refresh tokens, reset codes)
pub fn hash_sensitive_data(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Timing-safe string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_token_length_and_uniqueness() {
        let a = generate_secure_token(32);
        let b = generate_secure_token(32);
        assert_eq!(a.len(), 32);
        assert_eq!(b.len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_otp_code_is_six_digits() {
        for _ in 0..50 {
            let code = generate_otp_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hashed = hash_password_with_cost("SecurePass123!", 4).unwrap();
        assert_ne!(hashed, "SecurePass123!");
        assert!(verify_password("SecurePass123!", &hashed).unwrap());
        assert!(!verify_password("WrongPass123!", &hashed).unwrap());
    }

    #[test]
    fn test_sensitive_data_hash_is_deterministic() {
        let h1 = hash_sensitive_data("token");
        let h2 = hash_sensitive_data("token");
        let h3 = hash_sensitive_data("other");
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc123", "abc12"));
    }
}
