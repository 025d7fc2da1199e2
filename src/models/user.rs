//! User Model
//!
//! Core user data structures, including the single-use verification codes
//! used for email verification, OTP sign-in, and password resets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User representation for external API responses
///
/// This struct represents a user profile without sensitive information like
/// password hashes. All datetime fields use UTC.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique identifier for the user
    pub id: Uuid,

    /// User's display name
    pub name: String,

    /// User's email address (unique, normalized)
    pub email: String,

    /// User's phone number (unique)
    pub phone: String,

    /// Whether the user's email address has been verified
    pub email_verified: bool,

    /// Timestamp when the user account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the user profile was last modified
    pub updated_at: DateTime<Utc>,
}

/// Internal user representation including the password hash
///
/// Used internally by the auth service and stores. Never exposed in API
/// responses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserWithSecrets {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserWithSecrets> for User {
    fn from(user: UserWithSecrets) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            email_verified: user.email_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Purpose of a single-use verification code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "code_purpose", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CodePurpose {
    /// Email-address verification after signup
    EmailVerify,
    /// One-time passcode for passwordless sign-in
    LoginOtp,
    /// Password reset token
    PasswordReset,
}

/// A single-use, time-bounded verification code bound to a user
///
/// Only a SHA-256 hash of the code is stored; the plaintext is sent to the
/// user out of band and never persisted.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerificationCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub purpose: CodePurpose,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    /// Whether the code has passed its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Whether the code has already been redeemed
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// Whether the code can still be redeemed given an attempt cap
    pub fn is_usable(&self, max_attempts: i32) -> bool {
        !self.is_expired() && !self.is_consumed() && self.attempts < max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_code(expires_in_minutes: i64, attempts: i32) -> VerificationCode {
        VerificationCode {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            purpose: CodePurpose::EmailVerify,
            code_hash: "hash".to_string(),
            expires_at: Utc::now() + Duration::minutes(expires_in_minutes),
            attempts,
            consumed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_conversion_drops_password_hash() {
        let secret_user = UserWithSecrets {
            id: Uuid::new_v4(),
            name: "Alice Smith".to_string(),
            email: "alice@example.com".to_string(),
            phone: "+14155550123".to_string(),
            password_hash: "$2b$12$hash".to_string(),
            email_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let user: User = secret_user.clone().into();
        assert_eq!(user.id, secret_user.id);
        assert_eq!(user.email, secret_user.email);
        let serialized = serde_json::to_string(&user).unwrap();
        assert!(!serialized.contains("hash"));
    }

    #[test]
    fn test_code_usability() {
        assert!(sample_code(10, 0).is_usable(3));
        assert!(!sample_code(-1, 0).is_usable(3));
        assert!(!sample_code(10, 3).is_usable(3));

        let mut consumed = sample_code(10, 0);
        consumed.consumed_at = Some(Utc::now());
        assert!(!consumed.is_usable(3));
    }
}
