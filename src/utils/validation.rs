//! Validation Utilities
//!
//! Input validation functions for request payloads, shared between the
//! `validator` derive attributes and ad-hoc checks.

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

/// Validates email address format
pub fn validate_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    regex.is_match(email)
}

/// Normalizes email address to lowercase and removes whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates that a name contains only allowed characters and length
pub fn validate_name(name: &str) -> bool {
    let trimmed = name.trim();

    if trimmed.is_empty() || trimmed.len() > 255 {
        return false;
    }

    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = NAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z\s\-']+$").expect("Failed to compile name regex"));

    regex.is_match(trimmed)
}

/// Validates an international phone number (E.164-ish, 7-15 digits)
pub fn validate_phone(phone: &str) -> bool {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX
        .get_or_init(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("Failed to compile phone regex"));

    regex.is_match(phone.trim())
}

/// Validates a URL-safe slug for catalog entities
pub fn validate_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.len() > 128 {
        return false;
    }

    static SLUG_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = SLUG_REGEX
        .get_or_init(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("Failed to compile slug regex"));

    regex.is_match(slug)
}

/// Validates a 6-digit numeric verification or OTP code
pub fn validate_numeric_code(code: &str) -> bool {
    code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
}

/// Custom validator for email fields using the validator crate
pub fn email_validator(email: &str) -> Result<(), ValidationError> {
    if validate_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email"))
    }
}

/// Custom validator for name fields using the validator crate
pub fn name_validator(name: &str) -> Result<(), ValidationError> {
    if validate_name(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_name"))
    }
}

/// Custom validator for phone fields using the validator crate
pub fn phone_validator(phone: &str) -> Result<(), ValidationError> {
    if validate_phone(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone"))
    }
}

/// Custom validator for slug fields using the validator crate
pub fn slug_validator(slug: &str) -> Result<(), ValidationError> {
    if validate_slug(slug) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_slug"))
    }
}

/// Custom validator for 6-digit verification codes using the validator crate
pub fn verification_code_validator(code: &str) -> Result<(), ValidationError> {
    if validate_numeric_code(code) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_verification_code"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@example.com"));
        assert!(validate_email("a.b+tag@sub.example.org"));
        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("missing@tld"));
        assert!(!validate_email("@example.com"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Alice Smith"));
        assert!(validate_name("Anne-Marie O'Neil"));
        assert!(!validate_name(""));
        assert!(!validate_name(&"a".repeat(256)));
        assert!(!validate_name("Robert; DROP TABLE users"));
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+14155550123"));
        assert!(validate_phone("07700900123"));
        assert!(!validate_phone("555-0123"));
        assert!(!validate_phone("123"));
        assert!(!validate_phone("+123456789012345678"));
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("blue-widget"));
        assert!(validate_slug("widget2"));
        assert!(!validate_slug("Blue Widget"));
        assert!(!validate_slug("-leading"));
        assert!(!validate_slug(""));
    }

    #[test]
    fn test_validate_numeric_code() {
        assert!(validate_numeric_code("123456"));
        assert!(!validate_numeric_code("12345"));
        assert!(!validate_numeric_code("12345a"));
    }
}
