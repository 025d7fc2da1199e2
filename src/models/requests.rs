//! Request and Response Models
//!
//! Data structures for API request and response payloads with validation.
//! Every request body is schema-checked before any business logic runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::order::OrderStatus;
use crate::models::user::User;
use crate::utils::validation::{
    email_validator, name_validator, phone_validator, slug_validator, verification_code_validator,
};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Request payload for creating a new user account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    /// User's display name (1-255 characters)
    #[validate(custom(function = name_validator))]
    pub name: String,

    /// User's email address (must be unique and valid format)
    #[validate(custom(function = email_validator))]
    pub email: String,

    /// User's phone number (must be unique)
    #[validate(custom(function = phone_validator))]
    pub phone: String,

    /// User's password (8-128 characters with strength requirements)
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    #[validate(custom(function = validate_password_strength))]
    pub password: String,
}

/// Request payload for password login
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = email_validator))]
    pub email: String,

    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

/// Request payload for requesting a sign-in OTP
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OtpRequest {
    #[validate(custom(function = email_validator))]
    pub email: String,
}

/// Request payload for OTP verification and sign-in
#[derive(Debug, Deserialize, Validate)]
pub struct OtpVerifyRequest {
    #[validate(custom(function = email_validator))]
    pub email: String,

    /// 6-digit OTP code received out of band
    #[validate(custom(function = verification_code_validator))]
    pub otp_code: String,
}

/// Request payload for email verification
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(custom(function = email_validator))]
    pub email: String,

    /// 6-digit verification code
    #[validate(custom(function = verification_code_validator))]
    pub verification_code: String,
}

/// Request payload for initiating a password reset
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(custom(function = email_validator))]
    pub email: String,
}

/// Request payload for completing a password reset
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(custom(function = email_validator))]
    pub email: String,

    /// Reset token received out of band
    #[validate(length(min = 1, message = "Reset token cannot be empty"))]
    pub reset_token: String,

    /// New password (8-128 characters with strength requirements)
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    #[validate(custom(function = validate_password_strength))]
    pub new_password: String,
}

/// Request payload for refreshing access tokens
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    /// Refresh token to exchange for a new access token
    #[validate(length(min = 1, message = "Refresh token cannot be empty"))]
    pub refresh_token: String,
}

/// Request payload for revoking a single session
#[derive(Debug, Deserialize, Validate)]
pub struct LogoutRequest {
    #[validate(length(min = 1, message = "Refresh token cannot be empty"))]
    pub refresh_token: String,
}

/// Request payload for updating profile information
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(custom(function = name_validator))]
    pub name: Option<String>,

    #[validate(custom(function = phone_validator))]
    pub phone: Option<String>,
}

/// Response for signup: the verification artifact has been dispatched
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user_id: Uuid,
    /// Seconds until the verification code expires
    pub expires_in: i64,
}

/// Response carrying a token pair and the authenticated user
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

/// Response for token refresh operations
#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Generic acknowledgement response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

/// Request payload for adding a variant to the cart
#[derive(Debug, Deserialize, Validate)]
pub struct AddCartItemRequest {
    pub variant_id: Uuid,

    #[validate(range(min = 1, max = 999, message = "Quantity must be between 1 and 999"))]
    pub quantity: i32,
}

/// Request payload for changing a cart line's quantity
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCartItemRequest {
    #[validate(range(min = 1, max = 999, message = "Quantity must be between 1 and 999"))]
    pub quantity: i32,
}

// ---------------------------------------------------------------------------
// Orders & payment
// ---------------------------------------------------------------------------

/// Asynchronous payment-gateway callback payload
///
/// `signature` is a hex SHA-256 over the shared secret, transaction
/// reference, and status, verified before the order is touched.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentCallbackRequest {
    #[validate(length(min = 1, message = "Transaction reference cannot be empty"))]
    pub transaction_ref: String,

    /// Gateway-reported outcome: "succeeded" or "failed"
    #[validate(length(min = 1, message = "Status cannot be empty"))]
    pub status: String,

    #[validate(length(min = 1, message = "Signature cannot be empty"))]
    pub signature: String,
}

/// Response for the payment-status check
#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub transaction_ref: Option<String>,
    pub paid: bool,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Request payload for creating a product
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    #[validate(custom(function = slug_validator))]
    pub slug: String,

    pub description: Option<String>,
    pub category_id: Option<Uuid>,
}

/// Request payload for updating a product
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,
    pub category_id: Option<Uuid>,
}

/// Request payload for toggling a boolean catalog flag
#[derive(Debug, Deserialize)]
pub struct SetFlagRequest {
    pub value: bool,
}

/// Request payload for creating a category
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    #[validate(custom(function = slug_validator))]
    pub slug: String,
}

/// Request payload for updating a category
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: Option<String>,
}

/// Request payload for creating a variant
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVariantRequest {
    pub product_id: Uuid,

    #[validate(length(min = 1, max = 64, message = "SKU must be between 1 and 64 characters"))]
    pub sku: String,

    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_cents: i64,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
}

/// Request payload for updating a variant
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateVariantRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: Option<String>,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_cents: Option<i64>,
}

/// Request payload for adjusting variant stock by a signed delta
#[derive(Debug, Deserialize, Validate)]
pub struct AdjustStockRequest {
    #[validate(range(min = -9999, max = 9999, message = "Delta out of range"))]
    pub delta: i32,
}

/// Response for health check
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Validates password strength according to security requirements
fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(ValidationError::new(
            "Password must contain at least one lowercase letter",
        ));
    }

    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(ValidationError::new(
            "Password must contain at least one uppercase letter",
        ));
    }

    if !password.chars().any(|c| c.is_numeric()) {
        return Err(ValidationError::new(
            "Password must contain at least one digit",
        ));
    }

    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err(ValidationError::new(
            "Password must contain at least one special character",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_strength_validation() {
        assert!(validate_password_strength("SecurePass123!").is_ok());
        assert!(validate_password_strength("SECUREPASS123!").is_err());
        assert!(validate_password_strength("securepass123!").is_err());
        assert!(validate_password_strength("SecurePass!").is_err());
        assert!(validate_password_strength("SecurePass123").is_err());
    }

    #[test]
    fn test_signup_request_validation() {
        let request = SignupRequest {
            name: "Alice Smith".to_string(),
            email: "alice@example.com".to_string(),
            phone: "+14155550123".to_string(),
            password: "SecurePass123!".to_string(),
        };
        assert!(request.validate().is_ok());

        let bad_email = SignupRequest {
            email: "not-an-email".to_string(),
            ..request.clone()
        };
        assert!(bad_email.validate().is_err());

        let bad_phone = SignupRequest {
            phone: "555-0123".to_string(),
            ..request
        };
        assert!(bad_phone.validate().is_err());
    }

    #[test]
    fn test_otp_verify_request_validation() {
        let request = OtpVerifyRequest {
            email: "alice@example.com".to_string(),
            otp_code: "123456".to_string(),
        };
        assert!(request.validate().is_ok());

        let invalid = OtpVerifyRequest {
            email: "alice@example.com".to_string(),
            otp_code: "12345".to_string(),
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_reset_password_request_validation() {
        let request = ResetPasswordRequest {
            email: "alice@example.com".to_string(),
            reset_token: "sometoken".to_string(),
            new_password: "NewSecure123!".to_string(),
        };
        assert!(request.validate().is_ok());

        let weak = ResetPasswordRequest {
            email: "alice@example.com".to_string(),
            reset_token: "sometoken".to_string(),
            new_password: "weak".to_string(),
        };
        assert!(weak.validate().is_err());
    }

    #[test]
    fn test_cart_item_request_validation() {
        let request = AddCartItemRequest {
            variant_id: Uuid::new_v4(),
            quantity: 2,
        };
        assert!(request.validate().is_ok());

        let zero = AddCartItemRequest {
            variant_id: Uuid::new_v4(),
            quantity: 0,
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_create_product_request_validation() {
        let request = CreateProductRequest {
            name: "Blue Widget".to_string(),
            slug: "blue-widget".to_string(),
            description: None,
            category_id: None,
        };
        assert!(request.validate().is_ok());

        let bad_slug = CreateProductRequest {
            slug: "Blue Widget".to_string(),
            ..request
        };
        assert!(bad_slug.validate().is_err());
    }

    #[test]
    fn test_create_variant_request_validation() {
        let request = CreateVariantRequest {
            product_id: Uuid::new_v4(),
            sku: "WID-BLU-L".to_string(),
            name: "Large / Blue".to_string(),
            price_cents: 1999,
            stock: 10,
        };
        assert!(request.validate().is_ok());

        let negative = CreateVariantRequest {
            price_cents: -1,
            ..request
        };
        assert!(negative.validate().is_err());
    }
}
