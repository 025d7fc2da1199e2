//! HTTP Request Handlers
//!
//! Axum handlers for auth, profile, and cart endpoints. Every handler with
//! a body validates it first, so nothing malformed reaches the services.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::cart::Cart,
    models::requests::*,
    models::{TokenPair, User},
    service::{
        AuthService, CartService, CatalogService, JwtService, OrderService, RateLimitService,
    },
    utils::error::{AppError, AppResult},
    VERSION,
};

use super::middleware::AuthUser;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub jwt_service: Arc<JwtService>,
    pub cart_service: Arc<CartService>,
    pub order_service: Arc<OrderService>,
    pub catalog_service: Arc<CatalogService>,
    pub rate_limiter: Arc<RateLimitService>,
}

/// Standard success response wrapper
#[derive(serde::Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Flatten validator errors into one AppError::Validation message
pub fn handle_validation_error(err: validator::ValidationErrors) -> AppError {
    let mut messages = Vec::new();

    for (field, errors) in err.field_errors() {
        for error in errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for field '{}'", field));
            messages.push(format!("{}: {}", field, message));
        }
    }

    AppError::Validation(messages.join(", "))
}

fn auth_response(tokens: TokenPair, user: User) -> AuthResponse {
    AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: tokens.token_type,
        expires_in: tokens.expires_in,
        user,
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse<HealthCheckResponse>> {
    Json(SuccessResponse::new(HealthCheckResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: VERSION.to_string(),
    }))
}

/// Create a new account and send a verification code
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> AppResult<Json<SuccessResponse<SignupResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    let outcome = state.auth_service.signup(request).await?;
    Ok(Json(SuccessResponse::new(SignupResponse {
        message: "Verification code sent".to_string(),
        user_id: outcome.user_id,
        expires_in: outcome.expires_in,
    })))
}

/// Redeem a signup verification code
pub async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyEmailRequest>,
) -> AppResult<Json<SuccessResponse<AuthResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    let (tokens, user) = state
        .auth_service
        .verify_email(&request.email, &request.verification_code)
        .await?;
    Ok(Json(SuccessResponse::new(auth_response(tokens, user))))
}

/// Password sign-in
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<SuccessResponse<AuthResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    let (tokens, user) = state
        .auth_service
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(SuccessResponse::new(auth_response(tokens, user))))
}

/// Request a sign-in OTP
pub async fn request_otp(
    State(state): State<AppState>,
    Json(request): Json<OtpRequest>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    state.auth_service.request_otp(&request.email).await?;
    Ok(Json(SuccessResponse::new(MessageResponse {
        message: "If the account exists, a sign-in code has been sent".to_string(),
    })))
}

/// Redeem a sign-in OTP
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<OtpVerifyRequest>,
) -> AppResult<Json<SuccessResponse<AuthResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    let (tokens, user) = state
        .auth_service
        .verify_otp(&request.email, &request.otp_code)
        .await?;
    Ok(Json(SuccessResponse::new(auth_response(tokens, user))))
}

/// Start a password reset
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    state.auth_service.forgot_password(&request.email).await?;
    Ok(Json(SuccessResponse::new(MessageResponse {
        message: "If the account exists, a reset token has been sent".to_string(),
    })))
}

/// Complete a password reset
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    state
        .auth_service
        .reset_password(&request.email, &request.reset_token, &request.new_password)
        .await?;
    Ok(Json(SuccessResponse::new(MessageResponse {
        message: "Password has been reset".to_string(),
    })))
}

/// Exchange a refresh token for a new access token
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> AppResult<Json<SuccessResponse<RefreshTokenResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    let access_token = state
        .jwt_service
        .refresh_access_token(&request.refresh_token)
        .await?;
    Ok(Json(SuccessResponse::new(RefreshTokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_expires_in(),
    })))
}

/// Revoke the session behind one refresh token
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<LogoutRequest>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    request.validate().map_err(handle_validation_error)?;

    state
        .jwt_service
        .revoke_refresh_token(&request.refresh_token)
        .await?;
    Ok(Json(SuccessResponse::new(MessageResponse {
        message: "Logged out".to_string(),
    })))
}

/// Revoke every session the caller holds
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    let revoked = state
        .jwt_service
        .revoke_all_user_sessions(user.user_id)
        .await?;
    Ok(Json(SuccessResponse::new(MessageResponse {
        message: format!("Logged out of {} sessions", revoked),
    })))
}

/// Fetch the caller's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<SuccessResponse<User>>> {
    let profile = state.auth_service.get_profile(user.user_id).await?;
    Ok(Json(SuccessResponse::new(profile)))
}

/// Update the caller's profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<SuccessResponse<User>>> {
    request.validate().map_err(handle_validation_error)?;

    let profile = state
        .auth_service
        .update_profile(user.user_id, request)
        .await?;
    Ok(Json(SuccessResponse::new(profile)))
}

/// Fetch the caller's cart
pub async fn get_cart(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<SuccessResponse<Cart>>> {
    let cart = state.cart_service.get_cart(user.user_id).await?;
    Ok(Json(SuccessResponse::new(cart)))
}

/// Add a variant to the caller's cart
pub async fn add_cart_item(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<AddCartItemRequest>,
) -> AppResult<Json<SuccessResponse<Cart>>> {
    request.validate().map_err(handle_validation_error)?;

    let cart = state
        .cart_service
        .add_item(user.user_id, request.variant_id, request.quantity)
        .await?;
    Ok(Json(SuccessResponse::new(cart)))
}

/// Change the quantity of a cart line
pub async fn update_cart_item(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(variant_id): Path<Uuid>,
    Json(request): Json<UpdateCartItemRequest>,
) -> AppResult<Json<SuccessResponse<Cart>>> {
    request.validate().map_err(handle_validation_error)?;

    let cart = state
        .cart_service
        .update_quantity(user.user_id, variant_id, request.quantity)
        .await?;
    Ok(Json(SuccessResponse::new(cart)))
}

/// Remove a line from the caller's cart
pub async fn remove_cart_item(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(variant_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Cart>>> {
    let cart = state
        .cart_service
        .remove_item(user.user_id, variant_id)
        .await?;
    Ok(Json(SuccessResponse::new(cart)))
}

/// Empty the caller's cart
pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    state.cart_service.clear(user.user_id).await?;
    Ok(Json(SuccessResponse::new(MessageResponse {
        message: "Cart cleared".to_string(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response_creation() {
        let response = SuccessResponse::new("test data");
        assert!(response.success);
        assert_eq!(response.data, "test data");
    }

    #[test]
    fn test_validation_error_flattening() {
        let request = SignupRequest {
            name: "".to_string(),
            email: "not-an-email".to_string(),
            phone: "bad".to_string(),
            password: "weak".to_string(),
        };
        let err = request.validate().unwrap_err();
        let app_error = handle_validation_error(err);
        match app_error {
            AppError::Validation(msg) => {
                assert!(msg.contains("email"));
                assert!(msg.contains("password"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
