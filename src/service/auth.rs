//! Authentication Service
//!
//! Account lifecycle: signup with email verification, password and OTP
//! sign-in, password reset, token refresh, and profile management.
//!
//! Lookups that could reveal whether an account exists (login, OTP request,
//! forgot password) either fail with a neutral message or succeed silently,
//! so the API cannot be used to enumerate registered emails.

use std::sync::Arc;

use chrono::{Duration, Utc};
use log::{info, warn};
use uuid::Uuid;

use crate::models::requests::{SignupRequest, UpdateProfileRequest};
use crate::models::user::{CodePurpose, UserWithSecrets, VerificationCode};
use crate::models::{TokenPair, User};
use crate::service::jwt::{JwtError, JwtService};
use crate::service::mailer::Mailer;
use crate::store::{NewUser, StoreError, UserStore};
use crate::utils::error::AppError;
use crate::utils::security::{
    constant_time_compare, generate_otp_code, generate_secure_token, hash_password_with_cost,
    hash_sensitive_data, verify_password, DEFAULT_BCRYPT_COST,
};
use crate::utils::validation::normalize_email;

/// Minutes before a signup verification code expires
const VERIFICATION_CODE_EXPIRY_MINUTES: i64 = 15;
/// Minutes before a login OTP expires
const OTP_EXPIRY_MINUTES: i64 = 10;
/// Minutes before a password-reset token expires
const RESET_TOKEN_EXPIRY_MINUTES: i64 = 30;
/// Failed redemptions allowed before a code is dead
const MAX_CODE_ATTEMPTS: i32 = 5;

/// Authentication service errors
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("{0} is already in use")]
    Duplicate(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired code")]
    InvalidCode,

    #[error("User not found")]
    UserNotFound,

    #[error("Mail delivery failed: {0}")]
    Mail(String),

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

impl From<StoreError> for AuthServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => AuthServiceError::Duplicate(field),
            other => AuthServiceError::Store(other),
        }
    }
}

impl From<AuthServiceError> for AppError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::Duplicate(field) => {
                AppError::Conflict(format!("{} is already in use", field))
            }
            AuthServiceError::InvalidCredentials => {
                AppError::Authentication("Invalid credentials".to_string())
            }
            AuthServiceError::InvalidCode => {
                AppError::Authentication("Invalid or expired code".to_string())
            }
            AuthServiceError::UserNotFound => AppError::NotFound("User not found".to_string()),
            AuthServiceError::Mail(msg) => AppError::ExternalService(msg),
            AuthServiceError::Jwt(e) => e.into(),
            AuthServiceError::Store(e) => e.into(),
            AuthServiceError::Hashing(e) => AppError::HashingError(e),
        }
    }
}

/// Outcome of a signup: the account exists but is unverified until the
/// emailed code is redeemed
#[derive(Debug)]
pub struct SignupOutcome {
    pub user_id: Uuid,
    /// Seconds until the verification code expires
    pub expires_in: i64,
}

/// Service handling account lifecycle and sign-in flows
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: Arc<JwtService>,
    mailer: Arc<dyn Mailer>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt: Arc<JwtService>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            users,
            jwt,
            mailer,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    /// Lower the bcrypt cost; only sensible in tests
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Create an unverified account and email a verification code
    pub async fn signup(&self, request: SignupRequest) -> Result<SignupOutcome, AuthServiceError> {
        let email = normalize_email(&request.email);
        let password_hash = hash_password_with_cost(&request.password, self.bcrypt_cost)?;

        let user = self
            .users
            .insert_user(NewUser {
                name: request.name,
                email: email.clone(),
                phone: request.phone,
                password_hash,
            })
            .await?;

        let expires_in = self
            .issue_code(
                &user,
                CodePurpose::EmailVerify,
                &generate_otp_code(),
                VERIFICATION_CODE_EXPIRY_MINUTES,
            )
            .await?;

        info!("New signup: user {}", user.id);
        Ok(SignupOutcome {
            user_id: user.id,
            expires_in,
        })
    }

    /// Redeem a signup verification code; a successful redemption verifies
    /// the email and signs the user in
    pub async fn verify_email(
        &self,
        email: &str,
        code: &str,
    ) -> Result<(TokenPair, User), AuthServiceError> {
        let user = self.find_by_email_or_code_error(email).await?;
        self.redeem_code(&user, CodePurpose::EmailVerify, code).await?;

        self.users.mark_email_verified(user.id).await?;
        let tokens = self.jwt.generate_token_pair(user.id).await?;

        let mut user: User = user.into();
        user.email_verified = true;
        info!("Email verified for user {}", user.id);
        Ok((tokens, user))
    }

    /// Password sign-in. Unknown emails, wrong passwords, and unverified
    /// accounts all fail with the same neutral error.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(TokenPair, User), AuthServiceError> {
        let email = normalize_email(email);
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            warn!("Failed login attempt for user {}", user.id);
            return Err(AuthServiceError::InvalidCredentials);
        }
        if !user.email_verified {
            return Err(AuthServiceError::InvalidCredentials);
        }

        let tokens = self.jwt.generate_token_pair(user.id).await?;
        info!("User {} logged in", user.id);
        Ok((tokens, user.into()))
    }

    /// Email a sign-in OTP. Succeeds silently when the address is unknown.
    /// Unverified accounts may request one: OTP confirmation proves control
    /// of the mailbox, so it doubles as a fallback activation path when the
    /// signup code has expired.
    pub async fn request_otp(&self, email: &str) -> Result<(), AuthServiceError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_user_by_email(&email).await? else {
            return Ok(());
        };

        self.issue_code(
            &user,
            CodePurpose::LoginOtp,
            &generate_otp_code(),
            OTP_EXPIRY_MINUTES,
        )
        .await?;
        Ok(())
    }

    /// Redeem a sign-in OTP. A successful redemption also marks the account
    /// verified, since the caller has just proven control of the mailbox.
    pub async fn verify_otp(
        &self,
        email: &str,
        code: &str,
    ) -> Result<(TokenPair, User), AuthServiceError> {
        let user = self.find_by_email_or_code_error(email).await?;
        self.redeem_code(&user, CodePurpose::LoginOtp, code).await?;

        if !user.email_verified {
            self.users.mark_email_verified(user.id).await?;
        }
        let tokens = self.jwt.generate_token_pair(user.id).await?;

        let mut user: User = user.into();
        user.email_verified = true;
        info!("User {} logged in via OTP", user.id);
        Ok((tokens, user))
    }

    /// Email a password-reset token. Succeeds silently when the address is
    /// unknown.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthServiceError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_user_by_email(&email).await? else {
            return Ok(());
        };

        self.issue_code(
            &user,
            CodePurpose::PasswordReset,
            &generate_secure_token(32),
            RESET_TOKEN_EXPIRY_MINUTES,
        )
        .await?;
        Ok(())
    }

    /// Redeem a reset token and set a new password. Every existing session
    /// is revoked so stolen refresh tokens die with the old password.
    pub async fn reset_password(
        &self,
        email: &str,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), AuthServiceError> {
        let user = self.find_by_email_or_code_error(email).await?;
        self.redeem_code(&user, CodePurpose::PasswordReset, reset_token)
            .await?;

        let password_hash = hash_password_with_cost(new_password, self.bcrypt_cost)?;
        self.users.set_password_hash(user.id, &password_hash).await?;
        self.jwt.revoke_all_user_sessions(user.id).await?;

        info!("Password reset completed for user {}", user.id);
        Ok(())
    }

    /// Fetch the caller's profile
    pub async fn get_profile(&self, user_id: Uuid) -> Result<User, AuthServiceError> {
        let user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;
        Ok(user.into())
    }

    /// Update name and/or phone on the caller's profile
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<User, AuthServiceError> {
        self.users
            .update_profile(user_id, request.name, request.phone)
            .await?
            .ok_or(AuthServiceError::UserNotFound)
    }

    async fn find_by_email_or_code_error(
        &self,
        email: &str,
    ) -> Result<UserWithSecrets, AuthServiceError> {
        let email = normalize_email(email);
        self.users
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthServiceError::InvalidCode)
    }

    /// Store the hash of a single-use secret and mail the plaintext to the
    /// user. Returns the lifetime in seconds.
    async fn issue_code(
        &self,
        user: &UserWithSecrets,
        purpose: CodePurpose,
        plaintext: &str,
        expiry_minutes: i64,
    ) -> Result<i64, AuthServiceError> {
        let now = Utc::now();
        self.users
            .insert_code(VerificationCode {
                id: Uuid::new_v4(),
                user_id: user.id,
                purpose,
                code_hash: hash_sensitive_data(plaintext),
                expires_at: now + Duration::minutes(expiry_minutes),
                attempts: 0,
                consumed_at: None,
                created_at: now,
            })
            .await?;

        let delivery = match purpose {
            CodePurpose::EmailVerify => {
                self.mailer.send_verification_code(&user.email, plaintext).await
            }
            CodePurpose::LoginOtp => self.mailer.send_login_otp(&user.email, plaintext).await,
            CodePurpose::PasswordReset => {
                self.mailer.send_password_reset(&user.email, plaintext).await
            }
        };
        delivery.map_err(|e| AuthServiceError::Mail(e.to_string()))?;

        Ok(expiry_minutes * 60)
    }

    /// Validate and consume a single-use code. Failed attempts are counted;
    /// once the cap is reached the code is dead even if the right value is
    /// presented later.
    async fn redeem_code(
        &self,
        user: &UserWithSecrets,
        purpose: CodePurpose,
        presented: &str,
    ) -> Result<(), AuthServiceError> {
        let code = self
            .users
            .find_active_code(user.id, purpose)
            .await?
            .ok_or(AuthServiceError::InvalidCode)?;

        if !code.is_usable(MAX_CODE_ATTEMPTS) {
            return Err(AuthServiceError::InvalidCode);
        }

        if !constant_time_compare(&code.code_hash, &hash_sensitive_data(presented)) {
            let attempts = self.users.increment_code_attempts(code.id).await?;
            warn!(
                "Failed code redemption for user {} ({:?}), attempt {}",
                user.id, purpose, attempts
            );
            return Err(AuthServiceError::InvalidCode);
        }

        self.users.consume_code(code.id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Mailer that captures the last delivery per purpose
    #[derive(Default)]
    struct CaptureMailer {
        verification: Mutex<Option<String>>,
        otp: Mutex<Option<String>>,
        reset: Mutex<Option<String>>,
    }

    #[async_trait]
    impl Mailer for CaptureMailer {
        async fn send_verification_code(&self, _email: &str, code: &str) -> Result<(), AppError> {
            *self.verification.lock().unwrap() = Some(code.to_string());
            Ok(())
        }

        async fn send_login_otp(&self, _email: &str, code: &str) -> Result<(), AppError> {
            *self.otp.lock().unwrap() = Some(code.to_string());
            Ok(())
        }

        async fn send_password_reset(&self, _email: &str, token: &str) -> Result<(), AppError> {
            *self.reset.lock().unwrap() = Some(token.to_string());
            Ok(())
        }
    }

    fn auth_service() -> (AuthService, Arc<CaptureMailer>, Arc<JwtService>) {
        let store = Arc::new(MemoryStore::new());
        let jwt = Arc::new(JwtService::new(
            &JwtConfig {
                access_secret: "a".repeat(32),
                refresh_secret: "b".repeat(32),
                access_token_expires_hours: 1,
                refresh_token_expires_days: 30,
            },
            store.clone(),
        ));
        let mailer = Arc::new(CaptureMailer::default());
        let service =
            AuthService::new(store, jwt.clone(), mailer.clone()).with_bcrypt_cost(4);
        (service, mailer, jwt)
    }

    fn signup_request(email: &str, phone: &str) -> SignupRequest {
        SignupRequest {
            name: "Alice Smith".to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            password: "SecurePass123!".to_string(),
        }
    }

    async fn signed_up_and_verified(
        service: &AuthService,
        mailer: &CaptureMailer,
        email: &str,
    ) -> Uuid {
        let outcome = service
            .signup(signup_request(email, "+14155550123"))
            .await
            .unwrap();
        let code = mailer.verification.lock().unwrap().clone().unwrap();
        service.verify_email(email, &code).await.unwrap();
        outcome.user_id
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let (service, _, _) = auth_service();
        service
            .signup(signup_request("alice@example.com", "+14155550100"))
            .await
            .unwrap();

        let result = service
            .signup(signup_request("alice@example.com", "+14155550101"))
            .await;
        assert!(matches!(result, Err(AuthServiceError::Duplicate(f)) if f == "email"));
    }

    #[tokio::test]
    async fn test_signup_verify_login_flow() {
        let (service, mailer, _) = auth_service();
        signed_up_and_verified(&service, &mailer, "alice@example.com").await;

        let (tokens, user) = service
            .login("alice@example.com", "SecurePass123!")
            .await
            .unwrap();
        assert!(user.email_verified);
        assert!(!tokens.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_login_before_verification_fails_neutrally() {
        let (service, _, _) = auth_service();
        service
            .signup(signup_request("alice@example.com", "+14155550123"))
            .await
            .unwrap();

        let result = service.login("alice@example.com", "SecurePass123!").await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_wrong_password_fails_neutrally() {
        let (service, mailer, _) = auth_service();
        signed_up_and_verified(&service, &mailer, "alice@example.com").await;

        let result = service.login("alice@example.com", "WrongPass123!").await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_email_fails_neutrally() {
        let (service, _, _) = auth_service();
        let result = service.login("ghost@example.com", "SecurePass123!").await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_verification_code_is_single_use() {
        let (service, mailer, _) = auth_service();
        service
            .signup(signup_request("alice@example.com", "+14155550123"))
            .await
            .unwrap();
        let code = mailer.verification.lock().unwrap().clone().unwrap();

        service.verify_email("alice@example.com", &code).await.unwrap();
        let replay = service.verify_email("alice@example.com", &code).await;
        assert!(matches!(replay, Err(AuthServiceError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_code_dies_after_attempt_cap() {
        let (service, mailer, _) = auth_service();
        service
            .signup(signup_request("alice@example.com", "+14155550123"))
            .await
            .unwrap();
        let code = mailer.verification.lock().unwrap().clone().unwrap();

        for _ in 0..MAX_CODE_ATTEMPTS {
            let result = service.verify_email("alice@example.com", "000000").await;
            assert!(matches!(result, Err(AuthServiceError::InvalidCode)));
        }

        // Correct code no longer works
        let result = service.verify_email("alice@example.com", &code).await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_otp_sign_in_flow() {
        let (service, mailer, _) = auth_service();
        let user_id = signed_up_and_verified(&service, &mailer, "alice@example.com").await;

        service.request_otp("alice@example.com").await.unwrap();
        let otp = mailer.otp.lock().unwrap().clone().unwrap();

        let (_, user) = service.verify_otp("alice@example.com", &otp).await.unwrap();
        assert_eq!(user.id, user_id);
    }

    #[tokio::test]
    async fn test_otp_confirmation_verifies_unverified_account() {
        let (service, mailer, _) = auth_service();
        service
            .signup(signup_request("alice@example.com", "+14155550123"))
            .await
            .unwrap();

        // Signup code never redeemed; the OTP path still activates the account
        service.request_otp("alice@example.com").await.unwrap();
        let otp = mailer.otp.lock().unwrap().clone().unwrap();

        let (tokens, user) = service.verify_otp("alice@example.com", &otp).await.unwrap();
        assert!(user.email_verified);
        assert!(!tokens.access_token.is_empty());

        // Password login works once the account is verified
        assert!(service
            .login("alice@example.com", "SecurePass123!")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_otp_request_for_unknown_email_is_silent() {
        let (service, mailer, _) = auth_service();
        service.request_otp("ghost@example.com").await.unwrap();
        assert!(mailer.otp.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_password_reset_revokes_sessions() {
        let (service, mailer, jwt) = auth_service();
        signed_up_and_verified(&service, &mailer, "alice@example.com").await;
        let (tokens, _) = service
            .login("alice@example.com", "SecurePass123!")
            .await
            .unwrap();

        service.forgot_password("alice@example.com").await.unwrap();
        let token = mailer.reset.lock().unwrap().clone().unwrap();
        service
            .reset_password("alice@example.com", &token, "NewSecure123!")
            .await
            .unwrap();

        // Old refresh token is dead, new password works
        assert!(jwt.refresh_access_token(&tokens.refresh_token).await.is_err());
        assert!(service
            .login("alice@example.com", "NewSecure123!")
            .await
            .is_ok());
        assert!(matches!(
            service.login("alice@example.com", "SecurePass123!").await,
            Err(AuthServiceError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_reset_token_is_single_use() {
        let (service, mailer, _) = auth_service();
        signed_up_and_verified(&service, &mailer, "alice@example.com").await;

        service.forgot_password("alice@example.com").await.unwrap();
        let token = mailer.reset.lock().unwrap().clone().unwrap();
        service
            .reset_password("alice@example.com", &token, "NewSecure123!")
            .await
            .unwrap();

        let replay = service
            .reset_password("alice@example.com", &token, "OtherSecure123!")
            .await;
        assert!(matches!(replay, Err(AuthServiceError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (service, mailer, _) = auth_service();
        let user_id = signed_up_and_verified(&service, &mailer, "alice@example.com").await;

        let updated = service
            .update_profile(
                user_id,
                UpdateProfileRequest {
                    name: Some("Alice Jones".to_string()),
                    phone: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Alice Jones");
        assert_eq!(updated.phone, "+14155550123");
    }
}
