//! Outbound Mail
//!
//! Seam for delivering verification codes, OTPs, and reset tokens out of
//! band. The default [`LogMailer`] writes deliveries to the log, which is
//! enough for development; a real SMTP implementation plugs in behind the
//! same trait.

use async_trait::async_trait;
use log::info;

use crate::utils::error::AppError;

/// Outbound mail delivery
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<(), AppError>;

    async fn send_login_otp(&self, email: &str, code: &str) -> Result<(), AppError>;

    async fn send_password_reset(&self, email: &str, token: &str) -> Result<(), AppError>;
}

/// Mailer that logs deliveries instead of sending them
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<(), AppError> {
        info!("[mail] verification code for {}: {}", email, code);
        Ok(())
    }

    async fn send_login_otp(&self, email: &str, code: &str) -> Result<(), AppError> {
        info!("[mail] login OTP for {}: {}", email, code);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, token: &str) -> Result<(), AppError> {
        info!("[mail] password reset token for {}: {}", email, token);
        Ok(())
    }
}
