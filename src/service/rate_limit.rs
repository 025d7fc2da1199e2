//! Rate Limiting Service
//!
//! Fixed-window rate limiting keyed on client identity and operation
//! category, with an optional lockout once a window's budget is exhausted.
//! Limits are checked before request validation so abusive clients never
//! reach the business logic.

use std::sync::Arc;

use chrono::{Duration, Utc};
use log::{debug, warn};
use uuid::Uuid;

use crate::config::env;
use crate::store::{RateLimitStore, RateLimitWindow, StoreError};
use crate::utils::error::AppError;

/// Operation categories with independent budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitCategory {
    Signup,
    Login,
    OtpRequest,
    OtpVerify,
    PasswordReset,
    General,
}

impl RateLimitCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            RateLimitCategory::Signup => "signup",
            RateLimitCategory::Login => "login",
            RateLimitCategory::OtpRequest => "otp_request",
            RateLimitCategory::OtpVerify => "otp_verify",
            RateLimitCategory::PasswordReset => "password_reset",
            RateLimitCategory::General => "general",
        }
    }
}

/// Budget for one category
#[derive(Debug, Clone)]
pub struct RateLimit {
    /// Requests allowed per window
    pub max_attempts: i32,
    /// Window length in minutes
    pub window_minutes: i64,
    /// Lockout applied once the budget is exhausted; `None` means the
    /// client is only refused until the window rolls over
    pub lockout_minutes: Option<i64>,
}

impl RateLimit {
    fn from_env(prefix: &str, default: &RateLimit) -> Self {
        let lockout = env::get_i64(
            &format!("RATE_LIMIT_{}_LOCKOUT_MINUTES", prefix),
            default.lockout_minutes.unwrap_or(0),
        );
        Self {
            max_attempts: env::get_i32(
                &format!("RATE_LIMIT_{}_MAX_ATTEMPTS", prefix),
                default.max_attempts,
            ),
            window_minutes: env::get_i64(
                &format!("RATE_LIMIT_{}_WINDOW_MINUTES", prefix),
                default.window_minutes,
            ),
            lockout_minutes: if lockout > 0 { Some(lockout) } else { None },
        }
    }
}

/// Per-category rate-limit budgets
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub signup: RateLimit,
    pub login: RateLimit,
    pub otp_request: RateLimit,
    pub otp_verify: RateLimit,
    pub password_reset: RateLimit,
    pub general: RateLimit,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            signup: RateLimit {
                max_attempts: 5,
                window_minutes: 60,
                lockout_minutes: Some(60),
            },
            login: RateLimit {
                max_attempts: 10,
                window_minutes: 15,
                lockout_minutes: Some(30),
            },
            otp_request: RateLimit {
                max_attempts: 3,
                window_minutes: 10,
                lockout_minutes: Some(30),
            },
            otp_verify: RateLimit {
                max_attempts: 5,
                window_minutes: 10,
                lockout_minutes: Some(30),
            },
            password_reset: RateLimit {
                max_attempts: 3,
                window_minutes: 60,
                lockout_minutes: Some(60),
            },
            general: RateLimit {
                max_attempts: 120,
                window_minutes: 1,
                lockout_minutes: None,
            },
        }
    }
}

impl RateLimitConfig {
    /// Load budgets from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            signup: RateLimit::from_env("SIGNUP", &defaults.signup),
            login: RateLimit::from_env("LOGIN", &defaults.login),
            otp_request: RateLimit::from_env("OTP_REQUEST", &defaults.otp_request),
            otp_verify: RateLimit::from_env("OTP_VERIFY", &defaults.otp_verify),
            password_reset: RateLimit::from_env("PASSWORD_RESET", &defaults.password_reset),
            general: RateLimit::from_env("GENERAL", &defaults.general),
        }
    }

    pub fn limit_for(&self, category: RateLimitCategory) -> &RateLimit {
        match category {
            RateLimitCategory::Signup => &self.signup,
            RateLimitCategory::Login => &self.login,
            RateLimitCategory::OtpRequest => &self.otp_request,
            RateLimitCategory::OtpVerify => &self.otp_verify,
            RateLimitCategory::PasswordReset => &self.password_reset,
            RateLimitCategory::General => &self.general,
        }
    }

    fn longest_window_minutes(&self) -> i64 {
        [
            &self.signup,
            &self.login,
            &self.otp_request,
            &self.otp_verify,
            &self.password_reset,
            &self.general,
        ]
        .iter()
        .map(|l| l.window_minutes)
        .max()
        .unwrap_or(60)
    }
}

/// Rate limiting errors
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Rate limit exceeded, retry in {retry_after_seconds} seconds")]
    LimitExceeded { retry_after_seconds: i64 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<RateLimitError> for AppError {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::LimitExceeded { .. } => AppError::RateLimit(
                "Too many requests, please try again later".to_string(),
            ),
            RateLimitError::Store(e) => e.into(),
        }
    }
}

/// Fixed-window rate limiter over a [`RateLimitStore`]
#[derive(Clone)]
pub struct RateLimitService {
    store: Arc<dyn RateLimitStore>,
    config: RateLimitConfig,
}

impl RateLimitService {
    pub fn new(store: Arc<dyn RateLimitStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    /// Record one attempt for the key and category, rejecting it when the
    /// window's budget is already spent or a lockout is active.
    pub async fn check_and_record(
        &self,
        key: &str,
        category: RateLimitCategory,
    ) -> Result<(), RateLimitError> {
        let now = Utc::now();
        let limit = self.config.limit_for(category);
        let existing = self.store.find_window(key, category.as_str()).await?;

        if let Some(ref window) = existing {
            if let Some(blocked_until) = window.blocked_until {
                if blocked_until > now {
                    let retry_after_seconds = (blocked_until - now).num_seconds().max(1);
                    warn!(
                        "Rate limit lockout active for {} on {}, {}s remaining",
                        key,
                        category.as_str(),
                        retry_after_seconds
                    );
                    return Err(RateLimitError::LimitExceeded {
                        retry_after_seconds,
                    });
                }
            }
        }

        let window_length = Duration::minutes(limit.window_minutes);
        let mut window = match existing {
            Some(w) if w.window_start + window_length > now => w,
            _ => RateLimitWindow {
                id: Uuid::new_v4(),
                key: key.to_string(),
                category: category.as_str().to_string(),
                attempts: 0,
                window_start: now,
                blocked_until: None,
            },
        };
        window.blocked_until = None;
        window.attempts += 1;

        if window.attempts > limit.max_attempts {
            let retry_after_seconds = match limit.lockout_minutes {
                Some(lockout) => {
                    window.blocked_until = Some(now + Duration::minutes(lockout));
                    lockout * 60
                }
                None => ((window.window_start + window_length) - now)
                    .num_seconds()
                    .max(1),
            };
            self.store.save_window(window).await?;
            warn!(
                "Rate limit exceeded for {} on {}",
                key,
                category.as_str()
            );
            return Err(RateLimitError::LimitExceeded {
                retry_after_seconds,
            });
        }

        debug!(
            "Rate limit attempt {}/{} for {} on {}",
            window.attempts,
            limit.max_attempts,
            key,
            category.as_str()
        );
        self.store.save_window(window).await?;
        Ok(())
    }

    /// Remove windows that can no longer affect any decision
    pub async fn cleanup_expired(&self) -> Result<u64, RateLimitError> {
        let cutoff = Utc::now() - Duration::minutes(self.config.longest_window_minutes());
        Ok(self.store.delete_expired_windows(cutoff).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service(max_attempts: i32, lockout_minutes: Option<i64>) -> RateLimitService {
        let mut config = RateLimitConfig::default();
        config.login = RateLimit {
            max_attempts,
            window_minutes: 15,
            lockout_minutes,
        };
        RateLimitService::new(Arc::new(MemoryStore::new()), config)
    }

    #[tokio::test]
    async fn test_rejects_after_budget_spent() {
        let limiter = service(3, None);
        for _ in 0..3 {
            limiter
                .check_and_record("10.0.0.1", RateLimitCategory::Login)
                .await
                .unwrap();
        }

        let result = limiter
            .check_and_record("10.0.0.1", RateLimitCategory::Login)
            .await;
        assert!(matches!(
            result,
            Err(RateLimitError::LimitExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = service(1, None);
        limiter
            .check_and_record("10.0.0.1", RateLimitCategory::Login)
            .await
            .unwrap();

        limiter
            .check_and_record("10.0.0.2", RateLimitCategory::Login)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_categories_are_independent() {
        let limiter = service(1, None);
        limiter
            .check_and_record("10.0.0.1", RateLimitCategory::Login)
            .await
            .unwrap();

        limiter
            .check_and_record("10.0.0.1", RateLimitCategory::General)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_lockout_reports_retry_after() {
        let limiter = service(1, Some(30));
        limiter
            .check_and_record("10.0.0.1", RateLimitCategory::Login)
            .await
            .unwrap();

        match limiter
            .check_and_record("10.0.0.1", RateLimitCategory::Login)
            .await
        {
            Err(RateLimitError::LimitExceeded {
                retry_after_seconds,
            }) => assert_eq!(retry_after_seconds, 30 * 60),
            other => panic!("expected lockout, got {:?}", other.map(|_| ())),
        }

        // Still blocked on the next attempt
        let result = limiter
            .check_and_record("10.0.0.1", RateLimitCategory::Login)
            .await;
        assert!(matches!(
            result,
            Err(RateLimitError::LimitExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_expired_window_resets_budget() {
        let store = Arc::new(MemoryStore::new());
        let limiter = RateLimitService::new(store.clone(), RateLimitConfig::default());

        // Seed a stale, fully spent window
        use crate::store::RateLimitStore;
        store
            .save_window(RateLimitWindow {
                id: Uuid::new_v4(),
                key: "10.0.0.1".to_string(),
                category: "login".to_string(),
                attempts: 1000,
                window_start: Utc::now() - Duration::hours(2),
                blocked_until: None,
            })
            .await
            .unwrap();

        limiter
            .check_and_record("10.0.0.1", RateLimitCategory::Login)
            .await
            .unwrap();
    }
}
