//! Configuration Module
//!
//! Centralized environment-driven configuration for the commerce service:
//! server, database, JWT, rate limiting, and payment-gateway settings.

use crate::service::rate_limit::RateLimitConfig;
use crate::utils::error::AppError;

/// Environment variable helpers
pub mod env {
    use std::env;

    /// Get environment variable as string with default
    pub fn get_string(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get environment variable as boolean with default
    pub fn get_bool(key: &str, default: bool) -> bool {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u16 with default
    pub fn get_u16(key: &str, default: u16) -> u16 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u32 with default
    pub fn get_u32(key: &str, default: u32) -> u32 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u64 with default
    pub fn get_u64(key: &str, default: u64) -> u64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as i32 with default. Values that do not
    /// parse as an i32, including out-of-range numbers, fall back to the
    /// default rather than being truncated.
    pub fn get_i32(key: &str, default: i32) -> i32 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as i64 with default
    pub fn get_i64(key: &str, default: i64) -> i64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Check if environment variable is set
    pub fn is_set(key: &str) -> bool {
        env::var(key).is_ok()
    }
}

/// Application configuration combining all service configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseSettings,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Rate limiting configuration
    pub rate_limits: RateLimitConfig,

    /// Payment gateway configuration
    pub payment: PaymentConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration settings
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expires_hours: i64,
    pub refresh_token_expires_days: i64,
}

/// Payment gateway configuration
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Shared secret used to verify callback signatures
    pub callback_secret: String,
    /// Currency code applied to new orders
    pub currency: String,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        let server = ServerConfig {
            host: env::get_string("SERVER_HOST", "0.0.0.0"),
            port: env::get_u16("SERVER_PORT", 3000),
        };

        let database = DatabaseSettings {
            url: std::env::var("DATABASE_URL").map_err(|_| {
                AppError::Configuration("DATABASE_URL environment variable is required".to_string())
            })?,
            max_connections: env::get_u32("DB_MAX_CONNECTIONS", 20),
            min_connections: env::get_u32("DB_MIN_CONNECTIONS", 1),
            connect_timeout_seconds: env::get_u64("DB_CONNECT_TIMEOUT", 30),
            idle_timeout_seconds: env::get_u64("DB_IDLE_TIMEOUT", 600),
        };

        let jwt = JwtConfig {
            access_secret: std::env::var("JWT_ACCESS_SECRET").map_err(|_| {
                AppError::Configuration(
                    "JWT_ACCESS_SECRET environment variable is required".to_string(),
                )
            })?,
            refresh_secret: std::env::var("JWT_REFRESH_SECRET").map_err(|_| {
                AppError::Configuration(
                    "JWT_REFRESH_SECRET environment variable is required".to_string(),
                )
            })?,
            access_token_expires_hours: env::get_i64("JWT_ACCESS_EXPIRES_HOURS", 1),
            refresh_token_expires_days: env::get_i64("JWT_REFRESH_EXPIRES_DAYS", 30),
        };

        let payment = PaymentConfig {
            callback_secret: std::env::var("PAYMENT_CALLBACK_SECRET").map_err(|_| {
                AppError::Configuration(
                    "PAYMENT_CALLBACK_SECRET environment variable is required".to_string(),
                )
            })?,
            currency: env::get_string("PAYMENT_CURRENCY", "USD"),
        };

        Ok(Self {
            server,
            database,
            jwt,
            rate_limits: RateLimitConfig::from_env(),
            payment,
        })
    }

    /// Validate the loaded configuration before the server starts
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt.access_secret.len() < 32 {
            return Err(AppError::Configuration(
                "JWT_ACCESS_SECRET must be at least 32 characters".to_string(),
            ));
        }
        if self.jwt.refresh_secret.len() < 32 {
            return Err(AppError::Configuration(
                "JWT_REFRESH_SECRET must be at least 32 characters".to_string(),
            ));
        }
        if self.jwt.access_secret == self.jwt.refresh_secret {
            return Err(AppError::Configuration(
                "access and refresh token secrets must differ".to_string(),
            ));
        }
        if self.payment.callback_secret.len() < 16 {
            return Err(AppError::Configuration(
                "PAYMENT_CALLBACK_SECRET must be at least 16 characters".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(AppError::Configuration(
                "DB_MAX_CONNECTIONS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
