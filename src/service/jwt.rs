//! JWT Service
//!
//! Issues and validates HS256 token pairs. Access tokens are stateless and
//! short-lived; refresh tokens are backed by a session row holding a SHA-256
//! hash of the token, so they can be revoked individually (logout) or in
//! bulk (logout-all, password reset). A refresh token whose session is gone
//! is dead no matter what its signature says.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::auth::{AccessTokenClaims, RefreshTokenClaims, Session, TokenPair, UserContext};
use crate::store::{SessionStore, StoreError};
use crate::utils::error::AppError;
use crate::utils::security::hash_sensitive_data;

/// JWT operation errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Token(_) | JwtError::InvalidToken => {
                AppError::Authentication("Invalid or expired token".to_string())
            }
            JwtError::Revoked => {
                AppError::Authentication("Token has been revoked".to_string())
            }
            JwtError::Store(e) => e.into(),
        }
    }
}

/// Service for issuing, validating, and revoking JWT tokens
#[derive(Clone)]
pub struct JwtService {
    sessions: Arc<dyn SessionStore>,
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
    access_expires: Duration,
    refresh_expires: Duration,
}

impl JwtService {
    pub fn new(config: &JwtConfig, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            sessions,
            access_encoding_key: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding_key: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding_key: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_expires: Duration::hours(config.access_token_expires_hours),
            refresh_expires: Duration::days(config.refresh_token_expires_days),
        }
    }

    /// Access token lifetime in seconds
    pub fn access_expires_in(&self) -> i64 {
        self.access_expires.num_seconds()
    }

    /// Issue a new access/refresh pair and persist the backing session
    pub async fn generate_token_pair(&self, user_id: Uuid) -> Result<TokenPair, JwtError> {
        let now = Utc::now();
        let session_id = Uuid::new_v4();

        let access_claims = AccessTokenClaims::new(user_id, now + self.access_expires, now);
        let access_token = encode(&Header::default(), &access_claims, &self.access_encoding_key)?;

        let refresh_expires_at = now + self.refresh_expires;
        let refresh_claims =
            RefreshTokenClaims::new(user_id, session_id, refresh_expires_at, now);
        let refresh_token =
            encode(&Header::default(), &refresh_claims, &self.refresh_encoding_key)?;

        self.sessions
            .insert_session(Session {
                id: session_id,
                user_id,
                refresh_token_hash: hash_sensitive_data(&refresh_token),
                expires_at: refresh_expires_at,
                created_at: now,
                last_used_at: now,
            })
            .await?;

        debug!("Issued token pair for user {} (session {})", user_id, session_id);
        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.access_expires.num_seconds(),
        ))
    }

    /// Validate an access token and extract the caller's identity
    pub fn validate_access_token(&self, token: &str) -> Result<UserContext, JwtError> {
        let data = decode::<AccessTokenClaims>(
            token,
            &self.access_decoding_key,
            &Validation::default(),
        )?;

        if data.claims.token_type != "access" {
            return Err(JwtError::InvalidToken);
        }

        UserContext::from_access_claims(&data.claims).map_err(|_| JwtError::InvalidToken)
    }

    /// Exchange a valid refresh token for a new access token
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, JwtError> {
        let (claims, session) = self.validate_refresh_token(refresh_token).await?;
        self.sessions.touch_session(session.id).await?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidToken)?;
        let now = Utc::now();
        let access_claims = AccessTokenClaims::new(user_id, now + self.access_expires, now);
        let access_token = encode(&Header::default(), &access_claims, &self.access_encoding_key)?;
        Ok(access_token)
    }

    /// Revoke the session behind one refresh token
    pub async fn revoke_refresh_token(&self, refresh_token: &str) -> Result<(), JwtError> {
        let (_, session) = self.validate_refresh_token(refresh_token).await?;
        self.sessions.delete_session(session.id).await?;
        debug!("Revoked session {}", session.id);
        Ok(())
    }

    /// Revoke every session the user holds; returns the count revoked
    pub async fn revoke_all_user_sessions(&self, user_id: Uuid) -> Result<u64, JwtError> {
        let revoked = self.sessions.delete_sessions_for_user(user_id).await?;
        debug!("Revoked {} sessions for user {}", revoked, user_id);
        Ok(revoked)
    }

    /// Validate signature, expiry, and the backing session of a refresh token
    async fn validate_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<(RefreshTokenClaims, Session), JwtError> {
        let data = decode::<RefreshTokenClaims>(
            refresh_token,
            &self.refresh_decoding_key,
            &Validation::default(),
        )?;

        if data.claims.token_type != "refresh" {
            return Err(JwtError::InvalidToken);
        }

        let session_id =
            Uuid::parse_str(&data.claims.session_id).map_err(|_| JwtError::InvalidToken)?;
        let session = self
            .sessions
            .find_session(session_id)
            .await?
            .ok_or(JwtError::Revoked)?;

        if session.expires_at <= Utc::now() {
            self.sessions.delete_session(session.id).await?;
            return Err(JwtError::Revoked);
        }
        if session.refresh_token_hash != hash_sensitive_data(refresh_token) {
            return Err(JwtError::Revoked);
        }

        Ok((data.claims, session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn jwt_service() -> (JwtService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let config = JwtConfig {
            access_secret: "a".repeat(32),
            refresh_secret: "b".repeat(32),
            access_token_expires_hours: 1,
            refresh_token_expires_days: 30,
        };
        (JwtService::new(&config, store.clone()), store)
    }

    #[tokio::test]
    async fn test_generate_and_validate_access_token() {
        let (service, _) = jwt_service();
        let user_id = Uuid::new_v4();

        let pair = service.generate_token_pair(user_id).await.unwrap();
        assert_eq!(pair.token_type, "Bearer");

        let context = service.validate_access_token(&pair.access_token).unwrap();
        assert_eq!(context.user_id, user_id);
    }

    #[tokio::test]
    async fn test_refresh_token_rejected_as_access_token() {
        let (service, _) = jwt_service();
        let pair = service
            .generate_token_pair(Uuid::new_v4())
            .await
            .unwrap();

        // Different secret, so the signature itself fails
        assert!(service.validate_access_token(&pair.refresh_token).is_err());
    }

    #[tokio::test]
    async fn test_refresh_yields_new_access_token() {
        let (service, _) = jwt_service();
        let user_id = Uuid::new_v4();
        let pair = service.generate_token_pair(user_id).await.unwrap();

        let access = service
            .refresh_access_token(&pair.refresh_token)
            .await
            .unwrap();
        let context = service.validate_access_token(&access).unwrap();
        assert_eq!(context.user_id, user_id);
    }

    #[tokio::test]
    async fn test_revoked_refresh_token_is_never_reusable() {
        let (service, _) = jwt_service();
        let pair = service
            .generate_token_pair(Uuid::new_v4())
            .await
            .unwrap();

        service
            .revoke_refresh_token(&pair.refresh_token)
            .await
            .unwrap();

        let result = service.refresh_access_token(&pair.refresh_token).await;
        assert!(matches!(result, Err(JwtError::Revoked)));
    }

    #[tokio::test]
    async fn test_revoke_all_kills_every_session() {
        let (service, _) = jwt_service();
        let user_id = Uuid::new_v4();
        let first = service.generate_token_pair(user_id).await.unwrap();
        let second = service.generate_token_pair(user_id).await.unwrap();

        let revoked = service.revoke_all_user_sessions(user_id).await.unwrap();
        assert_eq!(revoked, 2);

        assert!(service
            .refresh_access_token(&first.refresh_token)
            .await
            .is_err());
        assert!(service
            .refresh_access_token(&second.refresh_token)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let (service, _) = jwt_service();
        let pair = service
            .generate_token_pair(Uuid::new_v4())
            .await
            .unwrap();

        let mut tampered = pair.access_token.clone();
        tampered.push('x');
        assert!(service.validate_access_token(&tampered).is_err());
    }
}
