//! Rate Limiting Middleware
//!
//! Applies the fixed-window rate limiter to every request before routing
//! reaches validation or business logic. The limiter key is the client IP
//! (X-Forwarded-For when present, otherwise the socket address) and the
//! category is derived from the request path, so the sensitive auth
//! endpoints carry much tighter budgets than general traffic.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::service::rate_limit::{RateLimitCategory, RateLimitError, RateLimitService};
use crate::utils::error::AppError;

/// Map a request path to its rate-limit category
pub fn categorize_path(path: &str) -> RateLimitCategory {
    match path {
        "/auth/signup" => RateLimitCategory::Signup,
        "/auth/login" => RateLimitCategory::Login,
        "/auth/otp/request" => RateLimitCategory::OtpRequest,
        "/auth/otp/verify" | "/auth/verify-email" => RateLimitCategory::OtpVerify,
        "/auth/forgot-password" | "/auth/reset-password" => RateLimitCategory::PasswordReset,
        _ => RateLimitCategory::General,
    }
}

/// Best-effort client identity for rate limiting
fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate-limiting middleware; runs before validation and handlers
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimitService>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    let category = categorize_path(request.uri().path());

    match limiter.check_and_record(&key, category).await {
        Ok(()) => next.run(request).await,
        Err(RateLimitError::LimitExceeded {
            retry_after_seconds,
        }) => {
            let mut response = AppError::RateLimit(
                "Too many requests, please try again later".to_string(),
            )
            .into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
        Err(RateLimitError::Store(e)) => AppError::from(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::rate_limit::{RateLimit, RateLimitConfig};
    use crate::store::MemoryStore;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        middleware::from_fn_with_state,
        routing::post,
        Router,
    };
    use tower::util::ServiceExt;

    fn app(max_attempts: i32) -> Router {
        let mut config = RateLimitConfig::default();
        config.login = RateLimit {
            max_attempts,
            window_minutes: 15,
            lockout_minutes: None,
        };
        let limiter = Arc::new(RateLimitService::new(
            Arc::new(MemoryStore::new()),
            config,
        ));

        Router::new()
            .route("/auth/login", post(|| async { "ok" }))
            .layer(from_fn_with_state(limiter, rate_limit_middleware))
    }

    fn login_request(ip: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_path_categorization() {
        assert_eq!(categorize_path("/auth/signup"), RateLimitCategory::Signup);
        assert_eq!(categorize_path("/auth/login"), RateLimitCategory::Login);
        assert_eq!(
            categorize_path("/auth/verify-email"),
            RateLimitCategory::OtpVerify
        );
        assert_eq!(
            categorize_path("/auth/reset-password"),
            RateLimitCategory::PasswordReset
        );
        assert_eq!(categorize_path("/order/checkout"), RateLimitCategory::General);
    }

    #[tokio::test]
    async fn test_request_over_budget_gets_429_with_retry_after() {
        let app = app(2);

        for _ in 0..2 {
            let response = app.clone().oneshot(login_request("10.0.0.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.clone().oneshot(login_request("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
    }

    #[tokio::test]
    async fn test_clients_limited_independently() {
        let app = app(1);

        let first = app.clone().oneshot(login_request("10.0.0.1")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let blocked = app.clone().oneshot(login_request("10.0.0.1")).await.unwrap();
        assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);

        let other = app.clone().oneshot(login_request("10.0.0.2")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
    }
}
