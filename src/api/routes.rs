//! API Route Definitions
//!
//! All HTTP routes, assembled through a builder that lets deployments
//! enable only the surfaces they need (storefront-only, payment-callback
//! receiver, admin catalog service, and so on). Authenticated surfaces are
//! wrapped in the JWT middleware; the rate limiter is applied to the whole
//! app in [`create_app`] so it runs before anything else.

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::service::JwtService;

use super::catalog_handlers::*;
use super::handlers::*;
use super::middleware::auth_middleware;
use super::order_handlers::*;
use super::security_middleware::rate_limit_middleware;

/// Builder for creating API routes with configurable surfaces
#[derive(Default)]
pub struct RouterBuilder {
    /// Health check endpoint (GET /health)
    health_check: bool,
    /// Public auth flows (signup, login, OTP, verification, reset, refresh)
    /// and the authenticated logout endpoints
    auth: bool,
    /// Profile endpoints (GET/PUT /user/profile)
    profile: bool,
    /// Cart endpoints under /user/cart
    cart: bool,
    /// Order endpoints under /order
    orders: bool,
    /// Payment gateway callback (POST /order/payment/callback)
    payment_callback: bool,
    /// Catalog endpoints under /product, /category, /variant
    catalog: bool,
}

impl RouterBuilder {
    /// All surfaces disabled; enable them explicitly
    pub fn new() -> Self {
        Self::default()
    }

    /// Every surface enabled; the standard single-service deployment
    pub fn with_all_routes() -> Self {
        Self {
            health_check: true,
            auth: true,
            profile: true,
            cart: true,
            orders: true,
            payment_callback: true,
            catalog: true,
        }
    }

    /// Storefront surfaces only: auth, profile, cart, orders, callback,
    /// but no catalog administration
    pub fn with_storefront_routes() -> Self {
        Self {
            health_check: true,
            auth: true,
            profile: true,
            cart: true,
            orders: true,
            payment_callback: true,
            catalog: false,
        }
    }

    /// Health check only; useful for monitoring deployments
    pub fn with_minimal_routes() -> Self {
        Self {
            health_check: true,
            ..Self::default()
        }
    }

    pub fn health_check(mut self, enabled: bool) -> Self {
        self.health_check = enabled;
        self
    }

    pub fn auth(mut self, enabled: bool) -> Self {
        self.auth = enabled;
        self
    }

    pub fn profile(mut self, enabled: bool) -> Self {
        self.profile = enabled;
        self
    }

    pub fn cart(mut self, enabled: bool) -> Self {
        self.cart = enabled;
        self
    }

    pub fn orders(mut self, enabled: bool) -> Self {
        self.orders = enabled;
        self
    }

    pub fn payment_callback(mut self, enabled: bool) -> Self {
        self.payment_callback = enabled;
        self
    }

    pub fn catalog(mut self, enabled: bool) -> Self {
        self.catalog = enabled;
        self
    }

    /// Build the router. Authenticated routes are wrapped in the JWT
    /// middleware backed by `jwt_service`.
    pub fn build(self, jwt_service: Arc<JwtService>) -> Router<AppState> {
        let mut public = Router::new();
        let mut protected = Router::new();

        if self.health_check {
            public = public.route("/health", get(health_check));
        }

        if self.auth {
            public = public
                .route("/auth/signup", post(signup))
                .route("/auth/login", post(login))
                .route("/auth/otp/request", post(request_otp))
                .route("/auth/otp/verify", post(verify_otp))
                .route("/auth/verify-email", post(verify_email))
                .route("/auth/forgot-password", post(forgot_password))
                .route("/auth/reset-password", post(reset_password))
                .route("/auth/refresh", post(refresh_token));
            protected = protected
                .route("/auth/logout", post(logout))
                .route("/auth/logout-all", post(logout_all));
        }

        if self.profile {
            protected = protected
                .route("/user/profile", get(get_profile))
                .route("/user/profile", put(update_profile));
        }

        if self.cart {
            protected = protected
                .route("/user/cart", get(get_cart))
                .route("/user/cart", delete(clear_cart))
                .route("/user/cart/items", post(add_cart_item))
                .route("/user/cart/items/{variant_id}", put(update_cart_item))
                .route("/user/cart/items/{variant_id}", delete(remove_cart_item));
        }

        if self.orders {
            protected = protected
                .route("/order/checkout", post(checkout))
                .route("/order", get(list_orders))
                .route("/order/{id}", get(get_order))
                .route("/order/{id}/cancel", post(cancel_order))
                .route("/order/{id}/payment-status", get(payment_status))
                .route("/order/{id}/fulfill", post(fulfill_order));
        }

        if self.payment_callback {
            public = public.route("/order/payment/callback", post(payment_callback));
        }

        if self.catalog {
            // Reads are public for storefront consumption; writes require
            // authentication
            public = public
                .route("/product", get(list_products))
                .route("/product/{id}", get(get_product))
                .route("/product/{id}/variants", get(list_variants))
                .route("/category", get(list_categories))
                .route("/category/{id}", get(get_category))
                .route("/variant/{id}", get(get_variant));
            protected = protected
                .route("/product", post(create_product))
                .route("/product/{id}", put(update_product))
                .route("/product/{id}", delete(delete_product))
                .route("/product/{id}/active", put(set_product_active))
                .route("/product/{id}/featured", put(set_product_featured))
                .route("/category", post(create_category))
                .route("/category/{id}", put(update_category))
                .route("/category/{id}", delete(delete_category))
                .route("/category/{id}/active", put(set_category_active))
                .route("/variant", post(create_variant))
                .route("/variant/{id}", put(update_variant))
                .route("/variant/{id}", delete(delete_variant))
                .route("/variant/{id}/active", put(set_variant_active))
                .route("/variant/{id}/stock", post(adjust_stock));
        }

        public.merge(protected.layer(from_fn_with_state(jwt_service, auth_middleware)))
    }
}

/// Build the complete application with every surface, the JWT middleware,
/// the rate limiter applied ahead of routing, request tracing, and
/// permissive CORS
pub fn create_app(state: AppState) -> Router {
    RouterBuilder::with_all_routes()
        .build(state.jwt_service.clone())
        .layer(from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .into_inner(),
        )
}
