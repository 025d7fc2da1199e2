//! Commerce Service Library
//!
//! An e-commerce platform backend providing account lifecycle management,
//! catalog administration, cart handling, and an order/payment state machine,
//! exposed as a RESTful HTTP API. Designed for microservices architecture
//! with a focus on security, correctness, and maintainability.
//!
//! # Features
//!
//! - **Account Lifecycle**: Signup with email verification, password and OTP
//!   sign-in, password reset, and revocable refresh-token sessions
//! - **Password Security**: bcrypt hashing with configurable cost factors
//! - **Order State Machine**: Pending → AwaitingPayment → Paid → Fulfilled,
//!   with cancellation allowed only before payment
//! - **Idempotent Payment Callback**: Signature-verified gateway callbacks
//!   that tolerate redelivery
//! - **Rate Limiting**: Fixed-window budgets per client and endpoint
//!   category, enforced before request validation
//! - **Flexible Router**: Configurable surfaces via the RouterBuilder pattern
//! - **Database Integration**: PostgreSQL with connection pooling, plus an
//!   in-memory store for tests
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use commerce_service::{
//!     api::{create_app, AppState},
//!     config::AppConfig,
//!     database::DatabaseConfig,
//!     service::{
//!         AuthService, CartService, CatalogService, JwtService, LogMailer,
//!         MockGateway, OrderService, RateLimitService,
//!     },
//!     store::PgStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let pool = DatabaseConfig::from_env()?.create_pool().await?;
//!     let store = Arc::new(PgStore::new(pool));
//!
//!     let jwt_service = Arc::new(JwtService::new(&config.jwt, store.clone()));
//!     let state = AppState {
//!         auth_service: Arc::new(AuthService::new(
//!             store.clone(),
//!             jwt_service.clone(),
//!             Arc::new(LogMailer),
//!         )),
//!         jwt_service,
//!         cart_service: Arc::new(CartService::new(store.clone(), store.clone())),
//!         order_service: Arc::new(OrderService::new(
//!             store.clone(),
//!             store.clone(),
//!             store.clone(),
//!             Arc::new(MockGateway::new(config.payment.callback_secret.clone())),
//!             config.payment.currency.clone(),
//!         )),
//!         catalog_service: Arc::new(CatalogService::new(store.clone())),
//!         rate_limiter: Arc::new(RateLimitService::new(store, config.rate_limits.clone())),
//!     };
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(
//!         listener,
//!         create_app(state).into_make_service_with_connect_info::<std::net::SocketAddr>(),
//!     )
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized into several layers:
//!
//! - **API Layer**: HTTP handlers, middleware, and configurable routing
//! - **Service Layer**: Business logic for auth, cart, orders, and catalog
//! - **Store Layer**: Persistence traits with PostgreSQL and in-memory backends
//! - **Models**: Data structures and request/response types
//! - **Utils**: Shared utilities for security, validation, and error handling

/// HTTP API layer with handlers and configurable routing
pub mod api;

/// Configuration management for all service settings
pub mod config;

/// Database connection management and configuration
pub mod database;

/// Data models and request/response structures
pub mod models;

/// Business logic services
pub mod service;

/// Persistence traits and their PostgreSQL/in-memory implementations
pub mod store;

/// Shared utilities for security, validation, and error handling
pub mod utils;

// Re-export commonly used types for convenient access
pub use api::{create_app, AppState, RouterBuilder};
pub use models::{
    auth::{Session, TokenPair, UserContext},
    cart::{Cart, CartItem},
    catalog::{Category, Product, Variant},
    order::{Order, OrderItem, OrderStatus},
    requests::{
        AddCartItemRequest, CreateCategoryRequest, CreateProductRequest, CreateVariantRequest,
        LoginRequest, PaymentCallbackRequest, RefreshTokenRequest, SignupRequest,
        UpdateProfileRequest, VerifyEmailRequest,
    },
    user::{CodePurpose, User, VerificationCode},
};
pub use service::{
    AuthService, CartService, CatalogService, JwtService, LogMailer, Mailer, MockGateway,
    OrderService, PaymentGateway, RateLimitService,
};
pub use store::{MemoryStore, PgStore};
pub use utils::error::{AppError, AppResult, ErrorResponse};

// Re-export database utilities for configuration
pub use database::{DatabaseConfig, DatabasePool};

// Re-export configuration system
pub use config::{env, AppConfig, JwtConfig, PaymentConfig, ServerConfig};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
