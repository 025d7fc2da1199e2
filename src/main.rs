//! Commerce Service Development Server
//!
//! A complete HTTP server with every API surface enabled, for local
//! development and testing. Production deployments that need a narrower
//! surface should use the RouterBuilder in their own binary.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;

use commerce_service::{
    api::{create_app, AppState},
    config::AppConfig,
    database::DatabaseConfig,
    service::{
        AuthService, CartService, CatalogService, JwtService, LogMailer, MockGateway,
        OrderService, RateLimitService,
    },
    store::PgStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // Initialize structured logging for development
    env_logger::init();

    log::info!(
        "🚀 Starting Commerce Service v{}",
        commerce_service::VERSION
    );

    // Load configuration from environment
    let config = AppConfig::from_env()?;
    config.validate()?;

    log::info!("✅ Configuration loaded and validated");

    // Database configuration and connection
    let db_config = DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        connect_timeout: Duration::from_secs(config.database.connect_timeout_seconds),
        idle_timeout: Duration::from_secs(config.database.idle_timeout_seconds),
    };
    let pool = db_config.create_pool().await?;

    // Run database migrations
    log::info!("🔄 Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("✅ Database migrations completed");

    // One PostgreSQL store backs every persistence trait
    let store = Arc::new(PgStore::new(pool));

    let jwt_service = Arc::new(JwtService::new(&config.jwt, store.clone()));
    let auth_service = Arc::new(AuthService::new(
        store.clone(),
        jwt_service.clone(),
        Arc::new(LogMailer),
    ));
    let cart_service = Arc::new(CartService::new(store.clone(), store.clone()));
    let order_service = Arc::new(OrderService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(MockGateway::new(config.payment.callback_secret.clone())),
        config.payment.currency.clone(),
    ));
    let catalog_service = Arc::new(CatalogService::new(store.clone()));
    let rate_limiter = Arc::new(RateLimitService::new(store, config.rate_limits.clone()));

    log::info!("✅ Services initialized");
    log::info!(
        "   - Rate limiting: login {} attempts per {} minutes",
        config.rate_limits.login.max_attempts,
        config.rate_limits.login.window_minutes
    );
    log::info!("   - Order currency: {}", config.payment.currency);

    let state = AppState {
        auth_service,
        jwt_service,
        cart_service,
        order_service,
        catalog_service,
        rate_limiter,
    };

    let app = create_app(state);

    // Server configuration
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    log::info!("🌐 Starting server on {}", bind_addr);

    log::info!("📋 API Endpoints:");
    log::info!("   GET  /health - Health check");
    log::info!("   POST /auth/signup - Create account, sends verification code");
    log::info!("   POST /auth/verify-email - Redeem verification code");
    log::info!("   POST /auth/login - Password sign-in");
    log::info!("   POST /auth/otp/request | /auth/otp/verify - OTP sign-in");
    log::info!("   POST /auth/forgot-password | /auth/reset-password - Password reset");
    log::info!("   POST /auth/refresh | /auth/logout | /auth/logout-all - Sessions");
    log::info!("   GET/PUT /user/profile - Profile");
    log::info!("   GET/POST/PUT/DELETE /user/cart... - Cart");
    log::info!("   POST /order/checkout, GET /order, POST /order/{{id}}/cancel - Orders");
    log::info!("   POST /order/payment/callback - Signed gateway callback");
    log::info!("   CRUD /product, /category, /variant - Catalog");

    // ConnectInfo is required so the rate limiter can fall back to the
    // socket address when no X-Forwarded-For header is present
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("✅ Server listening and ready for requests");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
