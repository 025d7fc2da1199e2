//! Service Layer
//!
//! Business logic, composed over the storage traits. Each service exposes
//! its own error enum that converts into the API error taxonomy.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod jwt;
pub mod mailer;
pub mod order;
pub mod payment;
pub mod rate_limit;

pub use auth::{AuthService, AuthServiceError};
pub use cart::{CartService, CartServiceError};
pub use catalog::{CatalogService, CatalogServiceError};
pub use jwt::{JwtError, JwtService};
pub use mailer::{LogMailer, Mailer};
pub use order::{OrderService, OrderServiceError};
pub use payment::{MockGateway, PaymentGateway};
pub use rate_limit::{RateLimitCategory, RateLimitConfig, RateLimitError, RateLimitService};
