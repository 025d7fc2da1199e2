//! API Layer
//!
//! HTTP handlers, middleware, and route assembly.

pub mod catalog_handlers;
pub mod handlers;
pub mod middleware;
pub mod order_handlers;
pub mod routes;
pub mod security_middleware;

pub use handlers::{AppState, SuccessResponse};
pub use middleware::{auth_middleware, AuthUser};
pub use routes::{create_app, RouterBuilder};
pub use security_middleware::rate_limit_middleware;
