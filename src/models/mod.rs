//! Data Models
//!
//! Domain entities and request/response payloads.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod requests;
pub mod user;

pub use auth::{AccessTokenClaims, RefreshTokenClaims, Session, TokenPair, UserContext};
pub use cart::{Cart, CartItem};
pub use catalog::{Category, Product, Variant};
pub use order::{Order, OrderItem, OrderStatus};
pub use user::{CodePurpose, User, UserWithSecrets, VerificationCode};
