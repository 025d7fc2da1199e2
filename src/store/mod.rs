//! Persistence Layer
//!
//! Storage traits for every aggregate the services operate on, with a
//! Postgres implementation for production and an in-memory implementation
//! for tests. All multi-step invariants (stock never negative, order status
//! transitions, single-use codes) are enforced here with atomic guarded
//! updates so concurrent requests cannot observe intermediate states.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::cart::{Cart, CartItem};
use crate::models::catalog::{Category, Product, Variant};
use crate::models::order::{Order, OrderStatus};
use crate::models::user::{CodePurpose, UserWithSecrets, VerificationCode};
use crate::models::{Session, User};
use crate::utils::error::AppError;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors surfaced by the storage layer
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint was violated; carries the conflicting field name
    #[error("{0} is already in use")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => {
                AppError::Conflict(format!("{} is already in use", field))
            }
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

/// Fields required to create a user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
}

/// One fixed rate-limit window for a (key, category) pair
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RateLimitWindow {
    pub id: Uuid,
    /// Client identity the window is keyed on (IP address)
    pub key: String,
    /// Operation category the limit applies to
    pub category: String,
    pub attempts: i32,
    pub window_start: DateTime<Utc>,
    /// Set when the client is locked out beyond the current window
    pub blocked_until: Option<DateTime<Utc>>,
}

/// Storage operations for users and their verification codes
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with [`StoreError::Duplicate`] when the
    /// email or phone is already taken.
    async fn insert_user(&self, new_user: NewUser) -> StoreResult<UserWithSecrets>;

    async fn find_user_by_id(&self, user_id: Uuid) -> StoreResult<Option<UserWithSecrets>>;

    /// Lookup by normalized email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserWithSecrets>>;

    /// Update name and/or phone. Returns the updated profile, or `None`
    /// when the user does not exist.
    async fn update_profile(
        &self,
        user_id: Uuid,
        name: Option<String>,
        phone: Option<String>,
    ) -> StoreResult<Option<User>>;

    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> StoreResult<()>;

    async fn mark_email_verified(&self, user_id: Uuid) -> StoreResult<()>;

    /// Insert a fresh verification code, invalidating any previous active
    /// code for the same user and purpose.
    async fn insert_code(&self, code: VerificationCode) -> StoreResult<()>;

    /// Latest unconsumed code for the user and purpose, if any
    async fn find_active_code(
        &self,
        user_id: Uuid,
        purpose: CodePurpose,
    ) -> StoreResult<Option<VerificationCode>>;

    /// Record a failed redemption attempt; returns the new attempt count
    async fn increment_code_attempts(&self, code_id: Uuid) -> StoreResult<i32>;

    /// Mark a code as redeemed so it can never be used again
    async fn consume_code(&self, code_id: Uuid) -> StoreResult<()>;
}

/// Storage operations for refresh-token sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: Session) -> StoreResult<()>;

    async fn find_session(&self, session_id: Uuid) -> StoreResult<Option<Session>>;

    /// Update the session's last-used timestamp
    async fn touch_session(&self, session_id: Uuid) -> StoreResult<()>;

    /// Delete one session; returns whether a row was removed
    async fn delete_session(&self, session_id: Uuid) -> StoreResult<bool>;

    /// Delete every session belonging to the user; returns the count removed
    async fn delete_sessions_for_user(&self, user_id: Uuid) -> StoreResult<u64>;

    async fn delete_expired_sessions(&self) -> StoreResult<u64>;
}

/// Storage operations for per-user carts
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get_cart(&self, user_id: Uuid) -> StoreResult<Cart>;

    /// Add a line item, or increase the quantity of an existing line for
    /// the same variant. Returns the updated cart.
    async fn add_cart_item(&self, user_id: Uuid, item: CartItem) -> StoreResult<Cart>;

    /// Replace the quantity of an existing line. Returns `None` when the
    /// variant is not in the cart.
    async fn update_cart_quantity(
        &self,
        user_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
    ) -> StoreResult<Option<Cart>>;

    /// Remove one line. Returns `None` when the variant is not in the cart.
    async fn remove_cart_item(&self, user_id: Uuid, variant_id: Uuid)
        -> StoreResult<Option<Cart>>;

    async fn clear_cart(&self, user_id: Uuid) -> StoreResult<()>;
}

/// Storage operations for orders
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: Order) -> StoreResult<()>;

    async fn find_order(&self, order_id: Uuid) -> StoreResult<Option<Order>>;

    /// All orders for a user, newest first
    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>>;

    async fn find_order_by_transaction_ref(
        &self,
        transaction_ref: &str,
    ) -> StoreResult<Option<Order>>;

    /// Record the gateway transaction reference on an order
    async fn set_transaction_ref(
        &self,
        order_id: Uuid,
        transaction_ref: &str,
    ) -> StoreResult<()>;

    /// Atomically move an order from one of the `from` statuses to `to`.
    /// Returns the updated order, or `None` when the order is missing or not
    /// in an accepted source status. The guard and the write happen in a
    /// single statement so concurrent transitions cannot both succeed.
    async fn transition_status(
        &self,
        order_id: Uuid,
        from: &[OrderStatus],
        to: OrderStatus,
    ) -> StoreResult<Option<Order>>;
}

/// Storage operations for the product catalog
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_product(&self, product: Product) -> StoreResult<()>;
    async fn find_product(&self, product_id: Uuid) -> StoreResult<Option<Product>>;
    async fn list_products(&self) -> StoreResult<Vec<Product>>;
    /// Replace a product row. Returns `false` when the product is missing.
    async fn update_product(&self, product: &Product) -> StoreResult<bool>;
    async fn delete_product(&self, product_id: Uuid) -> StoreResult<bool>;

    async fn insert_category(&self, category: Category) -> StoreResult<()>;
    async fn find_category(&self, category_id: Uuid) -> StoreResult<Option<Category>>;
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn update_category(&self, category: &Category) -> StoreResult<bool>;
    async fn delete_category(&self, category_id: Uuid) -> StoreResult<bool>;

    async fn insert_variant(&self, variant: Variant) -> StoreResult<()>;
    async fn find_variant(&self, variant_id: Uuid) -> StoreResult<Option<Variant>>;
    async fn list_variants_for_product(&self, product_id: Uuid) -> StoreResult<Vec<Variant>>;
    async fn update_variant(&self, variant: &Variant) -> StoreResult<bool>;
    async fn delete_variant(&self, variant_id: Uuid) -> StoreResult<bool>;

    /// Atomically adjust stock by a signed delta, refusing any change that
    /// would make stock negative. Returns the updated variant, or `None`
    /// when the variant is missing or the guard failed.
    async fn adjust_stock(&self, variant_id: Uuid, delta: i32) -> StoreResult<Option<Variant>>;
}

/// Storage operations for rate-limit windows
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Current window for the key and category, if one exists
    async fn find_window(&self, key: &str, category: &str)
        -> StoreResult<Option<RateLimitWindow>>;

    /// Insert or replace the window for its (key, category) pair
    async fn save_window(&self, window: RateLimitWindow) -> StoreResult<()>;

    /// Remove windows whose start is older than the cutoff and whose
    /// lockout, if any, has passed. Returns the count removed.
    async fn delete_expired_windows(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;
}
