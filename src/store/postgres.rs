//! Postgres Store
//!
//! Production implementation of the storage traits over a sqlx connection
//! pool. Guarded updates (stock, order status) are expressed as single
//! conditional UPDATE statements so the database is the point of atomicity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::cart::{Cart, CartItem};
use crate::models::catalog::{Category, Product, Variant};
use crate::models::order::{Order, OrderItem, OrderStatus};
use crate::models::user::{CodePurpose, UserWithSecrets, VerificationCode};
use crate::models::{Session, User};

use super::{
    CartStore, CatalogStore, NewUser, OrderStore, RateLimitStore, RateLimitWindow, SessionStore,
    StoreError, StoreResult, UserStore,
};

/// Postgres-backed implementation of all storage traits
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_cart(&self, user_id: Uuid) -> StoreResult<Cart> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT variant_id, product_id, name, unit_price_cents, quantity, added_at
            FROM cart_items
            WHERE user_id = $1
            ORDER BY added_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Cart { user_id, items })
    }

    async fn load_order_items(&self, order_id: Uuid) -> StoreResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT variant_id, product_id, name, unit_price_cents, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn assemble_order(&self, row: OrderRow) -> StoreResult<Order> {
        let items = self.load_order_items(row.id).await?;
        Ok(row.into_order(items))
    }
}

/// Maps a unique-constraint violation onto [`StoreError::Duplicate`] using
/// the constraint name, falling back to the raw database error.
fn map_unique_violation(err: sqlx::Error, fields: &[(&str, &str)]) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if let Some(constraint) = db_err.constraint() {
            for (needle, field) in fields {
                if constraint.contains(needle) {
                    return StoreError::Duplicate((*field).to_string());
                }
            }
        }
    }
    StoreError::Database(err)
}

/// Flat order row; line items live in `order_items`
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    status: OrderStatus,
    total_cents: i64,
    currency: String,
    transaction_ref: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            status: self.status,
            total_cents: self.total_cents,
            currency: self.currency,
            transaction_ref: self.transaction_ref,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, new_user: NewUser) -> StoreResult<UserWithSecrets> {
        sqlx::query_as::<_, UserWithSecrets>(
            r#"
            INSERT INTO users (id, name, email, phone, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, phone, password_hash, email_verified,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.phone)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &[("email", "email"), ("phone", "phone")]))
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> StoreResult<Option<UserWithSecrets>> {
        let user = sqlx::query_as::<_, UserWithSecrets>(
            r#"
            SELECT id, name, email, phone, password_hash, email_verified,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserWithSecrets>> {
        let user = sqlx::query_as::<_, UserWithSecrets>(
            r#"
            SELECT id, name, email, phone, password_hash, email_verified,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        name: Option<String>,
        phone: Option<String>,
    ) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, phone, email_verified, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &[("phone", "phone")]))
    }

    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> StoreResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_email_verified(&self, user_id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE users SET email_verified = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_code(&self, code: VerificationCode) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM verification_codes WHERE user_id = $1 AND purpose = $2",
        )
        .bind(code.user_id)
        .bind(code.purpose)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO verification_codes
                (id, user_id, purpose, code_hash, expires_at, attempts, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(code.id)
        .bind(code.user_id)
        .bind(code.purpose)
        .bind(&code.code_hash)
        .bind(code.expires_at)
        .bind(code.attempts)
        .bind(code.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_active_code(
        &self,
        user_id: Uuid,
        purpose: CodePurpose,
    ) -> StoreResult<Option<VerificationCode>> {
        let code = sqlx::query_as::<_, VerificationCode>(
            r#"
            SELECT id, user_id, purpose, code_hash, expires_at, attempts,
                   consumed_at, created_at
            FROM verification_codes
            WHERE user_id = $1 AND purpose = $2 AND consumed_at IS NULL
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(purpose)
        .fetch_optional(&self.pool)
        .await?;
        Ok(code)
    }

    async fn increment_code_attempts(&self, code_id: Uuid) -> StoreResult<i32> {
        let attempts: Option<(i32,)> = sqlx::query_as(
            r#"
            UPDATE verification_codes
            SET attempts = attempts + 1
            WHERE id = $1
            RETURNING attempts
            "#,
        )
        .bind(code_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempts.map(|(a,)| a).unwrap_or(0))
    }

    async fn consume_code(&self, code_id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE verification_codes SET consumed_at = NOW() WHERE id = $1")
            .bind(code_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn insert_session(&self, session: Session) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions
                (id, user_id, refresh_token_hash, expires_at, created_at, last_used_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.refresh_token_hash)
        .bind(session.expires_at)
        .bind(session.created_at)
        .bind(session.last_used_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> StoreResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, refresh_token_hash, expires_at, created_at, last_used_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn touch_session(&self, session_id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE sessions SET last_used_at = NOW() WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_sessions_for_user(&self, user_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_expired_sessions(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn get_cart(&self, user_id: Uuid) -> StoreResult<Cart> {
        self.load_cart(user_id).await
    }

    async fn add_cart_item(&self, user_id: Uuid, item: CartItem) -> StoreResult<Cart> {
        sqlx::query(
            r#"
            INSERT INTO cart_items
                (user_id, variant_id, product_id, name, unit_price_cents, quantity, added_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, variant_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            "#,
        )
        .bind(user_id)
        .bind(item.variant_id)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.unit_price_cents)
        .bind(item.quantity)
        .bind(item.added_at)
        .execute(&self.pool)
        .await?;

        self.load_cart(user_id).await
    }

    async fn update_cart_quantity(
        &self,
        user_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
    ) -> StoreResult<Option<Cart>> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $3 WHERE user_id = $1 AND variant_id = $2",
        )
        .bind(user_id)
        .bind(variant_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(self.load_cart(user_id).await?))
    }

    async fn remove_cart_item(
        &self,
        user_id: Uuid,
        variant_id: Uuid,
    ) -> StoreResult<Option<Cart>> {
        let result =
            sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND variant_id = $2")
                .bind(user_id)
                .bind(variant_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(self.load_cart(user_id).await?))
    }

    async fn clear_cart(&self, user_id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: Order) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders
                (id, user_id, status, total_cents, currency, transaction_ref,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.status)
        .bind(order.total_cents)
        .bind(&order.currency)
        .bind(&order.transaction_ref)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items
                    (order_id, position, variant_id, product_id, name,
                     unit_price_cents, quantity)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(order.id)
            .bind(position as i32)
            .bind(item.variant_id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_order(&self, order_id: Uuid) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, status, total_cents, currency, transaction_ref,
                   created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.assemble_order(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, status, total_cents, currency, transaction_ref,
                   created_at, updated_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(self.assemble_order(row).await?);
        }
        Ok(orders)
    }

    async fn find_order_by_transaction_ref(
        &self,
        transaction_ref: &str,
    ) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, status, total_cents, currency, transaction_ref,
                   created_at, updated_at
            FROM orders
            WHERE transaction_ref = $1
            "#,
        )
        .bind(transaction_ref)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.assemble_order(row).await?)),
            None => Ok(None),
        }
    }

    async fn set_transaction_ref(
        &self,
        order_id: Uuid,
        transaction_ref: &str,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE orders SET transaction_ref = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(order_id)
        .bind(transaction_ref)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn transition_status(
        &self,
        order_id: Uuid,
        from: &[OrderStatus],
        to: OrderStatus,
    ) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = ANY($3)
            RETURNING id, user_id, status, total_cents, currency, transaction_ref,
                      created_at, updated_at
            "#,
        )
        .bind(order_id)
        .bind(to)
        .bind(from.to_vec())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.assemble_order(row).await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn insert_product(&self, product: Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, slug, description, category_id, active, featured,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.category_id)
        .bind(product.active)
        .bind(product.featured)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &[("slug", "slug")]))?;
        Ok(())
    }

    async fn find_product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let products =
            sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;
        Ok(products)
    }

    async fn update_product(&self, product: &Product) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, category_id = $4, active = $5,
                featured = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category_id)
        .bind(product.active)
        .bind(product.featured)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_product(&self, product_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_category(&self, category: Category) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(category.active)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &[("slug", "slug")]))?;
        Ok(())
    }

    async fn find_category(&self, category_id: Uuid) -> StoreResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
                .bind(category_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(category)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    async fn update_category(&self, category: &Category) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE categories SET name = $2, active = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(category.active)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_category(&self, category_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_variant(&self, variant: Variant) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO variants
                (id, product_id, sku, name, price_cents, stock, active,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(variant.id)
        .bind(variant.product_id)
        .bind(&variant.sku)
        .bind(&variant.name)
        .bind(variant.price_cents)
        .bind(variant.stock)
        .bind(variant.active)
        .bind(variant.created_at)
        .bind(variant.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &[("sku", "sku")]))?;
        Ok(())
    }

    async fn find_variant(&self, variant_id: Uuid) -> StoreResult<Option<Variant>> {
        let variant = sqlx::query_as::<_, Variant>("SELECT * FROM variants WHERE id = $1")
            .bind(variant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(variant)
    }

    async fn list_variants_for_product(&self, product_id: Uuid) -> StoreResult<Vec<Variant>> {
        let variants = sqlx::query_as::<_, Variant>(
            "SELECT * FROM variants WHERE product_id = $1 ORDER BY created_at",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(variants)
    }

    async fn update_variant(&self, variant: &Variant) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE variants
            SET name = $2, price_cents = $3, active = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(variant.id)
        .bind(&variant.name)
        .bind(variant.price_cents)
        .bind(variant.active)
        .bind(variant.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_variant(&self, variant_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM variants WHERE id = $1")
            .bind(variant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust_stock(&self, variant_id: Uuid, delta: i32) -> StoreResult<Option<Variant>> {
        let variant = sqlx::query_as::<_, Variant>(
            r#"
            UPDATE variants
            SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1 AND stock + $2 >= 0
            RETURNING *
            "#,
        )
        .bind(variant_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;
        Ok(variant)
    }
}

#[async_trait]
impl RateLimitStore for PgStore {
    async fn find_window(
        &self,
        key: &str,
        category: &str,
    ) -> StoreResult<Option<RateLimitWindow>> {
        let window = sqlx::query_as::<_, RateLimitWindow>(
            r#"
            SELECT id, key, category, attempts, window_start, blocked_until
            FROM rate_limit_windows
            WHERE key = $1 AND category = $2
            "#,
        )
        .bind(key)
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;
        Ok(window)
    }

    async fn save_window(&self, window: RateLimitWindow) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rate_limit_windows
                (id, key, category, attempts, window_start, blocked_until)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (key, category)
            DO UPDATE SET attempts = EXCLUDED.attempts,
                          window_start = EXCLUDED.window_start,
                          blocked_until = EXCLUDED.blocked_until
            "#,
        )
        .bind(window.id)
        .bind(&window.key)
        .bind(&window.category)
        .bind(window.attempts)
        .bind(window.window_start)
        .bind(window.blocked_until)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_expired_windows(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM rate_limit_windows
            WHERE window_start < $1
              AND (blocked_until IS NULL OR blocked_until <= NOW())
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
