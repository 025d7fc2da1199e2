//! In-Memory Store
//!
//! A complete implementation of the storage traits over mutex-guarded maps.
//! Used by the test suite and useful for local development without Postgres.
//! The guarded operations (stock adjustment, status transitions) hold the
//! aggregate's lock across check and write, matching the atomicity the
//! Postgres implementation gets from single guarded statements.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::cart::{Cart, CartItem};
use crate::models::catalog::{Category, Product, Variant};
use crate::models::order::{Order, OrderStatus};
use crate::models::user::{CodePurpose, UserWithSecrets, VerificationCode};
use crate::models::{Session, User};

use super::{
    CartStore, CatalogStore, NewUser, OrderStore, RateLimitStore, RateLimitWindow, SessionStore,
    StoreError, StoreResult, UserStore,
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, UserWithSecrets>,
    codes: HashMap<Uuid, VerificationCode>,
    sessions: HashMap<Uuid, Session>,
    carts: HashMap<Uuid, Vec<CartItem>>,
    orders: HashMap<Uuid, Order>,
    products: HashMap<Uuid, Product>,
    categories: HashMap<Uuid, Category>,
    variants: HashMap<Uuid, Variant>,
    rate_limit_windows: HashMap<(String, String), RateLimitWindow>,
}

/// In-memory implementation of all storage traits
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, new_user: NewUser) -> StoreResult<UserWithSecrets> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }
        if state.users.values().any(|u| u.phone == new_user.phone) {
            return Err(StoreError::Duplicate("phone".to_string()));
        }

        let now = Utc::now();
        let user = UserWithSecrets {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            phone: new_user.phone,
            password_hash: new_user.password_hash,
            email_verified: false,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> StoreResult<Option<UserWithSecrets>> {
        let state = self.state.lock().await;
        Ok(state.users.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserWithSecrets>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        name: Option<String>,
        phone: Option<String>,
    ) -> StoreResult<Option<User>> {
        let mut state = self.state.lock().await;
        if let Some(ref phone) = phone {
            if state
                .users
                .values()
                .any(|u| u.id != user_id && &u.phone == phone)
            {
                return Err(StoreError::Duplicate("phone".to_string()));
            }
        }

        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            user.name = name;
        }
        if let Some(phone) = phone {
            user.phone = phone;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone().into()))
    }

    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&user_id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_email_verified(&self, user_id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&user_id) {
            user.email_verified = true;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn insert_code(&self, code: VerificationCode) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state
            .codes
            .retain(|_, c| !(c.user_id == code.user_id && c.purpose == code.purpose));
        state.codes.insert(code.id, code);
        Ok(())
    }

    async fn find_active_code(
        &self,
        user_id: Uuid,
        purpose: CodePurpose,
    ) -> StoreResult<Option<VerificationCode>> {
        let state = self.state.lock().await;
        Ok(state
            .codes
            .values()
            .filter(|c| c.user_id == user_id && c.purpose == purpose && !c.is_consumed())
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn increment_code_attempts(&self, code_id: Uuid) -> StoreResult<i32> {
        let mut state = self.state.lock().await;
        match state.codes.get_mut(&code_id) {
            Some(code) => {
                code.attempts += 1;
                Ok(code.attempts)
            }
            None => Ok(0),
        }
    }

    async fn consume_code(&self, code_id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if let Some(code) = state.codes.get_mut(&code_id) {
            code.consumed_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, session: Session) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.sessions.insert(session.id, session);
        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> StoreResult<Option<Session>> {
        let state = self.state.lock().await;
        Ok(state.sessions.get(&session_id).cloned())
    }

    async fn touch_session(&self, session_id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if let Some(session) = state.sessions.get_mut(&session_id) {
            session.last_used_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(state.sessions.remove(&session_id).is_some())
    }

    async fn delete_sessions_for_user(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - state.sessions.len()) as u64)
    }

    async fn delete_expired_sessions(&self) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let before = state.sessions.len();
        state.sessions.retain(|_, s| s.expires_at > now);
        Ok((before - state.sessions.len()) as u64)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn get_cart(&self, user_id: Uuid) -> StoreResult<Cart> {
        let state = self.state.lock().await;
        Ok(Cart {
            user_id,
            items: state.carts.get(&user_id).cloned().unwrap_or_default(),
        })
    }

    async fn add_cart_item(&self, user_id: Uuid, item: CartItem) -> StoreResult<Cart> {
        let mut state = self.state.lock().await;
        let items = state.carts.entry(user_id).or_default();
        match items.iter_mut().find(|i| i.variant_id == item.variant_id) {
            Some(existing) => existing.quantity += item.quantity,
            None => items.push(item),
        }
        Ok(Cart {
            user_id,
            items: items.clone(),
        })
    }

    async fn update_cart_quantity(
        &self,
        user_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
    ) -> StoreResult<Option<Cart>> {
        let mut state = self.state.lock().await;
        let Some(items) = state.carts.get_mut(&user_id) else {
            return Ok(None);
        };
        let Some(item) = items.iter_mut().find(|i| i.variant_id == variant_id) else {
            return Ok(None);
        };
        item.quantity = quantity;
        Ok(Some(Cart {
            user_id,
            items: items.clone(),
        }))
    }

    async fn remove_cart_item(
        &self,
        user_id: Uuid,
        variant_id: Uuid,
    ) -> StoreResult<Option<Cart>> {
        let mut state = self.state.lock().await;
        let Some(items) = state.carts.get_mut(&user_id) else {
            return Ok(None);
        };
        let before = items.len();
        items.retain(|i| i.variant_id != variant_id);
        if items.len() == before {
            return Ok(None);
        }
        Ok(Some(Cart {
            user_id,
            items: items.clone(),
        }))
    }

    async fn clear_cart(&self, user_id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.carts.remove(&user_id);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: Order) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.orders.insert(order.id, order);
        Ok(())
    }

    async fn find_order(&self, order_id: Uuid) -> StoreResult<Option<Order>> {
        let state = self.state.lock().await;
        Ok(state.orders.get(&order_id).cloned())
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn find_order_by_transaction_ref(
        &self,
        transaction_ref: &str,
    ) -> StoreResult<Option<Order>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .values()
            .find(|o| o.transaction_ref.as_deref() == Some(transaction_ref))
            .cloned())
    }

    async fn set_transaction_ref(
        &self,
        order_id: Uuid,
        transaction_ref: &str,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if let Some(order) = state.orders.get_mut(&order_id) {
            order.transaction_ref = Some(transaction_ref.to_string());
            order.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn transition_status(
        &self,
        order_id: Uuid,
        from: &[OrderStatus],
        to: OrderStatus,
    ) -> StoreResult<Option<Order>> {
        let mut state = self.state.lock().await;
        let Some(order) = state.orders.get_mut(&order_id) else {
            return Ok(None);
        };
        if !from.contains(&order.status) {
            return Ok(None);
        }
        order.status = to;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn insert_product(&self, product: Product) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.products.values().any(|p| p.slug == product.slug) {
            return Err(StoreError::Duplicate("slug".to_string()));
        }
        state.products.insert(product.id, product);
        Ok(())
    }

    async fn find_product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
        let state = self.state.lock().await;
        Ok(state.products.get(&product_id).cloned())
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let state = self.state.lock().await;
        let mut products: Vec<Product> = state.products.values().cloned().collect();
        products.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(products)
    }

    async fn update_product(&self, product: &Product) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        if !state.products.contains_key(&product.id) {
            return Ok(false);
        }
        state.products.insert(product.id, product.clone());
        Ok(true)
    }

    async fn delete_product(&self, product_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        state.variants.retain(|_, v| v.product_id != product_id);
        Ok(state.products.remove(&product_id).is_some())
    }

    async fn insert_category(&self, category: Category) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.categories.values().any(|c| c.slug == category.slug) {
            return Err(StoreError::Duplicate("slug".to_string()));
        }
        state.categories.insert(category.id, category);
        Ok(())
    }

    async fn find_category(&self, category_id: Uuid) -> StoreResult<Option<Category>> {
        let state = self.state.lock().await;
        Ok(state.categories.get(&category_id).cloned())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let state = self.state.lock().await;
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(categories)
    }

    async fn update_category(&self, category: &Category) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        if !state.categories.contains_key(&category.id) {
            return Ok(false);
        }
        state.categories.insert(category.id, category.clone());
        Ok(true)
    }

    async fn delete_category(&self, category_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        for product in state.products.values_mut() {
            if product.category_id == Some(category_id) {
                product.category_id = None;
            }
        }
        Ok(state.categories.remove(&category_id).is_some())
    }

    async fn insert_variant(&self, variant: Variant) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.variants.values().any(|v| v.sku == variant.sku) {
            return Err(StoreError::Duplicate("sku".to_string()));
        }
        state.variants.insert(variant.id, variant);
        Ok(())
    }

    async fn find_variant(&self, variant_id: Uuid) -> StoreResult<Option<Variant>> {
        let state = self.state.lock().await;
        Ok(state.variants.get(&variant_id).cloned())
    }

    async fn list_variants_for_product(&self, product_id: Uuid) -> StoreResult<Vec<Variant>> {
        let state = self.state.lock().await;
        let mut variants: Vec<Variant> = state
            .variants
            .values()
            .filter(|v| v.product_id == product_id)
            .cloned()
            .collect();
        variants.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(variants)
    }

    async fn update_variant(&self, variant: &Variant) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        if !state.variants.contains_key(&variant.id) {
            return Ok(false);
        }
        state.variants.insert(variant.id, variant.clone());
        Ok(true)
    }

    async fn delete_variant(&self, variant_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(state.variants.remove(&variant_id).is_some())
    }

    async fn adjust_stock(&self, variant_id: Uuid, delta: i32) -> StoreResult<Option<Variant>> {
        let mut state = self.state.lock().await;
        let Some(variant) = state.variants.get_mut(&variant_id) else {
            return Ok(None);
        };
        let new_stock = variant.stock + delta;
        if new_stock < 0 {
            return Ok(None);
        }
        variant.stock = new_stock;
        variant.updated_at = Utc::now();
        Ok(Some(variant.clone()))
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn find_window(
        &self,
        key: &str,
        category: &str,
    ) -> StoreResult<Option<RateLimitWindow>> {
        let state = self.state.lock().await;
        Ok(state
            .rate_limit_windows
            .get(&(key.to_string(), category.to_string()))
            .cloned())
    }

    async fn save_window(&self, window: RateLimitWindow) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state
            .rate_limit_windows
            .insert((window.key.clone(), window.category.clone()), window);
        Ok(())
    }

    async fn delete_expired_windows(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let before = state.rate_limit_windows.len();
        state.rate_limit_windows.retain(|_, w| {
            w.window_start >= cutoff || w.blocked_until.map(|b| b > now).unwrap_or(false)
        });
        Ok((before - state.rate_limit_windows.len()) as u64)
    }
}
