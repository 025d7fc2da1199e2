//! Cart Service
//!
//! Per-user cart management. Adding an item snapshots the product name and
//! current unit price so checkout charges exactly what the customer saw.
//! Stock is only reserved at checkout; the add-time check is a courtesy.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::models::cart::{Cart, CartItem};
use crate::store::{CartStore, CatalogStore, StoreError};
use crate::utils::error::AppError;

/// Cart service errors
#[derive(Debug, thiserror::Error)]
pub enum CartServiceError {
    #[error("Variant not found")]
    VariantNotFound,

    #[error("Variant is not available in the requested quantity")]
    VariantUnavailable,

    #[error("Item is not in the cart")]
    NotInCart,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<CartServiceError> for AppError {
    fn from(err: CartServiceError) -> Self {
        match err {
            CartServiceError::VariantNotFound => {
                AppError::NotFound("Variant not found".to_string())
            }
            CartServiceError::VariantUnavailable => AppError::Validation(
                "Variant is not available in the requested quantity".to_string(),
            ),
            CartServiceError::NotInCart => {
                AppError::NotFound("Item is not in the cart".to_string())
            }
            CartServiceError::Store(e) => e.into(),
        }
    }
}

/// Service managing per-user carts
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { carts, catalog }
    }

    pub async fn get_cart(&self, user_id: Uuid) -> Result<Cart, CartServiceError> {
        Ok(self.carts.get_cart(user_id).await?)
    }

    /// Add a variant to the cart, merging with an existing line for the
    /// same variant
    pub async fn add_item(
        &self,
        user_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
    ) -> Result<Cart, CartServiceError> {
        let variant = self
            .catalog
            .find_variant(variant_id)
            .await?
            .ok_or(CartServiceError::VariantNotFound)?;
        if !variant.is_purchasable(quantity) {
            return Err(CartServiceError::VariantUnavailable);
        }

        let name = match self.catalog.find_product(variant.product_id).await? {
            Some(product) => format!("{} ({})", product.name, variant.name),
            None => variant.name.clone(),
        };

        let cart = self
            .carts
            .add_cart_item(
                user_id,
                CartItem {
                    variant_id: variant.id,
                    product_id: variant.product_id,
                    name,
                    unit_price_cents: variant.price_cents,
                    quantity,
                    added_at: Utc::now(),
                },
            )
            .await?;
        Ok(cart)
    }

    /// Replace the quantity of an existing line
    pub async fn update_quantity(
        &self,
        user_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
    ) -> Result<Cart, CartServiceError> {
        self.carts
            .update_cart_quantity(user_id, variant_id, quantity)
            .await?
            .ok_or(CartServiceError::NotInCart)
    }

    pub async fn remove_item(
        &self,
        user_id: Uuid,
        variant_id: Uuid,
    ) -> Result<Cart, CartServiceError> {
        self.carts
            .remove_cart_item(user_id, variant_id)
            .await?
            .ok_or(CartServiceError::NotInCart)
    }

    pub async fn clear(&self, user_id: Uuid) -> Result<(), CartServiceError> {
        Ok(self.carts.clear_cart(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::{Product, Variant};
    use crate::store::MemoryStore;

    async fn seed_variant(store: &MemoryStore, price: i64, stock: i32, active: bool) -> Uuid {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: "Widget".to_string(),
            slug: format!("widget-{}", Uuid::new_v4().simple()),
            description: None,
            category_id: None,
            active: true,
            featured: false,
            created_at: now,
            updated_at: now,
        };
        let variant = Variant {
            id: Uuid::new_v4(),
            product_id: product.id,
            sku: format!("SKU-{}", Uuid::new_v4().simple()),
            name: "Blue".to_string(),
            price_cents: price,
            stock,
            active,
            created_at: now,
            updated_at: now,
        };
        store.insert_product(product).await.unwrap();
        let variant_id = variant.id;
        store.insert_variant(variant).await.unwrap();
        variant_id
    }

    fn cart_service(store: Arc<MemoryStore>) -> CartService {
        CartService::new(store.clone(), store)
    }

    #[tokio::test]
    async fn test_add_item_snapshots_price_and_name() {
        let store = Arc::new(MemoryStore::new());
        let variant_id = seed_variant(&store, 1999, 10, true).await;
        let service = cart_service(store);

        let user_id = Uuid::new_v4();
        let cart = service.add_item(user_id, variant_id, 2).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].unit_price_cents, 1999);
        assert_eq!(cart.items[0].name, "Widget (Blue)");
        assert_eq!(cart.total_cents(), 3998);
    }

    #[tokio::test]
    async fn test_add_inactive_variant_rejected() {
        let store = Arc::new(MemoryStore::new());
        let variant_id = seed_variant(&store, 1999, 10, false).await;
        let service = cart_service(store);

        let result = service.add_item(Uuid::new_v4(), variant_id, 1).await;
        assert!(matches!(result, Err(CartServiceError::VariantUnavailable)));
    }

    #[tokio::test]
    async fn test_add_beyond_stock_rejected() {
        let store = Arc::new(MemoryStore::new());
        let variant_id = seed_variant(&store, 1999, 2, true).await;
        let service = cart_service(store);

        let result = service.add_item(Uuid::new_v4(), variant_id, 3).await;
        assert!(matches!(result, Err(CartServiceError::VariantUnavailable)));
    }

    #[tokio::test]
    async fn test_update_missing_line_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let service = cart_service(store);

        let result = service
            .update_quantity(Uuid::new_v4(), Uuid::new_v4(), 2)
            .await;
        assert!(matches!(result, Err(CartServiceError::NotInCart)));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let store = Arc::new(MemoryStore::new());
        let variant_id = seed_variant(&store, 500, 5, true).await;
        let service = cart_service(store);
        let user_id = Uuid::new_v4();

        service.add_item(user_id, variant_id, 1).await.unwrap();
        let cart = service.remove_item(user_id, variant_id).await.unwrap();
        assert!(cart.is_empty());

        service.add_item(user_id, variant_id, 1).await.unwrap();
        service.clear(user_id).await.unwrap();
        assert!(service.get_cart(user_id).await.unwrap().is_empty());
    }
}
