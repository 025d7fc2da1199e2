//! Cart Model
//!
//! The cart is a per-user working set of variant line items. Unit prices are
//! snapshotted when an item is added so the checkout total is the exact sum
//! the customer saw.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single line item in a user's cart
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartItem {
    /// Variant being purchased
    pub variant_id: Uuid,

    /// Product the variant belongs to
    pub product_id: Uuid,

    /// Product name captured when the item was added
    pub name: String,

    /// Unit price in minor currency units, captured when the item was added
    pub unit_price_cents: i64,

    /// Quantity requested
    pub quantity: i32,

    /// Timestamp when the item was added
    pub added_at: DateTime<Utc>,
}

/// A user's current cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: Uuid,
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Total of all line items in minor currency units
    pub fn total_cents(&self) -> i64 {
        self.items
            .iter()
            .map(|item| item.unit_price_cents * i64::from(item.quantity))
            .sum()
    }

    /// Whether the cart holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, quantity: i32) -> CartItem {
        CartItem {
            variant_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            name: "Widget".to_string(),
            unit_price_cents: price,
            quantity,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_total() {
        let cart = Cart {
            user_id: Uuid::new_v4(),
            items: vec![item(1000, 2), item(499, 3)],
        };
        assert_eq!(cart.total_cents(), 2000 + 1497);
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart {
            user_id: Uuid::new_v4(),
            items: vec![],
        };
        assert!(cart.is_empty());
        assert_eq!(cart.total_cents(), 0);
    }
}
