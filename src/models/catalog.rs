//! Catalog Models
//!
//! Products, categories, and purchasable variants. Catalog entities carry no
//! domain invariants beyond unique identifying fields and non-negative stock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product listed in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// URL-safe unique identifier
    pub slug: String,

    pub description: Option<String>,

    /// Owning category, if assigned
    pub category_id: Option<Uuid>,

    /// Whether the product is visible in the storefront
    pub active: bool,

    /// Whether the product is highlighted in featured listings
    pub featured: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A grouping of products
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,

    /// URL-safe unique identifier
    pub slug: String,

    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchasable variant of a product (size, colour, ...)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Variant {
    pub id: Uuid,
    pub product_id: Uuid,

    /// Unique stock-keeping unit
    pub sku: String,

    /// Variant display name ("Large / Blue")
    pub name: String,

    /// Unit price in minor currency units
    pub price_cents: i64,

    /// Units currently in stock; never negative
    pub stock: i32,

    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Variant {
    /// Whether the variant can be added to a cart in the given quantity
    pub fn is_purchasable(&self, quantity: i32) -> bool {
        self.active && quantity > 0 && self.stock >= quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(active: bool, stock: i32) -> Variant {
        Variant {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            sku: "WID-BLU-L".to_string(),
            name: "Large / Blue".to_string(),
            price_cents: 1999,
            stock,
            active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_purchasable_checks_stock_and_active() {
        assert!(variant(true, 5).is_purchasable(5));
        assert!(!variant(true, 5).is_purchasable(6));
        assert!(!variant(false, 5).is_purchasable(1));
        assert!(!variant(true, 5).is_purchasable(0));
    }
}
