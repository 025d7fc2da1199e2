//! Order Model
//!
//! Orders are created from a cart snapshot at checkout and advance through an
//! explicit state machine. Every status change goes through
//! [`OrderStatus::can_transition`] so invalid transitions are impossible to
//! express at the service layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an order
///
/// `pending -> awaiting_payment -> paid -> fulfilled`, with `cancelled`
/// reachable from any pre-`paid` state. The payment callback is the only
/// transition into `paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    AwaitingPayment,
    Paid,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    /// Whether a transition from `self` to `next` is legal
    pub fn can_transition(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, AwaitingPayment)
                | (AwaitingPayment, Paid)
                | (Paid, Fulfilled)
                | (Pending, Cancelled)
                | (AwaitingPayment, Cancelled)
        )
    }

    /// Whether the order can still be cancelled by its owner
    pub fn is_cancellable(self) -> bool {
        self.can_transition(OrderStatus::Cancelled)
    }

    /// Whether the order has reached a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Fulfilled | OrderStatus::Cancelled)
    }
}

/// A line item frozen into an order at checkout
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    /// Variant the line item was created from
    pub variant_id: Uuid,

    /// Product the variant belongs to
    pub product_id: Uuid,

    /// Product name captured at checkout
    pub name: String,

    /// Unit price in minor currency units, captured at checkout
    pub unit_price_cents: i64,

    /// Quantity ordered
    pub quantity: i32,
}

impl OrderItem {
    /// Line total in minor currency units
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * i64::from(self.quantity)
    }
}

/// An order created from a cart snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier for the order
    pub id: Uuid,

    /// Owner of the order
    pub user_id: Uuid,

    /// Current lifecycle status
    pub status: OrderStatus,

    /// Order total in minor currency units
    pub total_cents: i64,

    /// ISO currency code
    pub currency: String,

    /// External payment-gateway transaction reference, set once the gateway
    /// transaction has been created
    pub transaction_ref: Option<String>,

    /// Frozen line items
    pub items: Vec<OrderItem>,

    /// Timestamp when the order was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the order was last modified
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sum of all line totals
    pub fn computed_total_cents(&self) -> i64 {
        self.items.iter().map(OrderItem::line_total_cents).sum()
    }
}
