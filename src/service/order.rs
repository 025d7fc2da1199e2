//! Order Service
//!
//! Checkout and the order lifecycle. An order is a frozen snapshot of the
//! cart; its status only moves through the transitions the state machine
//! allows, and every transition is an atomic guarded store update, so
//! concurrent callbacks, cancellations, and fulfillments cannot race an
//! order into an illegal state.
//!
//! The payment callback is delivered at least once; replays of an outcome
//! that has already been applied are acknowledged without touching the
//! order again.

use std::sync::Arc;

use chrono::Utc;
use log::{error, info, warn};
use uuid::Uuid;

use crate::models::order::{Order, OrderItem, OrderStatus};
use crate::models::requests::PaymentCallbackRequest;
use crate::service::payment::PaymentGateway;
use crate::store::{CartStore, CatalogStore, OrderStore, StoreError};
use crate::utils::error::AppError;

/// Gateway-reported outcome values accepted on the callback
const CALLBACK_SUCCEEDED: &str = "succeeded";
const CALLBACK_FAILED: &str = "failed";

/// Order service errors
#[derive(Debug, thiserror::Error)]
pub enum OrderServiceError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),

    #[error("Order not found")]
    NotFound,

    #[error("Order belongs to another user")]
    NotOwner,

    #[error("Order can no longer be cancelled")]
    CannotCancel,

    #[error("Order is not in a state that allows this operation")]
    InvalidTransition,

    #[error("Invalid callback signature")]
    InvalidSignature,

    #[error("Unknown transaction reference")]
    UnknownTransaction,

    #[error("Unsupported callback status: {0}")]
    UnsupportedStatus(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<OrderServiceError> for AppError {
    fn from(err: OrderServiceError) -> Self {
        match err {
            OrderServiceError::EmptyCart => AppError::Validation("Cart is empty".to_string()),
            OrderServiceError::InsufficientStock(name) => {
                AppError::Conflict(format!("Insufficient stock for {}", name))
            }
            OrderServiceError::NotFound => AppError::NotFound("Order not found".to_string()),
            OrderServiceError::NotOwner => {
                AppError::Forbidden("Order belongs to another user".to_string())
            }
            OrderServiceError::CannotCancel => {
                AppError::Conflict("Order can no longer be cancelled".to_string())
            }
            OrderServiceError::InvalidTransition => AppError::Conflict(
                "Order is not in a state that allows this operation".to_string(),
            ),
            OrderServiceError::InvalidSignature => {
                AppError::Authentication("Invalid callback signature".to_string())
            }
            OrderServiceError::UnknownTransaction => {
                AppError::NotFound("Unknown transaction reference".to_string())
            }
            OrderServiceError::UnsupportedStatus(status) => {
                AppError::Validation(format!("Unsupported callback status: {}", status))
            }
            OrderServiceError::Gateway(msg) => AppError::ExternalService(msg),
            OrderServiceError::Store(e) => e.into(),
        }
    }
}

/// Service owning checkout and the order state machine
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogStore>,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        carts: Arc<dyn CartStore>,
        catalog: Arc<dyn CatalogStore>,
        gateway: Arc<dyn PaymentGateway>,
        currency: String,
    ) -> Self {
        Self {
            orders,
            carts,
            catalog,
            gateway,
            currency,
        }
    }

    /// Convert the caller's cart into an order awaiting payment.
    ///
    /// Stock is reserved line by line with guarded decrements; if any line
    /// cannot be reserved, or the gateway refuses the transaction,
    /// everything reserved so far is returned to stock.
    pub async fn checkout(&self, user_id: Uuid) -> Result<Order, OrderServiceError> {
        let cart = self.carts.get_cart(user_id).await?;
        if cart.is_empty() {
            return Err(OrderServiceError::EmptyCart);
        }

        let mut reserved: Vec<(Uuid, i32)> = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let decremented = self
                .catalog
                .adjust_stock(item.variant_id, -item.quantity)
                .await?;
            if decremented.is_none() {
                self.restock(&reserved).await;
                return Err(OrderServiceError::InsufficientStock(item.name.clone()));
            }
            reserved.push((item.variant_id, item.quantity));
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            user_id,
            status: OrderStatus::Pending,
            total_cents: cart.total_cents(),
            currency: self.currency.clone(),
            transaction_ref: None,
            items: cart
                .items
                .iter()
                .map(|item| OrderItem {
                    variant_id: item.variant_id,
                    product_id: item.product_id,
                    name: item.name.clone(),
                    unit_price_cents: item.unit_price_cents,
                    quantity: item.quantity,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };
        self.orders.insert_order(order.clone()).await?;

        let transaction = match self
            .gateway
            .create_transaction(order.id, order.total_cents, &order.currency)
            .await
        {
            Ok(transaction) => transaction,
            Err(e) => {
                self.restock(&reserved).await;
                self.orders
                    .transition_status(order.id, &[OrderStatus::Pending], OrderStatus::Cancelled)
                    .await?;
                error!("Gateway rejected checkout for order {}: {}", order.id, e);
                return Err(OrderServiceError::Gateway(e.to_string()));
            }
        };

        self.orders
            .set_transaction_ref(order.id, &transaction.transaction_ref)
            .await?;
        let order = self
            .orders
            .transition_status(
                order.id,
                &[OrderStatus::Pending],
                OrderStatus::AwaitingPayment,
            )
            .await?
            .ok_or(OrderServiceError::InvalidTransition)?;

        self.carts.clear_cart(user_id).await?;
        info!(
            "Order {} created for user {} ({} {})",
            order.id, user_id, order.total_cents, order.currency
        );
        Ok(order)
    }

    /// All orders for the caller, newest first
    pub async fn list_orders(&self, user_id: Uuid) -> Result<Vec<Order>, OrderServiceError> {
        Ok(self.orders.list_orders_for_user(user_id).await?)
    }

    /// One order: 404 when it does not exist, 403 when it belongs to
    /// another user
    pub async fn get_order(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<Order, OrderServiceError> {
        let order = self
            .orders
            .find_order(order_id)
            .await?
            .ok_or(OrderServiceError::NotFound)?;
        if order.user_id != user_id {
            return Err(OrderServiceError::NotOwner);
        }
        Ok(order)
    }

    /// Cancel an order that has not been paid, returning its items to stock
    pub async fn cancel_order(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<Order, OrderServiceError> {
        let order = self.get_order(user_id, order_id).await?;

        let cancelled = self
            .orders
            .transition_status(
                order.id,
                &[OrderStatus::Pending, OrderStatus::AwaitingPayment],
                OrderStatus::Cancelled,
            )
            .await?
            .ok_or(OrderServiceError::CannotCancel)?;

        let reserved: Vec<(Uuid, i32)> = cancelled
            .items
            .iter()
            .map(|i| (i.variant_id, i.quantity))
            .collect();
        self.restock(&reserved).await;

        info!("Order {} cancelled by user {}", order_id, user_id);
        Ok(cancelled)
    }

    /// Apply a signed payment-gateway callback.
    ///
    /// Idempotent under at-least-once delivery: a replay reporting an
    /// outcome the order already reached is acknowledged as-is.
    pub async fn handle_callback(
        &self,
        request: &PaymentCallbackRequest,
    ) -> Result<Order, OrderServiceError> {
        if !self.gateway.verify_signature(
            &request.transaction_ref,
            &request.status,
            &request.signature,
        ) {
            warn!(
                "Rejected callback with bad signature for {}",
                request.transaction_ref
            );
            return Err(OrderServiceError::InvalidSignature);
        }

        let order = self
            .orders
            .find_order_by_transaction_ref(&request.transaction_ref)
            .await?
            .ok_or_else(|| {
                warn!(
                    "Callback for unknown transaction reference {}",
                    request.transaction_ref
                );
                OrderServiceError::UnknownTransaction
            })?;

        match request.status.as_str() {
            CALLBACK_SUCCEEDED => {
                match self
                    .orders
                    .transition_status(order.id, &[OrderStatus::AwaitingPayment], OrderStatus::Paid)
                    .await?
                {
                    Some(paid) => {
                        info!("Order {} paid via {}", paid.id, request.transaction_ref);
                        Ok(paid)
                    }
                    // Replayed success callback
                    None if order.status == OrderStatus::Paid
                        || order.status == OrderStatus::Fulfilled =>
                    {
                        Ok(order)
                    }
                    None => Err(OrderServiceError::InvalidTransition),
                }
            }
            CALLBACK_FAILED => {
                match self
                    .orders
                    .transition_status(
                        order.id,
                        &[OrderStatus::AwaitingPayment],
                        OrderStatus::Cancelled,
                    )
                    .await?
                {
                    Some(cancelled) => {
                        let reserved: Vec<(Uuid, i32)> = cancelled
                            .items
                            .iter()
                            .map(|i| (i.variant_id, i.quantity))
                            .collect();
                        self.restock(&reserved).await;
                        info!(
                            "Order {} cancelled after failed payment {}",
                            cancelled.id, request.transaction_ref
                        );
                        Ok(cancelled)
                    }
                    // Replayed failure callback
                    None if order.status == OrderStatus::Cancelled => Ok(order),
                    None => Err(OrderServiceError::InvalidTransition),
                }
            }
            other => Err(OrderServiceError::UnsupportedStatus(other.to_string())),
        }
    }

    /// Mark a paid order as fulfilled
    pub async fn fulfill_order(&self, order_id: Uuid) -> Result<Order, OrderServiceError> {
        match self
            .orders
            .transition_status(order_id, &[OrderStatus::Paid], OrderStatus::Fulfilled)
            .await?
        {
            Some(fulfilled) => {
                info!("Order {} fulfilled", order_id);
                Ok(fulfilled)
            }
            None => {
                if self.orders.find_order(order_id).await?.is_none() {
                    Err(OrderServiceError::NotFound)
                } else {
                    Err(OrderServiceError::InvalidTransition)
                }
            }
        }
    }

    /// Return reserved units to stock. Failures are logged rather than
    /// propagated; the triggering operation has already made its decision.
    async fn restock(&self, reserved: &[(Uuid, i32)]) {
        for (variant_id, quantity) in reserved {
            if let Err(e) = self.catalog.adjust_stock(*variant_id, *quantity).await {
                error!(
                    "Failed to restock {} units of variant {}: {}",
                    quantity, variant_id, e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cart::CartItem;
    use crate::models::catalog::{Product, Variant};
    use crate::service::payment::MockGateway;
    use crate::store::{CartStore, CatalogStore, MemoryStore};

    const SECRET: &str = "callback-secret-0123456789abcdef";

    struct Fixture {
        store: Arc<MemoryStore>,
        gateway: MockGateway,
        service: OrderService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let gateway = MockGateway::new(SECRET.to_string());
        let service = OrderService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(gateway.clone()),
            "USD".to_string(),
        );
        Fixture {
            store,
            gateway,
            service,
        }
    }

    async fn seed_variant(store: &MemoryStore, price: i64, stock: i32) -> Variant {
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
            active: true,
            created_at: now,
            updated_at: now,
        };
        store.insert_product(product).await.unwrap();
        store.insert_variant(variant.clone()).await.unwrap();
        variant
    }

    async fn add_to_cart(store: &MemoryStore, user_id: Uuid, variant: &Variant, quantity: i32) {
        store
            .add_cart_item(
                user_id,
                CartItem {
                    variant_id: variant.id,
                    product_id: variant.product_id,
                    name: "Widget (Blue)".to_string(),
                    unit_price_cents: variant.price_cents,
                    quantity,
                    added_at: Utc::now(),
                },
            )
            .await
            .unwrap();
    }

    fn callback(gateway: &MockGateway, transaction_ref: &str, status: &str) -> PaymentCallbackRequest {
        PaymentCallbackRequest {
            transaction_ref: transaction_ref.to_string(),
            status: status.to_string(),
            signature: gateway.sign(transaction_ref, status),
        }
    }

    #[tokio::test]
    async fn test_checkout_totals_match_cart_exactly() {
        let f = fixture();
        let user_id = Uuid::new_v4();
        let a = seed_variant(&f.store, 1000, 10).await;
        let b = seed_variant(&f.store, 499, 10).await;
        add_to_cart(&f.store, user_id, &a, 2).await;
        add_to_cart(&f.store, user_id, &b, 3).await;

        let order = f.service.checkout(user_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::AwaitingPayment);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total_cents, 2 * 1000 + 3 * 499);
        assert_eq!(order.total_cents, order.computed_total_cents());
        assert!(order.transaction_ref.is_some());

        // Cart is cleared and stock is reserved
        assert!(f.store.get_cart(user_id).await.unwrap().is_empty());
        assert_eq!(f.store.find_variant(a.id).await.unwrap().unwrap().stock, 8);
        assert_eq!(f.store.find_variant(b.id).await.unwrap().unwrap().stock, 7);
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_rejected() {
        let f = fixture();
        let result = f.service.checkout(Uuid::new_v4()).await;
        assert!(matches!(result, Err(OrderServiceError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_checkout_restocks_when_one_line_fails() {
        let f = fixture();
        let user_id = Uuid::new_v4();
        let plenty = seed_variant(&f.store, 1000, 10).await;
        let scarce = seed_variant(&f.store, 500, 1).await;
        add_to_cart(&f.store, user_id, &plenty, 2).await;
        add_to_cart(&f.store, user_id, &scarce, 5).await;

        let result = f.service.checkout(user_id).await;
        assert!(matches!(
            result,
            Err(OrderServiceError::InsufficientStock(_))
        ));

        // The successful decrement was rolled back
        assert_eq!(
            f.store.find_variant(plenty.id).await.unwrap().unwrap().stock,
            10
        );
        assert_eq!(
            f.store.find_variant(scarce.id).await.unwrap().unwrap().stock,
            1
        );
        // Cart untouched
        assert_eq!(f.store.get_cart(user_id).await.unwrap().items.len(), 2);
    }

    #[tokio::test]
    async fn test_success_callback_marks_paid_and_is_idempotent() {
        let f = fixture();
        let user_id = Uuid::new_v4();
        let variant = seed_variant(&f.store, 1000, 10).await;
        add_to_cart(&f.store, user_id, &variant, 1).await;
        let order = f.service.checkout(user_id).await.unwrap();
        let txn = order.transaction_ref.clone().unwrap();

        let request = callback(&f.gateway, &txn, "succeeded");
        let paid = f.service.handle_callback(&request).await.unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);

        // Replay is acknowledged without another transition
        let replay = f.service.handle_callback(&request).await.unwrap();
        assert_eq!(replay.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_callback_with_bad_signature_rejected() {
        let f = fixture();
        let user_id = Uuid::new_v4();
        let variant = seed_variant(&f.store, 1000, 10).await;
        add_to_cart(&f.store, user_id, &variant, 1).await;
        let order = f.service.checkout(user_id).await.unwrap();
        let txn = order.transaction_ref.clone().unwrap();

        let request = PaymentCallbackRequest {
            transaction_ref: txn.clone(),
            status: "succeeded".to_string(),
            signature: "forged".to_string(),
        };
        let result = f.service.handle_callback(&request).await;
        assert!(matches!(result, Err(OrderServiceError::InvalidSignature)));

        // Order untouched
        let current = f.service.get_order(user_id, order.id).await.unwrap();
        assert_eq!(current.status, OrderStatus::AwaitingPayment);
    }

    #[tokio::test]
    async fn test_callback_for_unknown_transaction_rejected() {
        let f = fixture();
        let request = callback(&f.gateway, "txn_missing", "succeeded");
        let result = f.service.handle_callback(&request).await;
        assert!(matches!(result, Err(OrderServiceError::UnknownTransaction)));
    }

    #[tokio::test]
    async fn test_failed_callback_cancels_and_restocks() {
        let f = fixture();
        let user_id = Uuid::new_v4();
        let variant = seed_variant(&f.store, 1000, 10).await;
        add_to_cart(&f.store, user_id, &variant, 4).await;
        let order = f.service.checkout(user_id).await.unwrap();
        let txn = order.transaction_ref.clone().unwrap();
        assert_eq!(
            f.store.find_variant(variant.id).await.unwrap().unwrap().stock,
            6
        );

        let request = callback(&f.gateway, &txn, "failed");
        let cancelled = f.service.handle_callback(&request).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(
            f.store.find_variant(variant.id).await.unwrap().unwrap().stock,
            10
        );
    }

    #[tokio::test]
    async fn test_cancel_rejected_once_paid() {
        let f = fixture();
        let user_id = Uuid::new_v4();
        let variant = seed_variant(&f.store, 1000, 10).await;
        add_to_cart(&f.store, user_id, &variant, 1).await;
        let order = f.service.checkout(user_id).await.unwrap();
        let txn = order.transaction_ref.clone().unwrap();

        f.service
            .handle_callback(&callback(&f.gateway, &txn, "succeeded"))
            .await
            .unwrap();

        let result = f.service.cancel_order(user_id, order.id).await;
        assert!(matches!(result, Err(OrderServiceError::CannotCancel)));
    }

    #[tokio::test]
    async fn test_cancel_before_payment_restocks() {
        let f = fixture();
        let user_id = Uuid::new_v4();
        let variant = seed_variant(&f.store, 1000, 10).await;
        add_to_cart(&f.store, user_id, &variant, 3).await;
        let order = f.service.checkout(user_id).await.unwrap();

        let cancelled = f.service.cancel_order(user_id, order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(
            f.store.find_variant(variant.id).await.unwrap().unwrap().stock,
            10
        );
    }

    #[tokio::test]
    async fn test_orders_are_owner_scoped() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let variant = seed_variant(&f.store, 1000, 10).await;
        add_to_cart(&f.store, owner, &variant, 1).await;
        let order = f.service.checkout(owner).await.unwrap();

        let foreign = f.service.get_order(Uuid::new_v4(), order.id).await;
        assert!(matches!(foreign, Err(OrderServiceError::NotOwner)));

        let missing = f.service.get_order(owner, Uuid::new_v4()).await;
        assert!(matches!(missing, Err(OrderServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_fulfill_requires_paid() {
        let f = fixture();
        let user_id = Uuid::new_v4();
        let variant = seed_variant(&f.store, 1000, 10).await;
        add_to_cart(&f.store, user_id, &variant, 1).await;
        let order = f.service.checkout(user_id).await.unwrap();

        let premature = f.service.fulfill_order(order.id).await;
        assert!(matches!(
            premature,
            Err(OrderServiceError::InvalidTransition)
        ));

        let txn = order.transaction_ref.clone().unwrap();
        f.service
            .handle_callback(&callback(&f.gateway, &txn, "succeeded"))
            .await
            .unwrap();

        let fulfilled = f.service.fulfill_order(order.id).await.unwrap();
        assert_eq!(fulfilled.status, OrderStatus::Fulfilled);
    }
}
