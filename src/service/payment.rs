//! Payment Gateway
//!
//! Seam for the external payment provider. Checkout creates a gateway
//! transaction and records its reference on the order; the provider later
//! reports the outcome through a signed callback. Signatures are hex
//! SHA-256 over the shared secret, transaction reference, and status, and
//! are compared in constant time.

use async_trait::async_trait;
use log::debug;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::utils::error::AppError;
use crate::utils::security::constant_time_compare;

/// A transaction registered with the payment provider
#[derive(Debug, Clone)]
pub struct GatewayTransaction {
    /// Provider-issued reference used to correlate callbacks
    pub transaction_ref: String,
}

/// External payment provider
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register a payment of `amount_cents` and return its reference
    async fn create_transaction(
        &self,
        order_id: Uuid,
        amount_cents: i64,
        currency: &str,
    ) -> Result<GatewayTransaction, AppError>;

    /// Verify a callback signature against the shared secret
    fn verify_signature(&self, transaction_ref: &str, status: &str, signature: &str) -> bool;
}

/// Computes the expected callback signature
pub fn callback_signature(secret: &str, transaction_ref: &str, status: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(transaction_ref.as_bytes());
    hasher.update(status.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Gateway stub that accepts every transaction
///
/// Stands in for a real provider integration; callbacks are still verified
/// against the shared secret exactly as they would be in production.
#[derive(Debug, Clone)]
pub struct MockGateway {
    callback_secret: String,
}

impl MockGateway {
    pub fn new(callback_secret: String) -> Self {
        Self { callback_secret }
    }

    /// Sign a callback payload; used by tests and local tooling to simulate
    /// provider callbacks
    pub fn sign(&self, transaction_ref: &str, status: &str) -> String {
        callback_signature(&self.callback_secret, transaction_ref, status)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_transaction(
        &self,
        order_id: Uuid,
        amount_cents: i64,
        currency: &str,
    ) -> Result<GatewayTransaction, AppError> {
        let transaction_ref = format!("txn_{}", Uuid::new_v4().simple());
        debug!(
            "Created gateway transaction {} for order {} ({} {})",
            transaction_ref, order_id, amount_cents, currency
        );
        Ok(GatewayTransaction { transaction_ref })
    }

    fn verify_signature(&self, transaction_ref: &str, status: &str, signature: &str) -> bool {
        let expected = callback_signature(&self.callback_secret, transaction_ref, status);
        constant_time_compare(&expected, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_gateway_issues_unique_refs() {
        let gateway = MockGateway::new("secret".repeat(4));
        let a = gateway
            .create_transaction(Uuid::new_v4(), 1000, "USD")
            .await
            .unwrap();
        let b = gateway
            .create_transaction(Uuid::new_v4(), 1000, "USD")
            .await
            .unwrap();
        assert_ne!(a.transaction_ref, b.transaction_ref);
    }

    #[test]
    fn test_signature_round_trip() {
        let gateway = MockGateway::new("secret".repeat(4));
        let signature = gateway.sign("txn_abc", "succeeded");
        assert!(gateway.verify_signature("txn_abc", "succeeded", &signature));
        assert!(!gateway.verify_signature("txn_abc", "failed", &signature));
        assert!(!gateway.verify_signature("txn_other", "succeeded", &signature));
    }
}
