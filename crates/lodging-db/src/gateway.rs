//! # Payment Gateway
//!
//! The external card/UPI processor, seen from the booking side.
//!
//! ```text
//! BookingService                      Gateway
//!      │  create_order(amount, INR, receipt)  │
//!      │ ───────────────────────────────────► │
//!      │ ◄─────────────────────────────────── │  order_xxx
//!      │                                      │
//!      │    (guest pays in the browser)       │
//!      │                                      │
//!      │  verify_payment(order, payment, sig) │
//!      │ ───────────────────────────────────► │
//!      │ ◄─────────────────────────────────── │  true / false
//! ```
//!
//! Signature checking belongs to the gateway client. The booking rules only
//! see the boolean answer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An order created on the gateway for a pending payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// Gateway-issued id, e.g. `order_Nx3hL2`.
    pub order_id: String,
    /// Minor units.
    pub amount: i64,
    pub currency: String,
    /// Our transaction reference.
    pub receipt: String,
}

/// The signed confirmation the guest's browser relays after paying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    /// Tag stored on the settled payment (`CARD`, `UPI`, ...).
    /// Defaults to `GATEWAY`.
    #[serde(default)]
    pub method: Option<String>,
    pub order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

/// Gateway failures. All of them surface as `ExternalService`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment gateway credentials are not configured")]
    NotConfigured,

    #[error("payment gateway unreachable: {0}")]
    Unavailable(String),

    #[error("payment gateway rejected the request: {0}")]
    Rejected(String),
}

/// Operations the booking core needs from a payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates an order for `amount` minor units.
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError>;

    /// Whether the confirmation is authentic and the charge succeeded.
    async fn verify_payment(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, GatewayError>;
}

/// Stand-in used when no processor is wired up. Every call fails with
/// [`GatewayError::NotConfigured`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn create_order(
        &self,
        _amount: i64,
        _currency: &str,
        _receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn verify_payment(
        &self,
        _order_id: &str,
        _payment_id: &str,
        _signature: &str,
    ) -> Result<bool, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_gateway_refuses_everything() {
        let gateway = UnconfiguredGateway;
        assert!(matches!(
            gateway.create_order(100, "INR", "TXN1").await,
            Err(GatewayError::NotConfigured)
        ));
        assert!(matches!(
            gateway.verify_payment("order_1", "pay_1", "sig").await,
            Err(GatewayError::NotConfigured)
        ));
    }

    #[test]
    fn test_confirmation_method_is_optional() {
        let relayed: PaymentConfirmation = serde_json::from_str(
            r#"{"order_id":"order_1","gateway_payment_id":"pay_1","signature":"abc"}"#,
        )
        .unwrap();
        assert_eq!(relayed.method, None);
        assert_eq!(relayed.order_id, "order_1");

        let tagged: PaymentConfirmation = serde_json::from_str(
            r#"{"method":"UPI","order_id":"order_1","gateway_payment_id":"pay_1","signature":"abc"}"#,
        )
        .unwrap();
        assert_eq!(tagged.method.as_deref(), Some("UPI"));
    }
}
