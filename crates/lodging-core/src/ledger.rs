//! # Payment Ledger
//!
//! The payment records of ONE reservation, and the rules for changing them.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. At most one Pending payment per reservation                        │
//! │  2. Pending → Completed | Failed, nothing else moves                   │
//! │  3. A refund is a NEW record: amount = −total, status Completed,       │
//! │     method REFUND, fresh transaction reference                         │
//! │  4. Only a completed, not-yet-refunded charge can be refunded          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger is loaded from storage, changed in memory, and every method
//! returns the record it created or changed so the caller can persist it.

use chrono::{DateTime, Utc};

use crate::clock::IdGenerator;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Payment, PaymentStatus, Reservation};

/// Method tag of the placeholder payment created with a booking.
pub const METHOD_PENDING: &str = "PENDING";

/// Method tag of refund records.
pub const METHOD_REFUND: &str = "REFUND";

/// Method tag of payments routed through the external gateway.
pub const METHOD_GATEWAY: &str = "GATEWAY";

/// All payments belonging to a single reservation.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentLedger {
    reservation_id: String,
    payments: Vec<Payment>,
}

impl PaymentLedger {
    /// Builds a ledger from stored records. Records for other reservations
    /// are dropped.
    pub fn new(reservation_id: impl Into<String>, payments: Vec<Payment>) -> Self {
        let reservation_id = reservation_id.into();
        let payments = payments
            .into_iter()
            .filter(|p| p.reservation_id == reservation_id)
            .collect();
        PaymentLedger {
            reservation_id,
            payments,
        }
    }

    pub fn reservation_id(&self) -> &str {
        &self.reservation_id
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    /// The Pending payment, if any.
    pub fn pending(&self) -> Option<&Payment> {
        self.payments
            .iter()
            .find(|p| p.status == PaymentStatus::Pending)
    }

    /// The completed (positive) charge, if any.
    pub fn completed_charge(&self) -> Option<&Payment> {
        self.payments
            .iter()
            .find(|p| p.status == PaymentStatus::Completed && !p.is_refund())
    }

    /// Whether a refund record already exists.
    pub fn has_refund(&self) -> bool {
        self.payments.iter().any(Payment::is_refund)
    }

    /// A completed charge exists and has not been refunded.
    pub fn is_refundable(&self) -> bool {
        self.completed_charge().is_some() && !self.has_refund()
    }

    /// Net money received: completed charges minus refunds.
    pub fn net_paid(&self) -> Money {
        self.payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Completed)
            .map(Payment::amount)
            .sum()
    }

    /// Records a new Pending payment.
    ///
    /// ## Errors
    /// `DuplicatePendingPayment` if one is already pending.
    pub fn record_attempt(
        &mut self,
        amount: Money,
        method: &str,
        ids: &dyn IdGenerator,
        now: DateTime<Utc>,
    ) -> CoreResult<Payment> {
        if self.pending().is_some() {
            return Err(CoreError::DuplicatePendingPayment {
                reservation_id: self.reservation_id.clone(),
            });
        }

        let payment = Payment {
            id: ids.new_id(),
            reservation_id: self.reservation_id.clone(),
            amount_cents: amount.cents(),
            method: method.to_string(),
            status: PaymentStatus::Pending,
            transaction_ref: ids.transaction_ref(),
            gateway_order_id: None,
            external_ref: None,
            processed_at: None,
            created_at: now,
        };

        self.payments.push(payment.clone());
        Ok(payment)
    }

    /// Records the gateway order created for a pending payment.
    pub fn attach_order(&mut self, payment_id: &str, order_id: &str) -> CoreResult<Payment> {
        let payment = self.pending_mut(payment_id, "attach a gateway order")?;
        if let Some(existing) = &payment.gateway_order_id {
            return Err(CoreError::GatewayOrderExists {
                payment_id: payment.id.clone(),
                order_id: existing.clone(),
            });
        }
        payment.gateway_order_id = Some(order_id.to_string());
        Ok(payment.clone())
    }

    /// Marks a pending payment as settled.
    pub fn complete(
        &mut self,
        payment_id: &str,
        method: &str,
        external_ref: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Payment> {
        let payment = self.pending_mut(payment_id, "complete")?;
        payment.status = PaymentStatus::Completed;
        payment.method = method.to_string();
        payment.external_ref = Some(external_ref.to_string());
        payment.processed_at = Some(now);
        Ok(payment.clone())
    }

    /// Marks a pending payment as failed.
    pub fn fail(&mut self, payment_id: &str, now: DateTime<Utc>) -> CoreResult<Payment> {
        let payment = self.pending_mut(payment_id, "fail")?;
        payment.status = PaymentStatus::Failed;
        payment.processed_at = Some(now);
        Ok(payment.clone())
    }

    /// Issues a refund of the reservation's full total.
    ///
    /// The original charge is left untouched.
    ///
    /// ## Errors
    /// `NothingToRefund` without a completed, unrefunded charge.
    pub fn refund(
        &mut self,
        reservation: &Reservation,
        ids: &dyn IdGenerator,
        now: DateTime<Utc>,
    ) -> CoreResult<Payment> {
        if reservation.id != self.reservation_id || !self.is_refundable() {
            return Err(CoreError::NothingToRefund {
                reservation_id: reservation.id.clone(),
            });
        }

        let refund = Payment {
            id: ids.new_id(),
            reservation_id: self.reservation_id.clone(),
            amount_cents: (-reservation.total_amount()).cents(),
            method: METHOD_REFUND.to_string(),
            status: PaymentStatus::Completed,
            transaction_ref: ids.transaction_ref(),
            gateway_order_id: None,
            external_ref: None,
            processed_at: Some(now),
            created_at: now,
        };

        self.payments.push(refund.clone());
        Ok(refund)
    }

    fn pending_mut(&mut self, payment_id: &str, operation: &'static str) -> CoreResult<&mut Payment> {
        let payment = self
            .payments
            .iter_mut()
            .find(|p| p.id == payment_id)
            .ok_or_else(|| CoreError::not_found("Payment", payment_id))?;

        if payment.status != PaymentStatus::Pending {
            return Err(CoreError::InvalidPaymentStatus {
                payment_id: payment.id.clone(),
                current_status: payment.status,
                operation,
            });
        }

        Ok(payment)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SequentialIds;
    use crate::types::ReservationStatus;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn reservation() -> Reservation {
        Reservation {
            id: "res-1".to_string(),
            booking_reference: "BK0000000001".to_string(),
            confirmation_number: "HR0000000001".to_string(),
            room_id: "room-1".to_string(),
            user_id: "user-1".to_string(),
            check_in_date: NaiveDate::from_ymd_opt(2026, 3, 6).unwrap(),
            check_out_date: NaiveDate::from_ymd_opt(2026, 3, 8).unwrap(),
            guest_count: 1,
            total_amount_cents: 293_700,
            status: ReservationStatus::Confirmed,
            guest_name: "Asha Rao".to_string(),
            guest_email: "asha@example.com".to_string(),
            guest_phone: None,
            special_requests: None,
            created_at: now(),
            updated_at: now(),
            cancelled_at: None,
            actual_check_in: None,
            actual_check_out: None,
        }
    }

    #[test]
    fn test_second_pending_payment_is_rejected() {
        let ids = SequentialIds::new();
        let mut ledger = PaymentLedger::new("res-1", vec![]);

        ledger
            .record_attempt(Money::from_cents(293_700), METHOD_PENDING, &ids, now())
            .unwrap();
        let err = ledger
            .record_attempt(Money::from_cents(293_700), METHOD_PENDING, &ids, now())
            .unwrap_err();

        assert!(matches!(err, CoreError::DuplicatePendingPayment { .. }));
        assert_eq!(ledger.payments().len(), 1);
    }

    #[test]
    fn test_gateway_order_is_attached_once() {
        let ids = SequentialIds::new();
        let mut ledger = PaymentLedger::new("res-1", vec![]);
        let pending = ledger
            .record_attempt(Money::from_cents(293_700), METHOD_PENDING, &ids, now())
            .unwrap();

        ledger.attach_order(&pending.id, "order_1").unwrap();
        let err = ledger.attach_order(&pending.id, "order_2").unwrap_err();

        match err {
            CoreError::GatewayOrderExists { order_id, .. } => assert_eq!(order_id, "order_1"),
            other => panic!("expected GatewayOrderExists, got {other:?}"),
        }
        assert_eq!(ledger.pending().unwrap().gateway_order_id.as_deref(), Some("order_1"));
    }

    #[test]
    fn test_complete_then_refund_leaves_charge_untouched() {
        let ids = SequentialIds::new();
        let mut ledger = PaymentLedger::new("res-1", vec![]);
        let pending = ledger
            .record_attempt(Money::from_cents(293_700), METHOD_PENDING, &ids, now())
            .unwrap();

        let charge = ledger.complete(&pending.id, "CARD", "pay_123", now()).unwrap();
        assert_eq!(charge.status, PaymentStatus::Completed);
        assert_eq!(charge.external_ref.as_deref(), Some("pay_123"));
        assert!(ledger.pending().is_none());

        let refund = ledger.refund(&reservation(), &ids, now()).unwrap();
        assert_eq!(refund.amount_cents, -293_700);
        assert_eq!(refund.status, PaymentStatus::Completed);
        assert_eq!(refund.method, METHOD_REFUND);
        assert_ne!(refund.transaction_ref, charge.transaction_ref);

        assert_eq!(ledger.completed_charge(), Some(&charge));
        assert_eq!(ledger.net_paid(), Money::zero());
    }

    #[test]
    fn test_refund_requires_completed_charge() {
        let ids = SequentialIds::new();
        let mut ledger = PaymentLedger::new("res-1", vec![]);
        ledger
            .record_attempt(Money::from_cents(293_700), METHOD_PENDING, &ids, now())
            .unwrap();

        let err = ledger.refund(&reservation(), &ids, now()).unwrap_err();
        assert!(matches!(err, CoreError::NothingToRefund { .. }));
    }

    #[test]
    fn test_refund_only_once() {
        let ids = SequentialIds::new();
        let mut ledger = PaymentLedger::new("res-1", vec![]);
        let pending = ledger
            .record_attempt(Money::from_cents(293_700), METHOD_PENDING, &ids, now())
            .unwrap();
        ledger.complete(&pending.id, "CARD", "pay_1", now()).unwrap();

        ledger.refund(&reservation(), &ids, now()).unwrap();
        assert!(ledger.refund(&reservation(), &ids, now()).is_err());
    }

    #[test]
    fn test_failed_payment_cannot_be_completed() {
        let ids = SequentialIds::new();
        let mut ledger = PaymentLedger::new("res-1", vec![]);
        let pending = ledger
            .record_attempt(Money::from_cents(100), METHOD_PENDING, &ids, now())
            .unwrap();

        ledger.fail(&pending.id, now()).unwrap();
        let err = ledger.complete(&pending.id, "CARD", "pay_1", now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidPaymentStatus {
                current_status: PaymentStatus::Failed,
                ..
            }
        ));

        // A new attempt is allowed once nothing is pending
        assert!(ledger
            .record_attempt(Money::from_cents(100), METHOD_PENDING, &ids, now())
            .is_ok());
    }

    #[test]
    fn test_unknown_payment_is_not_found() {
        let mut ledger = PaymentLedger::new("res-1", vec![]);
        assert!(matches!(
            ledger.fail("nope", now()),
            Err(CoreError::NotFound { entity: "Payment", .. })
        ));
    }
}
