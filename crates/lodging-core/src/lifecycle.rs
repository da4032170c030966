//! # Reservation Lifecycle
//!
//! The state machine of a reservation and the guards on each transition.
//!
//! ## Transitions
//! ```text
//! ┌────────────────┬──────────────────────────────────────┬──────────────────────────┐
//! │ Transition     │ Guard                                │ Effect                   │
//! ├────────────────┼──────────────────────────────────────┼──────────────────────────┤
//! │ create         │ dates ordered, not in the past,      │ Pending reservation +    │
//! │                │ guests ≤ capacity, room free         │ Pending payment (total)  │
//! │ processPayment │ Pending, exactly one Pending payment │ ok:   Confirmed          │
//! │                │                                      │ fail: Cancelled          │
//! │ cancel         │ not terminal, actor owns it          │ Cancelled (+ refund?)    │
//! │ checkIn        │ Confirmed, check-in date ≤ today     │ CheckedIn                │
//! │ checkOut       │ CheckedIn                            │ Completed                │
//! └────────────────┴──────────────────────────────────────┴──────────────────────────┘
//! ```
//!
//! Every function here mutates in-memory records and returns what changed.
//! Persisting the result as one unit of work is the caller's job.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::availability;
use crate::cancellation;
use crate::clock::{Clock, IdGenerator};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ledger::{PaymentLedger, METHOD_PENDING};
use crate::pricing::{PriceQuote, PricingEngine};
use crate::types::{Payment, Reservation, ReservationStatus, Room, StayDates, Subject, User};
use crate::validation::{
    validate_email, validate_guest_count, validate_guest_name, validate_special_requests,
    validate_stay_dates,
};

// =============================================================================
// Status Machine
// =============================================================================

impl ReservationStatus {
    /// Whether `self → next` is an edge of the lifecycle graph.
    pub const fn can_transition_to(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, CheckedIn)
                | (CheckedIn, Completed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (CheckedIn, Cancelled)
        )
    }
}

impl Reservation {
    fn transition(
        &mut self,
        next: ReservationStatus,
        operation: &'static str,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidReservationStatus {
                reservation_id: self.id.clone(),
                current_status: self.status,
                operation,
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Pending → Confirmed.
    pub fn confirm(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.transition(ReservationStatus::Confirmed, "confirm", now)
    }

    /// Any live status → Cancelled.
    ///
    /// Ownership is checked before status so an outsider learns nothing
    /// about the reservation's state.
    pub fn cancel(&mut self, actor: &Subject, now: DateTime<Utc>) -> CoreResult<()> {
        if actor.user_id != self.user_id {
            return Err(CoreError::Unauthorized {
                reservation_id: self.id.clone(),
                user_id: actor.user_id.clone(),
            });
        }
        self.transition(ReservationStatus::Cancelled, "cancel", now)?;
        self.cancelled_at = Some(now);
        Ok(())
    }

    /// Confirmed → CheckedIn, on or after the booked check-in date.
    pub fn check_in(&mut self, today: NaiveDate, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status == ReservationStatus::Confirmed && self.check_in_date > today {
            return Err(CoreError::CheckInNotYetAllowed {
                reservation_id: self.id.clone(),
                check_in: self.check_in_date,
            });
        }
        self.transition(ReservationStatus::CheckedIn, "check in", now)?;
        self.actual_check_in = Some(now);
        Ok(())
    }

    /// CheckedIn → Completed.
    pub fn check_out(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.transition(ReservationStatus::Completed, "check out", now)?;
        self.actual_check_out = Some(now);
        Ok(())
    }

    fn cancel_unpaid(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.transition(ReservationStatus::Cancelled, "cancel after failed payment", now)?;
        self.cancelled_at = Some(now);
        Ok(())
    }
}

// =============================================================================
// Create
// =============================================================================

/// What a guest asks for when booking.
///
/// Contact fields left as `None` are copied from the booking user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub room_id: String,
    pub user_id: String,
    pub stay: StayDates,
    pub guest_count: i64,
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub guest_email: Option<String>,
    #[serde(default)]
    pub guest_phone: Option<String>,
    #[serde(default)]
    pub special_requests: Option<String>,
}

impl BookingRequest {
    pub fn new(
        room_id: impl Into<String>,
        user_id: impl Into<String>,
        stay: StayDates,
        guest_count: i64,
    ) -> Self {
        BookingRequest {
            room_id: room_id.into(),
            user_id: user_id.into(),
            stay,
            guest_count,
            guest_name: None,
            guest_email: None,
            guest_phone: None,
            special_requests: None,
        }
    }

    pub fn with_guest(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.guest_name = Some(name.into());
        self.guest_email = Some(email.into());
        self
    }

    pub fn with_special_requests(mut self, text: impl Into<String>) -> Self {
        self.special_requests = Some(text.into());
        self
    }
}

/// The records produced by a successful `create`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub reservation: Reservation,
    pub payment: Payment,
    pub quote: PriceQuote,
}

/// Runs every `create` guard and builds the Pending reservation and payment.
///
/// `existing` must hold the room's current reservations; cancelled ones are
/// ignored. Input is validated before availability is looked at, so a bad
/// request never reports a conflict.
///
/// ## Errors
/// - `NotFound` if the room or user is inactive or does not match the request
/// - `Validation` for dates, guest count and contact fields
/// - `RoomUnavailable` if a live reservation overlaps
pub fn open_reservation(
    request: &BookingRequest,
    room: &Room,
    guest: &User,
    existing: &[Reservation],
    clock: &dyn Clock,
    ids: &dyn IdGenerator,
) -> CoreResult<NewBooking> {
    if !room.is_active || room.id != request.room_id {
        return Err(CoreError::not_found("Room", &request.room_id));
    }
    if !guest.is_active || guest.id != request.user_id {
        return Err(CoreError::not_found("User", &request.user_id));
    }

    let now = clock.now();
    validate_stay_dates(&request.stay, clock.today())?;
    validate_guest_count(request.guest_count, room.capacity)?;

    let guest_name = request
        .guest_name
        .clone()
        .unwrap_or_else(|| guest.full_name.clone());
    let guest_email = request
        .guest_email
        .clone()
        .unwrap_or_else(|| guest.email.clone());
    let guest_phone = request.guest_phone.clone().or_else(|| guest.phone.clone());
    validate_guest_name(&guest_name)?;
    validate_email(&guest_email)?;
    validate_special_requests(request.special_requests.as_deref())?;

    if !availability::is_available(&room.id, &request.stay, existing) {
        return Err(CoreError::RoomUnavailable {
            room_id: room.id.clone(),
            check_in: request.stay.check_in,
            check_out: request.stay.check_out,
        });
    }

    let quote = PricingEngine::quote(room, &request.stay)?;

    let reservation = Reservation {
        id: ids.new_id(),
        booking_reference: ids.booking_reference(),
        confirmation_number: ids.confirmation_number(),
        room_id: room.id.clone(),
        user_id: guest.id.clone(),
        check_in_date: request.stay.check_in,
        check_out_date: request.stay.check_out,
        guest_count: request.guest_count,
        total_amount_cents: quote.total_cost.cents(),
        status: ReservationStatus::Pending,
        guest_name: guest_name.trim().to_string(),
        guest_email: guest_email.trim().to_string(),
        guest_phone,
        special_requests: request.special_requests.clone(),
        created_at: now,
        updated_at: now,
        cancelled_at: None,
        actual_check_in: None,
        actual_check_out: None,
    };

    let mut ledger = PaymentLedger::new(reservation.id.clone(), Vec::new());
    let payment = ledger.record_attempt(quote.total_cost, METHOD_PENDING, ids, now)?;

    Ok(NewBooking {
        reservation,
        payment,
        quote,
    })
}

// =============================================================================
// Process Payment
// =============================================================================

/// The gateway's verdict on a charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Approved { method: String, external_ref: String },
    Declined,
}

/// What `settle_payment` did.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// Payment Completed, reservation Confirmed.
    Confirmed { payment: Payment },
    /// Payment Failed, reservation Cancelled.
    Declined { payment: Payment },
}

impl Settlement {
    pub fn payment(&self) -> &Payment {
        match self {
            Settlement::Confirmed { payment } | Settlement::Declined { payment } => payment,
        }
    }
}

/// Checks the `processPayment` guard and returns the payment to settle.
///
/// Run this before contacting the gateway so a reservation in the wrong
/// state never reaches it.
pub fn payment_to_settle<'a>(
    reservation: &Reservation,
    ledger: &'a PaymentLedger,
) -> CoreResult<&'a Payment> {
    if reservation.status != ReservationStatus::Pending {
        return Err(CoreError::InvalidReservationStatus {
            reservation_id: reservation.id.clone(),
            current_status: reservation.status,
            operation: "process payment",
        });
    }

    ledger.pending().ok_or_else(|| CoreError::NoPendingPayment {
        reservation_id: reservation.id.clone(),
    })
}

/// Like [`payment_to_settle`], and also requires the pending payment to carry
/// the gateway order `order_id` the confirmation names.
pub fn payment_for_order<'a>(
    reservation: &Reservation,
    ledger: &'a PaymentLedger,
    order_id: &str,
) -> CoreResult<&'a Payment> {
    let pending = payment_to_settle(reservation, ledger)?;
    match pending.gateway_order_id.as_deref() {
        None => Err(CoreError::NoGatewayOrder {
            reservation_id: reservation.id.clone(),
        }),
        Some(attached) if attached != order_id => Err(ValidationError::InvalidFormat {
            field: "order_id".to_string(),
            reason: "does not belong to this reservation".to_string(),
        }
        .into()),
        Some(_) => Ok(pending),
    }
}

/// Applies the gateway's verdict to the reservation and its pending payment.
pub fn settle_payment(
    reservation: &mut Reservation,
    ledger: &mut PaymentLedger,
    outcome: PaymentOutcome,
    now: DateTime<Utc>,
) -> CoreResult<Settlement> {
    let payment_id = payment_to_settle(reservation, ledger)?.id.clone();

    match outcome {
        PaymentOutcome::Approved {
            method,
            external_ref,
        } => {
            let payment = ledger.complete(&payment_id, &method, &external_ref, now)?;
            reservation.confirm(now)?;
            Ok(Settlement::Confirmed { payment })
        }
        PaymentOutcome::Declined => {
            let payment = ledger.fail(&payment_id, now)?;
            reservation.cancel_unpaid(now)?;
            Ok(Settlement::Declined { payment })
        }
    }
}

// =============================================================================
// Cancel
// =============================================================================

/// What a cancellation changed besides the reservation itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CancellationOutcome {
    /// A pending payment that will now never settle, marked Failed.
    pub abandoned_payment: Option<Payment>,
    /// The refund record, when the policy granted one and money was taken.
    pub refund: Option<Payment>,
}

/// Cancels on behalf of `actor`, then settles the money side.
///
/// ```text
/// pending payment?         → Failed
/// refund eligible AND paid → new REFUND record for the full total
/// ```
pub fn cancel_booking(
    reservation: &mut Reservation,
    ledger: &mut PaymentLedger,
    actor: &Subject,
    now: DateTime<Utc>,
    ids: &dyn IdGenerator,
) -> CoreResult<CancellationOutcome> {
    reservation.cancel(actor, now)?;

    let abandoned_payment = match ledger.pending().map(|p| p.id.clone()) {
        Some(payment_id) => Some(ledger.fail(&payment_id, now)?),
        None => None,
    };

    let refund = if cancellation::is_refund_eligible(reservation, now) && ledger.is_refundable() {
        Some(ledger.refund(reservation, ids, now)?)
    } else {
        None
    };

    Ok(CancellationOutcome {
        abandoned_payment,
        refund,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
