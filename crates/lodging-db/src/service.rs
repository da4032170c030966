//! # Booking Service
//!
//! Runs each lifecycle operation as one unit of work: load the records,
//! let `lodging-core` decide, write the result, commit.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_reservation                                                    │
//! │    room lock ─► BEGIN ─► load room, user, overlapping stays            │
//! │              ─► open_reservation (guards, pricing)                     │
//! │              ─► guarded INSERT reservation ─► INSERT pending payment   │
//! │              ─► COMMIT                                                 │
//! │                                                                         │
//! │  process_payment                                                       │
//! │    read + order guard ─► gateway.verify_payment                        │
//! │                       ─► BEGIN ─► order guard ─► settle ─► COMMIT      │
//! │    (the gateway is never called while a transaction is open)           │
//! │                                                                         │
//! │  cancel / check_in / check_out                                         │
//! │    BEGIN ─► load ─► transition (+ ledger) ─► save ─► COMMIT            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error before COMMIT drops the transaction, which rolls it back.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use lodging_core::ledger::{PaymentLedger, METHOD_GATEWAY};
use lodging_core::lifecycle::{self, BookingRequest, NewBooking, PaymentOutcome, Settlement};
use lodging_core::validation::{
    validate_capacity, validate_date_range, validate_payment_method, validate_price_cents,
    validate_room_number,
};
use lodging_core::{
    Clock, CoreError, IdGenerator, Payment, PriceQuote, PricingEngine, RandomIds, Reservation,
    ReservationStats, Room, RoomCategory, StayDates, Subject, SystemClock, ValidationError,
};

use crate::config::LodgingConfig;
use crate::error::BookingResult;
use crate::gateway::{GatewayError, GatewayOrder, PaymentConfirmation, PaymentGateway, UnconfiguredGateway};
use crate::pool::Database;
use crate::repository::{
    PaymentRepository, ReservationRepository, RoomFilter, RoomRepository, UserRepository,
};

// =============================================================================
// Results
// =============================================================================

/// A settled charge and the confirmed reservation.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub reservation: Reservation,
    pub payment: Payment,
}

/// A cancelled reservation and what happened to its money.
#[derive(Debug, Clone, PartialEq)]
pub struct Cancellation {
    pub reservation: Reservation,
    pub abandoned_payment: Option<Payment>,
    pub refund: Option<Payment>,
}

/// Fields of a new catalogue room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub hotel_id: String,
    pub room_number: String,
    pub category: RoomCategory,
    pub capacity: i64,
    pub base_price_cents: i64,
    pub description: Option<String>,
}

// =============================================================================
// Service
// =============================================================================

/// Entry point for every booking operation.
///
/// ## Usage
/// ```rust,ignore
/// let config = LodgingConfig::load()?;
/// let db = Database::new(config.db_config()).await?;
/// let service = BookingService::new(db, config).with_gateway(Arc::new(my_gateway));
///
/// let booking = service.create_reservation(&request).await?;
/// ```
#[derive(Clone)]
pub struct BookingService {
    db: Database,
    config: LodgingConfig,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    gateway: Arc<dyn PaymentGateway>,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl std::fmt::Debug for BookingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingService")
            .field("db", &self.db)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BookingService {
    /// System clock, random ids, and no payment gateway.
    pub fn new(db: Database, config: LodgingConfig) -> Self {
        BookingService {
            db,
            config,
            clock: Arc::new(SystemClock),
            ids: Arc::new(RandomIds),
            gateway: Arc::new(UnconfiguredGateway),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Pricing & Availability
    // =========================================================================

    /// Price breakdown for booking `room_id` for `stay`.
    pub async fn quote_price(&self, room_id: &str, stay: &StayDates) -> BookingResult<PriceQuote> {
        let room = self.active_room(room_id).await?;
        Ok(PricingEngine::quote(&room, stay)?)
    }

    /// Read-only: whether no live reservation of the room overlaps `stay`.
    ///
    /// Unknown and deactivated rooms are `NotFound`, never available.
    pub async fn is_available(&self, room_id: &str, stay: &StayDates) -> BookingResult<bool> {
        validate_date_range(stay.check_in, stay.check_out)?;
        let room = self.active_room(room_id).await?;
        Ok(self.db.reservations().is_room_available(&room.id, stay).await?)
    }

    /// Active rooms free for `stay`, narrowed by `filter`.
    pub async fn find_available_rooms(&self, stay: &StayDates, filter: &RoomFilter) -> BookingResult<Vec<Room>> {
        validate_date_range(stay.check_in, stay.check_out)?;
        if let Some(guests) = filter.min_capacity {
            validate_capacity(guests)?;
        }
        Ok(self.db.rooms().find_available(stay, filter).await?)
    }

    pub async fn available_room_count(&self, stay: &StayDates) -> BookingResult<i64> {
        validate_date_range(stay.check_in, stay.check_out)?;
        Ok(self.db.rooms().count_available(stay).await?)
    }

    // =========================================================================
    // Room Catalogue
    // =========================================================================

    pub async fn add_room(&self, new_room: NewRoom) -> BookingResult<Room> {
        validate_room_number(&new_room.room_number)?;
        validate_capacity(new_room.capacity)?;
        validate_price_cents(new_room.base_price_cents)?;

        let now = self.clock.now();
        let room = Room {
            id: self.ids.new_id(),
            hotel_id: new_room.hotel_id,
            room_number: new_room.room_number.trim().to_string(),
            category: new_room.category,
            capacity: new_room.capacity,
            base_price_cents: new_room.base_price_cents,
            description: new_room.description,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.db.rooms().insert(&room).await?;
        info!(room_id = %room.id, hotel_id = %room.hotel_id, room_number = %room.room_number, "Room added");
        Ok(room)
    }

    /// Saves catalogue edits. Prices already locked into reservations are
    /// unaffected.
    pub async fn update_room(&self, mut room: Room) -> BookingResult<Room> {
        validate_room_number(&room.room_number)?;
        validate_capacity(room.capacity)?;
        validate_price_cents(room.base_price_cents)?;

        room.updated_at = self.clock.now();
        self.db.rooms().update(&room).await?;
        Ok(room)
    }

    pub async fn rooms_for_hotel(&self, hotel_id: &str) -> BookingResult<Vec<Room>> {
        Ok(self.db.rooms().list_by_hotel(hotel_id).await?)
    }

    pub async fn rooms_by_category(&self, category: RoomCategory) -> BookingResult<Vec<Room>> {
        Ok(self.db.rooms().list_by_category(category).await?)
    }

    /// Active rooms sleeping at least `guests`, smallest first.
    pub async fn rooms_for_guests(&self, guests: i64) -> BookingResult<Vec<Room>> {
        validate_capacity(guests)?;
        Ok(self.db.rooms().list_by_min_capacity(guests).await?)
    }

    /// Active rooms whose nightly base price lies in `[min_cents, max_cents]`,
    /// cheapest first.
    pub async fn rooms_in_price_range(&self, min_cents: i64, max_cents: i64) -> BookingResult<Vec<Room>> {
        validate_price_cents(min_cents)?;
        validate_price_cents(max_cents)?;
        if min_cents > max_cents {
            return Err(ValidationError::OutOfRange {
                field: "min_price".to_string(),
                min: 0,
                max: max_cents,
            }
            .into());
        }
        Ok(self.db.rooms().list_by_price_range(min_cents, max_cents).await?)
    }

    /// Soft delete: the room disappears from searches and cannot be booked.
    pub async fn deactivate_room(&self, room_id: &str) -> BookingResult<()> {
        self.db.rooms().deactivate(room_id, self.clock.now()).await?;
        Ok(())
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Books a room: Pending reservation plus Pending payment for the total.
    pub async fn create_reservation(&self, request: &BookingRequest) -> BookingResult<NewBooking> {
        let _room_guard = self.lock_room(&request.room_id).await;
        let mut tx = self.db.begin().await?;

        let room = RoomRepository::fetch(&mut *tx, &request.room_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Room", &request.room_id))?;
        let guest = UserRepository::fetch(&mut *tx, &request.user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", &request.user_id))?;
        let existing = ReservationRepository::overlapping(&mut *tx, &room.id, &request.stay).await?;

        let booking = lifecycle::open_reservation(
            request,
            &room,
            &guest,
            &existing,
            self.clock.as_ref(),
            self.ids.as_ref(),
        )?;

        if !ReservationRepository::insert_if_available(&mut *tx, &booking.reservation).await? {
            warn!(room_id = %room.id, stay = %request.stay, "Room taken by a concurrent booking");
            return Err(CoreError::RoomUnavailable {
                room_id: room.id,
                check_in: request.stay.check_in,
                check_out: request.stay.check_out,
            }
            .into());
        }
        PaymentRepository::insert(&mut *tx, &booking.payment).await?;

        tx.commit().await?;

        info!(
            reservation_id = %booking.reservation.id,
            booking_reference = %booking.reservation.booking_reference,
            room_id = %booking.reservation.room_id,
            total = %booking.reservation.total_amount(),
            "Reservation created"
        );
        Ok(booking)
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Opens a gateway order for the reservation's pending payment.
    ///
    /// Calling again returns the order already recorded instead of creating
    /// a second one. Concurrent calls for one reservation run one at a time;
    /// if another process attached an order first, that order wins.
    pub async fn create_payment_order(&self, reservation_id: &str) -> BookingResult<GatewayOrder> {
        self.require_gateway()?;
        let _order_guard = self.lock_key(format!("order:{reservation_id}")).await;

        let (reservation, ledger) = self.load_with_ledger(reservation_id).await?;
        let pending = lifecycle::payment_to_settle(&reservation, &ledger)?.clone();

        if let Some(order_id) = &pending.gateway_order_id {
            debug!(reservation_id = %reservation.id, order_id = %order_id, "Reusing gateway order");
            return Ok(self.recorded_order(&pending, order_id));
        }

        let order = self
            .gateway
            .create_order(pending.amount_cents, &self.config.currency, &pending.transaction_ref)
            .await?;

        let mut tx = self.db.begin().await?;
        let (_, mut ledger) = Self::load_in_tx(&mut *tx, reservation_id).await?;
        let updated = match ledger.attach_order(&pending.id, &order.order_id) {
            Ok(updated) => updated,
            Err(CoreError::GatewayOrderExists { order_id, .. }) => {
                warn!(
                    reservation_id = %reservation.id,
                    order_id = %order_id,
                    discarded = %order.order_id,
                    "Gateway order attached concurrently, keeping the recorded one"
                );
                return Ok(self.recorded_order(&pending, &order_id));
            }
            Err(e) => return Err(e.into()),
        };
        PaymentRepository::save(&mut *tx, &updated).await?;
        tx.commit().await?;

        info!(
            reservation_id = %reservation.id,
            order_id = %order.order_id,
            amount = order.amount,
            currency = %order.currency,
            "Payment order created"
        );
        Ok(order)
    }

    /// Settles the pending payment using the gateway's verdict.
    ///
    /// A verified confirmation confirms the reservation. A rejected one
    /// fails the payment and cancels the reservation, then returns
    /// `PaymentDeclined`; both records are committed before the error is
    /// returned.
    pub async fn process_payment(
        &self,
        reservation_id: &str,
        confirmation: &PaymentConfirmation,
    ) -> BookingResult<PaymentReceipt> {
        let method = match confirmation.method.as_deref() {
            Some(method) => {
                validate_payment_method(method)?;
                method.trim().to_string()
            }
            None => METHOD_GATEWAY.to_string(),
        };
        self.require_gateway()?;

        let (reservation, ledger) = self.load_with_ledger(reservation_id).await?;
        lifecycle::payment_for_order(&reservation, &ledger, &confirmation.order_id)?;

        let verified = self
            .gateway
            .verify_payment(
                &confirmation.order_id,
                &confirmation.gateway_payment_id,
                &confirmation.signature,
            )
            .await?;

        let outcome = if verified {
            PaymentOutcome::Approved {
                method,
                external_ref: confirmation.gateway_payment_id.clone(),
            }
        } else {
            PaymentOutcome::Declined
        };

        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let (mut reservation, mut ledger) = Self::load_in_tx(&mut *tx, reservation_id).await?;
        lifecycle::payment_for_order(&reservation, &ledger, &confirmation.order_id)?;
        let settlement = lifecycle::settle_payment(&mut reservation, &mut ledger, outcome, now)?;
        PaymentRepository::save(&mut *tx, settlement.payment()).await?;
        ReservationRepository::save_status(&mut *tx, &reservation).await?;
        tx.commit().await?;

        match settlement {
            Settlement::Confirmed { payment } => {
                info!(
                    reservation_id = %reservation.id,
                    payment_id = %payment.id,
                    amount = %payment.amount(),
                    "Payment completed, reservation confirmed"
                );
                Ok(PaymentReceipt {
                    reservation,
                    payment,
                })
            }
            Settlement::Declined { payment } => {
                warn!(
                    reservation_id = %reservation.id,
                    payment_id = %payment.id,
                    "Payment declined, reservation cancelled"
                );
                Err(CoreError::PaymentDeclined {
                    reservation_id: reservation.id,
                    payment_id: payment.id,
                }
                .into())
            }
        }
    }

    /// All payment records of a reservation, oldest first.
    pub async fn payments_for_reservation(&self, reservation_id: &str) -> BookingResult<Vec<Payment>> {
        Ok(self.db.payments().list_for_reservation(reservation_id).await?)
    }

    /// The settled charge of a reservation, if it has been paid.
    pub async fn completed_charge(&self, reservation_id: &str) -> BookingResult<Option<Payment>> {
        Ok(self.db.payments().completed_charge(reservation_id).await?)
    }

    pub async fn get_payment(&self, payment_id: &str) -> BookingResult<Payment> {
        self.db
            .payments()
            .get_by_id(payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment", payment_id).into())
    }

    /// Resolves a gateway receipt (our transaction reference) to its payment.
    pub async fn find_payment_by_transaction_ref(&self, transaction_ref: &str) -> BookingResult<Payment> {
        self.db
            .payments()
            .get_by_transaction_ref(transaction_ref)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment", transaction_ref).into())
    }

    // =========================================================================
    // Cancel / Check-in / Check-out
    // =========================================================================

    /// Cancels on behalf of `actor`, refunding when the policy allows.
    pub async fn cancel_reservation(&self, reservation_id: &str, actor: &Subject) -> BookingResult<Cancellation> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let (mut reservation, mut ledger) = Self::load_in_tx(&mut *tx, reservation_id).await?;

        let outcome = lifecycle::cancel_booking(&mut reservation, &mut ledger, actor, now, self.ids.as_ref())?;

        ReservationRepository::save_status(&mut *tx, &reservation).await?;
        if let Some(abandoned) = &outcome.abandoned_payment {
            PaymentRepository::save(&mut *tx, abandoned).await?;
        }
        if let Some(refund) = &outcome.refund {
            PaymentRepository::insert(&mut *tx, refund).await?;
        }
        tx.commit().await?;

        info!(
            reservation_id = %reservation.id,
            refunded = outcome.refund.is_some(),
            "Reservation cancelled"
        );
        Ok(Cancellation {
            reservation,
            abandoned_payment: outcome.abandoned_payment,
            refund: outcome.refund,
        })
    }

    /// Front desk: guest arrives.
    pub async fn check_in(&self, reservation_id: &str) -> BookingResult<Reservation> {
        let mut tx = self.db.begin().await?;
        let mut reservation = Self::reservation_in_tx(&mut *tx, reservation_id).await?;

        reservation.check_in(self.clock.today(), self.clock.now())?;

        ReservationRepository::save_status(&mut *tx, &reservation).await?;
        tx.commit().await?;

        info!(reservation_id = %reservation.id, "Guest checked in");
        Ok(reservation)
    }

    /// Front desk: guest leaves.
    pub async fn check_out(&self, reservation_id: &str) -> BookingResult<Reservation> {
        let mut tx = self.db.begin().await?;
        let mut reservation = Self::reservation_in_tx(&mut *tx, reservation_id).await?;

        reservation.check_out(self.clock.now())?;

        ReservationRepository::save_status(&mut *tx, &reservation).await?;
        tx.commit().await?;

        info!(reservation_id = %reservation.id, "Guest checked out");
        Ok(reservation)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub async fn get_reservation(&self, reservation_id: &str) -> BookingResult<Reservation> {
        self.db
            .reservations()
            .get_by_id(reservation_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Reservation", reservation_id).into())
    }

    pub async fn find_by_confirmation_number(&self, confirmation_number: &str) -> BookingResult<Reservation> {
        self.db
            .reservations()
            .get_by_confirmation_number(confirmation_number)
            .await?
            .ok_or_else(|| CoreError::not_found("Reservation", confirmation_number).into())
    }

    pub async fn find_by_booking_reference(&self, booking_reference: &str) -> BookingResult<Reservation> {
        self.db
            .reservations()
            .get_by_booking_reference(booking_reference)
            .await?
            .ok_or_else(|| CoreError::not_found("Reservation", booking_reference).into())
    }

    /// Newest first.
    pub async fn reservations_for_user(&self, user_id: &str) -> BookingResult<Vec<Reservation>> {
        Ok(self.db.reservations().list_for_user(user_id).await?)
    }

    /// Reservations checking in on any day of `[start, end]`.
    pub async fn reservations_checking_in(&self, start: NaiveDate, end: NaiveDate) -> BookingResult<Vec<Reservation>> {
        validate_date_range(start, end)?;
        Ok(self.db.reservations().list_by_check_in_range(start, end).await?)
    }

    pub async fn stats(&self) -> BookingResult<ReservationStats> {
        Ok(self.db.reservations().stats().await?)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Serialises bookings of one room within this process.
    async fn lock_room(&self, room_id: &str) -> OwnedMutexGuard<()> {
        self.lock_key(format!("room:{room_id}")).await
    }

    /// Entries nobody holds or waits on are dropped before each insert, so
    /// the map only ever holds keys with work in flight.
    async fn lock_key(&self, key: String) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of keyed locks currently tracked.
    pub async fn tracked_lock_count(&self) -> usize {
        let mut locks = self.locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.len()
    }

    fn recorded_order(&self, pending: &Payment, order_id: &str) -> GatewayOrder {
        GatewayOrder {
            order_id: order_id.to_string(),
            amount: pending.amount_cents,
            currency: self.config.currency.clone(),
            receipt: pending.transaction_ref.clone(),
        }
    }

    fn require_gateway(&self) -> Result<(), GatewayError> {
        match self.config.gateway {
            Some(_) => Ok(()),
            None => Err(GatewayError::NotConfigured),
        }
    }

    async fn active_room(&self, room_id: &str) -> BookingResult<Room> {
        match self.db.rooms().get_by_id(room_id).await? {
            Some(room) if room.is_active => Ok(room),
            _ => Err(CoreError::not_found("Room", room_id).into()),
        }
    }

    async fn load_with_ledger(&self, reservation_id: &str) -> BookingResult<(Reservation, PaymentLedger)> {
        let reservation = self.get_reservation(reservation_id).await?;
        let payments = self.db.payments().list_for_reservation(reservation_id).await?;
        let ledger = PaymentLedger::new(reservation.id.clone(), payments);
        Ok((reservation, ledger))
    }

    async fn reservation_in_tx(conn: &mut SqliteConnection, reservation_id: &str) -> BookingResult<Reservation> {
        ReservationRepository::fetch(conn, reservation_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Reservation", reservation_id).into())
    }

    async fn load_in_tx(
        conn: &mut SqliteConnection,
        reservation_id: &str,
    ) -> BookingResult<(Reservation, PaymentLedger)> {
        let reservation = Self::reservation_in_tx(&mut *conn, reservation_id).await?;
        let payments = PaymentRepository::fetch_for_reservation(conn, reservation_id).await?;
        let ledger = PaymentLedger::new(reservation.id.clone(), payments);
        Ok((reservation, ledger))
    }
}
