//! End-to-end booking flows against an in-memory database.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};

use lodging_core::ledger::{METHOD_GATEWAY, METHOD_REFUND};
use lodging_core::{
    BookingRequest, CoreError, ErrorKind, FixedClock, Money, PaymentStatus, ReservationStatus,
    Room, RoomCategory, SequentialIds, StayDates, Subject, User, UserRole,
};
use lodging_db::{
    BookingService, Database, DbConfig, GatewayCredentials, GatewayError, GatewayOrder,
    LodgingConfig, PaymentConfirmation, PaymentGateway, RoomFilter,
};

// =============================================================================
// Harness
// =============================================================================

/// Approves or declines according to a switch, counting orders created.
#[derive(Debug)]
struct ScriptedGateway {
    approve: AtomicBool,
    orders_created: AtomicU32,
}

impl ScriptedGateway {
    fn approving() -> Self {
        ScriptedGateway {
            approve: AtomicBool::new(true),
            orders_created: AtomicU32::new(0),
        }
    }

    fn decline(&self) {
        self.approve.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let n = self.orders_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(GatewayOrder {
            order_id: format!("order_{n}"),
            amount,
            currency: currency.to_string(),
            receipt: receipt.to_string(),
        })
    }

    async fn verify_payment(
        &self,
        _order_id: &str,
        _payment_id: &str,
        _signature: &str,
    ) -> Result<bool, GatewayError> {
        Ok(self.approve.load(Ordering::SeqCst))
    }
}

struct Harness {
    service: BookingService,
    clock: Arc<FixedClock>,
    gateway: Arc<ScriptedGateway>,
    guest: User,
    other_guest: User,
    single: Room,
    double: Room,
    suite: Room,
}

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, m, d).unwrap()
}

fn configured() -> LodgingConfig {
    LodgingConfig {
        gateway: Some(GatewayCredentials {
            key_id: "rzp_test_key".to_string(),
            key_secret: "secret".to_string(),
        }),
        ..LodgingConfig::default()
    }
}

fn user(id: &str, email: &str, name: &str) -> User {
    User {
        id: id.to_string(),
        email: email.to_string(),
        full_name: name.to_string(),
        phone: None,
        role: UserRole::Guest,
        is_active: true,
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn room(id: &str, number: &str, category: RoomCategory, capacity: i64, base_major: i64) -> Room {
    let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    Room {
        id: id.to_string(),
        hotel_id: "hotel-1".to_string(),
        room_number: number.to_string(),
        category,
        capacity,
        base_price_cents: base_major * 100,
        description: None,
        is_active: true,
        created_at: created,
        updated_at: created,
    }
}

async fn harness_with(config: LodgingConfig) -> Harness {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let guest = user("user-1", "asha@example.com", "Asha Rao");
    let other_guest = user("user-2", "dan@example.com", "Daniel Okafor");
    db.users().insert(&guest).await.unwrap();
    db.users().insert(&other_guest).await.unwrap();

    let single = room("room-single", "101", RoomCategory::Single, 2, 1000);
    let double = room("room-double", "201", RoomCategory::Double, 3, 1500);
    let suite = room("room-suite", "301", RoomCategory::Suite, 4, 3000);
    for r in [&single, &double, &suite] {
        db.rooms().insert(r).await.unwrap();
    }

    // Sunday 2026-03-01, noon UTC
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()));
    let gateway = Arc::new(ScriptedGateway::approving());

    let service = BookingService::new(db, config)
        .with_clock(clock.clone())
        .with_ids(Arc::new(SequentialIds::new()))
        .with_gateway(gateway.clone());

    Harness {
        service,
        clock,
        gateway,
        guest,
        other_guest,
        single,
        double,
        suite,
    }
}

async fn harness() -> Harness {
    harness_with(configured()).await
}

/// Fri 2026-03-06 → Sun 2026-03-08, two weekend nights.
fn weekend() -> StayDates {
    StayDates::new(date(3, 6), date(3, 8))
}

fn confirmation(order_id: &str) -> PaymentConfirmation {
    PaymentConfirmation {
        method: Some("CARD".to_string()),
        order_id: order_id.to_string(),
        gateway_payment_id: format!("pay_{order_id}"),
        signature: "sig".to_string(),
    }
}

impl Harness {
    fn subject(&self) -> Subject {
        Subject::new(&self.guest.id, UserRole::Guest)
    }

    async fn book(&self, room: &Room, stay: StayDates, guests: i64) -> String {
        let request = BookingRequest::new(&room.id, &self.guest.id, stay, guests);
        let booking = self.service.create_reservation(&request).await.unwrap();
        booking.reservation.id
    }

    async fn book_and_pay(&self, room: &Room, stay: StayDates) -> String {
        let id = self.book(room, stay, 1).await;
        let order = self.service.create_payment_order(&id).await.unwrap();
        self.service
            .process_payment(&id, &confirmation(&order.order_id))
            .await
            .unwrap();
        id
    }
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_weekend_booking_is_priced_and_pending() {
    let h = harness().await;

    let quote = h.service.quote_price(&h.single.id, &weekend()).await.unwrap();
    assert_eq!(quote.room_price, Money::from_major(2600));
    assert_eq!(quote.total_cost, Money::from_major(2937));

    let request = BookingRequest::new(&h.single.id, &h.guest.id, weekend(), 2);
    let booking = h.service.create_reservation(&request).await.unwrap();

    assert_eq!(booking.reservation.status, ReservationStatus::Pending);
    assert_eq!(booking.reservation.total_amount(), Money::from_major(2937));
    assert_eq!(booking.reservation.guest_name, "Asha Rao");
    assert_eq!(booking.reservation.guest_email, "asha@example.com");
    assert_eq!(booking.payment.status, PaymentStatus::Pending);
    assert_eq!(booking.payment.amount_cents, booking.reservation.total_amount_cents);

    let stored = h.service.get_reservation(&booking.reservation.id).await.unwrap();
    assert_eq!(stored.booking_reference, booking.reservation.booking_reference);
    let by_ref = h
        .service
        .find_by_booking_reference(&booking.reservation.booking_reference)
        .await
        .unwrap();
    assert_eq!(by_ref.id, booking.reservation.id);
    let by_confirmation = h
        .service
        .find_by_confirmation_number(&booking.reservation.confirmation_number)
        .await
        .unwrap();
    assert_eq!(by_confirmation.id, booking.reservation.id);

    let payments = h.service.payments_for_reservation(&booking.reservation.id).await.unwrap();
    assert_eq!(payments.len(), 1);
}

#[tokio::test]
async fn test_too_many_guests_persists_nothing() {
    let h = harness().await;

    let request = BookingRequest::new(&h.single.id, &h.guest.id, weekend(), 5);
    let err = h.service.create_reservation(&request).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    let db = h.service.database();
    assert_eq!(db.reservations().count().await.unwrap(), 0);
    assert!(h.service.is_available(&h.single.id, &weekend()).await.unwrap());
}

#[tokio::test]
async fn test_unknown_room_and_user_are_not_found() {
    let h = harness().await;

    let request = BookingRequest::new("no-such-room", &h.guest.id, weekend(), 1);
    let err = h.service.create_reservation(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let request = BookingRequest::new(&h.single.id, "no-such-user", weekend(), 1);
    let err = h.service.create_reservation(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_shared_boundary_date_is_a_conflict() {
    let h = harness().await;
    h.book(&h.single, weekend(), 1).await;

    // Starts on the day the first stay ends
    let next = StayDates::new(date(3, 8), date(3, 10));
    assert!(!h.service.is_available(&h.single.id, &next).await.unwrap());

    let request = BookingRequest::new(&h.single.id, &h.other_guest.id, next, 1);
    let err = h.service.create_reservation(&request).await.unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::RoomUnavailable { .. })
    ));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // A stay that ends the day before is fine
    let earlier = StayDates::new(date(3, 3), date(3, 5));
    assert!(h.service.is_available(&h.single.id, &earlier).await.unwrap());
}

#[tokio::test]
async fn test_availability_of_unknown_or_inactive_room_is_not_found() {
    let h = harness().await;

    let err = h.service.is_available("no-such-room", &weekend()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    h.service.deactivate_room(&h.suite.id).await.unwrap();
    let err = h.service.is_available(&h.suite.id, &weekend()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let inverted = StayDates::new(date(3, 8), date(3, 6));
    let err = h.service.is_available(&h.single.id, &inverted).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_room_locks_are_released_after_use() {
    let h = harness().await;
    h.book(&h.single, weekend(), 1).await;
    h.book(&h.double, weekend(), 1).await;
    let id = h.book(&h.suite, weekend(), 1).await;
    h.service.create_payment_order(&id).await.unwrap();

    assert_eq!(h.service.tracked_lock_count().await, 0);
}

#[tokio::test]
async fn test_cancelled_reservation_frees_the_room() {
    let h = harness().await;
    let id = h.book(&h.single, weekend(), 1).await;

    h.service.cancel_reservation(&id, &h.subject()).await.unwrap();

    assert!(h.service.is_available(&h.single.id, &weekend()).await.unwrap());
    let request = BookingRequest::new(&h.single.id, &h.other_guest.id, weekend(), 1);
    assert!(h.service.create_reservation(&request).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_bookings_for_one_room_admit_one() {
    let h = harness().await;

    let a = BookingRequest::new(&h.single.id, &h.guest.id, weekend(), 1);
    let b = BookingRequest::new(&h.single.id, &h.other_guest.id, weekend(), 1);
    let (first, second) = tokio::join!(
        h.service.create_reservation(&a),
        h.service.create_reservation(&b)
    );

    assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
    assert_eq!(h.service.database().reservations().count().await.unwrap(), 1);
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_find_available_rooms_applies_filters() {
    let h = harness().await;
    h.book(&h.double, weekend(), 1).await;

    let all = h
        .service
        .find_available_rooms(&weekend(), &RoomFilter::new())
        .await
        .unwrap();
    let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec![h.single.id.as_str(), h.suite.id.as_str()]);

    let roomy = h
        .service
        .find_available_rooms(&weekend(), &RoomFilter::new().min_capacity(3))
        .await
        .unwrap();
    assert_eq!(roomy.len(), 1);
    assert_eq!(roomy[0].id, h.suite.id);

    let singles = h
        .service
        .find_available_rooms(&weekend(), &RoomFilter::new().category(RoomCategory::Single))
        .await
        .unwrap();
    assert_eq!(singles.len(), 1);
    assert_eq!(singles[0].id, h.single.id);

    assert_eq!(h.service.available_room_count(&weekend()).await.unwrap(), 2);

    h.service.deactivate_room(&h.suite.id).await.unwrap();
    assert_eq!(h.service.available_room_count(&weekend()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_catalogue_reads() {
    let h = harness().await;

    assert_eq!(h.service.rooms_for_hotel("hotel-1").await.unwrap().len(), 3);
    assert!(h.service.rooms_for_hotel("hotel-2").await.unwrap().is_empty());

    let suites = h.service.rooms_by_category(RoomCategory::Suite).await.unwrap();
    assert_eq!(suites.len(), 1);
    assert_eq!(suites[0].id, h.suite.id);

    let roomy: Vec<String> = h
        .service
        .rooms_for_guests(3)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(roomy, vec![h.double.id.clone(), h.suite.id.clone()]);

    let mid: Vec<String> = h
        .service
        .rooms_in_price_range(100_000, 150_000)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(mid, vec![h.single.id.clone(), h.double.id.clone()]);

    let err = h.service.rooms_in_price_range(150_000, 100_000).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    h.service.deactivate_room(&h.double.id).await.unwrap();
    assert_eq!(h.service.rooms_in_price_range(100_000, 150_000).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_find_available_rooms_rejects_bad_input() {
    let h = harness().await;

    let inverted = StayDates::new(date(3, 8), date(3, 6));
    let err = h
        .service
        .find_available_rooms(&inverted, &RoomFilter::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = h
        .service
        .find_available_rooms(&weekend(), &RoomFilter::new().min_capacity(0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// =============================================================================
// Payments
// =============================================================================

#[tokio::test]
async fn test_verified_payment_confirms_reservation() {
    let h = harness().await;
    let id = h.book(&h.single, weekend(), 1).await;

    let order = h.service.create_payment_order(&id).await.unwrap();
    assert_eq!(order.amount, Money::from_major(2937).cents());
    assert_eq!(order.currency, "INR");

    let receipt = h
        .service
        .process_payment(&id, &confirmation(&order.order_id))
        .await
        .unwrap();

    assert_eq!(receipt.reservation.status, ReservationStatus::Confirmed);
    assert_eq!(receipt.payment.status, PaymentStatus::Completed);
    assert_eq!(receipt.payment.method, "CARD");
    assert_eq!(receipt.payment.external_ref.as_deref(), Some("pay_order_1"));
    assert!(receipt.payment.processed_at.is_some());

    let stored = h.service.get_reservation(&id).await.unwrap();
    assert_eq!(stored.status, ReservationStatus::Confirmed);
}

#[tokio::test]
async fn test_payment_method_defaults_to_gateway() {
    let h = harness().await;
    let id = h.book(&h.single, weekend(), 1).await;
    let order = h.service.create_payment_order(&id).await.unwrap();

    let mut relayed = confirmation(&order.order_id);
    relayed.method = None;
    let receipt = h.service.process_payment(&id, &relayed).await.unwrap();

    assert_eq!(receipt.payment.method, METHOD_GATEWAY);
}

#[tokio::test]
async fn test_declined_payment_cancels_and_is_committed() {
    let h = harness().await;
    let id = h.book(&h.single, weekend(), 1).await;
    let order = h.service.create_payment_order(&id).await.unwrap();

    h.gateway.decline();
    let err = h
        .service
        .process_payment(&id, &confirmation(&order.order_id))
        .await
        .unwrap_err();

    assert!(matches!(err.as_core(), Some(CoreError::PaymentDeclined { .. })));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let stored = h.service.get_reservation(&id).await.unwrap();
    assert_eq!(stored.status, ReservationStatus::Cancelled);
    assert!(stored.cancelled_at.is_some());

    let payments = h.service.payments_for_reservation(&id).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Failed);

    // The room is free again
    assert!(h.service.is_available(&h.single.id, &weekend()).await.unwrap());
}

#[tokio::test]
async fn test_payment_order_is_reused() {
    let h = harness().await;
    let id = h.book(&h.single, weekend(), 1).await;

    let first = h.service.create_payment_order(&id).await.unwrap();
    let second = h.service.create_payment_order(&id).await.unwrap();

    assert_eq!(first.order_id, second.order_id);
    assert_eq!(first.receipt, second.receipt);
    assert_eq!(h.gateway.orders_created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_confirmation_for_another_order_is_rejected() {
    let h = harness().await;
    let id = h.book(&h.single, weekend(), 1).await;
    h.service.create_payment_order(&id).await.unwrap();

    let err = h
        .service
        .process_payment(&id, &confirmation("order_forged"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let stored = h.service.get_reservation(&id).await.unwrap();
    assert_eq!(stored.status, ReservationStatus::Pending);
}

#[tokio::test]
async fn test_paying_twice_is_a_conflict() {
    let h = harness().await;
    let id = h.book_and_pay(&h.single, weekend()).await;

    let err = h
        .service
        .process_payment(&id, &confirmation("order_1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_missing_gateway_credentials_is_external_failure() {
    let h = harness_with(LodgingConfig::default()).await;
    let id = h.book(&h.single, weekend(), 1).await;

    let err = h.service.create_payment_order(&id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExternalService);

    let err = h
        .service
        .process_payment(&id, &confirmation("order_1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExternalService);

    // Nothing changed
    let stored = h.service.get_reservation(&id).await.unwrap();
    assert_eq!(stored.status, ReservationStatus::Pending);
}

#[tokio::test]
async fn test_confirmation_replayed_on_unordered_reservation_is_refused() {
    let h = harness().await;
    h.book_and_pay(&h.single, weekend()).await;
    let other = h.book(&h.double, weekend(), 1).await;

    // order_1 belongs to the first reservation; the second never opened one
    let err = h
        .service
        .process_payment(&other, &confirmation("order_1"))
        .await
        .unwrap_err();

    assert!(matches!(err.as_core(), Some(CoreError::NoGatewayOrder { .. })));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let stored = h.service.get_reservation(&other).await.unwrap();
    assert_eq!(stored.status, ReservationStatus::Pending);
    let payments = h.service.payments_for_reservation(&other).await.unwrap();
    assert_eq!(payments[0].status, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_gateway_payment_settles_only_one_reservation() {
    let h = harness().await;
    h.book_and_pay(&h.single, weekend()).await;
    let other = h.book(&h.double, weekend(), 1).await;
    let order = h.service.create_payment_order(&other).await.unwrap();

    // Genuine order, but the gateway payment id was already used for order_1
    let mut reused = confirmation(&order.order_id);
    reused.gateway_payment_id = "pay_order_1".to_string();
    let err = h.service.process_payment(&other, &reused).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    let stored = h.service.get_reservation(&other).await.unwrap();
    assert_eq!(stored.status, ReservationStatus::Pending);
    assert!(h.service.completed_charge(&other).await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_payment_orders_share_one_order() {
    let h = harness().await;
    let id = h.book(&h.single, weekend(), 1).await;

    let (first, second) = tokio::join!(
        h.service.create_payment_order(&id),
        h.service.create_payment_order(&id)
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.order_id, second.order_id);
    assert_eq!(h.gateway.orders_created.load(Ordering::SeqCst), 1);
    let payments = h.service.payments_for_reservation(&id).await.unwrap();
    assert_eq!(payments[0].gateway_order_id.as_deref(), Some(first.order_id.as_str()));

    h.service
        .process_payment(&id, &confirmation(&first.order_id))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_payment_lookups() {
    let h = harness().await;
    let id = h.book_and_pay(&h.single, weekend()).await;

    let charge = h.service.completed_charge(&id).await.unwrap().expect("paid");
    assert_eq!(charge.status, PaymentStatus::Completed);
    assert_eq!(charge.amount(), Money::from_major(2937));

    let by_ref = h
        .service
        .find_payment_by_transaction_ref(&charge.transaction_ref)
        .await
        .unwrap();
    assert_eq!(by_ref.id, charge.id);
    assert_eq!(h.service.get_payment(&charge.id).await.unwrap(), charge);

    let err = h
        .service
        .find_payment_by_transaction_ref("TXN000000000000")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_early_cancellation_is_refunded() {
    let h = harness().await;
    let id = h.book_and_pay(&h.single, weekend()).await;

    let cancellation = h.service.cancel_reservation(&id, &h.subject()).await.unwrap();

    assert_eq!(cancellation.reservation.status, ReservationStatus::Cancelled);
    assert!(cancellation.abandoned_payment.is_none());
    let refund = cancellation.refund.expect("refund issued");
    assert_eq!(refund.amount_cents, -Money::from_major(2937).cents());
    assert_eq!(refund.method, METHOD_REFUND);
    assert_eq!(refund.status, PaymentStatus::Completed);

    let payments = h.service.payments_for_reservation(&id).await.unwrap();
    assert_eq!(payments.len(), 2);
}

#[tokio::test]
async fn test_late_cancellation_is_not_refunded() {
    let h = harness().await;
    let id = h.book_and_pay(&h.single, weekend()).await;

    // 2026-03-05 22:00 UTC, two hours before check-in day starts
    h.clock.set(Utc.with_ymd_and_hms(2026, 3, 5, 22, 0, 0).unwrap());
    let cancellation = h.service.cancel_reservation(&id, &h.subject()).await.unwrap();

    assert_eq!(cancellation.reservation.status, ReservationStatus::Cancelled);
    assert!(cancellation.refund.is_none());
    let payments = h.service.payments_for_reservation(&id).await.unwrap();
    assert_eq!(payments.len(), 1);
}

#[tokio::test]
async fn test_cancelling_unpaid_booking_fails_pending_payment() {
    let h = harness().await;
    let id = h.book(&h.single, weekend(), 1).await;

    let cancellation = h.service.cancel_reservation(&id, &h.subject()).await.unwrap();

    let abandoned = cancellation.abandoned_payment.expect("pending payment abandoned");
    assert_eq!(abandoned.status, PaymentStatus::Failed);
    assert!(cancellation.refund.is_none());
}

#[tokio::test]
async fn test_second_cancel_is_a_conflict() {
    let h = harness().await;
    let id = h.book_and_pay(&h.single, weekend()).await;

    h.service.cancel_reservation(&id, &h.subject()).await.unwrap();
    let err = h.service.cancel_reservation(&id, &h.subject()).await.unwrap_err();

    assert!(matches!(
        err.as_core(),
        Some(CoreError::InvalidReservationStatus { .. })
    ));
    // Still exactly one refund
    let refunds = h
        .service
        .payments_for_reservation(&id)
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.is_refund())
        .count();
    assert_eq!(refunds, 1);
}

#[tokio::test]
async fn test_cancel_by_someone_else_is_refused() {
    let h = harness().await;
    let id = h.book(&h.single, weekend(), 1).await;

    let intruder = Subject::new(&h.other_guest.id, UserRole::Guest);
    let err = h.service.cancel_reservation(&id, &intruder).await.unwrap_err();

    assert!(matches!(err.as_core(), Some(CoreError::Unauthorized { .. })));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let stored = h.service.get_reservation(&id).await.unwrap();
    assert_eq!(stored.status, ReservationStatus::Pending);
}

// =============================================================================
// Stay
// =============================================================================

#[tokio::test]
async fn test_check_in_and_out_complete_the_stay() {
    let h = harness().await;
    let id = h.book_and_pay(&h.single, weekend()).await;

    let err = h.service.check_in(&id).await.unwrap_err();
    assert!(matches!(err.as_core(), Some(CoreError::CheckInNotYetAllowed { .. })));

    h.clock.set(Utc.with_ymd_and_hms(2026, 3, 6, 15, 0, 0).unwrap());
    let checked_in = h.service.check_in(&id).await.unwrap();
    assert_eq!(checked_in.status, ReservationStatus::CheckedIn);
    assert!(checked_in.actual_check_in.is_some());

    h.clock.advance(Duration::days(2));
    let done = h.service.check_out(&id).await.unwrap();
    assert_eq!(done.status, ReservationStatus::Completed);
    assert!(done.actual_check_out.is_some());

    // Terminal
    let err = h.service.cancel_reservation(&id, &h.subject()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_check_out_requires_check_in() {
    let h = harness().await;
    let id = h.book_and_pay(&h.single, weekend()).await;

    let err = h.service.check_out(&id).await.unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::InvalidReservationStatus { .. })
    ));
}

// =============================================================================
// Reporting
// =============================================================================

#[tokio::test]
async fn test_stats_count_active_and_completed_revenue() {
    let h = harness().await;

    let completed = h.book_and_pay(&h.single, weekend()).await;
    h.book_and_pay(&h.double, weekend()).await;
    h.book(&h.suite, weekend(), 1).await;

    h.clock.set(Utc.with_ymd_and_hms(2026, 3, 6, 15, 0, 0).unwrap());
    h.service.check_in(&completed).await.unwrap();
    h.service.check_out(&completed).await.unwrap();

    let stats = h.service.stats().await.unwrap();
    assert_eq!(stats.total_reservations, 3);
    // The double is confirmed; the suite is still pending
    assert_eq!(stats.active_reservations, 1);
    assert_eq!(stats.total_revenue, Money::from_major(2937));

    let mine = h.service.reservations_for_user(&h.guest.id).await.unwrap();
    assert_eq!(mine.len(), 3);

    let arriving = h
        .service
        .reservations_checking_in(date(3, 6), date(3, 6))
        .await
        .unwrap();
    assert_eq!(arriving.len(), 3);
}
