//! # Domain Types
//!
//! Core domain types used throughout the booking platform.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────┐   │
//! │  │      Room       │   │    Reservation      │   │    Payment      │   │
//! │  │  ─────────────  │   │  ─────────────────  │   │  ─────────────  │   │
//! │  │  id (UUID)      │◄──│  room_id (FK)       │◄──│  reservation_id │   │
//! │  │  room_number    │   │  booking_reference  │   │  amount_cents   │   │
//! │  │  category       │   │  confirmation_number│   │  method (tag)   │   │
//! │  │  capacity       │   │  status             │   │  status         │   │
//! │  │  base_price     │   │  total_amount_cents │   │  transaction_ref│   │
//! │  └─────────────────┘   └─────────────────────┘   └─────────────────┘   │
//! │                                                                         │
//! │  References point one way only (child → parent, by id).               │
//! │  Reverse traversal ("payments of a reservation") is a query.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every reservation has:
//! - `id`: UUID v4 - immutable, used for relations
//! - Business IDs: booking reference and confirmation number - human-readable

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1200 bps = 12%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Room
// =============================================================================

/// Room category. Suite and Presidential are the premium tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RoomCategory {
    Single,
    Double,
    Suite,
    Presidential,
}

impl RoomCategory {
    /// Whether the premium-category surcharge applies.
    pub const fn is_premium(&self) -> bool {
        matches!(self, RoomCategory::Suite | RoomCategory::Presidential)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            RoomCategory::Single => "single",
            RoomCategory::Double => "double",
            RoomCategory::Suite => "suite",
            RoomCategory::Presidential => "presidential",
        }
    }
}

impl FromStr for RoomCategory {
    type Err = ValidationError;

    /// Case-insensitive: `"SUITE"`, `"Suite"` and `"suite"` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(RoomCategory::Single),
            "double" => Ok(RoomCategory::Double),
            "suite" => Ok(RoomCategory::Suite),
            "presidential" => Ok(RoomCategory::Presidential),
            _ => Err(ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: vec![
                    "single".to_string(),
                    "double".to_string(),
                    "suite".to_string(),
                    "presidential".to_string(),
                ],
            }),
        }
    }
}

impl fmt::Display for RoomCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bookable room.
///
/// Immutable for the duration of a pricing computation; the price charged is
/// copied into the reservation and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Room {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning hotel (outside the booking core).
    pub hotel_id: String,

    /// Door number shown to guests.
    pub room_number: String,

    pub category: RoomCategory,

    /// Maximum number of guests. Always positive.
    pub capacity: i64,

    /// Base nightly price in cents. Never negative.
    pub base_price_cents: i64,

    pub description: Option<String>,

    /// Whether the room can be booked (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Returns the base nightly price as Money.
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }
}

// =============================================================================
// Stay Dates
// =============================================================================

/// A half-open range of nights `[check_in, check_out)`.
///
/// Construction does not validate ordering: pricing has a defined fallback
/// for empty or inverted ranges, and validation reports it as a field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StayDates {
    #[ts(as = "String")]
    pub check_in: NaiveDate,
    #[ts(as = "String")]
    pub check_out: NaiveDate,
}

impl StayDates {
    pub const fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        StayDates {
            check_in,
            check_out,
        }
    }

    /// Number of nights; zero or negative for empty/inverted ranges.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Each night of the stay, by the date the night starts on.
    pub fn each_night(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.check_in
            .iter_days()
            .take_while(move |night| *night < self.check_out)
    }

    /// A stay of `nights` nights starting on `check_in`.
    pub fn starting(check_in: NaiveDate, nights: u64) -> Self {
        let check_out = check_in
            .checked_add_days(Days::new(nights))
            .unwrap_or(NaiveDate::MAX);
        StayDates::new(check_in, check_out)
    }
}

impl fmt::Display for StayDates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.check_in, self.check_out)
    }
}

// =============================================================================
// Reservation
// =============================================================================

/// The lifecycle state of a reservation.
///
/// ```text
/// Pending ──► Confirmed ──► CheckedIn ──► Completed
///    │            │             │
///    └────────────┴─────────────┴──────► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Created, awaiting payment.
    Pending,
    /// Paid.
    Confirmed,
    /// Guest is in the room.
    CheckedIn,
    /// Guest has left. Terminal.
    Completed,
    /// Terminal.
    Cancelled,
}

impl ReservationStatus {
    /// No transition leaves a terminal status.
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Completed | ReservationStatus::Cancelled
        )
    }

    /// Whether a reservation in this status holds its room.
    pub const fn blocks_room(&self) -> bool {
        !matches!(self, ReservationStatus::Cancelled)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::CheckedIn => "checked_in",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for ReservationStatus {
    fn default() -> Self {
        ReservationStatus::Pending
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A booking of one room for a range of nights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Reservation {
    pub id: String,

    /// Globally unique, e.g. `BK3F9A0C1D2E`.
    pub booking_reference: String,

    /// Globally unique, e.g. `HR7C21B0AA95`. Used by front desk lookups.
    pub confirmation_number: String,

    pub room_id: String,

    /// The user who booked (and may cancel).
    pub user_id: String,

    #[ts(as = "String")]
    pub check_in_date: NaiveDate,

    #[ts(as = "String")]
    pub check_out_date: NaiveDate,

    pub guest_count: i64,

    /// Locked at creation; never recomputed.
    pub total_amount_cents: i64,

    pub status: ReservationStatus,

    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub special_requests: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,

    #[ts(as = "Option<String>")]
    pub actual_check_in: Option<DateTime<Utc>>,

    #[ts(as = "Option<String>")]
    pub actual_check_out: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Returns the locked total as Money.
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    /// Returns the booked nights.
    #[inline]
    pub fn stay(&self) -> StayDates {
        StayDates::new(self.check_in_date, self.check_out_date)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// The state of a single payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    /// Kept for records imported from systems that mark the charge itself.
    /// The ledger never assigns it: refunds are separate negative records.
    Refunded,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A charge or refund against a reservation.
///
/// Refunds are separate records with a negated amount; the original charge is
/// never mutated by a refund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub reservation_id: String,

    /// Positive for charges, negative for refunds.
    pub amount_cents: i64,

    /// Free-form tag: `PENDING`, `GATEWAY`, `REFUND`, `CARD`, ...
    pub method: String,

    pub status: PaymentStatus,

    /// Our own reference, sent to the gateway as the order receipt.
    pub transaction_ref: String,

    /// Order id issued by the payment gateway, once an order exists.
    pub gateway_order_id: Option<String>,

    /// Payment id reported by the gateway when the charge settles.
    pub external_ref: Option<String>,

    #[ts(as = "Option<String>")]
    pub processed_at: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Whether this record is a refund (negative amount).
    #[inline]
    pub fn is_refund(&self) -> bool {
        self.amount_cents < 0
    }
}

// =============================================================================
// Users & Identity
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Guest,
    Admin,
}

/// A registered user. Credentials live with the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A verified identity handed to the core by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub user_id: String,
    pub role: UserRole,
}

impl Subject {
    pub fn new(user_id: impl Into<String>, role: UserRole) -> Self {
        Subject {
            user_id: user_id.into(),
            role,
        }
    }
}

// =============================================================================
// Reporting
// =============================================================================

/// Aggregate counters for dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReservationStats {
    pub total_reservations: i64,
    /// Confirmed + CheckedIn.
    pub active_reservations: i64,
    /// Sum of total amounts of Completed reservations.
    pub total_revenue: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
