//! # lodging-core: Pure Booking Logic
//!
//! Every rule about rooms, reservations and money lives here, as plain
//! functions over plain data. No database, no network, no wall clock.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lodging Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Web / API layer (outside this workspace)           │   │
//! │  │    search rooms ──► book ──► pay ──► check in ──► check out     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                lodging-db (BookingService)                      │   │
//! │  │      one sqlx transaction per operation, payment gateway        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ lodging-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   pricing    availability   lifecycle   ledger   cancellation  │   │
//! │  │   money      types          validation  clock    error         │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • INJECTED CLOCK AND IDS   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`pricing`] - Nightly rates with weekend/season/category surcharges
//! - [`availability`] - The inclusive overlap predicate
//! - [`lifecycle`] - Reservation state machine and its guards
//! - [`ledger`] - Payment records of one reservation
//! - [`cancellation`] - Refund eligibility
//! - [`clock`] - Injectable time and id sources
//! - [`money`] - Integer money (no floating point)
//! - [`types`] - Domain records
//! - [`error`] - Error types and caller-facing kinds
//! - [`validation`] - Input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use lodging_core::money::Money;
//! use lodging_core::types::TaxRate;
//!
//! let room_price = Money::from_major(2600);
//! let tax = room_price
//!     .calculate_tax(TaxRate::from_bps(lodging_core::BOOKING_TAX_RATE_BPS))
//!     .unwrap();
//!
//! assert_eq!(tax, Money::from_major(312));
//! assert_eq!(tax.to_string(), "312.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod availability;
pub mod cancellation;
pub mod clock;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, FixedClock, IdGenerator, RandomIds, SequentialIds, SystemClock};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use ledger::PaymentLedger;
pub use lifecycle::{BookingRequest, CancellationOutcome, NewBooking, PaymentOutcome, Settlement};
pub use money::Money;
pub use pricing::{PriceQuote, PricingEngine};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tax on the room price, in basis points (12%).
pub const BOOKING_TAX_RATE_BPS: u32 = 1200;

/// Flat service fee added to every booking, in cents.
pub const SERVICE_FEE_CENTS: i64 = 2500;

/// Cancellations earlier than this many hours before the check-in date are
/// refunded.
pub const REFUND_WINDOW_HOURS: i64 = 24;

/// Highest nightly base price a room may carry, in cents (100,000,000.00).
///
/// Keeps every stay total representable in an `i64`.
pub const MAX_BASE_PRICE_CENTS: i64 = 10_000_000_000;

/// Longest bookable stay.
pub const MAX_NIGHTS: i64 = 365;

/// Maximum length of the free-text special requests.
pub const MAX_SPECIAL_REQUESTS_LEN: usize = 500;
