//! # Cancellation Policy
//!
//! Free cancellation until 24 hours before the start of the check-in date.
//!
//! ```text
//! check-in date 2026-03-10
//!   cutoff = 2026-03-10T00:00Z − 24h = 2026-03-09T00:00Z
//!
//!   cancel at 2026-03-08T23:59Z → refund
//!   cancel at 2026-03-09T00:00Z → no refund (boundary is exclusive)
//! ```

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::types::Reservation;
use crate::REFUND_WINDOW_HOURS;

/// The last instant (exclusive) at which a cancellation is refunded.
pub fn refund_cutoff(check_in: NaiveDate) -> DateTime<Utc> {
    check_in.and_time(NaiveTime::MIN).and_utc() - Duration::hours(REFUND_WINDOW_HOURS)
}

/// Whether cancelling `reservation` at `now` earns a refund.
pub fn is_refund_eligible(reservation: &Reservation, now: DateTime<Utc>) -> bool {
    now < refund_cutoff(reservation.check_in_date)
}

// =============================================================================
// Unit Tests
// =============================================================================
