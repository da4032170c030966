//! # Availability
//!
//! Decides whether a room is free for a range of nights.
//!
//! ## Overlap Predicate
//! ```text
//! existing.check_in <= requested.check_out  AND
//! existing.check_out >= requested.check_in
//!
//! Both comparisons are inclusive, so stays that share a boundary date
//! conflict:
//!
//!   existing   ├──── Mar 6 ──── Mar 8 ┤
//!   requested                   ├ Mar 8 ──── Mar 10 ┤   → CONFLICT
//!   requested                     ├ Mar 9 ── Mar 11 ┤   → free
//! ```
//!
//! Only non-cancelled reservations hold a room. The SQL used by the
//! repositories encodes exactly the same predicate.

use crate::types::{Reservation, StayDates};

/// The inclusive overlap test between two ranges of nights.
#[inline]
pub fn overlaps(existing: &StayDates, requested: &StayDates) -> bool {
    existing.check_in <= requested.check_out && existing.check_out >= requested.check_in
}

/// Whether `reservation` keeps `room_id` from being booked for `requested`.
pub fn conflicts_with(reservation: &Reservation, room_id: &str, requested: &StayDates) -> bool {
    reservation.room_id == room_id
        && reservation.status.blocks_room()
        && overlaps(&reservation.stay(), requested)
}

/// Read-only availability check over a set of known reservations.
///
/// `reservations` may include other rooms' bookings; they are ignored.
pub fn is_available(room_id: &str, requested: &StayDates, reservations: &[Reservation]) -> bool {
    !reservations
        .iter()
        .any(|reservation| conflicts_with(reservation, room_id, requested))
}

// =============================================================================
// Unit Tests
// =============================================================================
