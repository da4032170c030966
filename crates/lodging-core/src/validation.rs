//! # Validation Module
//!
//! Input validation for booking requests and catalogue edits.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web frontend                                                 │
//! │  └── Immediate user feedback (date pickers, guest counters)            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Stay dates ordered, not in the past                               │
//! │  └── Guests within capacity, contact fields well-formed                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (check_in_date < check_out_date)                            │
//! │  ├── UNIQUE booking_reference / confirmation_number                    │
//! │  └── One pending payment per reservation (partial unique index)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here runs before any persistence.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::StayDates;
use crate::{MAX_BASE_PRICE_CENTS, MAX_NIGHTS, MAX_SPECIAL_REQUESTS_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Stay Validators
// =============================================================================

/// Validates the requested nights.
///
/// ## Rules
/// - check-in strictly before check-out
/// - check-in not before `today`
/// - at most MAX_NIGHTS nights
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use lodging_core::types::StayDates;
/// use lodging_core::validation::validate_stay_dates;
///
/// let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
/// let ok = StayDates::new(today, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
/// assert!(validate_stay_dates(&ok, today).is_ok());
///
/// let same_day = StayDates::new(today, today);
/// assert!(validate_stay_dates(&same_day, today).is_err());
/// ```
pub fn validate_stay_dates(stay: &StayDates, today: NaiveDate) -> ValidationResult<()> {
    if stay.check_in >= stay.check_out {
        return Err(ValidationError::InvalidDateRange {
            check_in: stay.check_in,
            check_out: stay.check_out,
        });
    }

    if stay.check_in < today {
        return Err(ValidationError::CheckInInPast {
            check_in: stay.check_in,
            today,
        });
    }

    if stay.nights() > MAX_NIGHTS {
        return Err(ValidationError::OutOfRange {
            field: "nights".to_string(),
            min: 1,
            max: MAX_NIGHTS,
        });
    }

    Ok(())
}

/// Validates a date range used for searches and reports.
///
/// Unlike a stay, a search may start in the past.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> ValidationResult<()> {
    if start > end {
        return Err(ValidationError::InvalidDateRange {
            check_in: start,
            check_out: end,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the number of guests against the room.
///
/// ## Rules
/// - At least one guest
/// - No more than `capacity`
pub fn validate_guest_count(guests: i64, capacity: i64) -> ValidationResult<()> {
    if guests <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "guest_count".to_string(),
        });
    }

    if guests > capacity {
        return Err(ValidationError::CapacityExceeded {
            requested: guests,
            capacity,
        });
    }

    Ok(())
}

/// Validates a room capacity.
pub fn validate_capacity(capacity: i64) -> ValidationResult<()> {
    if capacity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "capacity".to_string(),
        });
    }
    Ok(())
}

/// Validates a nightly base price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - At most `MAX_BASE_PRICE_CENTS`
///
/// ## Example
/// ```rust
/// use lodging_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(100_000).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX / 4).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_BASE_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "base_price".to_string(),
            min: 0,
            max: MAX_BASE_PRICE_CENTS,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a room number such as `101` or `PH-2`.
pub fn validate_room_number(room_number: &str) -> ValidationResult<()> {
    let room_number = room_number.trim();

    if room_number.is_empty() {
        return Err(ValidationError::Required {
            field: "room_number".to_string(),
        });
    }

    if room_number.len() > 20 {
        return Err(ValidationError::TooLong {
            field: "room_number".to_string(),
            max: 20,
        });
    }

    if !room_number
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "room_number".to_string(),
            reason: "must contain only letters, numbers and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a guest name.
pub fn validate_guest_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "guest_name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "guest_name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a guest email. Deliverability is the mailer's problem; this only
/// rejects values that cannot be an address.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "guest_email".to_string(),
        });
    }

    let well_formed = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "guest_email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(())
}

/// Validates optional free text attached to a booking.
pub fn validate_special_requests(text: Option<&str>) -> ValidationResult<()> {
    match text {
        Some(text) if text.len() > MAX_SPECIAL_REQUESTS_LEN => Err(ValidationError::TooLong {
            field: "special_requests".to_string(),
            max: MAX_SPECIAL_REQUESTS_LEN,
        }),
        _ => Ok(()),
    }
}

/// Validates a payment method tag (`CARD`, `UPI`, `GATEWAY`, ...).
pub fn validate_payment_method(method: &str) -> ValidationResult<()> {
    let method = method.trim();

    if method.is_empty() {
        return Err(ValidationError::Required {
            field: "payment_method".to_string(),
        });
    }

    if method.len() > 30 {
        return Err(ValidationError::TooLong {
            field: "payment_method".to_string(),
            max: 30,
        });
    }

    if !method
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "payment_method".to_string(),
            reason: "must contain only letters, digits and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use lodging_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
