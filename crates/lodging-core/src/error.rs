//! # Error Types
//!
//! Domain-specific error types for lodging-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lodging-core errors (this file)                                       │
//! │  ├── CoreError        - Booking rule violations                        │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - The category every error reports to callers    │
//! │                                                                         │
//! │  lodging-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── BookingError     - What service callers see                       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → BookingError → caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, statuses)
//! 3. "Not found", "invalid state" and "unauthorized" are distinct variants
//! 4. Each error maps to exactly one [`ErrorKind`]

use serde::Serialize;
use thiserror::Error;

use crate::types::{PaymentStatus, ReservationStatus};

// =============================================================================
// Error Kind
// =============================================================================

/// The caller-facing category of a failure.
///
/// ```text
/// Validation      → bad request, the client can fix the input
/// NotFound        → the referenced record does not exist (or is inactive)
/// Conflict        → not allowed in the current state, try a different action
/// ExternalService → gateway unreachable or misconfigured, try again later
/// Internal        → storage failure, try again later
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    ExternalService,
    Internal,
}

impl ErrorKind {
    /// Short user-visible hint for the category.
    pub const fn hint(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "bad request",
            ErrorKind::NotFound => "not found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::ExternalService | ErrorKind::Internal => "try again later",
        }
    }

    /// Whether the client can succeed by changing its request.
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Conflict
        )
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Booking rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced room/reservation/payment/user does not exist or is inactive.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A non-cancelled reservation overlaps the requested nights.
    ///
    /// ## User Workflow
    /// ```text
    /// Book room 101, Mar 6 → Mar 8
    ///      │
    ///      ▼
    /// Existing confirmed stay Mar 8 → Mar 10 (shares the boundary date)
    ///      │
    ///      ▼
    /// RoomUnavailable { room_id: "101…", check_in: 2026-03-06, … }
    /// ```
    #[error("Room {room_id} is not available from {check_in} to {check_out}")]
    RoomUnavailable {
        room_id: String,
        check_in: chrono::NaiveDate,
        check_out: chrono::NaiveDate,
    },

    /// The reservation's current status does not permit the operation.
    #[error("Reservation {reservation_id} is {current_status}, cannot {operation}")]
    InvalidReservationStatus {
        reservation_id: String,
        current_status: ReservationStatus,
        operation: &'static str,
    },

    /// Check-in requested before the booked check-in date.
    #[error("Reservation {reservation_id} cannot check in before {check_in}")]
    CheckInNotYetAllowed {
        reservation_id: String,
        check_in: chrono::NaiveDate,
    },

    /// The acting user does not own the reservation.
    #[error("User {user_id} is not authorized to modify reservation {reservation_id}")]
    Unauthorized {
        reservation_id: String,
        user_id: String,
    },

    /// A second Pending payment was requested while one exists.
    #[error("Reservation {reservation_id} already has a pending payment")]
    DuplicatePendingPayment { reservation_id: String },

    /// Payment processing needs exactly one Pending payment.
    #[error("Reservation {reservation_id} has no pending payment")]
    NoPendingPayment { reservation_id: String },

    /// Payment confirmations are only accepted for an order opened earlier.
    #[error("Reservation {reservation_id} has no gateway order to confirm")]
    NoGatewayOrder { reservation_id: String },

    /// The pending payment is already bound to a gateway order.
    #[error("Payment {payment_id} already has gateway order {order_id}")]
    GatewayOrderExists { payment_id: String, order_id: String },

    /// The payment is not in a status that allows the operation.
    #[error("Payment {payment_id} is {current_status}, cannot {operation}")]
    InvalidPaymentStatus {
        payment_id: String,
        current_status: PaymentStatus,
        operation: &'static str,
    },

    /// Refunds only apply to a completed charge that has not been refunded.
    #[error("Reservation {reservation_id} has no completed charge to refund")]
    NothingToRefund { reservation_id: String },

    /// The gateway refused the charge. The booking has been cancelled.
    #[error("Payment {payment_id} for reservation {reservation_id} was declined")]
    PaymentDeclined {
        reservation_id: String,
        payment_id: String,
    },

    /// Gateway unreachable, misconfigured, or returned garbage.
    #[error("Payment gateway error: {0}")]
    ExternalService(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// The caller-facing category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::RoomUnavailable { .. }
            | CoreError::InvalidReservationStatus { .. }
            | CoreError::CheckInNotYetAllowed { .. }
            | CoreError::Unauthorized { .. }
            | CoreError::DuplicatePendingPayment { .. }
            | CoreError::NoPendingPayment { .. }
            | CoreError::NoGatewayOrder { .. }
            | CoreError::GatewayOrderExists { .. }
            | CoreError::InvalidPaymentStatus { .. }
            | CoreError::NothingToRefund { .. }
            | CoreError::PaymentDeclined { .. } => ErrorKind::Conflict,
            CoreError::ExternalService(_) => ErrorKind::ExternalService,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements and are
/// raised before anything is persisted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Check-out must fall after check-in.
    #[error("check-out {check_out} must be after check-in {check_in}")]
    InvalidDateRange {
        check_in: chrono::NaiveDate,
        check_out: chrono::NaiveDate,
    },

    /// Check-in may not be in the past.
    #[error("check-in {check_in} is before today ({today})")]
    CheckInInPast {
        check_in: chrono::NaiveDate,
        today: chrono::NaiveDate,
    },

    /// More guests than the room sleeps.
    #[error("guest count {requested} exceeds room capacity {capacity}")]
    CapacityExceeded { requested: i64, capacity: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidReservationStatus {
            reservation_id: "r-1".to_string(),
            current_status: ReservationStatus::Cancelled,
            operation: "cancel",
        };
        assert_eq!(err.to_string(), "Reservation r-1 is cancelled, cannot cancel");

        let err = ValidationError::CapacityExceeded {
            requested: 3,
            capacity: 2,
        };
        assert_eq!(err.to_string(), "guest count 3 exceeds room capacity 2");
    }

    #[test]
    fn test_kinds_are_distinguishable() {
        assert_eq!(
            CoreError::not_found("Reservation", "r-1").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::Unauthorized {
                reservation_id: "r-1".to_string(),
                user_id: "u-2".to_string(),
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            CoreError::ExternalService("timeout".to_string()).kind(),
            ErrorKind::ExternalService
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "guest_name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
        assert_eq!(core_err.kind().hint(), "bad request");
    }
}
