//! # Database and Service Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          Gateway failure    Booking rule   │
//! │       │                                   │                 │          │
//! │       ▼                                   ▼                 ▼          │
//! │  DbError (this module)              GatewayError       CoreError       │
//! │       │                                   │                 │          │
//! │       └───────────────┬───────────────────┴─────────────────┘          │
//! │                       ▼                                                 │
//! │  BookingError ← what BookingService callers see                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kind() → Validation | NotFound | Conflict | ExternalService | Internal │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use lodging_core::{CoreError, ErrorKind, ValidationError};
use thiserror::Error;

use crate::gateway::GatewayError;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate booking reference or confirmation number
    /// - Second pending payment for a reservation
    /// - Room number already used in the hotel
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (e.g. check-in not before check-out).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::UniqueViolation { .. } => ErrorKind::Conflict,
            DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => {
                ErrorKind::Validation
            }
            _ => ErrorKind::Internal,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports constraints as text:
                // "UNIQUE constraint failed: payments.reservation_id"
                // "FOREIGN KEY constraint failed"
                // "CHECK constraint failed: check_in_date < check_out_date"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Booking Error
// =============================================================================

/// Everything a [`BookingService`](crate::service::BookingService) call can
/// fail with.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl BookingError {
    /// The caller-facing category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::Core(err) => err.kind(),
            BookingError::Db(err) => err.kind(),
        }
    }

    /// "bad request", "not found", "conflict" or "try again later".
    pub fn hint(&self) -> &'static str {
        self.kind().hint()
    }

    /// The wrapped booking rule violation, if that is what this is.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            BookingError::Core(err) => Some(err),
            BookingError::Db(_) => None,
        }
    }
}

impl From<ValidationError> for BookingError {
    fn from(err: ValidationError) -> Self {
        BookingError::Core(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for BookingError {
    fn from(err: sqlx::Error) -> Self {
        BookingError::Db(err.into())
    }
}

impl From<GatewayError> for BookingError {
    fn from(err: GatewayError) -> Self {
        BookingError::Core(CoreError::ExternalService(err.to_string()))
    }
}

/// Result type for service operations.
pub type BookingResult<T> = Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(DbError::not_found("Room", "r-1").kind(), ErrorKind::NotFound);
        assert_eq!(
            DbError::duplicate("payments.reservation_id", "r-1").kind(),
            ErrorKind::Conflict
        );
        assert_eq!(DbError::PoolExhausted.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_gateway_errors_are_external() {
        let err: BookingError = GatewayError::NotConfigured.into();
        assert_eq!(err.kind(), ErrorKind::ExternalService);
        assert_eq!(err.hint(), "try again later");
    }

    #[test]
    fn test_validation_is_bad_request() {
        let err: BookingError = ValidationError::MustBePositive {
            field: "guest_count".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.hint(), "bad request");
        assert!(err.as_core().is_some());
    }
}
