//! # lodging-db: Persistence and Orchestration
//!
//! SQLite storage for the booking platform, the payment-gateway contract,
//! configuration, and the [`BookingService`] that runs every lifecycle
//! operation as one transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lodging Data Flow                                │
//! │                                                                         │
//! │  API handler (book room)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    lodging-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐   │   │
//! │  │   │BookingService │──►│  Repositories  │──►│   Database    │   │   │
//! │  │   │ (service.rs)  │   │ room, user,    │   │   (pool.rs)   │   │   │
//! │  │   │               │   │ reservation,   │   │  SqlitePool   │   │   │
//! │  │   │               │   │ payment        │   │  migrations   │   │   │
//! │  │   └───────┬───────┘   └────────────────┘   └───────────────┘   │   │
//! │  │           │                                                     │   │
//! │  │           ├──► lodging-core (rules, pricing, ledger)           │   │
//! │  │           └──► PaymentGateway (gateway.rs)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (LODGING_DATABASE_PATH)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and service error types
//! - [`repository`] - Repositories for rooms, users, reservations, payments
//! - [`gateway`] - Payment gateway contract
//! - [`config`] - Environment configuration
//! - [`service`] - Booking operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lodging_db::{BookingService, Database, LodgingConfig};
//!
//! let config = LodgingConfig::load()?;
//! let db = Database::new(config.db_config()).await?;
//! let service = BookingService::new(db, config);
//!
//! let rooms = service.find_available_rooms(&stay, &RoomFilter::new().min_capacity(2)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod gateway;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, GatewayCredentials, LodgingConfig};
pub use error::{BookingError, BookingResult, DbError, DbResult};
pub use gateway::{GatewayError, GatewayOrder, PaymentConfirmation, PaymentGateway, UnconfiguredGateway};
pub use pool::{Database, DbConfig};
pub use service::{BookingService, Cancellation, NewRoom, PaymentReceipt};

// Repository re-exports for convenience
pub use repository::{
    PaymentRepository, ReservationRepository, RoomFilter, RoomRepository, UserRepository,
};
