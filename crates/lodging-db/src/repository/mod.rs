//! # Repository Module
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  BookingService / callers                                              │
//! │       │                                                                 │
//! │       │  db.rooms().find_available(&stay, &filter)                     │
//! │       ▼                                                                 │
//! │  RoomRepository        ReservationRepository     PaymentRepository     │
//! │  UserRepository                                                        │
//! │       │                                                                 │
//! │       │  Two flavours of method:                                       │
//! │       │  • &self           → runs on the pool (reads, catalogue edits) │
//! │       │  • (conn, ...)     → runs inside the caller's transaction      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reverse lookups (a reservation's payments, a user's reservations) are
//! queries here, never back-pointers on the records.

pub mod payment;
pub mod reservation;
pub mod room;
pub mod user;

pub use payment::PaymentRepository;
pub use reservation::ReservationRepository;
pub use room::{RoomFilter, RoomRepository};
pub use user::UserRepository;
