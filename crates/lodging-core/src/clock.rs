//! # Clock and Id Capabilities
//!
//! The booking rules need "now", "today" and fresh identifiers. Both are
//! injected so every rule is a deterministic function of its inputs:
//!
//! ```text
//! Production: SystemClock + RandomIds
//! Tests:      FixedClock  + SequentialIds
//! ```
//!
//! "Today" is the UTC calendar date of `now()`.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use uuid::Uuid;

// =============================================================================
// Clock
// =============================================================================

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicI64,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        FixedClock {
            millis: AtomicI64::new(at.timestamp_millis()),
        }
    }

    /// A clock at midnight UTC of the given date.
    pub fn at_start_of(date: NaiveDate) -> Self {
        FixedClock::new(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

// =============================================================================
// Identifiers
// =============================================================================

/// Source of record ids and human-readable reference codes.
///
/// ## Formats
/// ```text
/// booking reference    BK + 10 uppercase hex   BK3F9A0C1D2E
/// confirmation number  HR + 10 uppercase hex   HR7C21B0AA95
/// transaction ref      TXN + 12 uppercase hex  TXN0B1C2D3E4F5A
/// ```
pub trait IdGenerator: Send + Sync {
    /// Primary key for a new record.
    fn new_id(&self) -> String;

    fn booking_reference(&self) -> String;

    fn confirmation_number(&self) -> String;

    fn transaction_ref(&self) -> String;
}

/// UUID v4 backed generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl RandomIds {
    fn hex(len: usize) -> String {
        Uuid::new_v4().simple().to_string()[..len].to_ascii_uppercase()
    }
}

impl IdGenerator for RandomIds {
    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn booking_reference(&self) -> String {
        format!("BK{}", Self::hex(10))
    }

    fn confirmation_number(&self) -> String {
        format!("HR{}", Self::hex(10))
    }

    fn transaction_ref(&self) -> String {
        format!("TXN{}", Self::hex(12))
    }
}

/// Predictable generator for tests: every call takes the next number.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        SequentialIds::default()
    }

    fn bump(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl IdGenerator for SequentialIds {
    fn new_id(&self) -> String {
        format!("id-{:06}", self.bump())
    }

    fn booking_reference(&self) -> String {
        format!("BK{:010X}", self.bump())
    }

    fn confirmation_number(&self) -> String {
        format!("HR{:010X}", self.bump())
    }

    fn transaction_ref(&self) -> String {
        format!("TXN{:012X}", self.bump())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
