//! # Pricing Engine
//!
//! Turns a room and a range of nights into a price. Pure: no state, no I/O.
//!
//! ## Algorithm
//! ```text
//! for each night in [check_in, check_out):
//!     rate = base price
//!     × 1.30  if the night starts on a Friday or Saturday
//!     × 1.50  if it falls in Dec 20–31 or Jan 1–5
//!     × 1.20  if it falls in June, July or August
//!     × 1.10  if the room is a Suite or Presidential
//! room_price = round_half_up(Σ rate)          ← the only rounding step
//! total_cost = room_price + round_half_up(12% × room_price) + 25.00
//! ```
//!
//! Multipliers compound on the same night. Intermediate rates are carried as
//! exact fixed-point values (i128, scaled by 10000⁴) so the result matches
//! decimal arithmetic to the cent.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Money, BPS_SCALE};
use crate::types::{Room, RoomCategory, StayDates, TaxRate};
use crate::validation::{validate_price_cents, ValidationResult};
use crate::{BOOKING_TAX_RATE_BPS, SERVICE_FEE_CENTS};

/// Highest number of multipliers that can stack on one night.
const MAX_STACKED: u32 = 4;

// =============================================================================
// Surcharges
// =============================================================================

/// A rule that raises the price of a single night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Surcharge {
    /// Friday and Saturday nights.
    Weekend,
    /// December 20 through January 5.
    WinterHoliday,
    /// June through August.
    SummerPeak,
    /// Suite and Presidential rooms.
    PremiumCategory,
}

impl Surcharge {
    /// Multiplier in basis points (13000 = ×1.30).
    pub const fn multiplier_bps(&self) -> u32 {
        match self {
            Surcharge::Weekend => 13_000,
            Surcharge::WinterHoliday => 15_000,
            Surcharge::SummerPeak => 12_000,
            Surcharge::PremiumCategory => 11_000,
        }
    }

    /// The surcharges that apply to `night` for a room of `category`,
    /// in application order.
    pub fn applicable(category: RoomCategory, night: NaiveDate) -> Vec<Surcharge> {
        let mut applied = Vec::with_capacity(MAX_STACKED as usize);

        if matches!(night.weekday(), Weekday::Fri | Weekday::Sat) {
            applied.push(Surcharge::Weekend);
        }

        let (month, day) = (night.month(), night.day());
        if (month == 12 && day >= 20) || (month == 1 && day <= 5) {
            applied.push(Surcharge::WinterHoliday);
        }

        if (6..=8).contains(&month) {
            applied.push(Surcharge::SummerPeak);
        }

        if category.is_premium() {
            applied.push(Surcharge::PremiumCategory);
        }

        applied
    }
}

// =============================================================================
// Quote
// =============================================================================

/// The price of one night.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NightlyRate {
    #[ts(as = "String")]
    pub night: NaiveDate,
    pub surcharges: Vec<Surcharge>,
    /// Rounded for display; the stay total is rounded from exact values.
    pub amount: Money,
}

/// A full price breakdown for a stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceQuote {
    pub stay: StayDates,
    pub nights: Vec<NightlyRate>,
    /// Sum of nightly rates.
    pub room_price: Money,
    pub tax: Money,
    pub service_fee: Money,
    /// What the guest pays: room price + tax + service fee.
    pub total_cost: Money,
}

// =============================================================================
// Pricing Engine
// =============================================================================

/// Stateless price calculator.
///
/// ## Example
/// ```rust,ignore
/// let quote = PricingEngine::quote(&room, &stay)?;
/// assert_eq!(quote.total_cost, PricingEngine::total_cost(&room, &stay)?);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine;

impl PricingEngine {
    /// Sum of nightly rates, rounded half-up to the cent.
    ///
    /// Empty or inverted ranges fall back to the unmodified base price.
    ///
    /// ## Errors
    /// `OutOfRange` if the base price exceeds `MAX_BASE_PRICE_CENTS` or the
    /// sum does not fit in `Money`.
    pub fn price(room: &Room, stay: &StayDates) -> ValidationResult<Money> {
        validate_price_cents(room.base_price_cents)?;
        if stay.nights() <= 0 {
            return Ok(room.base_price());
        }

        let exact = stay.each_night().try_fold(0i128, |acc, night| {
            acc.checked_add(Self::exact_nightly(room, &Surcharge::applicable(room.category, night)))
        });

        exact
            .and_then(|exact| Money::round_half_up(exact, Self::scale()))
            .ok_or_else(|| Self::too_large("room_price"))
    }

    /// Room price plus 12% tax and the fixed service fee.
    pub fn total_cost(room: &Room, stay: &StayDates) -> ValidationResult<Money> {
        let room_price = Self::price(room, stay)?;
        let (_, total) = Self::charges_on(room_price)?;
        Ok(total)
    }

    /// Full breakdown, consistent with [`price`](Self::price) and
    /// [`total_cost`](Self::total_cost).
    pub fn quote(room: &Room, stay: &StayDates) -> ValidationResult<PriceQuote> {
        let room_price = Self::price(room, stay)?;
        let (tax, total_cost) = Self::charges_on(room_price)?;
        let nights = stay
            .each_night()
            .map(|night| Self::nightly_rate(room, night))
            .collect::<ValidationResult<Vec<_>>>()?;

        Ok(PriceQuote {
            stay: *stay,
            nights,
            room_price,
            tax,
            service_fee: Money::from_cents(SERVICE_FEE_CENTS),
            total_cost,
        })
    }

    /// Price of a single night, rounded for display.
    pub fn nightly_rate(room: &Room, night: NaiveDate) -> ValidationResult<NightlyRate> {
        validate_price_cents(room.base_price_cents)?;
        let surcharges = Surcharge::applicable(room.category, night);
        let amount = Money::round_half_up(Self::exact_nightly(room, &surcharges), Self::scale())
            .ok_or_else(|| Self::too_large("nightly_rate"))?;
        Ok(NightlyRate {
            night,
            surcharges,
            amount,
        })
    }

    /// `(tax, total)` for a room price.
    fn charges_on(room_price: Money) -> ValidationResult<(Money, Money)> {
        let tax = room_price
            .calculate_tax(TaxRate::from_bps(BOOKING_TAX_RATE_BPS))
            .ok_or_else(|| Self::too_large("tax"))?;
        let total = room_price
            .checked_add(tax)
            .and_then(|sum| sum.checked_add(Money::from_cents(SERVICE_FEE_CENTS)))
            .ok_or_else(|| Self::too_large("total_cost"))?;
        Ok((tax, total))
    }

    /// Nightly rate in cents × 10000⁴, exact. The base price is capped, so
    /// this cannot overflow.
    fn exact_nightly(room: &Room, surcharges: &[Surcharge]) -> i128 {
        let stacked = surcharges
            .iter()
            .fold(room.base_price_cents as i128, |acc, s| {
                acc * s.multiplier_bps() as i128
            });
        let missing = MAX_STACKED - surcharges.len() as u32;
        stacked * BPS_SCALE.pow(missing)
    }

    fn scale() -> i128 {
        BPS_SCALE.pow(MAX_STACKED)
    }

    fn too_large(field: &str) -> ValidationError {
        ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
