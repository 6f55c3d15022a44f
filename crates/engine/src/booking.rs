//! Point-of-booking pricing for the two booking modes.
//!
//! "Park now" and "reserve" bookings use a simpler model than
//! [`compute_pricing`](crate::compute_pricing): the host rate is clamped into
//! a per-mode band, a flat booking fee is added, and low-rate park-now
//! bookings are lifted to a minimum charge. The host/platform split is a
//! fixed share of the subtotal and ignores the minimum charge.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, Precision};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingMode {
    ParkNow,
    Reserve,
}

impl BookingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParkNow => "park_now",
            Self::Reserve => "reserve",
        }
    }
}

impl fmt::Display for BookingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "parknow" | "now" => Ok(Self::ParkNow),
            "reserve" | "reservation" => Ok(Self::Reserve),
            _ => Err(EngineError::InvalidMode(s.trim().to_string())),
        }
    }
}

/// Allowed hourly rates for one booking mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBand {
    pub min: Decimal,
    pub max: Decimal,
    /// Used when the host rate is missing or not a finite number.
    pub default_rate: Decimal,
}

impl RateBand {
    fn clamp(self, rate: Decimal) -> Decimal {
        rate.max(self.min).min(self.max)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingPolicy {
    pub park_now: RateBand,
    pub reserve: RateBand,
    /// Rates at or below this count as low-rate spots.
    pub low_rate_threshold: Decimal,
    pub low_rate_booking_fee: Decimal,
    pub standard_booking_fee: Decimal,
    /// Floor for low-rate park-now totals.
    pub minimum_charge: Decimal,
    pub minimum_billable_hours: Decimal,
    pub platform_share: Decimal,
    pub host_share: Decimal,
}

impl BookingPolicy {
    pub fn band(&self, mode: BookingMode) -> RateBand {
        match mode {
            BookingMode::ParkNow => self.park_now,
            BookingMode::Reserve => self.reserve,
        }
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            park_now: RateBand {
                min: dec!(2.00),
                max: dec!(4.00),
                default_rate: dec!(3.00),
            },
            reserve: RateBand {
                min: dec!(1.50),
                max: dec!(3.00),
                default_rate: dec!(2.25),
            },
            low_rate_threshold: dec!(2.00),
            low_rate_booking_fee: dec!(0.79),
            standard_booking_fee: dec!(0.49),
            minimum_charge: dec!(3.99),
            minimum_billable_hours: dec!(0.25),
            platform_share: dec!(0.30),
            host_share: dec!(0.70),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub mode: BookingMode,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub host_rate: Option<Decimal>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BookingPriceBreakdown {
    pub hourly_rate: Money,
    pub hours: Decimal,
    pub subtotal: Money,
    pub booking_fee: Money,
    /// What the driver is charged.
    pub total: Money,
    pub platform_fee: Money,
    pub host_payout: Money,
    /// Callers should tell the driver when the minimum charge kicked in.
    pub minimum_charge_applied: bool,
}

/// Converts a host rate coming from a float-typed source.
///
/// NaN and infinities become `None` (the mode default applies). Finite values
/// outside the decimal range saturate, so they still clamp to the band edge.
pub fn host_rate_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    match value.to_string().parse::<Decimal>() {
        Ok(rate) => Some(rate),
        Err(_) if value.abs() < 1.0 => Some(Decimal::ZERO),
        Err(_) if value > 0.0 => Some(Decimal::MAX),
        Err(_) => Some(Decimal::MIN),
    }
}

/// Billable hours between `start` and `end`, never below the policy floor.
pub fn billable_hours(start: DateTime<Utc>, end: DateTime<Utc>, minimum: Decimal) -> Decimal {
    let millis = Decimal::from((end - start).num_milliseconds());
    (millis / Decimal::from(3_600_000)).max(minimum)
}

pub fn hourly_rate_for_mode(
    host_rate: Option<Decimal>,
    mode: BookingMode,
    policy: &BookingPolicy,
    precision: Precision,
) -> Money {
    let band = policy.band(mode);
    precision.round(band.clamp(host_rate.unwrap_or(band.default_rate)))
}

pub fn compute_booking_price_breakdown(
    request: &BookingRequest,
    policy: &BookingPolicy,
    precision: Precision,
) -> BookingPriceBreakdown {
    let round = |value: Decimal| precision.round(value);

    let hours = billable_hours(request.start, request.end, policy.minimum_billable_hours);
    let hourly_rate = hourly_rate_for_mode(request.host_rate, request.mode, policy, precision);
    let subtotal = round(hourly_rate * hours);

    let low_rate = hourly_rate.amount() <= policy.low_rate_threshold;
    let booking_fee = round(if low_rate {
        policy.low_rate_booking_fee
    } else {
        policy.standard_booking_fee
    });
    let raw_total = subtotal + booking_fee;

    let minimum_charge_applied = request.mode == BookingMode::ParkNow
        && low_rate
        && raw_total.amount() < policy.minimum_charge;
    let total = if minimum_charge_applied {
        round(policy.minimum_charge)
    } else {
        raw_total
    };

    BookingPriceBreakdown {
        hourly_rate,
        hours,
        subtotal,
        booking_fee,
        total,
        platform_fee: round(subtotal * policy.platform_share),
        host_payout: round(subtotal * policy.host_share),
        minimum_charge_applied,
    }
}
