//! # Engine
//!
//! Pricing and booking-cost engine for Parkspot.
//!
//! A quote flows through up to two steps:
//!
//! 1. [`derive_hourly_rate`] turns a host's base rate and the booking context
//!    (zone, time of day, event, demand, lead time, vehicle) into an hourly
//!    rate.
//! 2. Either [`compute_pricing`] (generic fee schedule with tax and
//!    processing) or [`compute_booking_price_breakdown`] (park-now/reserve
//!    bands with a minimum charge) itemizes the cost of a duration.
//!
//! Every function is pure and infallible: bad input is clamped or defaulted,
//! never rejected. All money lines are rounded to a [`Precision`] at each step,
//! so the same inputs always give the same cents.
//!
//! [`Engine`] bundles the schedules and precision so callers configure them
//! once.

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

pub use booking::{
    BookingMode, BookingPolicy, BookingPriceBreakdown, BookingRequest, RateBand, billable_hours,
    compute_booking_price_breakdown, host_rate_from_f64, hourly_rate_for_mode,
};
pub use breakdown::{FeeSchedule, PricingBreakdown, PricingInputs, compute_pricing};
pub use clock::{Clock, FixedClock, SystemClock};
pub use currency::Currency;
pub use error::EngineError;
pub use listings::{Listing, ListingObserver, ListingStore, SubscriptionId};
pub use money::{Money, Precision};
pub use rate::{
    HourWindow, RateContext, RateInputs, RateMultipliers, RateSchedule, VehicleType, Zone,
    derive_hourly_rate,
};

mod booking;
mod breakdown;
mod clock;
mod currency;
mod error;
mod listings;
mod money;
mod rate;

/// Rate derivation chained into a fee breakdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub multipliers: RateMultipliers,
    pub hourly_rate: Money,
    pub hours: Decimal,
    pub breakdown: PricingBreakdown,
}

/// Configured pricing engine.
///
/// Cheap to clone and safe to share between threads; it holds no state
/// besides its configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Engine {
    currency: Currency,
    precision: Precision,
    rates: RateSchedule,
    fees: FeeSchedule,
    booking: BookingPolicy,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn rate_schedule(&self) -> &RateSchedule {
        &self.rates
    }

    pub fn fee_schedule(&self) -> &FeeSchedule {
        &self.fees
    }

    pub fn booking_policy(&self) -> &BookingPolicy {
        &self.booking
    }

    pub fn rate_multipliers(&self, context: &RateContext) -> RateMultipliers {
        RateMultipliers::from_context(context, &self.rates)
    }

    pub fn derive_hourly_rate(&self, context: &RateContext) -> Money {
        let rate = derive_hourly_rate(context, &self.rates, self.precision);
        tracing::debug!(address = %context.address, %rate, "derived hourly rate");
        rate
    }

    /// Itemizes `hours` at `rate_per_hour` under the engine's fee schedule.
    pub fn compute_pricing(
        &self,
        hours: Decimal,
        rate_per_hour: impl Into<Decimal>,
    ) -> PricingBreakdown {
        let inputs = PricingInputs::new(hours, rate_per_hour)
            .with_fees(self.fees)
            .with_precision(self.precision);
        let breakdown = compute_pricing(&inputs);
        tracing::debug!(
            %hours,
            base = %breakdown.base,
            driver_total = %breakdown.driver_total,
            host_payout = %breakdown.host_payout,
            "computed pricing breakdown"
        );
        breakdown
    }

    pub fn hourly_rate_for_mode(&self, host_rate: Option<Decimal>, mode: BookingMode) -> Money {
        hourly_rate_for_mode(host_rate, mode, &self.booking, self.precision)
    }

    pub fn compute_booking(&self, request: &BookingRequest) -> BookingPriceBreakdown {
        let breakdown = compute_booking_price_breakdown(request, &self.booking, self.precision);
        tracing::debug!(
            mode = %request.mode,
            total = %breakdown.total,
            minimum_charge_applied = breakdown.minimum_charge_applied,
            "computed booking breakdown"
        );
        breakdown
    }

    /// Derives the hourly rate for `context` and itemizes the span from its
    /// start time to `end`, billing at least the booking policy's minimum
    /// hours.
    pub fn quote(&self, context: &RateContext, end: DateTime<FixedOffset>) -> Quote {
        let multipliers = self.rate_multipliers(context);
        let hourly_rate = self.precision.round(multipliers.raw_rate());
        let hours = billable_hours(
            context.start_time.with_timezone(&Utc),
            end.with_timezone(&Utc),
            self.booking.minimum_billable_hours,
        );
        let breakdown = self.compute_pricing(hours, hourly_rate);
        tracing::debug!(%hourly_rate, %hours, total = %breakdown.driver_total, "quoted booking");

        Quote {
            multipliers,
            hourly_rate,
            hours,
            breakdown,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::builder().build()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    currency: Currency,
    precision: Option<Precision>,
    rates: RateSchedule,
    fees: FeeSchedule,
    booking: BookingPolicy,
}

impl EngineBuilder {
    /// Currency of the quotes. Also sets the precision unless
    /// [`precision`](Self::precision) is given explicitly.
    pub fn currency(mut self, currency: Currency) -> EngineBuilder {
        self.currency = currency;
        self
    }

    /// Override the number of minor units money lines are rounded to.
    pub fn precision(mut self, precision: Precision) -> EngineBuilder {
        self.precision = Some(precision);
        self
    }

    pub fn rate_schedule(mut self, rates: RateSchedule) -> EngineBuilder {
        self.rates = rates;
        self
    }

    pub fn fee_schedule(mut self, fees: FeeSchedule) -> EngineBuilder {
        self.fees = fees;
        self
    }

    pub fn booking_policy(mut self, booking: BookingPolicy) -> EngineBuilder {
        self.booking = booking;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            currency: self.currency,
            precision: self.precision.unwrap_or(self.currency.precision()),
            rates: self.rates,
            fees: self.fees,
            booking: self.booking,
        }
    }
}
