//! Hourly rate derivation.
//!
//! A host publishes a base hourly rate; the rate a driver actually sees is the
//! base rate scaled by surge factors that depend on where and when the spot is
//! booked:
//!
//! ```text
//! rate = base × zone × peak × overnight × event × demand × lead_time × vehicle
//! ```
//!
//! Factors combine multiplicatively and the product is rounded **once**, at
//! the end, to the configured [`Precision`].

use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, TimeDelta, Timelike, Weekday};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, Precision, clock::Clock};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    #[default]
    Standard,
    Suv,
    Truck,
}

impl VehicleType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Suv => "suv",
            Self::Truck => "truck",
        }
    }

    fn is_large(self) -> bool {
        matches!(self, Self::Suv | Self::Truck)
    }
}

impl FromStr for VehicleType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "car" => Ok(Self::Standard),
            "suv" => Ok(Self::Suv),
            "truck" => Ok(Self::Truck),
            other => Err(EngineError::InvalidVehicle(other.to_string())),
        }
    }
}

/// Pricing zone inferred from a listing address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Downtown,
    /// Stadium or arena district.
    Venue,
    #[default]
    Standard,
}

impl Zone {
    /// Case-insensitive substring match. The first matching rule wins:
    /// `downtown` is checked before `stadium`/`arena`.
    pub fn from_address(address: &str) -> Self {
        let address = address.to_lowercase();
        if address.contains("downtown") {
            Self::Downtown
        } else if address.contains("stadium") || address.contains("arena") {
            Self::Venue
        } else {
            Self::Standard
        }
    }
}

/// Half-open range of local hours, `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start: u32,
    pub end: u32,
}

impl HourWindow {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(self, hour: u32) -> bool {
        self.start <= hour && hour < self.end
    }
}

/// Surge factors applied by [`derive_hourly_rate`].
///
/// Defaults reproduce the marketplace's published schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateSchedule {
    /// Used when the context carries no (or a non-positive) base rate.
    pub default_base_rate: Decimal,
    pub downtown_multiplier: Decimal,
    pub venue_multiplier: Decimal,
    /// Applied on weekdays inside any of `peak_windows`.
    pub peak_multiplier: Decimal,
    pub peak_windows: Vec<HourWindow>,
    pub overnight_multiplier: Decimal,
    pub overnight_window: HourWindow,
    pub event_multiplier: Decimal,
    /// Demand surge is `min(demand_cap, demand_score × demand_weight)`.
    pub demand_weight: Decimal,
    pub demand_cap: Decimal,
    /// Applied when the booking starts less than `short_notice_minutes` after
    /// it was created.
    pub short_notice_multiplier: Decimal,
    pub short_notice_minutes: i64,
    /// Applied to SUVs and trucks.
    pub large_vehicle_multiplier: Decimal,
}

impl Default for RateSchedule {
    fn default() -> Self {
        Self {
            default_base_rate: dec!(10.00),
            downtown_multiplier: dec!(1.25),
            venue_multiplier: dec!(1.35),
            peak_multiplier: dec!(1.15),
            peak_windows: vec![HourWindow::new(7, 10), HourWindow::new(16, 19)],
            overnight_multiplier: dec!(0.9),
            overnight_window: HourWindow::new(0, 5),
            event_multiplier: dec!(1.3),
            demand_weight: dec!(0.25),
            demand_cap: dec!(0.25),
            short_notice_multiplier: dec!(1.1),
            short_notice_minutes: 120,
            large_vehicle_multiplier: dec!(1.1),
        }
    }
}

/// Everything the rate deriver looks at.
///
/// Timestamps are mandatory: the local hour and weekday are read in the
/// offset each timestamp carries. Use [`RateInputs`] to fill gaps from a
/// [`Clock`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateContext {
    pub base_rate: Option<Decimal>,
    pub address: String,
    pub is_event_day: bool,
    /// Typically in `[0, 1]`; negative scores count as zero.
    pub demand_score: Decimal,
    pub vehicle_type: Option<VehicleType>,
    pub start_time: DateTime<FixedOffset>,
    pub booking_created_at: DateTime<FixedOffset>,
}

impl RateContext {
    pub fn new(
        start_time: DateTime<FixedOffset>,
        booking_created_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            base_rate: None,
            address: String::new(),
            is_event_day: false,
            demand_score: Decimal::ZERO,
            vehicle_type: None,
            start_time,
            booking_created_at,
        }
    }

    pub fn with_base_rate(mut self, base_rate: Decimal) -> Self {
        self.base_rate = Some(base_rate);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_event_day(mut self, is_event_day: bool) -> Self {
        self.is_event_day = is_event_day;
        self
    }

    pub fn with_demand_score(mut self, demand_score: Decimal) -> Self {
        self.demand_score = demand_score;
        self
    }

    pub fn with_vehicle_type(mut self, vehicle_type: VehicleType) -> Self {
        self.vehicle_type = Some(vehicle_type);
        self
    }
}

/// A [`RateContext`] where every field may be missing.
///
/// Missing timestamps become "now" according to the clock passed to
/// [`RateInputs::resolve`]; present ones are moved into the market time zone
/// so peak and overnight windows are evaluated in local time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateInputs {
    pub base_rate: Option<Decimal>,
    pub address: Option<String>,
    pub is_event_day: Option<bool>,
    pub demand_score: Option<Decimal>,
    pub vehicle_type: Option<VehicleType>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub booking_created_at: Option<DateTime<FixedOffset>>,
}

impl RateInputs {
    pub fn resolve(self, clock: &impl Clock, timezone: Tz) -> RateContext {
        let now = clock.now().with_timezone(&timezone).fixed_offset();
        let local = |t: DateTime<FixedOffset>| t.with_timezone(&timezone).fixed_offset();

        RateContext {
            base_rate: self.base_rate,
            address: self.address.unwrap_or_default(),
            is_event_day: self.is_event_day.unwrap_or(false),
            demand_score: self.demand_score.unwrap_or(Decimal::ZERO),
            vehicle_type: self.vehicle_type,
            start_time: self.start_time.map_or(now, local),
            booking_created_at: self.booking_created_at.map_or(now, local),
        }
    }
}

/// Itemized factors behind a derived rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RateMultipliers {
    pub base_rate: Decimal,
    pub zone: Zone,
    pub zone_factor: Decimal,
    pub peak: Decimal,
    pub overnight: Decimal,
    pub event: Decimal,
    pub demand: Decimal,
    pub lead_time: Decimal,
    pub vehicle: Decimal,
}

impl RateMultipliers {
    pub fn from_context(context: &RateContext, schedule: &RateSchedule) -> Self {
        let base_rate = context
            .base_rate
            .filter(|rate| *rate > Decimal::ZERO)
            .unwrap_or(schedule.default_base_rate);

        let zone = Zone::from_address(&context.address);
        let zone_factor = match zone {
            Zone::Downtown => schedule.downtown_multiplier,
            Zone::Venue => schedule.venue_multiplier,
            Zone::Standard => Decimal::ONE,
        };

        let start = context.start_time;
        let hour = start.hour();
        let weekday = !matches!(start.weekday(), Weekday::Sat | Weekday::Sun);
        let in_peak = weekday && schedule.peak_windows.iter().any(|w| w.contains(hour));

        let surge = context
            .demand_score
            .max(Decimal::ZERO)
            .saturating_mul(schedule.demand_weight)
            .min(schedule.demand_cap);

        let notice =
            TimeDelta::try_minutes(schedule.short_notice_minutes).unwrap_or(TimeDelta::MAX);
        let short_notice = start - context.booking_created_at < notice;

        let large_vehicle = context.vehicle_type.is_some_and(VehicleType::is_large);

        Self {
            base_rate,
            zone,
            zone_factor,
            peak: factor(in_peak, schedule.peak_multiplier),
            overnight: factor(
                schedule.overnight_window.contains(hour),
                schedule.overnight_multiplier,
            ),
            event: factor(context.is_event_day, schedule.event_multiplier),
            demand: Decimal::ONE + surge,
            lead_time: factor(short_notice, schedule.short_notice_multiplier),
            vehicle: factor(large_vehicle, schedule.large_vehicle_multiplier),
        }
    }

    /// Product of all factors, excluding the base rate.
    pub fn combined(&self) -> Decimal {
        [
            self.zone_factor,
            self.peak,
            self.overnight,
            self.event,
            self.demand,
            self.lead_time,
            self.vehicle,
        ]
        .into_iter()
        .fold(Decimal::ONE, Decimal::saturating_mul)
    }

    /// Unrounded rate.
    pub fn raw_rate(&self) -> Decimal {
        self.base_rate.saturating_mul(self.combined())
    }
}

fn factor(applies: bool, multiplier: Decimal) -> Decimal {
    if applies { multiplier } else { Decimal::ONE }
}

/// Effective hourly rate for a booking context.
pub fn derive_hourly_rate(
    context: &RateContext,
    schedule: &RateSchedule,
    precision: Precision,
) -> Money {
    precision.round(RateMultipliers::from_context(context, schedule).raw_rate())
}
