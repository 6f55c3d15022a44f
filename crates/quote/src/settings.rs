//! Handles settings for the quote tool.
//!
//! Settings are layered: defaults, then an optional TOML file
//! (`config/parkspot.toml` unless `--config` is given), then `PARKSPOT_*`
//! environment variables with `__` between nested keys, e.g.
//! `PARKSPOT_FEES__SALES_TAX_PERCENT=0.0875`.
use chrono_tz::Tz;
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use engine::{BookingPolicy, Currency, Engine, FeeSchedule, Precision, RateSchedule};
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/parkspot";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_level: String,
    pub currency: Currency,
    /// Overrides the currency's minor units.
    pub precision: Option<u32>,
    /// IANA name of the market time zone.
    pub timezone: String,
    pub rates: RateSchedule,
    pub fees: FeeSchedule,
    pub booking: BookingPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            currency: Currency::default(),
            precision: None,
            timezone: "America/New_York".to_string(),
            rates: RateSchedule::default(),
            fees: FeeSchedule::default(),
            booking: BookingPolicy::default(),
        }
    }
}

impl Settings {
    /// Loads settings; an explicit `path` must exist, the default one may not.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file = File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(path.is_some());
        Self::build(Config::builder().add_source(file).add_source(environment()))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|err| AppError::Timezone(format!("{}: {err}", self.timezone)))
    }

    pub fn engine(&self) -> Engine {
        let builder = Engine::builder()
            .currency(self.currency)
            .rate_schedule(self.rates.clone())
            .fee_schedule(self.fees)
            .booking_policy(self.booking);
        match self.precision {
            Some(minor_units) => builder.precision(Precision::new(minor_units)).build(),
            None => builder.build(),
        }
    }
}

/// `PARKSPOT_<KEY>` for top-level keys, `__` between nested ones.
fn environment() -> Environment {
    Environment::with_prefix("PARKSPOT")
        .prefix_separator("_")
        .separator("__")
}
