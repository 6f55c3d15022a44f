use serde::{Deserialize, Serialize};

use crate::{EngineError, money::Precision};

/// ISO currency code a quote is expressed in.
///
/// Parkspot prices are decimals of **major units** (dollars, euros). The
/// currency only decides how many fraction digits survive rounding and how an
/// amount is rendered for display.
///
/// ## Minor units
///
/// `minor_units()` returns how many decimal digits an amount keeps after each
/// rounding step. USD has 2 minor units, so `14.375` rounds to `14.38`; JPY has
/// none, so `1437.5` rounds to `1438`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Jpy,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Jpy => "JPY",
        }
    }

    /// Number of fraction digits used when rounding and formatting amounts.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Currency::Usd | Currency::Eur => 2,
            Currency::Jpy => 0,
        }
    }

    /// Rounding precision matching this currency.
    #[must_use]
    pub const fn precision(self) -> Precision {
        Precision::new(self.minor_units())
    }

    pub(crate) const fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Jpy => "¥",
        }
    }

    /// `true` when the symbol is written after the amount (`12.34€`).
    pub(crate) const fn symbol_after(self) -> bool {
        matches!(self, Currency::Eur)
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "JPY" => Ok(Currency::Jpy),
            other => Err(EngineError::InvalidCurrency(other.to_string())),
        }
    }
}
