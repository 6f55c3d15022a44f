use std::{
    fmt,
    ops::{Add, Mul, Sub},
};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError};

/// Number of decimal places a money amount keeps (`currencyMinorUnit`).
///
/// Rounding is *round half up* on the scaled value:
/// `round(x) = floor(x × 10^n + 0.5) / 10^n`, computed in exact decimal
/// arithmetic so `14.375` always becomes `14.38` and never `14.37`.
///
/// ```rust
/// use engine::Precision;
/// use rust_decimal_macros::dec;
///
/// let cents = Precision::default();
/// assert_eq!(cents.round(dec!(14.375)).to_string(), "14.38");
/// assert_eq!(cents.round(dec!(0.9409)).to_string(), "0.94");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Precision(u32);

impl Precision {
    /// Largest supported number of minor digits; larger values are clamped.
    pub const MAX_MINOR_UNITS: u32 = 8;

    /// Two decimal places (cents).
    pub const CENTS: Precision = Precision(2);

    #[must_use]
    pub const fn new(minor_units: u32) -> Self {
        if minor_units > Self::MAX_MINOR_UNITS {
            Self(Self::MAX_MINOR_UNITS)
        } else {
            Self(minor_units)
        }
    }

    #[must_use]
    pub const fn minor_units(self) -> u32 {
        self.0
    }

    /// `10^n` as a decimal.
    fn factor(self) -> Decimal {
        Decimal::from(10u64.pow(self.0))
    }

    /// Rounds a raw decimal to this precision, producing a [`Money`].
    ///
    /// Saturates at the decimal range instead of overflowing.
    #[must_use]
    pub fn round(self, value: Decimal) -> Money {
        let factor = self.factor();
        let scaled = value.saturating_mul(factor).saturating_add(dec!(0.5)).floor();
        let mut rounded = scaled / factor;
        rounded.rescale(self.0);
        Money(rounded)
    }

    /// Parses a decimal string in major units.
    ///
    /// Accepts `.` or `,` as decimal separator, an optional leading `+`/`-`
    /// and an optional currency symbol. Rejects more fraction digits than this
    /// precision allows (`12.345` with cents).
    pub fn parse(self, raw: &str) -> Result<Money, EngineError> {
        let trimmed = raw.trim().trim_start_matches(['$', '€', '¥']).trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidAmount("empty amount".to_string()));
        }

        let normalized = trimmed.replace(',', ".");
        let digits = normalized.trim_start_matches(['+', '-']);
        if digits.is_empty()
            || digits.matches('.').count() > 1
            || !digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        {
            return Err(EngineError::InvalidAmount(format!("invalid amount: {raw}")));
        }

        if let Some((_, frac)) = digits.split_once('.')
            && frac.len() > self.0 as usize
        {
            return Err(EngineError::InvalidAmount(format!(
                "too many decimals: {raw}"
            )));
        }

        let value: Decimal = normalized
            .trim_start_matches('+')
            .parse()
            .map_err(|_| EngineError::InvalidAmount(format!("amount too large: {raw}")))?;
        Ok(self.round(value))
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::CENTS
    }
}

impl From<u32> for Precision {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Precision> for u32 {
    fn from(value: Precision) -> Self {
        value.0
    }
}

/// A money amount in **major units**, always a whole number of minor units.
///
/// A `Money` can only be produced by [`Precision::round`] (or by adding and
/// subtracting other `Money` values, which keeps the invariant). Multiplying
/// by a rate or a percentage yields a raw [`Decimal`] that has to go through
/// `round` again before it can be stored in a breakdown.
///
/// Serialized as a decimal string (`"14.38"`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Returns the underlying decimal value.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Formats the amount for display with the currency symbol.
    ///
    /// ```rust
    /// use engine::{Currency, Precision};
    /// use rust_decimal_macros::dec;
    ///
    /// let price = Precision::CENTS.round(dec!(3.99));
    /// assert_eq!(price.format(Currency::Usd), "$3.99");
    /// assert_eq!(price.format(Currency::Eur), "3.99€");
    /// ```
    #[must_use]
    pub fn format(self, currency: Currency) -> String {
        let mut value = self.0;
        value.rescale(currency.minor_units());
        let sign = if value.is_sign_negative() && !value.is_zero() {
            "-"
        } else {
            ""
        };
        let abs = value.abs();
        if currency.symbol_after() {
            format!("{sign}{abs}{}", currency.symbol())
        } else {
            format!("{sign}{}{abs}", currency.symbol())
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Mul<Decimal> for Money {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Self::Output {
        self.0.saturating_mul(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_is_half_up() {
        let cents = Precision::CENTS;
        assert_eq!(cents.round(dec!(14.375)).amount(), dec!(14.38));
        assert_eq!(cents.round(dec!(14.374999)).amount(), dec!(14.37));
        assert_eq!(cents.round(dec!(1.005)).amount(), dec!(1.01));
        assert_eq!(cents.round(dec!(2)).to_string(), "2.00");
    }

    #[test]
    fn negative_midpoints_round_toward_positive_infinity() {
        let cents = Precision::CENTS;
        assert_eq!(cents.round(dec!(-0.125)).amount(), dec!(-0.12));
        assert_eq!(cents.round(dec!(-0.126)).amount(), dec!(-0.13));
    }

    #[test]
    fn zero_minor_units_rounds_to_integers() {
        let whole = Precision::new(0);
        assert_eq!(whole.round(dec!(1437.5)).to_string(), "1438");
        assert_eq!(whole.round(dec!(0.49)).to_string(), "0");
    }

    #[test]
    fn precision_is_clamped() {
        assert_eq!(Precision::new(30).minor_units(), Precision::MAX_MINOR_UNITS);
    }

    #[test]
    fn arithmetic_keeps_precision() {
        let cents = Precision::CENTS;
        let a = cents.round(dec!(20));
        let b = cents.round(dec!(2.10));
        assert_eq!((a + b).to_string(), "22.10");
        assert_eq!((a - b).to_string(), "17.90");
        assert_eq!(a * dec!(0.029), dec!(0.580));
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        let huge = Precision::CENTS.round(Decimal::MAX);
        assert!(huge.amount() > Decimal::ZERO);
        let _ = huge + huge;
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        let cents = Precision::CENTS;
        assert_eq!(cents.parse("10").unwrap().to_string(), "10.00");
        assert_eq!(cents.parse("10,5").unwrap().to_string(), "10.50");
        assert_eq!(cents.parse("$2.25").unwrap().to_string(), "2.25");
        assert_eq!(cents.parse("-0.01").unwrap().to_string(), "-0.01");
        assert_eq!(cents.parse(" +1.00 ").unwrap().to_string(), "1.00");
    }

    #[test]
    fn parse_rejects_bad_input() {
        let cents = Precision::CENTS;
        assert!(cents.parse("").is_err());
        assert!(cents.parse("abc").is_err());
        assert!(cents.parse("1.2.3").is_err());
        assert!(cents.parse("12.345").is_err());
    }

    #[test]
    fn format_places_symbol() {
        let cents = Precision::CENTS;
        assert_eq!(cents.round(dec!(14.38)).format(Currency::Usd), "$14.38");
        assert_eq!(cents.round(dec!(-1.5)).format(Currency::Usd), "-$1.50");
        assert_eq!(cents.round(dec!(10.5)).format(Currency::Eur), "10.50€");
        assert_eq!(Precision::new(0).round(dec!(1200)).format(Currency::Jpy), "¥1200");
    }
}
