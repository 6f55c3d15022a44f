//! Fee-itemized price breakdown.
//!
//! Expands an hourly rate and a duration into what the driver pays, what the
//! host receives and what the platform keeps, under a configurable
//! [`FeeSchedule`].
//!
//! Every line is rounded on its own before it feeds the next one. Deferring
//! rounding to the end changes totals by up to one minor unit, so the order
//! below is a contract:
//!
//! 1. `base = round(hours × rate)`
//! 2. `driver_service_fee = round(base × service% + service_fixed)`
//! 3. `tax = round((base + driver_service_fee) × tax%)`
//! 4. `driver_total = base + driver_service_fee + tax`
//! 5. `processing_fee = round(driver_total × processing% + processing_fixed)`
//! 6. `platform_fee = round(base × platform%)`
//! 7. host payout and platform net, depending on who absorbs processing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::{Money, Precision};

/// Percentages are fractions: `0.12` means 12%.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// Share of the base kept by the platform.
    pub platform_fee_percent: Decimal,
    /// Service fee charged to the driver on top of the base.
    pub driver_service_fee_percent: Decimal,
    pub driver_service_fee_fixed: Decimal,
    /// Card processing cost, computed on the driver total.
    pub processing_percent: Decimal,
    pub processing_fixed: Decimal,
    /// Applied to base plus service fee.
    pub sales_tax_percent: Decimal,
    /// When `true` the host absorbs processing; otherwise the platform does.
    pub processing_paid_by_host: bool,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            platform_fee_percent: dec!(0.12),
            driver_service_fee_percent: dec!(0.08),
            driver_service_fee_fixed: dec!(0.50),
            processing_percent: dec!(0.029),
            processing_fixed: dec!(0.30),
            sales_tax_percent: Decimal::ZERO,
            processing_paid_by_host: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingInputs {
    /// Billable hours; negative values count as zero.
    pub hours: Decimal,
    /// Hourly rate; negative values count as zero.
    pub rate_per_hour: Decimal,
    pub fees: FeeSchedule,
    pub precision: Precision,
}

impl PricingInputs {
    pub fn new(hours: Decimal, rate_per_hour: impl Into<Decimal>) -> Self {
        Self {
            hours,
            rate_per_hour: rate_per_hour.into(),
            fees: FeeSchedule::default(),
            precision: Precision::default(),
        }
    }

    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PricingBreakdown {
    pub base: Money,
    pub driver_service_fee: Money,
    pub tax: Money,
    /// What the driver is charged.
    pub driver_total: Money,
    pub processing_fee: Money,
    pub platform_fee: Money,
    pub host_payout: Money,
    pub platform_net: Money,
}

pub fn compute_pricing(inputs: &PricingInputs) -> PricingBreakdown {
    let fees = &inputs.fees;
    let round = |value: Decimal| inputs.precision.round(value);

    let hours = inputs.hours.max(Decimal::ZERO);
    let rate = inputs.rate_per_hour.max(Decimal::ZERO);

    let base = round(hours.saturating_mul(rate));
    let driver_service_fee = round(
        (base * fees.driver_service_fee_percent).saturating_add(fees.driver_service_fee_fixed),
    );
    let tax = round((base + driver_service_fee) * fees.sales_tax_percent);
    let driver_total = base + driver_service_fee + tax;
    let processing_fee =
        round((driver_total * fees.processing_percent).saturating_add(fees.processing_fixed));
    let platform_fee = round(base * fees.platform_fee_percent);

    let (host_payout, platform_net) = if fees.processing_paid_by_host {
        (
            base - platform_fee - processing_fee,
            driver_service_fee + platform_fee,
        )
    } else {
        (
            base - platform_fee,
            driver_service_fee + platform_fee - processing_fee,
        )
    };

    PricingBreakdown {
        base,
        driver_service_fee,
        tax,
        driver_total,
        processing_fee,
        platform_fee,
        host_payout,
        platform_net,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_hours_at_ten() -> PricingInputs {
        PricingInputs::new(dec!(2), dec!(10))
    }

    #[test]
    fn processing_passed_to_platform() {
        let breakdown = compute_pricing(&two_hours_at_ten());

        assert_eq!(breakdown.base.to_string(), "20.00");
        assert_eq!(breakdown.driver_service_fee.to_string(), "2.10");
        assert_eq!(breakdown.tax.to_string(), "0.00");
        assert_eq!(breakdown.driver_total.to_string(), "22.10");
        assert_eq!(breakdown.processing_fee.to_string(), "0.94");
        assert_eq!(breakdown.platform_fee.to_string(), "2.40");
        assert_eq!(breakdown.host_payout.to_string(), "17.60");
        assert_eq!(breakdown.platform_net.to_string(), "3.56");
    }

    #[test]
    fn processing_paid_by_host() {
        let fees = FeeSchedule {
            processing_paid_by_host: true,
            ..FeeSchedule::default()
        };
        let breakdown = compute_pricing(&two_hours_at_ten().with_fees(fees));

        assert_eq!(breakdown.host_payout.to_string(), "16.66");
        assert_eq!(breakdown.platform_net.to_string(), "4.50");
        assert_eq!(breakdown.driver_total.to_string(), "22.10");
    }

    #[test]
    fn tax_applies_to_base_and_service_fee() {
        let fees = FeeSchedule {
            sales_tax_percent: dec!(0.0875),
            ..FeeSchedule::default()
        };
        let breakdown = compute_pricing(&PricingInputs::new(dec!(1.5), dec!(7.25)).with_fees(fees));

        // base 10.875 -> 10.88; service 10.88*0.08+0.5 = 1.3704 -> 1.37
        assert_eq!(breakdown.base.to_string(), "10.88");
        assert_eq!(breakdown.driver_service_fee.to_string(), "1.37");
        // (10.88 + 1.37) * 0.0875 = 1.071875 -> 1.07
        assert_eq!(breakdown.tax.to_string(), "1.07");
        assert_eq!(breakdown.driver_total.to_string(), "13.32");
        // 13.32 * 0.029 + 0.30 = 0.68628 -> 0.69
        assert_eq!(breakdown.processing_fee.to_string(), "0.69");
        // 10.88 * 0.12 = 1.3056 -> 1.31
        assert_eq!(breakdown.platform_fee.to_string(), "1.31");
        assert_eq!(breakdown.host_payout.to_string(), "9.57");
        assert_eq!(breakdown.platform_net.to_string(), "1.99");
    }

    #[test]
    fn rounding_happens_per_step() {
        // 3 × 0.335 = 1.005 -> 1.01; deferring rounding would change the fee.
        let fees = FeeSchedule {
            driver_service_fee_percent: dec!(0.5),
            driver_service_fee_fixed: Decimal::ZERO,
            ..FeeSchedule::default()
        };
        let breakdown = compute_pricing(&PricingInputs::new(dec!(3), dec!(0.335)).with_fees(fees));
        assert_eq!(breakdown.base.to_string(), "1.01");
        // 1.01 × 0.5 = 0.505 -> 0.51 (unrounded base would give 0.5025 -> 0.50)
        assert_eq!(breakdown.driver_service_fee.to_string(), "0.51");
    }

    #[test]
    fn driver_total_is_sum_of_lines() {
        let fees = FeeSchedule {
            sales_tax_percent: dec!(0.06),
            ..FeeSchedule::default()
        };
        for (hours, rate) in [
            (dec!(0.25), dec!(3.33)),
            (dec!(7.5), dec!(12.99)),
            (dec!(1), dec!(0)),
        ] {
            let b = compute_pricing(&PricingInputs::new(hours, rate).with_fees(fees));
            assert_eq!(b.driver_total, b.base + b.driver_service_fee + b.tax);
            assert_eq!(b.host_payout, b.base - b.platform_fee);
            assert_eq!(
                b.platform_net,
                b.driver_service_fee + b.platform_fee - b.processing_fee
            );
        }
    }

    #[test]
    fn negative_inputs_are_clamped() {
        let breakdown = compute_pricing(&PricingInputs::new(dec!(-4), dec!(10)));
        assert_eq!(breakdown.base, Money::ZERO);
        assert_eq!(breakdown.driver_service_fee.to_string(), "0.50");

        let breakdown = compute_pricing(&PricingInputs::new(dec!(2), dec!(-10)));
        assert_eq!(breakdown.base, Money::ZERO);
    }

    #[test]
    fn outputs_have_no_sub_minor_residue() {
        let precision = Precision::CENTS;
        let breakdown = compute_pricing(
            &PricingInputs::new(dec!(1.3333333), dec!(9.87)).with_precision(precision),
        );
        for line in [
            breakdown.base,
            breakdown.driver_service_fee,
            breakdown.tax,
            breakdown.driver_total,
            breakdown.processing_fee,
            breakdown.platform_fee,
            breakdown.host_payout,
            breakdown.platform_net,
        ] {
            assert_eq!(line.amount().scale(), precision.minor_units());
            assert!((line.amount() * dec!(100)).fract().is_zero());
        }
    }

    #[test]
    fn zero_minor_units() {
        let breakdown = compute_pricing(
            &PricingInputs::new(dec!(2), dec!(1000)).with_precision(Precision::new(0)),
        );
        assert_eq!(breakdown.base.to_string(), "2000");
        // 2000 × 0.08 + 0.5 = 160.5 -> 161
        assert_eq!(breakdown.driver_service_fee.to_string(), "161");
    }
}
