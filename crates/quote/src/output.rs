//! Plain-text rendering of quotes.

use engine::{
    BookingPriceBreakdown, Currency, Money, PricingBreakdown, Quote, RateMultipliers, Zone,
};
use rust_decimal::Decimal;

fn line(label: &str, value: impl std::fmt::Display) -> String {
    format!("{label:<22}{value}")
}

fn factor(label: &str, value: Decimal) -> String {
    line(&format!("  {label}"), format!("×{}", value.normalize()))
}

pub fn rate(multipliers: &RateMultipliers, hourly_rate: Money, currency: Currency) -> String {
    let zone = match multipliers.zone {
        Zone::Downtown => "downtown",
        Zone::Venue => "stadium/arena",
        Zone::Standard => "standard",
    };
    [
        line("base rate", multipliers.base_rate.normalize()),
        factor(&format!("zone ({zone})"), multipliers.zone_factor),
        factor("peak", multipliers.peak),
        factor("overnight", multipliers.overnight),
        factor("event", multipliers.event),
        factor("demand", multipliers.demand),
        factor("lead time", multipliers.lead_time),
        factor("vehicle", multipliers.vehicle),
        line("hourly rate", hourly_rate.format(currency)),
    ]
    .join("\n")
}

pub fn breakdown(breakdown: &PricingBreakdown, currency: Currency) -> String {
    [
        line("base", breakdown.base.format(currency)),
        line("service fee", breakdown.driver_service_fee.format(currency)),
        line("tax", breakdown.tax.format(currency)),
        line("driver total", breakdown.driver_total.format(currency)),
        line("processing fee", breakdown.processing_fee.format(currency)),
        line("platform fee", breakdown.platform_fee.format(currency)),
        line("host payout", breakdown.host_payout.format(currency)),
        line("platform net", breakdown.platform_net.format(currency)),
    ]
    .join("\n")
}

pub fn booking(breakdown: &BookingPriceBreakdown, currency: Currency) -> String {
    let mut lines = vec![
        line("hourly rate", breakdown.hourly_rate.format(currency)),
        line("hours", breakdown.hours.round_dp(2).normalize()),
        line("subtotal", breakdown.subtotal.format(currency)),
        line("booking fee", breakdown.booking_fee.format(currency)),
        line("total", breakdown.total.format(currency)),
        line("platform fee", breakdown.platform_fee.format(currency)),
        line("host payout", breakdown.host_payout.format(currency)),
    ];
    if breakdown.minimum_charge_applied {
        lines.push(format!(
            "minimum charge of {} applied",
            breakdown.total.format(currency)
        ));
    }
    lines.join("\n")
}

pub fn quote(quote: &Quote, currency: Currency) -> String {
    [
        rate(&quote.multipliers, quote.hourly_rate, currency),
        line("hours", quote.hours.round_dp(2).normalize()),
        breakdown(&quote.breakdown, currency),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta, Utc};
    use engine::{BookingMode, BookingRequest, Engine};
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn booking_mentions_minimum_charge() {
        let start: DateTime<Utc> = "2025-06-02T09:00:00Z".parse().unwrap();
        let breakdown = Engine::default().compute_booking(&BookingRequest {
            mode: BookingMode::ParkNow,
            start,
            end: start + TimeDelta::minutes(20),
            host_rate: Some(dec!(2)),
        });

        let text = booking(&breakdown, Currency::Usd);
        assert!(text.contains("hours                 0.33"));
        assert!(text.contains("total                 $3.99"));
        assert!(text.ends_with("minimum charge of $3.99 applied"));
    }

    #[test]
    fn breakdown_lists_every_line() {
        let priced = Engine::default().compute_pricing(dec!(2), dec!(10));
        let text = breakdown(&priced, Currency::Eur);
        assert_eq!(text.lines().count(), 8);
        assert!(text.contains("platform net          3.56€"));
    }
}
