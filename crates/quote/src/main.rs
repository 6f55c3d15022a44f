use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use engine::{
    BookingMode, BookingRequest, Engine, Money, Precision, RateInputs, RateMultipliers,
    SystemClock, VehicleType,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    settings::Settings,
};

mod error;
mod output;
mod settings;

#[derive(Parser, Debug)]
#[command(name = "parkspot_quote")]
#[command(about = "Price Parkspot bookings from the command line")]
struct Cli {
    /// Settings file path (TOML). Defaults to `config/parkspot.toml` if present.
    #[arg(long, env = "PARKSPOT_CONFIG")]
    config: Option<String>,

    /// Print results as JSON instead of text.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive the hourly rate for a booking context.
    Rate(RateArgs),
    /// Itemize a duration at a given hourly rate.
    Breakdown(BreakdownArgs),
    /// Price a park-now or reserve booking.
    Booking(BookingArgs),
    /// Derive the rate, then itemize the booking span.
    Quote(QuoteArgs),
}

/// Timestamps accept RFC 3339 (`2025-03-04T08:00:00-05:00`) or a local
/// `2025-03-04T08:00` in the configured time zone.
#[derive(Args, Debug)]
struct ContextArgs {
    #[arg(long)]
    base_rate: Option<String>,
    #[arg(long)]
    address: Option<String>,
    /// Booking start; defaults to now.
    #[arg(long)]
    start: Option<String>,
    /// When the booking was made; defaults to now.
    #[arg(long)]
    created: Option<String>,
    #[arg(long)]
    event_day: bool,
    #[arg(long)]
    demand: Option<String>,
    #[arg(long)]
    vehicle: Option<VehicleType>,
}

#[derive(Args, Debug)]
struct RateArgs {
    #[command(flatten)]
    context: ContextArgs,
}

#[derive(Args, Debug)]
struct BreakdownArgs {
    #[arg(long)]
    hours: Decimal,
    #[arg(long)]
    rate: Decimal,
}

#[derive(Args, Debug)]
struct BookingArgs {
    #[arg(long)]
    mode: BookingMode,
    #[arg(long)]
    start: String,
    #[arg(long)]
    end: String,
    #[arg(long)]
    host_rate: Option<String>,
}

#[derive(Args, Debug)]
struct QuoteArgs {
    #[command(flatten)]
    context: ContextArgs,
    #[arg(long)]
    end: String,
}

#[derive(Serialize)]
struct RateReport {
    hourly_rate: Money,
    multipliers: RateMultipliers,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "parkspot_quote={level},engine={level}",
            level = settings.log_level
        ))
        .with_writer(std::io::stderr)
        .init();

    let timezone = settings.timezone()?;
    let engine = settings.engine();
    tracing::info!(
        currency = %engine.currency(),
        minor_units = engine.precision().minor_units(),
        %timezone,
        "engine configured"
    );

    let rendered = run(&engine, timezone, cli.command, cli.json)?;
    println!("{rendered}");
    Ok(())
}

fn run(engine: &Engine, timezone: Tz, command: Command, json: bool) -> Result<String> {
    let currency = engine.currency();
    match command {
        Command::Rate(args) => {
            let context = rate_inputs(&args.context, engine.precision(), timezone)?
                .resolve(&SystemClock, timezone);
            let report = RateReport {
                hourly_rate: engine.derive_hourly_rate(&context),
                multipliers: engine.rate_multipliers(&context),
            };
            render(&report, json, |r| output::rate(&r.multipliers, r.hourly_rate, currency))
        }
        Command::Breakdown(args) => {
            let breakdown = engine.compute_pricing(args.hours, args.rate);
            render(&breakdown, json, |b| output::breakdown(b, currency))
        }
        Command::Booking(args) => {
            let request = BookingRequest {
                mode: args.mode,
                start: parse_timestamp(&args.start, timezone)?.with_timezone(&Utc),
                end: parse_timestamp(&args.end, timezone)?.with_timezone(&Utc),
                host_rate: args
                    .host_rate
                    .as_deref()
                    .and_then(|raw| lenient_amount("host rate", raw, engine.precision())),
            };
            let breakdown = engine.compute_booking(&request);
            render(&breakdown, json, |b| output::booking(b, currency))
        }
        Command::Quote(args) => {
            let context = rate_inputs(&args.context, engine.precision(), timezone)?
                .resolve(&SystemClock, timezone);
            let end = parse_timestamp(&args.end, timezone)?;
            let quote = engine.quote(&context, end);
            render(&quote, json, |q| output::quote(q, currency))
        }
    }
}

fn render<T: Serialize>(value: &T, json: bool, text: impl FnOnce(&T) -> String) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(text(value))
    }
}

fn rate_inputs(args: &ContextArgs, precision: Precision, timezone: Tz) -> Result<RateInputs> {
    let timestamp = |raw: &Option<String>| {
        raw.as_deref()
            .map(|raw| parse_timestamp(raw, timezone))
            .transpose()
    };

    Ok(RateInputs {
        base_rate: args
            .base_rate
            .as_deref()
            .and_then(|raw| lenient_amount("base rate", raw, precision)),
        address: args.address.clone(),
        is_event_day: Some(args.event_day),
        demand_score: args
            .demand
            .as_deref()
            .and_then(|raw| lenient_decimal("demand score", raw)),
        vehicle_type: args.vehicle,
        start_time: timestamp(&args.start)?,
        booking_created_at: timestamp(&args.created)?,
    })
}

/// Pricing never rejects a number: values that do not parse are dropped and
/// the engine falls back to its defaults.
fn lenient<E: std::fmt::Display>(
    label: &str,
    raw: &str,
    parse: impl FnOnce(&str) -> std::result::Result<Decimal, E>,
) -> Option<Decimal> {
    match parse(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!("ignoring {label} {raw:?}: {err}");
            None
        }
    }
}

/// Money amounts accept `$2,50`-style input at the engine's precision.
fn lenient_amount(label: &str, raw: &str, precision: Precision) -> Option<Decimal> {
    lenient(label, raw, |raw| precision.parse(raw).map(Decimal::from))
}

fn lenient_decimal(label: &str, raw: &str) -> Option<Decimal> {
    lenient(label, raw, |raw| raw.trim().parse::<Decimal>())
}

fn parse_timestamp(raw: &str, timezone: Tz) -> Result<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed);
    }

    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| timezone.from_local_datetime(&naive).earliest())
        .map(|local| local.fixed_offset())
        .ok_or_else(|| AppError::Timestamp(raw.to_string()))
}
