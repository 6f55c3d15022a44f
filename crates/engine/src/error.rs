//! The module contains the errors the engine can return.
//!
//! Pricing itself never fails: out-of-range numbers are clamped or replaced by
//! defaults. Errors only come from the parsing boundary (turning user text
//! into typed values) and from the listing store:
//!
//! - [`InvalidAmount`] returned when a money amount cannot be parsed.
//! - [`InvalidCurrency`] returned for an unknown currency code.
//! - [`InvalidMode`] returned for an unknown booking mode.
//! - [`InvalidVehicle`] returned for an unknown vehicle type.
//! - [`ListingNotFound`] returned when a listing id is not in the store.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidCurrency`]: EngineError::InvalidCurrency
//!  [`InvalidMode`]: EngineError::InvalidMode
//!  [`InvalidVehicle`]: EngineError::InvalidVehicle
//!  [`ListingNotFound`]: EngineError::ListingNotFound
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Unsupported currency: {0}")]
    InvalidCurrency(String),
    #[error("Invalid booking mode: {0}")]
    InvalidMode(String),
    #[error("Invalid vehicle type: {0}")]
    InvalidVehicle(String),
    #[error("\"{0}\" listing not found!")]
    ListingNotFound(String),
}
