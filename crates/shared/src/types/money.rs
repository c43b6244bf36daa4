//! Currency and minor-unit conversion.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Balances and transfer amounts are carried as `i64` minor units (cents)
//! everywhere behind the HTTP boundary. `Decimal` appears only when parsing
//! requests and rendering responses.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fractional digits carried by the supported currency.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Currencies supported by the system.
///
/// The ledger is single-currency: accounts may only be opened in USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar
    Usd,
}

impl Currency {
    /// The only currency accounts can be opened in.
    pub const SUPPORTED: Self = Self::Usd;

    /// Returns the ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

/// Errors converting a decimal amount into minor units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The amount has more fractional digits than the currency carries.
    #[error("amount {0} has more than 2 decimal places")]
    TooPrecise(Decimal),

    /// The amount does not fit into a 64-bit count of minor units.
    #[error("amount {0} is out of range")]
    OutOfRange(Decimal),
}

/// Converts a decimal amount (e.g. `25.10`) into minor units (`2510`).
///
/// # Errors
///
/// Returns an error if the amount has sub-cent precision or overflows `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64, MoneyError> {
    let scaled = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or(MoneyError::OutOfRange(amount))?;

    if !scaled.fract().is_zero() {
        return Err(MoneyError::TooPrecise(amount));
    }

    scaled.to_i64().ok_or(MoneyError::OutOfRange(amount))
}

/// Converts minor units (`2510`) back into a decimal amount (`25.10`).
#[must_use]
pub fn from_minor_units(units: i64) -> Decimal {
    Decimal::new(units, MINOR_UNIT_SCALE)
}
