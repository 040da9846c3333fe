//! Prices in integer minor currency units.
//!
//! The backend stores every price as a whole number of cents. Conversion to a
//! decimal amount happens only for display.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price expressed in minor currency units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    /// Create a price from a number of cents.
    #[must_use]
    pub const fn from_minor_units(cents: u64) -> Self {
        Self(cents)
    }

    /// Number of cents.
    #[must_use]
    pub const fn minor_units(&self) -> u64 {
        self.0
    }

    /// Amount in major units (dollars) as an exact decimal.
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.0), 2)
    }

    /// Format for display, e.g. `$19.99`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.as_decimal())
    }
}

impl From<u64> for Price {
    fn from(cents: u64) -> Self {
        Self(cents)
    }
}
