//! Type-safe price representation using decimal arithmetic.
//!
//! Prices never touch floating point: amounts are `rust_decimal::Decimal`
//! in the currency's standard unit (colones, not céntimos).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., colones, not céntimos).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero price in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency_code,
        }
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Multiply by an integer quantity (line totals).
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self {
            amount: self.amount * Decimal::from(quantity),
            currency_code: self.currency_code,
        }
    }

    /// Add two prices. Currencies are expected to match; the left-hand
    /// currency wins (the backend serves a single-currency catalog).
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        Self {
            amount: self.amount + other.amount,
            currency_code: self.currency_code,
        }
    }

    /// Format for display (e.g., "₡1500.00").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// ISO 4217 currency codes served by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// Costa Rican colón.
    #[default]
    CRC,
    USD,
}

impl CurrencyCode {
    /// Currency symbol for display.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::CRC => "₡",
            Self::USD => "$",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CRC => "CRC",
            Self::USD => "USD",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn crc(amount: &str) -> Price {
        Price::new(amount.parse().unwrap(), CurrencyCode::CRC)
    }

    #[test]
    fn test_display_crc() {
        assert_eq!(crc("1500").display(), "₡1500.00");
        assert_eq!(crc("999.5").display(), "₡999.50");
    }

    #[test]
    fn test_display_usd() {
        let p = Price::new("19.99".parse().unwrap(), CurrencyCode::USD);
        assert_eq!(p.display(), "$19.99");
    }

    #[test]
    fn test_times_and_plus() {
        let line = crc("1000").times(3);
        assert_eq!(line, crc("3000"));
        assert_eq!(line.plus(&crc("500")), crc("3500"));
    }

    #[test]
    fn test_zero() {
        let z = Price::zero(CurrencyCode::CRC);
        assert!(z.is_zero());
        assert_eq!(z.display(), "₡0.00");
    }
}
