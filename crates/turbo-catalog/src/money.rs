//! Money type for representing monetary values.
//!
//! Amounts are integers in the smallest currency unit so price comparisons
//! and range bounds never go through floating point.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    MXN,
    COP,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::MXN => "MXN",
            Currency::COP => "COP",
        }
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "MXN" => Some(Currency::MXN),
            "COP" => Some(Currency::COP),
            _ => None,
        }
    }
}

/// A monetary value with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in smallest currency unit (e.g., cents).
    pub amount_cents: i64,
    /// The currency.
    #[serde(default)]
    pub currency: Currency,
}

impl Money {
    pub fn new(amount_cents: i64, currency: Currency) -> Self {
        Self {
            amount_cents,
            currency,
        }
    }

    /// Shorthand for an amount in the default currency.
    pub fn cents(amount_cents: i64) -> Self {
        Self::new(amount_cents, Currency::default())
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    pub fn is_negative(&self) -> bool {
        self.amount_cents < 0
    }

    /// Compare amounts, returning `None` when the currencies differ.
    pub fn try_cmp(&self, other: &Money) -> Option<Ordering> {
        if self.currency != other.currency {
            return None;
        }
        Some(self.amount_cents.cmp(&other.amount_cents))
    }

    /// True when `self` is strictly cheaper than `other` in the same currency.
    pub fn is_below(&self, other: &Money) -> bool {
        matches!(self.try_cmp(other), Some(Ordering::Less))
    }
}
