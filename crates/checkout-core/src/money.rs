//! Money type for representing monetary values.
//!
//! Amounts are integers in the smallest unit of the currency. Pricing never
//! goes through floating point; percentages use `rust_decimal`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    VND,
    USD,
    EUR,
}

impl Currency {
    /// Get the currency code (e.g., "VND").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::VND => "VND",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
        }
    }

    /// Get the currency symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::VND => "\u{20ab}",
            Currency::USD => "$",
            Currency::EUR => "\u{20ac}",
        }
    }

    /// Get the number of decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::VND => 0,
            _ => 2,
        }
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "VND" => Some(Currency::VND),
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A monetary value with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in the smallest currency unit.
    pub amount: i64,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value.
    pub fn new(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Shorthand for a VND amount.
    pub fn vnd(amount: i64) -> Self {
        Self::new(amount, Currency::VND)
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Check if this is negative.
    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }

    /// Add another Money value. `None` on currency mismatch or overflow.
    pub fn try_add(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        let amount = self.amount.checked_add(other.amount)?;
        Some(Money::new(amount, self.currency))
    }

    /// Subtract another Money value. `None` on currency mismatch or overflow.
    pub fn try_subtract(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        let amount = self.amount.checked_sub(other.amount)?;
        Some(Money::new(amount, self.currency))
    }

    /// Multiply by an integer factor.
    pub fn try_multiply(&self, factor: i64) -> Option<Money> {
        let amount = self.amount.checked_mul(factor)?;
        Some(Money::new(amount, self.currency))
    }

    /// Calculate `percent`% of this amount, truncated to a whole unit.
    pub fn percentage(&self, percent: Decimal) -> Option<Money> {
        let scaled = Decimal::from(self.amount).checked_mul(percent)? / Decimal::ONE_HUNDRED;
        let amount = scaled.trunc().to_i64()?;
        Some(Money::new(amount, self.currency))
    }

    /// The smaller of two amounts in the same currency.
    pub fn min(self, other: Money) -> Money {
        if other.amount < self.amount {
            other
        } else {
            self
        }
    }

    /// Sum an iterator of Money values.
    pub fn try_sum<'a>(mut iter: impl Iterator<Item = &'a Money>, currency: Currency) -> Option<Money> {
        iter.try_fold(Money::zero(currency), |acc, m| acc.try_add(m))
    }

    /// Format as a display string (e.g., "530.000 ₫" or "$49.99").
    pub fn display(&self) -> String {
        match self.currency {
            Currency::VND => format!("{} {}", group_thousands(self.amount), self.currency.symbol()),
            _ => {
                let places = self.currency.decimal_places();
                let divisor = 10_i64.pow(places);
                let sign = if self.amount < 0 { "-" } else { "" };
                let abs = self.amount.unsigned_abs();
                format!(
                    "{}{}{}.{:0width$}",
                    sign,
                    self.currency.symbol(),
                    abs / divisor as u64,
                    abs % divisor as u64,
                    width = places as usize
                )
            }
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

fn group_thousands(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}
