//! Cart lines and subtotal aggregation.

use crate::error::CheckoutError;
use crate::ids::{CartLineId, ProductId};
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// A product in a user's cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    /// Cart line identifier.
    pub id: CartLineId,
    /// Product being purchased.
    pub product_id: ProductId,
    /// Product name (denormalized for display).
    pub name: String,
    /// Unit price.
    pub unit_price: Money,
    /// Quantity.
    pub quantity: i64,
    /// Selected size (e.g., "M", "XL").
    pub size: String,
    /// Stock available when the line was added.
    pub stock: i64,
}

impl CartLine {
    /// Create a new cart line.
    pub fn new(
        id: impl Into<CartLineId>,
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: i64,
        size: impl Into<String>,
        stock: i64,
    ) -> Self {
        Self {
            id: id.into(),
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            quantity,
            size: size.into(),
            stock,
        }
    }

    /// Reject malformed lines instead of skipping them.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.unit_price.is_negative() {
            return Err(CheckoutError::invalid_line(&self.id, "negative unit price"));
        }
        if self.quantity <= 0 {
            return Err(CheckoutError::invalid_line(
                &self.id,
                format!("non-positive quantity {}", self.quantity),
            ));
        }
        if self.stock < 0 {
            return Err(CheckoutError::invalid_line(&self.id, "negative stock"));
        }
        if self.quantity > self.stock {
            return Err(CheckoutError::invalid_line(
                &self.id,
                format!("quantity {} exceeds stock {}", self.quantity, self.stock),
            ));
        }
        Ok(())
    }

    /// `unit_price * quantity`.
    pub fn line_total(&self) -> Result<Money, CheckoutError> {
        self.unit_price
            .try_multiply(self.quantity)
            .ok_or(CheckoutError::Overflow)
    }
}

/// Sum `unit_price * quantity` over all lines.
///
/// An empty cart yields zero. Any malformed line fails the whole computation.
pub fn compute_subtotal(lines: &[CartLine], currency: Currency) -> Result<Money, CheckoutError> {
    let mut subtotal = Money::zero(currency);
    for line in lines {
        line.validate()?;
        if line.unit_price.currency != currency {
            return Err(CheckoutError::CurrencyMismatch {
                expected: currency.code().to_string(),
                got: line.unit_price.currency.code().to_string(),
            });
        }
        subtotal = subtotal
            .try_add(&line.line_total()?)
            .ok_or(CheckoutError::Overflow)?;
    }
    Ok(subtotal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, price: i64, quantity: i64) -> CartLine {
        CartLine::new(id, format!("p-{id}"), "Linen Shirt", Money::vnd(price), quantity, "M", 10)
    }

    #[test]
    fn test_empty_cart_subtotal_is_zero() {
        let subtotal = compute_subtotal(&[], Currency::VND).unwrap();
        assert!(subtotal.is_zero());
    }

    #[test]
    fn test_subtotal_sums_lines() {
        let lines = vec![line("1", 150_000, 2), line("2", 200_000, 1)];
        let subtotal = compute_subtotal(&lines, Currency::VND).unwrap();
        assert_eq!(subtotal, Money::vnd(500_000));
    }

    #[test]
    fn test_zero_price_line_is_valid() {
        let lines = vec![line("gift", 0, 1)];
        assert_eq!(compute_subtotal(&lines, Currency::VND).unwrap(), Money::vnd(0));
    }

    #[test]
    fn test_negative_price_rejected() {
        let lines = vec![line("1", 100, 1), line("2", -5, 1)];
        let err = compute_subtotal(&lines, Currency::VND).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidLine { ref line_id, .. } if line_id == "2"));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let lines = vec![line("1", 100, 0)];
        assert!(matches!(
            compute_subtotal(&lines, Currency::VND),
            Err(CheckoutError::InvalidLine { .. })
        ));
    }

    #[test]
    fn test_quantity_over_stock_rejected() {
        let mut over = line("1", 100, 11);
        over.stock = 10;
        assert!(matches!(over.validate(), Err(CheckoutError::InvalidLine { .. })));
    }

    #[test]
    fn test_overflow_detected() {
        let mut big = line("1", i64::MAX, 2);
        big.stock = 2;
        assert_eq!(
            compute_subtotal(&[big], Currency::VND),
            Err(CheckoutError::Overflow)
        );
    }
}
