//! Order totals.

use crate::cart::{compute_subtotal, CartLine};
use crate::error::CheckoutError;
use crate::money::{Currency, Money};
use crate::shipping::{resolve_shipping_fee, ShippingMethodCode};
use crate::voucher::AppliedVoucher;
use serde::{Deserialize, Serialize};

/// `subtotal + shipping_fee - discount`, never negative.
pub fn compute_total(subtotal: Money, shipping_fee: Money, discount: Money) -> Result<Money, CheckoutError> {
    let gross = add(subtotal, shipping_fee)?;
    if gross.currency != discount.currency {
        return Err(CheckoutError::CurrencyMismatch {
            expected: gross.currency.code().to_string(),
            got: discount.currency.code().to_string(),
        });
    }
    let total = gross.try_subtract(&discount).ok_or(CheckoutError::Overflow)?;
    if total.is_negative() {
        return Err(CheckoutError::NegativeTotal(total.amount));
    }
    Ok(total)
}

fn add(a: Money, b: Money) -> Result<Money, CheckoutError> {
    if a.currency != b.currency {
        return Err(CheckoutError::CurrencyMismatch {
            expected: a.currency.code().to_string(),
            got: b.currency.code().to_string(),
        });
    }
    a.try_add(&b).ok_or(CheckoutError::Overflow)
}

/// Every amount shown on the checkout summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// Sum of line totals.
    pub subtotal: Money,
    /// Flat shipping fee.
    pub shipping_fee: Money,
    /// Subtotal plus shipping; the base vouchers are checked against.
    pub order_total: Money,
    /// Voucher discount.
    pub discount: Money,
    /// Amount payable.
    pub total: Money,
}

impl PriceBreakdown {
    /// Price a set of lines with a shipping method and an optional voucher.
    ///
    /// The voucher's discount is taken as computed when it was validated; the
    /// caller re-validates when the order total changes.
    pub fn compute(
        lines: &[CartLine],
        shipping: ShippingMethodCode,
        voucher: Option<&AppliedVoucher>,
        currency: Currency,
    ) -> Result<Self, CheckoutError> {
        let subtotal = compute_subtotal(lines, currency)?;
        let shipping_fee = resolve_shipping_fee(shipping);
        let order_total = add(subtotal, shipping_fee)?;
        let discount = voucher
            .map(|v| v.discount)
            .unwrap_or_else(|| Money::zero(currency));
        let total = compute_total(subtotal, shipping_fee, discount)?;
        Ok(Self {
            subtotal,
            shipping_fee,
            order_total,
            discount,
            total,
        })
    }
}
