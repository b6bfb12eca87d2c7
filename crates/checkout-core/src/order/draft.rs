//! Checkout in progress.

use crate::cart::CartLine;
use crate::error::CheckoutError;
use crate::money::{Currency, Money};
use crate::order::ShippingAddress;
use crate::payment::PaymentMethod;
use crate::pricing::PriceBreakdown;
use crate::shipping::{ShippingMethodCode, CATALOG_CURRENCY};
use crate::voucher::AppliedVoucher;
use serde::{Deserialize, Serialize};

/// An unpersisted checkout.
///
/// Holds a snapshot of the purchased lines and keeps its price breakdown in
/// step with every change. Nothing is written anywhere until the order is
/// placed, so a draft can be dropped at any point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    lines: Vec<CartLine>,
    shipping_method: ShippingMethodCode,
    payment_method: PaymentMethod,
    voucher: Option<AppliedVoucher>,
    shipping_address: ShippingAddress,
    note: Option<String>,
    currency: Currency,
    breakdown: PriceBreakdown,
}

impl OrderDraft {
    /// Start a draft from the lines selected for purchase.
    ///
    /// Drafts are priced in the shipping catalog's currency; lines in any
    /// other currency are rejected with `CurrencyMismatch`.
    pub fn new(
        lines: Vec<CartLine>,
        shipping_method: ShippingMethodCode,
        payment_method: PaymentMethod,
    ) -> Result<Self, CheckoutError> {
        let currency = CATALOG_CURRENCY;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let breakdown = PriceBreakdown::compute(&lines, shipping_method, None, currency)?;
        Ok(Self {
            lines,
            shipping_method,
            payment_method,
            voucher: None,
            shipping_address: ShippingAddress::default(),
            note: None,
            currency,
            breakdown,
        })
    }

    /// Attach a validated voucher.
    pub fn apply_voucher(&mut self, voucher: AppliedVoucher) -> Result<(), CheckoutError> {
        let breakdown =
            PriceBreakdown::compute(&self.lines, self.shipping_method, Some(&voucher), self.currency)?;
        self.voucher = Some(voucher);
        self.breakdown = breakdown;
        Ok(())
    }

    /// Drop any applied voucher. Returns it if there was one.
    pub fn clear_voucher(&mut self) -> Option<AppliedVoucher> {
        let removed = self.voucher.take();
        if removed.is_some() {
            self.breakdown.discount = Money::zero(self.currency);
            self.breakdown.total = self.breakdown.order_total;
        }
        removed
    }

    /// Change the shipping method.
    ///
    /// The voucher discount depends on the order total, so an applied voucher
    /// is dropped and returned when the total moves; re-apply it to get a
    /// fresh discount.
    pub fn set_shipping_method(
        &mut self,
        method: ShippingMethodCode,
    ) -> Result<Option<AppliedVoucher>, CheckoutError> {
        let breakdown = PriceBreakdown::compute(&self.lines, method, None, self.currency)?;
        self.shipping_method = method;
        let stale = self
            .voucher
            .as_ref()
            .is_some_and(|v| v.order_total != breakdown.order_total);
        let dropped = if stale { self.voucher.take() } else { None };
        self.breakdown = PriceBreakdown::compute(&self.lines, method, self.voucher.as_ref(), self.currency)?;
        Ok(dropped)
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    pub fn set_shipping_address(&mut self, address: ShippingAddress) {
        self.shipping_address = address;
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        let note = note.into();
        self.note = if note.trim().is_empty() { None } else { Some(note) };
    }

    /// Check everything that must hold before the order is submitted.
    pub fn ensure_ready(&self) -> Result<(), CheckoutError> {
        if self.lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        for line in &self.lines {
            line.validate()?;
        }
        self.shipping_address.ensure_complete()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn shipping_method(&self) -> ShippingMethodCode {
        self.shipping_method
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn voucher(&self) -> Option<&AppliedVoucher> {
        self.voucher.as_ref()
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn breakdown(&self) -> &PriceBreakdown {
        &self.breakdown
    }

    pub fn subtotal(&self) -> Money {
        self.breakdown.subtotal
    }

    /// Subtotal plus shipping.
    pub fn order_total(&self) -> Money {
        self.breakdown.order_total
    }

    pub fn discount(&self) -> Money {
        self.breakdown.discount
    }

    pub fn total(&self) -> Money {
        self.breakdown.total
    }
}
