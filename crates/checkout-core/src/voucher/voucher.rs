//! Voucher definitions.

use crate::error::CheckoutError;
use crate::ids::{UserId, VoucherId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Type of discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// Fixed amount off.
    Fixed,
    /// Percentage off the order total.
    Percentage,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Fixed => "fixed",
            DiscountType::Percentage => "percentage",
        }
    }
}

/// Value of the discount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DiscountValue {
    /// Fixed amount off.
    Fixed(Money),
    /// Percentage off (0 - 100).
    Percentage(Decimal),
}

impl DiscountValue {
    pub fn discount_type(&self) -> DiscountType {
        match self {
            DiscountValue::Fixed(_) => DiscountType::Fixed,
            DiscountValue::Percentage(_) => DiscountType::Percentage,
        }
    }

    /// Calculate the discount for an order total.
    ///
    /// Fixed amounts are capped at the order total. `None` on overflow or
    /// currency mismatch.
    pub fn calculate(&self, order_total: &Money) -> Option<Money> {
        match self {
            DiscountValue::Fixed(amount) => {
                if amount.currency != order_total.currency {
                    return None;
                }
                Some(amount.min(*order_total))
            }
            DiscountValue::Percentage(percent) => {
                let discount = order_total.percentage(*percent)?;
                Some(discount.min(*order_total))
            }
        }
    }
}

/// A discount code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Voucher {
    /// Store identifier.
    pub id: VoucherId,
    /// Code, stored uppercased.
    pub code: String,
    /// Discount granted.
    pub discount: DiscountValue,
    /// Minimum order total (subtotal plus shipping).
    pub min_order: Money,
    /// First instant the voucher can be used.
    pub starts_at: DateTime<Utc>,
    /// Last instant the voucher can be used.
    pub ends_at: DateTime<Utc>,
    /// Users allowed to use the voucher. Empty means everyone.
    #[serde(default)]
    pub eligible_user_ids: Vec<UserId>,
    /// Users who already consumed the voucher.
    #[serde(default)]
    pub used_by: Vec<UserId>,
    /// Optional display text.
    #[serde(default)]
    pub description: Option<String>,
}

impl Voucher {
    /// Create a voucher open to everyone with no minimum order.
    pub fn new(
        id: impl Into<VoucherId>,
        code: &str,
        discount: DiscountValue,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Self {
        let currency = match discount {
            DiscountValue::Fixed(amount) => amount.currency,
            DiscountValue::Percentage(_) => Default::default(),
        };
        Self {
            id: id.into(),
            code: normalize_code(code),
            discount,
            min_order: Money::zero(currency),
            starts_at,
            ends_at,
            eligible_user_ids: Vec::new(),
            used_by: Vec::new(),
            description: None,
        }
    }

    /// Set the minimum order total.
    pub fn with_min_order(mut self, min_order: Money) -> Self {
        self.min_order = min_order;
        self
    }

    /// Restrict the voucher to the given users.
    pub fn with_eligible_users(mut self, users: impl IntoIterator<Item = UserId>) -> Self {
        self.eligible_user_ids = users.into_iter().collect();
        self
    }

    pub fn discount_type(&self) -> DiscountType {
        self.discount.discount_type()
    }

    /// Check whether a user may use this voucher at all.
    pub fn is_eligible(&self, user: &UserId) -> bool {
        self.eligible_user_ids.is_empty() || self.eligible_user_ids.contains(user)
    }

    /// Check whether a user has already consumed this voucher.
    pub fn is_used_by(&self, user: &UserId) -> bool {
        self.used_by.contains(user)
    }

    /// Whether the voucher should appear in a user's voucher picker.
    ///
    /// Not-yet-active vouchers are listed; expired or consumed ones are not.
    pub fn is_offered_to(&self, user: &UserId, now: DateTime<Utc>) -> bool {
        self.is_eligible(user) && now <= self.ends_at && !self.is_used_by(user)
    }

    /// Record a user as having consumed the voucher. Returns false if they
    /// already had.
    pub fn mark_used(&mut self, user: &UserId) -> bool {
        if self.is_used_by(user) {
            return false;
        }
        self.used_by.push(user.clone());
        true
    }

    /// Reject malformed definitions.
    pub fn validate_definition(&self) -> Result<(), CheckoutError> {
        let invalid = |reason: &str| CheckoutError::InvalidVoucher {
            code: self.code.clone(),
            reason: reason.to_string(),
        };

        if self.code.trim().is_empty() {
            return Err(invalid("empty code"));
        }
        if self.code != normalize_code(&self.code) {
            return Err(invalid("code is not normalized"));
        }
        match self.discount {
            DiscountValue::Fixed(amount) if amount.is_negative() => {
                return Err(invalid("negative discount"));
            }
            DiscountValue::Percentage(p) if p < Decimal::ZERO || p > Decimal::ONE_HUNDRED => {
                return Err(invalid("percentage must be between 0 and 100"));
            }
            _ => {}
        }
        if self.min_order.is_negative() {
            return Err(invalid("negative minimum order"));
        }
        if self.starts_at > self.ends_at {
            return Err(invalid("start date is after end date"));
        }
        Ok(())
    }
}

/// Canonical form of a voucher code: trimmed and uppercased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Vouchers a user should be offered, in input order.
pub fn available_vouchers<'a>(
    vouchers: &'a [Voucher],
    user: &UserId,
    now: DateTime<Utc>,
) -> Vec<&'a Voucher> {
    vouchers.iter().filter(|v| v.is_offered_to(user, now)).collect()
}
