//! Voucher eligibility checks and discount computation.

use crate::ids::{UserId, VoucherId};
use crate::money::{Currency, Money};
use crate::voucher::{DiscountValue, Voucher};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a voucher cannot be applied.
///
/// These are expected business outcomes, shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoucherRejection {
    #[error("Voucher {code} does not exist")]
    NotFound { code: String },

    #[error("Voucher {code} is not available for this account")]
    NotEligible { code: String },

    #[error("Voucher {code} is not active until {starts_at}")]
    NotYetActive { code: String, starts_at: DateTime<Utc> },

    #[error("Voucher {code} expired at {ended_at}")]
    Expired { code: String, ended_at: DateTime<Utc> },

    #[error("Voucher {code} needs a minimum order of {}, add {} more", .min_order.display(), .shortfall.display())]
    MinOrderNotMet {
        code: String,
        min_order: Money,
        shortfall: Money,
    },

    #[error("Voucher {code} has already been used")]
    AlreadyUsed { code: String },

    #[error("Voucher {code} is in {voucher_currency} and cannot discount an order in {order_currency}")]
    CurrencyMismatch {
        code: String,
        voucher_currency: Currency,
        order_currency: Currency,
    },

    #[error("Voucher {code} has a discount that cannot be computed")]
    InvalidDiscount { code: String },
}

impl VoucherRejection {
    /// Stable identifier for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            VoucherRejection::NotFound { .. } => "not_found",
            VoucherRejection::NotEligible { .. } => "not_eligible",
            VoucherRejection::NotYetActive { .. } => "not_yet_active",
            VoucherRejection::Expired { .. } => "expired",
            VoucherRejection::MinOrderNotMet { .. } => "min_order_not_met",
            VoucherRejection::AlreadyUsed { .. } => "already_used",
            VoucherRejection::CurrencyMismatch { .. } => "currency_mismatch",
            VoucherRejection::InvalidDiscount { .. } => "invalid_discount",
        }
    }

    pub fn code(&self) -> &str {
        match self {
            VoucherRejection::NotFound { code }
            | VoucherRejection::NotEligible { code }
            | VoucherRejection::NotYetActive { code, .. }
            | VoucherRejection::Expired { code, .. }
            | VoucherRejection::MinOrderNotMet { code, .. }
            | VoucherRejection::AlreadyUsed { code }
            | VoucherRejection::CurrencyMismatch { code, .. }
            | VoucherRejection::InvalidDiscount { code } => code,
        }
    }
}

/// A voucher that passed every check, with its computed discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedVoucher {
    pub voucher_id: VoucherId,
    pub code: String,
    pub value: DiscountValue,
    /// Order total the discount was computed against.
    pub order_total: Money,
    pub discount: Money,
}

/// Run the voucher checks in order and compute the discount.
///
/// `order_total` is subtotal plus shipping. The first failing check wins:
/// existence, eligibility, start date, end date, minimum order, prior use.
/// A fixed amount that cannot be applied to `order_total` is rejected last.
/// Pure and side-effect free; the same inputs always give the same result.
pub fn validate_voucher(
    voucher: Option<&Voucher>,
    code: &str,
    user: &UserId,
    order_total: Money,
    now: DateTime<Utc>,
) -> Result<AppliedVoucher, VoucherRejection> {
    let Some(voucher) = voucher else {
        return Err(VoucherRejection::NotFound {
            code: super::normalize_code(code),
        });
    };
    let code = voucher.code.clone();

    if !voucher.is_eligible(user) {
        return Err(VoucherRejection::NotEligible { code });
    }
    if now < voucher.starts_at {
        return Err(VoucherRejection::NotYetActive {
            code,
            starts_at: voucher.starts_at,
        });
    }
    if now > voucher.ends_at {
        return Err(VoucherRejection::Expired {
            code,
            ended_at: voucher.ends_at,
        });
    }
    if order_total.amount < voucher.min_order.amount {
        let shortfall = Money::new(
            voucher.min_order.amount - order_total.amount,
            voucher.min_order.currency,
        );
        return Err(VoucherRejection::MinOrderNotMet {
            code,
            min_order: voucher.min_order,
            shortfall,
        });
    }
    if voucher.is_used_by(user) {
        return Err(VoucherRejection::AlreadyUsed { code });
    }

    let Some(discount) = voucher.discount.calculate(&order_total) else {
        return Err(match voucher.discount {
            DiscountValue::Fixed(amount) => VoucherRejection::CurrencyMismatch {
                code,
                voucher_currency: amount.currency,
                order_currency: order_total.currency,
            },
            DiscountValue::Percentage(_) => VoucherRejection::InvalidDiscount { code },
        });
    };

    Ok(AppliedVoucher {
        voucher_id: voucher.id.clone(),
        code,
        value: voucher.discount,
        order_total,
        discount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn ten_percent(min_order: i64) -> Voucher {
        Voucher::new(
            "v1",
            "SALE10",
            DiscountValue::Percentage(Decimal::from(10)),
            now() - Duration::days(1),
            now() + Duration::days(1),
        )
        .with_min_order(Money::vnd(min_order))
    }

    fn user() -> UserId {
        UserId::new("u1")
    }

    #[test]
    fn test_percentage_discount_on_order_total() {
        let voucher = ten_percent(400_000);
        let applied =
            validate_voucher(Some(&voucher), "sale10", &user(), Money::vnd(530_000), now()).unwrap();
        assert_eq!(applied.discount, Money::vnd(53_000));
        assert_eq!(applied.code, "SALE10");
    }

    #[test]
    fn test_min_order_shortfall() {
        let voucher = ten_percent(600_000);
        let err = validate_voucher(Some(&voucher), "SALE10", &user(), Money::vnd(530_000), now())
            .unwrap_err();
        assert_eq!(
            err,
            VoucherRejection::MinOrderNotMet {
                code: "SALE10".into(),
                min_order: Money::vnd(600_000),
                shortfall: Money::vnd(70_000),
            }
        );
        assert_eq!(err.kind(), "min_order_not_met");
    }

    #[test]
    fn test_missing_voucher_reported_before_anything_else() {
        let err = validate_voucher(None, " nope ", &user(), Money::vnd(0), now()).unwrap_err();
        assert_eq!(err, VoucherRejection::NotFound { code: "NOPE".into() });
    }

    #[test]
    fn test_expired_wins_over_min_order_and_use() {
        let mut voucher = ten_percent(10_000_000);
        voucher.ends_at = now() - Duration::hours(1);
        voucher.used_by.push(user());
        let err = validate_voucher(Some(&voucher), "SALE10", &user(), Money::vnd(1), now())
            .unwrap_err();
        assert_eq!(err.kind(), "expired");
    }

    #[test]
    fn test_eligibility_checked_before_dates() {
        let mut voucher = ten_percent(0).with_eligible_users([UserId::new("u2")]);
        voucher.starts_at = now() + Duration::days(5);
        voucher.ends_at = now() + Duration::days(6);
        let err = validate_voucher(Some(&voucher), "SALE10", &user(), Money::vnd(1), now())
            .unwrap_err();
        assert_eq!(err.kind(), "not_eligible");
    }

    #[test]
    fn test_not_yet_active() {
        let mut voucher = ten_percent(0);
        voucher.starts_at = now() + Duration::seconds(1);
        let err = validate_voucher(Some(&voucher), "SALE10", &user(), Money::vnd(1), now())
            .unwrap_err();
        assert_eq!(err.kind(), "not_yet_active");
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let mut voucher = ten_percent(0);
        voucher.starts_at = now();
        voucher.ends_at = now();
        assert!(validate_voucher(Some(&voucher), "SALE10", &user(), Money::vnd(100), now()).is_ok());
    }

    #[test]
    fn test_already_used() {
        let mut voucher = ten_percent(0);
        voucher.used_by.push(user());
        let err = validate_voucher(Some(&voucher), "SALE10", &user(), Money::vnd(100), now())
            .unwrap_err();
        assert_eq!(err, VoucherRejection::AlreadyUsed { code: "SALE10".into() });
    }

    #[test]
    fn test_fixed_discount_capped_at_order_total() {
        let voucher = Voucher::new(
            "v2",
            "BIG",
            DiscountValue::Fixed(Money::vnd(1_000_000)),
            now() - Duration::days(1),
            now() + Duration::days(1),
        );
        let applied =
            validate_voucher(Some(&voucher), "BIG", &user(), Money::vnd(200_000), now()).unwrap();
        assert_eq!(applied.discount, Money::vnd(200_000));
    }

    #[test]
    fn test_fixed_discount_in_other_currency_rejected() {
        let voucher = Voucher::new(
            "v3",
            "FIVEUSD",
            DiscountValue::Fixed(Money::new(5, Currency::USD)),
            now() - Duration::days(1),
            now() + Duration::days(1),
        );
        let err = validate_voucher(Some(&voucher), "fiveusd", &user(), Money::vnd(530_000), now())
            .unwrap_err();
        assert_eq!(
            err,
            VoucherRejection::CurrencyMismatch {
                code: "FIVEUSD".into(),
                voucher_currency: Currency::USD,
                order_currency: Currency::VND,
            }
        );
        assert_eq!(err.kind(), "currency_mismatch");
    }

    #[test]
    fn test_validation_is_idempotent() {
        let voucher = ten_percent(400_000);
        let before = voucher.clone();
        let first = validate_voucher(Some(&voucher), "SALE10", &user(), Money::vnd(530_000), now());
        let second = validate_voucher(Some(&voucher), "SALE10", &user(), Money::vnd(530_000), now());
        assert_eq!(first, second);
        assert_eq!(voucher, before);
    }
}
