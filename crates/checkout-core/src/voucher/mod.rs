//! Vouchers and voucher validation.

mod validator;
mod voucher;

pub use validator::{validate_voucher, AppliedVoucher, VoucherRejection};
pub use voucher::{available_vouchers, normalize_code, DiscountType, DiscountValue, Voucher};
