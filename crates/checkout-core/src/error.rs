//! Checkout error types.

use thiserror::Error;

/// Input and arithmetic errors raised before anything is persisted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// A cart line is malformed (negative price, non-positive quantity, over stock).
    #[error("Invalid cart line {line_id}: {reason}")]
    InvalidLine { line_id: String, reason: String },

    /// Requested quantity exceeds what is in stock.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// Shipping method code is not in the catalog.
    #[error("Unknown shipping method: {0}")]
    UnknownShippingMethod(String),

    /// Payment method code is not recognised.
    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    /// Computed total would be negative.
    #[error("Order total would be negative: {0}")]
    NegativeTotal(i64),

    /// Persisted total does not match what its lines re-derive to.
    #[error("Order total mismatch: stored {stored}, derived {derived}")]
    TotalMismatch { stored: i64, derived: i64 },

    /// Voucher definition is malformed.
    #[error("Invalid voucher {code}: {reason}")]
    InvalidVoucher { code: String, reason: String },

    /// Shipping address is missing required fields.
    #[error("Incomplete shipping address: missing {0}")]
    IncompleteAddress(String),

    /// Nothing to check out.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart line not found.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// The session carries no authenticated user.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,
}

impl CheckoutError {
    pub(crate) fn invalid_line(line_id: impl ToString, reason: impl Into<String>) -> Self {
        CheckoutError::InvalidLine {
            line_id: line_id.to_string(),
            reason: reason.into(),
        }
    }
}
