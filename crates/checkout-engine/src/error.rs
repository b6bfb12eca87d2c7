//! Engine error types.

use checkout_core::{CheckoutError, OrderId};
use checkout_core::order::OrderStatus;
use checkout_core::voucher::VoucherRejection;
use checkout_store::StoreError;
use thiserror::Error;

/// Errors from engine operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No signed-in user.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Bad input: malformed lines, unknown methods, incomplete address.
    #[error(transparent)]
    Checkout(CheckoutError),

    /// The voucher cannot be applied.
    #[error(transparent)]
    Voucher(#[from] VoucherRejection),

    /// The user already has as many pending orders as allowed.
    #[error("Too many pending orders: {pending} pending, limit is {cap}")]
    TooManyPendingOrders { pending: usize, cap: usize },

    /// The order is not waiting for an online payment.
    #[error("Order {order_id} is not awaiting payment (status {status})")]
    PaymentNotAwaited { order_id: OrderId, status: OrderStatus },

    /// The order store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Error returned by order placement.
pub type OrderSubmissionError = EngineError;

impl From<CheckoutError> for EngineError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::NotAuthenticated => EngineError::NotAuthenticated,
            other => EngineError::Checkout(other),
        }
    }
}

impl EngineError {
    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Store(e) if e.is_retryable())
    }

    /// Stable identifier for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NotAuthenticated => "not_authenticated",
            EngineError::Checkout(_) => "invalid_input",
            EngineError::Voucher(rejection) => rejection.kind(),
            EngineError::TooManyPendingOrders { .. } => "too_many_pending_orders",
            EngineError::PaymentNotAwaited { .. } => "payment_not_awaited",
            EngineError::Store(_) => "store",
        }
    }
}
