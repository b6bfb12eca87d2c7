//! Store call tags and per-call timeouts.

use crate::error::StoreError;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Every operation the store exposes.
///
/// Each tag carries a default timeout; reads are cheaper than writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreCall {
    GetVoucher,
    ListVouchers,
    MarkVoucherUsed,
    GetUser,
    ListPendingOrders,
    ListOrders,
    GetOrder,
    CreateOrder,
    UpdateOrder,
    GetProduct,
    UpdateStock,
    ListCart,
    RemoveCartLine,
}

impl StoreCall {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetVoucher => "get_voucher",
            Self::ListVouchers => "list_vouchers",
            Self::MarkVoucherUsed => "mark_voucher_used",
            Self::GetUser => "get_user",
            Self::ListPendingOrders => "list_pending_orders",
            Self::ListOrders => "list_orders",
            Self::GetOrder => "get_order",
            Self::CreateOrder => "create_order",
            Self::UpdateOrder => "update_order",
            Self::GetProduct => "get_product",
            Self::UpdateStock => "update_stock",
            Self::ListCart => "list_cart",
            Self::RemoveCartLine => "remove_cart_line",
        }
    }

    /// Whether the call writes to the store.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::MarkVoucherUsed
                | Self::CreateOrder
                | Self::UpdateOrder
                | Self::UpdateStock
                | Self::RemoveCartLine
        )
    }

    /// Get the default timeout for this call.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::CreateOrder | Self::UpdateOrder => Duration::from_millis(5000),
            Self::ListVouchers | Self::ListOrders | Self::ListPendingOrders => Duration::from_millis(3000),
            Self::MarkVoucherUsed | Self::UpdateStock | Self::RemoveCartLine => Duration::from_millis(3000),
            _ => Duration::from_millis(2000),
        }
    }
}

impl fmt::Display for StoreCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timeouts applied to store calls.
#[derive(Debug, Clone, Default)]
pub struct TimeoutConfig {
    /// Applies to every call without an override. `None` uses each call's default.
    pub total: Option<Duration>,
    /// Per-call overrides.
    pub overrides: HashMap<StoreCall, Duration>,
}

impl TimeoutConfig {
    /// Use one timeout for every call.
    pub fn from_total(total: Duration) -> Self {
        Self {
            total: Some(total),
            overrides: HashMap::new(),
        }
    }

    /// Override the timeout of a single call.
    pub fn with_override(mut self, call: StoreCall, after: Duration) -> Self {
        self.overrides.insert(call, after);
        self
    }

    /// Effective timeout for a call.
    pub fn for_call(&self, call: StoreCall) -> Duration {
        self.overrides
            .get(&call)
            .copied()
            .or(self.total)
            .unwrap_or_else(|| call.default_timeout())
    }

    /// Run a store call, failing with `StoreError::Timeout` if it takes too long.
    pub async fn run<T, F>(&self, call: StoreCall, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let after = self.for_call(call);
        match tokio::time::timeout(after, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(call = %call, after_ms = after.as_millis() as u64, "store call timed out");
                Err(StoreError::Timeout { call, after })
            }
        }
    }
}
