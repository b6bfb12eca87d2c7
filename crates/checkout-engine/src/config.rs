//! Engine configuration.

use checkout_store::TimeoutConfig;
use std::time::Duration;

/// Default cap on orders a user may have pending at once.
pub const DEFAULT_MAX_PENDING_ORDERS: usize = 5;

/// Checkout engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Orders a user may have pending before new ones are refused.
    pub max_pending_orders: usize,
    /// Timeouts for store calls.
    pub timeouts: TimeoutConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_pending_orders: DEFAULT_MAX_PENDING_ORDERS,
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_max_pending_orders(mut self, cap: usize) -> Self {
        self.max_pending_orders = cap;
        self
    }

    /// Use one timeout for every store call.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts = TimeoutConfig::from_total(timeout);
        self
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }
}
