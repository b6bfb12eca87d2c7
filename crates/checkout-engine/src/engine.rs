//! Order submission.

use crate::config::EngineConfig;
use crate::error::EngineError;
use checkout_core::prelude::*;
use checkout_store::{OrderStore, StoreCall, StoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// Checkout operations against an order store.
pub struct CheckoutEngine<S: OrderStore + ?Sized> {
    pub(crate) store: Arc<S>,
    pub(crate) config: EngineConfig,
}

impl<S: OrderStore + ?Sized> Clone for CheckoutEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

/// A step run after the order record is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PostCommitStep {
    /// Decrement a product's stock.
    Stock { product_id: ProductId },
    /// Record the voucher as used by the customer.
    VoucherUsage { voucher_id: VoucherId },
    /// Remove a purchased line from the live cart.
    CartCleanup { line_id: CartLineId },
    /// Store the stock taken by an order awaiting payment.
    StockReservation,
}

impl fmt::Display for PostCommitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostCommitStep::Stock { product_id } => write!(f, "stock update for product {product_id}"),
            PostCommitStep::VoucherUsage { voucher_id } => write!(f, "usage of voucher {voucher_id}"),
            PostCommitStep::CartCleanup { line_id } => write!(f, "removal of cart line {line_id}"),
            PostCommitStep::StockReservation => f.write_str("record of reserved stock"),
        }
    }
}

/// A post-commit step that failed. The order stands regardless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCommitWarning {
    pub step: PostCommitStep,
    pub error: String,
}

/// Result of a successful placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    /// The order as stored.
    pub order: Order,
    /// Bookkeeping that did not go through.
    pub warnings: Vec<PostCommitWarning>,
}

impl Placement {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl<S: OrderStore + ?Sized> CheckoutEngine<S> {
    /// Create an engine with default configuration.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run one store call under its timeout.
    pub(crate) async fn call<T>(
        &self,
        call: StoreCall,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        self.config.timeouts.run(call, fut).await
    }

    /// Look a voucher up and validate it against `order_total`.
    pub(crate) async fn check_voucher(
        &self,
        code: &str,
        user: &UserId,
        order_total: Money,
        now: DateTime<Utc>,
    ) -> Result<AppliedVoucher, EngineError> {
        let voucher = self
            .call(StoreCall::GetVoucher, self.store.get_voucher_by_code(code))
            .await?;
        validate_voucher(voucher.as_ref(), code, user, order_total, now).map_err(|rejection| {
            info!(
                user_id = %user,
                voucher = %rejection.code(),
                reason = rejection.kind(),
                "voucher rejected"
            );
            EngineError::from(rejection)
        })
    }

    /// Place an order for the session's user.
    ///
    /// Checks run before anything is written: the user is signed in, the
    /// draft is complete, the user is under the pending order cap and any
    /// voucher still validates against fresh store data. The order record is
    /// then written, followed by the stock, voucher and cart updates. Those
    /// last three never undo the order; their failures come back as
    /// warnings on the placement.
    ///
    /// Two concurrent placements for the same user can both pass the cap
    /// check; the store is the only arbiter.
    pub async fn place_order(
        &self,
        session: &Session,
        draft: &OrderDraft,
        now: DateTime<Utc>,
    ) -> Result<Placement, EngineError> {
        let user = session.require_user()?;
        draft.ensure_ready()?;

        let pending = self
            .call(StoreCall::ListPendingOrders, self.store.list_pending_orders(user))
            .await?;
        let cap = self.config.max_pending_orders;
        if pending.len() >= cap {
            warn!(user_id = %user, pending = pending.len(), cap, "pending order cap reached");
            return Err(EngineError::TooManyPendingOrders {
                pending: pending.len(),
                cap,
            });
        }

        let mut draft = draft.clone();
        if let Some(applied) = draft.voucher().cloned() {
            let fresh = self
                .check_voucher(&applied.code, user, draft.order_total(), now)
                .await?;
            draft.apply_voucher(fresh)?;
        }

        let order = Order::from_draft(Order::generate_id(now), user.clone(), &draft, now);
        order.verify_total()?;

        let order = self
            .call(StoreCall::CreateOrder, self.store.create_order(&order))
            .await?;
        info!(
            user_id = %user,
            order_id = %order.id,
            total = order.total.amount,
            status = %order.order_status,
            voucher = order.voucher_code.as_deref().unwrap_or(""),
            "order placed"
        );

        let mut warnings = Vec::new();
        let order = self.decrement_stock(order, &mut warnings).await;
        if let Some(applied) = draft.voucher() {
            let step = PostCommitStep::VoucherUsage {
                voucher_id: applied.voucher_id.clone(),
            };
            let result = self
                .call(
                    StoreCall::MarkVoucherUsed,
                    self.store.mark_voucher_used(&applied.voucher_id, user),
                )
                .await;
            record(&order.id, step, result, &mut warnings);
        }
        for line in &order.lines {
            let step = PostCommitStep::CartCleanup {
                line_id: line.id.clone(),
            };
            let result = self
                .call(StoreCall::RemoveCartLine, self.store.remove_cart_line(&line.id, user))
                .await;
            record(&order.id, step, result, &mut warnings);
        }

        Ok(Placement { order, warnings })
    }

    /// Take each line's quantity out of stock.
    ///
    /// For an order awaiting payment the units actually removed are written
    /// back onto the order, so a failed payment restocks exactly those.
    async fn decrement_stock(&self, order: Order, warnings: &mut Vec<PostCommitWarning>) -> Order {
        let mut reserved = order.clone();
        for line in &order.lines {
            let step = PostCommitStep::Stock {
                product_id: line.product_id.clone(),
            };
            let result = self.adjust_stock(&line.product_id, -line.quantity).await;
            if let Some(applied) = record(&order.id, step, result, warnings) {
                reserved.reserve(&line.product_id, -applied);
            }
        }

        if order.order_status != OrderStatus::AwaitingPayment || reserved.reserved_stock.is_empty() {
            return order;
        }
        let result = self
            .call(StoreCall::UpdateOrder, self.store.update_order(&reserved))
            .await;
        record(&order.id, PostCommitStep::StockReservation, result, warnings).unwrap_or(order)
    }

    /// Add `delta` to a product's stock from a fresh read. Never goes below
    /// zero. Returns the change that was applied.
    pub(crate) async fn adjust_stock(&self, product_id: &ProductId, delta: i64) -> Result<i64, StoreError> {
        let product = self
            .call(StoreCall::GetProduct, self.store.get_product(product_id))
            .await?;
        let stock = product.stock.saturating_add(delta).max(0);
        self.call(
            StoreCall::UpdateStock,
            self.store.update_product_stock(product_id, stock),
        )
        .await?;
        Ok(stock - product.stock)
    }
}

/// Turn a failed post-commit step into a warning.
pub(crate) fn record<T>(
    order_id: &OrderId,
    step: PostCommitStep,
    result: Result<T, StoreError>,
    warnings: &mut Vec<PostCommitWarning>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(order_id = %order_id, step = %step, error = %e, "post-commit step failed");
            warnings.push(PostCommitWarning {
                step,
                error: e.to_string(),
            });
            None
        }
    }
}
