//! Second phase of online payments.

use crate::engine::{record, CheckoutEngine, PostCommitStep, PostCommitWarning};
use crate::error::EngineError;
use checkout_core::prelude::*;
use checkout_store::{OrderStore, StoreCall};
use chrono::{DateTime, Utc};
use tracing::info;

impl<S: OrderStore + ?Sized> CheckoutEngine<S> {
    /// The payment provider accepted the payment.
    ///
    /// Moves an `AwaitingPayment` order to `Pending` and marks it paid.
    /// Confirming an order that is already paid returns it unchanged.
    pub async fn confirm_payment(&self, order_id: &OrderId, now: DateTime<Utc>) -> Result<Order, EngineError> {
        let mut order = self
            .call(StoreCall::GetOrder, self.store.get_order(order_id))
            .await?;
        if order.is_paid() {
            return Ok(order);
        }
        if order.order_status != OrderStatus::AwaitingPayment {
            return Err(EngineError::PaymentNotAwaited {
                order_id: order.id,
                status: order.order_status,
            });
        }

        order.payment_status = PaymentStatus::Paid;
        order.record_status(OrderStatus::Pending, Some("Payment received"), now);
        let order = self
            .call(StoreCall::UpdateOrder, self.store.update_order(&order))
            .await?;
        info!(order_id = %order.id, method = %order.payment_method, "payment confirmed");
        Ok(order)
    }

    /// The payment failed or was abandoned.
    ///
    /// Cancels the order and puts back the stock reserved at placement.
    /// Units that were never taken out are not added. Voucher usage is kept.
    /// Restock failures are returned as warnings.
    pub async fn fail_payment(
        &self,
        order_id: &OrderId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(Order, Vec<PostCommitWarning>), EngineError> {
        let mut order = self
            .call(StoreCall::GetOrder, self.store.get_order(order_id))
            .await?;
        if order.order_status != OrderStatus::AwaitingPayment {
            return Err(EngineError::PaymentNotAwaited {
                order_id: order.id,
                status: order.order_status,
            });
        }

        order.payment_status = PaymentStatus::Failed;
        let note = format!("Payment failed: {reason}");
        order.record_status(OrderStatus::Cancelled, Some(&note), now);
        let reserved = std::mem::take(&mut order.reserved_stock);
        let order = self
            .call(StoreCall::UpdateOrder, self.store.update_order(&order))
            .await?;
        info!(order_id = %order.id, reason, "payment failed, order cancelled");

        let mut warnings = Vec::new();
        for reservation in &reserved {
            let step = PostCommitStep::Stock {
                product_id: reservation.product_id.clone(),
            };
            let result = self.adjust_stock(&reservation.product_id, reservation.quantity).await;
            record(&order.id, step, result, &mut warnings);
        }
        Ok((order, warnings))
    }
}
