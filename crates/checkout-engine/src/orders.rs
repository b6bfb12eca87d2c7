//! Order status changes and order history.

use crate::engine::CheckoutEngine;
use crate::error::EngineError;
use checkout_core::prelude::*;
use checkout_store::{OrderStore, StoreCall};
use chrono::{DateTime, Utc};
use tracing::info;

impl<S: OrderStore + ?Sized> CheckoutEngine<S> {
    /// Set an order's status and append it to the history.
    ///
    /// Any status may follow any other. Without a note the entry reads
    /// `Status changed to <status>`.
    pub async fn update_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Order, EngineError> {
        let mut order = self
            .call(StoreCall::GetOrder, self.store.get_order(order_id))
            .await?;
        let from = order.order_status;
        order.record_status(status, note, now);
        let order = self
            .call(StoreCall::UpdateOrder, self.store.update_order(&order))
            .await?;
        info!(order_id = %order.id, from = %from, to = %status, "order status changed");
        Ok(order)
    }

    /// The session user's orders, newest first.
    pub async fn orders_for(&self, session: &Session) -> Result<Vec<Order>, EngineError> {
        let user = session.require_user()?;
        let mut orders = self
            .call(StoreCall::ListOrders, self.store.list_orders(user))
            .await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Whether the session user has ordered a product before.
    pub async fn has_purchased(&self, session: &Session, product_id: &ProductId) -> Result<bool, EngineError> {
        let user = session.require_user()?;
        let orders = self
            .call(StoreCall::ListOrders, self.store.list_orders(user))
            .await?;
        Ok(orders.iter().any(|o| o.contains_product(product_id)))
    }

    /// The session user's live cart.
    pub async fn cart(&self, session: &Session) -> Result<Cart, EngineError> {
        let user = session.require_user()?;
        let lines = self
            .call(StoreCall::ListCart, self.store.list_cart(user))
            .await?;
        Ok(Cart::with_lines(user.clone(), lines))
    }
}
