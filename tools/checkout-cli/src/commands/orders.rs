//! Order history and status changes.

use anyhow::{anyhow, Result};
use checkout_core::prelude::*;
use chrono::Utc;

use super::{OrdersArgs, OrdersCommand};
use crate::context::Context;
use crate::output::status_badge;

/// Run the orders command.
pub async fn run(args: OrdersArgs, ctx: &Context) -> Result<()> {
    match args.command {
        OrdersCommand::List { user } => list_orders(&user, ctx).await,
        OrdersCommand::Status { order, status, note } => {
            set_status(&order, &status, note.as_deref(), ctx).await
        }
    }
}

async fn list_orders(user: &str, ctx: &Context) -> Result<()> {
    let conn = ctx.connect().await?;
    let orders = conn.engine.orders_for(&Session::user(user)).await?;

    if ctx.output.is_json() {
        ctx.output.json(&orders);
        return Ok(());
    }

    if orders.is_empty() {
        ctx.output.info(&format!("No orders for {}", user));
        return Ok(());
    }

    ctx.output.header(&format!("Orders for {}", user));
    let widths = [24, 18, 16, 8];
    ctx.output.table_row(&["ORDER", "STATUS", "TOTAL", "ITEMS"], &widths);
    for order in &orders {
        let id = order.id.to_string();
        let badge = status_badge(order.order_status);
        let total = order.total.display();
        let items = order.item_count().to_string();
        ctx.output
            .table_row(&[id.as_str(), badge.as_str(), total.as_str(), items.as_str()], &widths);
    }

    Ok(())
}

async fn set_status(order_id: &str, status: &str, note: Option<&str>, ctx: &Context) -> Result<()> {
    let status: OrderStatus = status.parse().map_err(|e: String| anyhow!(e))?;
    let conn = ctx.connect().await?;
    let order = conn
        .engine
        .update_status(&OrderId::new(order_id), status, note, Utc::now())
        .await?;
    conn.persist().await?;

    if ctx.output.is_json() {
        ctx.output.json(&order);
        return Ok(());
    }

    ctx.output.success(&format!("Order {} is now {}", order.id, status_badge(order.order_status)));
    for entry in &order.status_history {
        ctx.output.kv(
            &entry.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            &format!("{}: {}", entry.status.display_name(), entry.note),
        );
    }

    Ok(())
}
