//! Payment provider callbacks for online orders.

use anyhow::Result;
use checkout_core::prelude::*;
use chrono::Utc;
use serde_json::json;

use super::{PaymentArgs, PaymentCommand};
use crate::context::Context;

/// Run the payment command.
pub async fn run(args: PaymentArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.connect().await?;

    match args.command {
        PaymentCommand::Confirm { order } => {
            let order = conn
                .engine
                .confirm_payment(&OrderId::new(order), Utc::now())
                .await?;
            conn.persist().await?;

            if ctx.output.is_json() {
                ctx.output.json(&order);
                return Ok(());
            }
            ctx.output.success(&format!("Payment received for order {}", order.id));
        }
        PaymentCommand::Fail { order, reason } => {
            let (order, warnings) = conn
                .engine
                .fail_payment(&OrderId::new(order), &reason, Utc::now())
                .await?;
            conn.persist().await?;

            if ctx.output.is_json() {
                ctx.output.json(&json!({ "order": order, "warnings": warnings }));
                return Ok(());
            }
            ctx.output.warn(&format!("Order {} cancelled: {}", order.id, reason));
            for warning in &warnings {
                ctx.output.warn(&format!("{} failed: {}", warning.step, warning.error));
            }
        }
    }

    Ok(())
}
