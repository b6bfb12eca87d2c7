//! Place an order.

use anyhow::{Context as _, Result};
use chrono::Utc;
use dialoguer::Confirm;

use super::PlaceArgs;
use crate::context::Context;

/// Run the place command.
pub async fn run(args: PlaceArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.connect().await?;
    let session = args.draft.session();
    let mut draft = args.draft.draft(&conn.engine, &session).await?;
    draft.set_shipping_address(args.shipping_address());
    if let Some(note) = &args.note {
        draft.set_note(note.as_str());
    }
    draft.ensure_ready()?;

    if let Some(code) = &args.draft.voucher {
        conn.engine
            .apply_voucher(&session, &mut draft, code, Utc::now())
            .await?;
    }

    ctx.output.header(&format!("Placing order for {}", args.draft.user));
    ctx.output.kv("Items", &draft.lines().len().to_string());
    ctx.output.kv("Payment", draft.payment_method().display_name());
    ctx.output.breakdown(draft.breakdown());

    if !args.yes && !ctx.output.is_json() {
        ctx.output.info("");
        let confirmed = Confirm::new()
            .with_prompt("Place this order?")
            .default(true)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Order not placed");
            return Ok(());
        }
    }

    let spinner = ctx.output.spinner("Placing order...");
    let placed = conn.engine.place_order(&session, &draft, Utc::now()).await;
    spinner.finish_and_clear();
    let placement = placed?;

    conn.persist().await.context("Order placed but the snapshot was not saved")?;

    if ctx.output.is_json() {
        ctx.output.json(&placement);
        return Ok(());
    }

    ctx.output.success(&format!("Order {} placed", placement.order.id));
    ctx.output.kv("Status", placement.order.order_status.display_name());
    ctx.output.kv("Total", &placement.order.total.display());
    for warning in &placement.warnings {
        ctx.output.warn(&format!("{} failed: {}", warning.step, warning.error));
    }

    Ok(())
}
