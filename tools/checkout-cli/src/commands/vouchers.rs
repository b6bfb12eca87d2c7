//! List the vouchers a customer can use.

use anyhow::Result;
use checkout_core::prelude::*;
use chrono::Utc;

use super::VouchersArgs;
use crate::context::Context;
use crate::output::describe_discount;

/// Run the vouchers command.
pub async fn run(args: VouchersArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.connect().await?;
    let session = Session::user(args.user.as_str());
    let vouchers = conn.engine.available_vouchers(&session, Utc::now()).await?;

    if ctx.output.is_json() {
        ctx.output.json(&vouchers);
        return Ok(());
    }

    if vouchers.is_empty() {
        ctx.output.info(&format!("No vouchers available for {}", args.user));
        return Ok(());
    }

    ctx.output.header(&format!("Vouchers for {}", args.user));
    let widths = [12, 18, 16, 12];
    ctx.output.table_row(&["CODE", "DISCOUNT", "MIN ORDER", "ENDS"], &widths);
    for voucher in &vouchers {
        let discount = describe_discount(&voucher.discount);
        let min_order = voucher.min_order.display();
        let ends = voucher.ends_at.format("%Y-%m-%d").to_string();
        ctx.output.table_row(
            &[voucher.code.as_str(), discount.as_str(), min_order.as_str(), ends.as_str()],
            &widths,
        );
    }

    Ok(())
}
