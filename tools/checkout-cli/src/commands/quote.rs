//! Price a checkout without placing it.

use anyhow::Result;
use checkout_core::prelude::*;
use checkout_engine::EngineError;
use chrono::Utc;
use serde::Serialize;

use super::QuoteArgs;
use crate::context::Context;

#[derive(Serialize)]
struct Quote<'a> {
    lines: &'a [CartLine],
    shipping_method: ShippingMethodCode,
    payment_method: PaymentMethod,
    #[serde(flatten)]
    breakdown: &'a PriceBreakdown,
    voucher: Option<&'a AppliedVoucher>,
    rejection: Option<VoucherRejection>,
}

/// Run the quote command.
pub async fn run(args: QuoteArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.connect().await?;
    let session = args.draft.session();
    let mut draft = args.draft.draft(&conn.engine, &session).await?;

    // A rejected voucher still yields a quote, without the discount.
    let mut rejection = None;
    if let Some(code) = &args.draft.voucher {
        match conn.engine.apply_voucher(&session, &mut draft, code, Utc::now()).await {
            Ok(_) => {}
            Err(EngineError::Voucher(reason)) => rejection = Some(reason),
            Err(e) => return Err(e.into()),
        }
    }

    if ctx.output.is_json() {
        ctx.output.json(&Quote {
            lines: draft.lines(),
            shipping_method: draft.shipping_method(),
            payment_method: draft.payment_method(),
            breakdown: draft.breakdown(),
            voucher: draft.voucher(),
            rejection,
        });
        return Ok(());
    }

    ctx.output.header(&format!("Quote for {}", args.draft.user));
    for line in draft.lines() {
        ctx.output.list_item(&format!(
            "{} ({}) x{} @ {}",
            line.name,
            line.size,
            line.quantity,
            line.unit_price.display()
        ));
    }

    let method = ShippingMethod::get(draft.shipping_method());
    ctx.output.kv("Shipping method", &format!("{} ({})", method.label, method.estimate_label));
    ctx.output.kv("Payment", draft.payment_method().display_name());
    if let Some(applied) = draft.voucher() {
        ctx.output.kv("Voucher", &applied.code);
    }
    ctx.output.breakdown(draft.breakdown());

    if let Some(reason) = rejection {
        ctx.output.warn(&reason.to_string());
    }

    Ok(())
}
