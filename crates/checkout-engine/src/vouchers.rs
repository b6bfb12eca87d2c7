//! Voucher application on drafts.

use crate::engine::CheckoutEngine;
use crate::error::EngineError;
use checkout_core::prelude::*;
use checkout_store::{OrderStore, StoreCall};
use chrono::{DateTime, Utc};
use tracing::info;

impl<S: OrderStore + ?Sized> CheckoutEngine<S> {
    /// Validate `code` against the draft's order total and apply it.
    ///
    /// A rejection removes any voucher already on the draft, so a stale
    /// discount is never kept. Store failures leave the draft as it was.
    pub async fn apply_voucher(
        &self,
        session: &Session,
        draft: &mut OrderDraft,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<AppliedVoucher, EngineError> {
        let user = session.require_user()?;
        match self.check_voucher(code, user, draft.order_total(), now).await {
            Ok(applied) => {
                draft.apply_voucher(applied.clone())?;
                info!(
                    user_id = %user,
                    voucher = %applied.code,
                    discount = applied.discount.amount,
                    "voucher applied"
                );
                Ok(applied)
            }
            Err(e @ EngineError::Voucher(_)) => {
                draft.clear_voucher();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Vouchers to show the session's user: eligible, unexpired, unused.
    pub async fn available_vouchers(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<Vec<Voucher>, EngineError> {
        let user = session.require_user()?;
        let vouchers = self
            .call(StoreCall::ListVouchers, self.store.list_vouchers())
            .await?;
        Ok(available_vouchers(&vouchers, user, now)
            .into_iter()
            .cloned()
            .collect())
    }
}
