//! End-to-end checkout flows against the in-memory store.

use checkout_core::prelude::*;
use checkout_engine::{CheckoutEngine, EngineConfig, EngineError, PostCommitStep};
use checkout_store::{MemoryStore, OrderStore, Product, StoreCall, StoreError};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn user() -> UserId {
    UserId::new("u1")
}

fn session() -> Session {
    Session::user("u1")
}

fn shirt_line(quantity: i64) -> CartLine {
    CartLine::new("c1", "p1", "Linen Shirt", Money::vnd(250_000), quantity, "M", 10)
}

fn address() -> ShippingAddress {
    ShippingAddress::new("Nguyen An", "0901234567", "Ha Noi", "Ba Dinh", "12 Kim Ma")
}

fn draft_with(lines: Vec<CartLine>, payment: PaymentMethod) -> OrderDraft {
    let mut draft = OrderDraft::new(lines, ShippingMethodCode::Standard, payment).unwrap();
    draft.set_shipping_address(address());
    draft
}

fn percent_voucher(id: &str, code: &str, percent: i64, min_order: i64) -> Voucher {
    Voucher::new(
        id,
        code,
        DiscountValue::Percentage(Decimal::from(percent)),
        now() - Duration::days(10),
        now() + Duration::days(10),
    )
    .with_min_order(Money::vnd(min_order))
}

async fn seeded() -> (Arc<MemoryStore>, CheckoutEngine<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_product(&Product {
            id: ProductId::new("p1"),
            name: "Linen Shirt".into(),
            price: Money::vnd(250_000),
            stock: 10,
        })
        .await;
    store
        .insert_product(&Product {
            id: ProductId::new("p2"),
            name: "Canvas Tote".into(),
            price: Money::vnd(170_000),
            stock: 3,
        })
        .await;
    store.insert_cart_line(&user(), &shirt_line(2)).await;
    store.insert_voucher(&percent_voucher("v1", "SALE10", 10, 400_000)).await;

    let engine = CheckoutEngine::new(Arc::clone(&store));
    (store, engine)
}

async fn pending_order(store: &MemoryStore) {
    let draft = draft_with(vec![shirt_line(1)], PaymentMethod::Cod);
    let order = Order::from_draft(Order::generate_id(now()), user(), &draft, now());
    store.insert_order(&order).await;
}

#[tokio::test]
async fn test_percentage_voucher_on_subtotal_plus_shipping() {
    let (store, engine) = seeded().await;
    let mut draft = draft_with(vec![shirt_line(2)], PaymentMethod::Cod);
    assert_eq!(draft.order_total(), Money::vnd(530_000));

    let applied = engine
        .apply_voucher(&session(), &mut draft, "sale10", now())
        .await
        .unwrap();
    assert_eq!(applied.discount, Money::vnd(53_000));
    assert_eq!(draft.total(), Money::vnd(477_000));

    let placement = engine.place_order(&session(), &draft, now()).await.unwrap();
    assert!(placement.is_clean(), "{:?}", placement.warnings);
    assert_eq!(placement.order.total, Money::vnd(477_000));
    assert_eq!(placement.order.order_status, OrderStatus::Pending);
    assert!(placement.order.verify_total().is_ok());

    assert_eq!(store.get_product(&ProductId::new("p1")).await.unwrap().stock, 8);
    let voucher = store.get_voucher_by_code("SALE10").await.unwrap().unwrap();
    assert_eq!(voucher.used_by, vec![user()]);
    assert!(store.list_cart(&user()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_min_order_not_met_reports_shortfall_and_clears_voucher() {
    let (store, engine) = seeded().await;
    store.insert_voucher(&percent_voucher("v2", "BIG600", 10, 600_000)).await;
    let mut draft = draft_with(vec![shirt_line(2)], PaymentMethod::Cod);

    engine
        .apply_voucher(&session(), &mut draft, "SALE10", now())
        .await
        .unwrap();
    let err = engine
        .apply_voucher(&session(), &mut draft, "BIG600", now())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::Voucher(VoucherRejection::MinOrderNotMet {
            code: "BIG600".into(),
            min_order: Money::vnd(600_000),
            shortfall: Money::vnd(70_000),
        })
    );
    assert!(draft.voucher().is_none());
    assert_eq!(draft.total(), Money::vnd(530_000));
}

#[tokio::test]
async fn test_expired_voucher_rejected_before_min_order() {
    let (store, engine) = seeded().await;
    let mut expired = percent_voucher("v3", "OLD", 10, 9_000_000);
    expired.starts_at = now() - Duration::days(60);
    expired.ends_at = now() - Duration::days(30);
    store.insert_voucher(&expired).await;

    let mut draft = draft_with(vec![shirt_line(2)], PaymentMethod::Cod);
    let err = engine
        .apply_voucher(&session(), &mut draft, "old", now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Voucher(VoucherRejection::Expired { .. })));
}

#[tokio::test]
async fn test_pending_cap_blocks_before_any_write() {
    let (store, engine) = seeded().await;
    for _ in 0..5 {
        pending_order(&store).await;
    }
    store.clear_calls().await;

    let draft = draft_with(vec![shirt_line(2)], PaymentMethod::Cod);
    let err = engine.place_order(&session(), &draft, now()).await.unwrap_err();

    assert_eq!(err, EngineError::TooManyPendingOrders { pending: 5, cap: 5 });
    assert_eq!(store.calls().await, vec![StoreCall::ListPendingOrders]);
    assert!(!store.has_written().await);
}

#[tokio::test]
async fn test_pending_cap_counts_awaiting_payment_only_while_open() {
    let (store, engine) = seeded().await;
    for _ in 0..4 {
        pending_order(&store).await;
    }
    let online = draft_with(vec![shirt_line(1)], PaymentMethod::EWallet);
    engine.place_order(&session(), &online, now()).await.unwrap();

    let draft = draft_with(vec![shirt_line(1)], PaymentMethod::Cod);
    assert!(matches!(
        engine.place_order(&session(), &draft, now()).await,
        Err(EngineError::TooManyPendingOrders { pending: 5, .. })
    ));

    let config = EngineConfig::default().with_max_pending_orders(6);
    let roomier = CheckoutEngine::with_config(Arc::clone(&store), config);
    assert!(roomier.place_order(&session(), &draft, now()).await.is_ok());
}

#[tokio::test]
async fn test_fixed_discount_capped_to_zero_total() {
    let (store, engine) = seeded().await;
    let voucher = Voucher::new(
        "v4",
        "MILLION",
        DiscountValue::Fixed(Money::vnd(1_000_000)),
        now() - Duration::days(1),
        now() + Duration::days(1),
    );
    store.insert_voucher(&voucher).await;

    let tote = CartLine::new("c2", "p2", "Canvas Tote", Money::vnd(170_000), 1, "", 3);
    let mut draft = draft_with(vec![tote], PaymentMethod::Cod);
    assert_eq!(draft.order_total(), Money::vnd(200_000));

    let applied = engine
        .apply_voucher(&session(), &mut draft, "MILLION", now())
        .await
        .unwrap();
    assert_eq!(applied.discount, Money::vnd(200_000));
    assert_eq!(draft.total(), Money::vnd(0));

    let placement = engine.place_order(&session(), &draft, now()).await.unwrap();
    assert_eq!(placement.order.total, Money::vnd(0));
    assert!(!placement.order.total.is_negative());
}

#[tokio::test]
async fn test_revalidation_is_idempotent_and_read_only() {
    let (store, engine) = seeded().await;
    let mut draft = draft_with(vec![shirt_line(2)], PaymentMethod::Cod);

    let first = engine
        .apply_voucher(&session(), &mut draft, "SALE10", now())
        .await
        .unwrap();
    let second = engine
        .apply_voucher(&session(), &mut draft, "SALE10", now())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(draft.total(), Money::vnd(477_000));
    assert!(!store.has_written().await);
    let voucher = store.get_voucher_by_code("SALE10").await.unwrap().unwrap();
    assert!(voucher.used_by.is_empty());
}

#[tokio::test]
async fn test_voucher_cannot_be_reused_after_commit() {
    let (store, engine) = seeded().await;
    let mut draft = draft_with(vec![shirt_line(2)], PaymentMethod::Cod);
    engine
        .apply_voucher(&session(), &mut draft, "SALE10", now())
        .await
        .unwrap();
    engine.place_order(&session(), &draft, now()).await.unwrap();

    store.insert_cart_line(&user(), &shirt_line(2)).await;
    let mut again = draft_with(vec![shirt_line(2)], PaymentMethod::Cod);
    let err = engine
        .apply_voucher(&session(), &mut again, "SALE10", now())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Voucher(VoucherRejection::AlreadyUsed { code: "SALE10".into() })
    );
}

#[tokio::test]
async fn test_voucher_revalidated_at_commit() {
    let (store, engine) = seeded().await;
    let mut draft = draft_with(vec![shirt_line(2)], PaymentMethod::Cod);
    engine
        .apply_voucher(&session(), &mut draft, "SALE10", now())
        .await
        .unwrap();

    // Consumed from another tab between apply and place.
    store.mark_voucher_used(&VoucherId::new("v1"), &user()).await.unwrap();
    store.clear_calls().await;

    let err = engine.place_order(&session(), &draft, now()).await.unwrap_err();
    assert_eq!(err.kind(), "already_used");
    assert!(!store.has_written().await);
    assert!(store.list_orders(&user()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_post_commit_failures_do_not_undo_order() {
    let (store, engine) = seeded().await;
    store
        .fail_on(StoreCall::UpdateStock, StoreError::Connection("reset by peer".into()))
        .await;

    let draft = draft_with(vec![shirt_line(2)], PaymentMethod::Cod);
    let placement = engine.place_order(&session(), &draft, now()).await.unwrap();

    assert_eq!(placement.warnings.len(), 1);
    assert_eq!(
        placement.warnings[0].step,
        PostCommitStep::Stock {
            product_id: ProductId::new("p1")
        }
    );
    assert!(store.get_order(&placement.order.id).await.is_ok());
    assert!(store.list_cart(&user()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cart_cleanup_failure_is_reported() {
    let (_store, engine) = seeded().await;
    let stray = CartLine::new("c9", "p1", "Linen Shirt", Money::vnd(250_000), 1, "L", 10);
    let draft = draft_with(vec![stray], PaymentMethod::Cod);

    let placement = engine.place_order(&session(), &draft, now()).await.unwrap();
    assert!(matches!(
        placement.warnings.as_slice(),
        [w] if matches!(w.step, PostCommitStep::CartCleanup { .. })
    ));
}

#[tokio::test]
async fn test_stock_never_goes_negative() {
    let (store, engine) = seeded().await;
    store.update_product_stock(&ProductId::new("p1"), 1).await.unwrap();

    let draft = draft_with(vec![shirt_line(2)], PaymentMethod::Cod);
    engine.place_order(&session(), &draft, now()).await.unwrap();
    assert_eq!(store.get_product(&ProductId::new("p1")).await.unwrap().stock, 0);
}

#[tokio::test]
async fn test_online_payment_two_phase() {
    let (store, engine) = seeded().await;
    let draft = draft_with(vec![shirt_line(2)], PaymentMethod::Card);

    let placement = engine.place_order(&session(), &draft, now()).await.unwrap();
    let order = placement.order;
    assert_eq!(order.order_status, OrderStatus::AwaitingPayment);
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);

    let later = now() + Duration::minutes(3);
    let confirmed = engine.confirm_payment(&order.id, later).await.unwrap();
    assert_eq!(confirmed.order_status, OrderStatus::Pending);
    assert_eq!(confirmed.payment_status, PaymentStatus::Paid);
    assert_eq!(confirmed.status_history.len(), 2);
    assert_eq!(confirmed.status_history[1].timestamp, later);

    // Confirming twice is harmless.
    let again = engine.confirm_payment(&order.id, later).await.unwrap();
    assert_eq!(again, confirmed);
    assert_eq!(store.get_order(&order.id).await.unwrap().status_history.len(), 2);
}

#[tokio::test]
async fn test_failed_payment_cancels_and_restocks() {
    let (store, engine) = seeded().await;
    let draft = draft_with(vec![shirt_line(2)], PaymentMethod::Qr);
    let order = engine.place_order(&session(), &draft, now()).await.unwrap().order;
    assert_eq!(store.get_product(&ProductId::new("p1")).await.unwrap().stock, 8);

    let (cancelled, warnings) = engine
        .fail_payment(&order.id, "QR expired", now() + Duration::minutes(15))
        .await
        .unwrap();
    assert!(warnings.is_empty());
    assert_eq!(cancelled.order_status, OrderStatus::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Failed);
    assert_eq!(cancelled.status_history[1].note, "Payment failed: QR expired");
    assert_eq!(store.get_product(&ProductId::new("p1")).await.unwrap().stock, 10);

    let err = engine.confirm_payment(&order.id, now()).await.unwrap_err();
    assert!(matches!(err, EngineError::PaymentNotAwaited { .. }));
}

#[tokio::test]
async fn test_failed_payment_restocks_only_units_taken() {
    let (store, engine) = seeded().await;
    let p1 = ProductId::new("p1");
    store.update_product_stock(&p1, 1).await.unwrap();

    let draft = draft_with(vec![shirt_line(2)], PaymentMethod::Card);
    let order = engine.place_order(&session(), &draft, now()).await.unwrap().order;
    assert_eq!(store.get_product(&p1).await.unwrap().stock, 0);
    assert_eq!(
        order.reserved_stock,
        vec![StockReservation {
            product_id: p1.clone(),
            quantity: 1
        }]
    );
    assert_eq!(store.get_order(&order.id).await.unwrap().reserved_stock, order.reserved_stock);

    let (cancelled, warnings) = engine
        .fail_payment(&order.id, "declined", now() + Duration::minutes(5))
        .await
        .unwrap();
    assert!(warnings.is_empty());
    assert!(cancelled.reserved_stock.is_empty());
    assert_eq!(store.get_product(&p1).await.unwrap().stock, 1);
}

#[tokio::test]
async fn test_failed_payment_skips_lines_never_decremented() {
    let (store, engine) = seeded().await;
    store
        .fail_on(StoreCall::UpdateStock, StoreError::Connection("reset by peer".into()))
        .await;

    let draft = draft_with(vec![shirt_line(2)], PaymentMethod::Card);
    let placement = engine.place_order(&session(), &draft, now()).await.unwrap();
    assert!(placement.order.reserved_stock.is_empty());
    store.clear_failures().await;
    store.clear_calls().await;

    let (_, warnings) = engine
        .fail_payment(&placement.order.id, "declined", now() + Duration::minutes(5))
        .await
        .unwrap();
    assert!(warnings.is_empty());
    assert_eq!(store.get_product(&ProductId::new("p1")).await.unwrap().stock, 10);
    assert!(!store.calls().await.contains(&StoreCall::UpdateStock));
}

#[tokio::test]
async fn test_cod_order_cannot_be_confirmed_as_paid_online() {
    let (_store, engine) = seeded().await;
    let draft = draft_with(vec![shirt_line(1)], PaymentMethod::Cod);
    let order = engine.place_order(&session(), &draft, now()).await.unwrap().order;
    assert!(matches!(
        engine.confirm_payment(&order.id, now()).await,
        Err(EngineError::PaymentNotAwaited {
            status: OrderStatus::Pending,
            ..
        })
    ));
}

#[tokio::test]
async fn test_status_updates_append_history() {
    let (_store, engine) = seeded().await;
    let draft = draft_with(vec![shirt_line(1)], PaymentMethod::Cod);
    let order = engine.place_order(&session(), &draft, now()).await.unwrap().order;

    let shipped = engine
        .update_status(&order.id, OrderStatus::Shipped, None, now() + Duration::days(1))
        .await
        .unwrap();
    let reopened = engine
        .update_status(
            &order.id,
            OrderStatus::Processing,
            Some("Returned to warehouse"),
            now() + Duration::days(2),
        )
        .await
        .unwrap();

    assert_eq!(shipped.status_history.last().unwrap().note, "Status changed to shipped");
    assert_eq!(reopened.order_status, OrderStatus::Processing);
    assert_eq!(reopened.status_history.len(), 3);
    assert_eq!(reopened.status_history[..2], shipped.status_history[..]);
    assert_eq!(reopened.total, order.total);
}

#[tokio::test]
async fn test_anonymous_session_makes_no_calls() {
    let (store, engine) = seeded().await;
    let mut draft = draft_with(vec![shirt_line(1)], PaymentMethod::Cod);

    let anonymous = Session::anonymous();
    assert_eq!(
        engine.place_order(&anonymous, &draft, now()).await,
        Err(EngineError::NotAuthenticated)
    );
    assert_eq!(
        engine.apply_voucher(&anonymous, &mut draft, "SALE10", now()).await,
        Err(EngineError::NotAuthenticated)
    );
    assert!(store.calls().await.is_empty());
}

#[tokio::test]
async fn test_incomplete_address_rejected_locally() {
    let (store, engine) = seeded().await;
    let draft = OrderDraft::new(vec![shirt_line(1)], ShippingMethodCode::Express, PaymentMethod::Cod).unwrap();

    let err = engine.place_order(&session(), &draft, now()).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Checkout(CheckoutError::IncompleteAddress(_))
    ));
    assert!(store.calls().await.is_empty());
}

#[tokio::test]
async fn test_store_timeout_is_retryable_and_keeps_draft() {
    let store = Arc::new(MemoryStore::new());
    store.insert_voucher(&percent_voucher("v1", "SALE10", 10, 0)).await;
    store
        .delay_on(StoreCall::GetVoucher, std::time::Duration::from_millis(500))
        .await;
    let config = EngineConfig::default().with_store_timeout(std::time::Duration::from_millis(20));
    let engine = CheckoutEngine::with_config(Arc::clone(&store), config);

    let mut draft = draft_with(vec![shirt_line(1)], PaymentMethod::Cod);
    let before = draft.clone();
    let err = engine
        .apply_voucher(&session(), &mut draft, "SALE10", now())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Store(StoreError::Timeout {
            call: StoreCall::GetVoucher,
            ..
        })
    ));
    assert!(err.is_retryable());
    assert_eq!(draft, before);
}

#[tokio::test]
async fn test_available_vouchers_and_history() {
    let (store, engine) = seeded().await;
    let mut used = percent_voucher("v5", "USED", 5, 0);
    used.used_by.push(user());
    store.insert_voucher(&used).await;
    store
        .insert_voucher(&percent_voucher("v6", "VIP", 20, 0).with_eligible_users([UserId::new("u2")]))
        .await;

    let offered = engine.available_vouchers(&session(), now()).await.unwrap();
    let codes: Vec<_> = offered.iter().map(|v| v.code.as_str()).collect();
    assert_eq!(codes, vec!["SALE10"]);

    let draft = draft_with(vec![shirt_line(1)], PaymentMethod::Cod);
    let first = engine.place_order(&session(), &draft, now()).await.unwrap().order;
    store.insert_cart_line(&user(), &shirt_line(1)).await;
    let second = engine
        .place_order(&session(), &draft, now() + Duration::hours(1))
        .await
        .unwrap()
        .order;

    let history = engine.orders_for(&session()).await.unwrap();
    assert_eq!(
        history.iter().map(|o| o.id.clone()).collect::<Vec<_>>(),
        vec![second.id, first.id]
    );
    assert!(engine.has_purchased(&session(), &ProductId::new("p1")).await.unwrap());
    assert!(!engine.has_purchased(&session(), &ProductId::new("p2")).await.unwrap());
}

#[tokio::test]
async fn test_engine_over_trait_object() {
    let store: Arc<dyn OrderStore> = Arc::new(MemoryStore::new());
    let engine = CheckoutEngine::new(store);
    assert!(engine.orders_for(&session()).await.unwrap().is_empty());
    assert!(engine.cart(&session()).await.unwrap().is_empty());
}
