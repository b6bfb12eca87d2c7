//! In-process store backed by a json-server snapshot.

use crate::call::StoreCall;
use crate::error::StoreError;
use crate::records::{Product, User};
use crate::store::OrderStore;
use crate::wire::{CartDoc, OrderDoc, ProductDoc, Snapshot, UserDoc, VoucherDoc};
use async_trait::async_trait;
use checkout_core::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::trace;

/// An order store that keeps every collection in memory.
///
/// Records each call so tests can check which calls were made, and can be
/// told to fail or stall specific calls.
#[derive(Debug, Default)]
pub struct MemoryStore {
    db: RwLock<Snapshot>,
    calls: Mutex<Vec<StoreCall>>,
    failures: Mutex<HashMap<StoreCall, StoreError>>,
    delays: Mutex<HashMap<StoreCall, Duration>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot from JSON text.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            db: RwLock::new(snapshot),
            ..Self::default()
        }
    }

    /// Load a `db.json` file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Connection(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Write the current contents back as a `db.json` file.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&*self.db.read().await)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| StoreError::Connection(format!("{}: {e}", path.display())))
    }

    /// A copy of the current contents.
    pub async fn snapshot(&self) -> Snapshot {
        self.db.read().await.clone()
    }

    pub async fn insert_product(&self, product: &Product) {
        self.db.write().await.products.push(ProductDoc::from(product));
    }

    pub async fn insert_user(&self, user: &User) {
        self.db.write().await.users.push(UserDoc::from(user));
    }

    pub async fn insert_voucher(&self, voucher: &Voucher) {
        self.db.write().await.vouchers.push(VoucherDoc::from(voucher));
    }

    pub async fn insert_order(&self, order: &Order) {
        self.db.write().await.orders.push(OrderDoc::from(order));
    }

    pub async fn insert_cart_line(&self, user_id: &UserId, line: &CartLine) {
        self.db.write().await.cart.push(CartDoc::from_line(line, Some(user_id)));
    }

    /// Calls made so far, in order.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    /// Whether any write call was made.
    pub async fn has_written(&self) -> bool {
        self.calls.lock().await.iter().any(StoreCall::is_write)
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    /// Make every future `call` fail with `error`.
    pub async fn fail_on(&self, call: StoreCall, error: StoreError) {
        self.failures.lock().await.insert(call, error);
    }

    /// Make every future `call` sleep before answering.
    pub async fn delay_on(&self, call: StoreCall, delay: Duration) {
        self.delays.lock().await.insert(call, delay);
    }

    pub async fn clear_failures(&self) {
        self.failures.lock().await.clear();
        self.delays.lock().await.clear();
    }

    async fn enter(&self, call: StoreCall) -> Result<(), StoreError> {
        trace!(call = %call, "memory store call");
        self.calls.lock().await.push(call);
        let delay = self.delays.lock().await.get(&call).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.lock().await.get(&call) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn orders_where(&self, pred: impl Fn(&Order) -> bool) -> Vec<Order> {
        self.db
            .read()
            .await
            .orders
            .iter()
            .cloned()
            .map(Order::from)
            .filter(|o| pred(o))
            .collect()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn get_voucher_by_code(&self, code: &str) -> Result<Option<Voucher>, StoreError> {
        self.enter(StoreCall::GetVoucher).await?;
        let code = normalize_code(code);
        let doc = self
            .db
            .read()
            .await
            .vouchers
            .iter()
            .find(|v| normalize_code(&v.code) == code)
            .cloned();
        doc.map(|d| d.into_voucher(CATALOG_CURRENCY)).transpose()
    }

    async fn list_vouchers(&self) -> Result<Vec<Voucher>, StoreError> {
        self.enter(StoreCall::ListVouchers).await?;
        let docs = self.db.read().await.vouchers.clone();
        docs.into_iter().map(|d| d.into_voucher(CATALOG_CURRENCY)).collect()
    }

    async fn mark_voucher_used(&self, voucher_id: &VoucherId, user_id: &UserId) -> Result<(), StoreError> {
        self.enter(StoreCall::MarkVoucherUsed).await?;
        let mut db = self.db.write().await;
        let doc = db
            .vouchers
            .iter_mut()
            .find(|v| &v.id == voucher_id)
            .ok_or_else(|| StoreError::not_found("vouchers", voucher_id))?;
        if !doc.used_by.contains(user_id) {
            doc.used_by.push(user_id.clone());
        }
        Ok(())
    }

    async fn get_user(&self, user_id: &UserId) -> Result<User, StoreError> {
        self.enter(StoreCall::GetUser).await?;
        self.db
            .read()
            .await
            .users
            .iter()
            .find(|u| &u.id == user_id)
            .cloned()
            .map(User::from)
            .ok_or_else(|| StoreError::not_found("users", user_id))
    }

    async fn list_pending_orders(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError> {
        self.enter(StoreCall::ListPendingOrders).await?;
        Ok(self
            .orders_where(|o| &o.user_id == user_id && o.is_pending())
            .await)
    }

    async fn list_orders(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError> {
        self.enter(StoreCall::ListOrders).await?;
        Ok(self.orders_where(|o| &o.user_id == user_id).await)
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Order, StoreError> {
        self.enter(StoreCall::GetOrder).await?;
        self.orders_where(|o| &o.id == order_id)
            .await
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found("orders", order_id))
    }

    async fn create_order(&self, order: &Order) -> Result<Order, StoreError> {
        self.enter(StoreCall::CreateOrder).await?;
        let doc = OrderDoc::from(order);
        let mut db = self.db.write().await;
        if db.orders.iter().any(|o| o.id == doc.id) {
            return Err(StoreError::Http {
                status: 409,
                url: format!("/orders/{}", doc.id),
            });
        }
        db.orders.push(doc.clone());
        Ok(Order::from(doc))
    }

    async fn update_order(&self, order: &Order) -> Result<Order, StoreError> {
        self.enter(StoreCall::UpdateOrder).await?;
        let mut db = self.db.write().await;
        let slot = db
            .orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or_else(|| StoreError::not_found("orders", &order.id))?;
        let extra = std::mem::take(&mut slot.extra);
        *slot = OrderDoc::from(order);
        slot.extra = extra;
        Ok(Order::from(slot.clone()))
    }

    async fn get_product(&self, product_id: &ProductId) -> Result<Product, StoreError> {
        self.enter(StoreCall::GetProduct).await?;
        self.db
            .read()
            .await
            .products
            .iter()
            .find(|p| &p.id == product_id)
            .cloned()
            .map(|p| p.into_product(CATALOG_CURRENCY))
            .ok_or_else(|| StoreError::not_found("products", product_id))
    }

    async fn update_product_stock(&self, product_id: &ProductId, stock: i64) -> Result<(), StoreError> {
        self.enter(StoreCall::UpdateStock).await?;
        let mut db = self.db.write().await;
        let product = db
            .products
            .iter_mut()
            .find(|p| &p.id == product_id)
            .ok_or_else(|| StoreError::not_found("products", product_id))?;
        product.stock = stock;
        Ok(())
    }

    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartLine>, StoreError> {
        self.enter(StoreCall::ListCart).await?;
        Ok(self
            .db
            .read()
            .await
            .cart
            .iter()
            .filter(|c| c.user_id.as_ref() == Some(user_id))
            .map(|c| c.to_line(CATALOG_CURRENCY))
            .collect())
    }

    async fn remove_cart_line(&self, line_id: &CartLineId, user_id: &UserId) -> Result<(), StoreError> {
        self.enter(StoreCall::RemoveCartLine).await?;
        let mut db = self.db.write().await;
        let before = db.cart.len();
        db.cart
            .retain(|c| !(&c.id == line_id && c.belongs_to(user_id)));
        if db.cart.len() == before {
            return Err(StoreError::not_found("cart", line_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    const DB: &str = r#"{
        "products": [{ "id": 1, "name": "Linen Shirt", "price": 250000, "stock": 5 }],
        "users": [{ "id": "u1", "name": "An", "email": "an@example.com", "password": "x" }],
        "cart": [
            { "id": 10, "userId": "u1", "productId": 1, "name": "Linen Shirt", "price": 250000, "quantity": 2, "size": "M", "stock": 5 },
            { "id": 11, "userId": "u2", "productId": 1, "name": "Linen Shirt", "price": 250000, "quantity": 1, "size": "L", "stock": 5 }
        ],
        "orders": [],
        "vouchers": [{
            "id": 1, "code": "SALE10", "type": "percentage", "discount": 10, "minOrder": 0,
            "startDate": "2025-01-01", "endDate": "2025-12-31", "usedBy": []
        }],
        "vietnam-addresses": []
    }"#;

    #[tokio::test]
    async fn test_snapshot_lookups() {
        let store = MemoryStore::from_json(DB).unwrap();
        let voucher = store.get_voucher_by_code("sale10").await.unwrap().unwrap();
        assert_eq!(voucher.discount, DiscountValue::Percentage(Decimal::from(10)));
        assert!(store.get_voucher_by_code("NOPE").await.unwrap().is_none());

        let user = store.get_user(&UserId::new("u1")).await.unwrap();
        assert_eq!(user.email, "an@example.com");

        let cart = store.list_cart(&UserId::new("u1")).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].unit_price, Money::vnd(250_000));
    }

    #[tokio::test]
    async fn test_mark_voucher_used_is_idempotent() {
        let store = MemoryStore::from_json(DB).unwrap();
        let user = UserId::new("u1");
        store.mark_voucher_used(&VoucherId::new("1"), &user).await.unwrap();
        store.mark_voucher_used(&VoucherId::new("1"), &user).await.unwrap();
        let voucher = store.get_voucher_by_code("SALE10").await.unwrap().unwrap();
        assert_eq!(voucher.used_by, vec![user]);
    }

    #[tokio::test]
    async fn test_remove_cart_line_scoped_to_user() {
        let store = MemoryStore::from_json(DB).unwrap();
        let err = store
            .remove_cart_line(&CartLineId::new("11"), &UserId::new("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { collection: "cart", .. }));
        store
            .remove_cart_line(&CartLineId::new("10"), &UserId::new("u1"))
            .await
            .unwrap();
        assert!(store.list_cart(&UserId::new("u1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_orders_round_trip_and_pending_filter() {
        let store = MemoryStore::new();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let lines = vec![CartLine::new("10", "1", "Linen Shirt", Money::vnd(250_000), 2, "M", 5)];
        let draft = OrderDraft::new(lines, ShippingMethodCode::Standard, PaymentMethod::Cod).unwrap();
        let user = UserId::new("u1");

        let mut order = Order::from_draft(Order::generate_id(now), user.clone(), &draft, now);
        let stored = store.create_order(&order).await.unwrap();
        assert_eq!(stored, order);
        assert!(store.create_order(&order).await.is_err());

        order.record_status(OrderStatus::Delivered, None, now + chrono::Duration::days(2));
        store.update_order(&order).await.unwrap();
        assert!(store.list_pending_orders(&user).await.unwrap().is_empty());
        assert_eq!(store.list_orders(&user).await.unwrap().len(), 1);
        assert_eq!(store.get_order(&order.id).await.unwrap().status_history.len(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure_and_call_log() {
        let store = MemoryStore::from_json(DB).unwrap();
        store
            .fail_on(StoreCall::UpdateStock, StoreError::Connection("reset".into()))
            .await;
        let err = store
            .update_product_stock(&ProductId::new("1"), 3)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store.calls().await, vec![StoreCall::UpdateStock]);
        assert!(store.has_written().await);

        store.clear_failures().await;
        store.update_product_stock(&ProductId::new("1"), 3).await.unwrap();
        assert_eq!(store.get_product(&ProductId::new("1")).await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_unrelated_collections_kept() {
        let store = MemoryStore::from_json(DB).unwrap();
        let snapshot = store.snapshot().await;
        assert!(snapshot.other.contains_key("vietnam-addresses"));
        assert_eq!(snapshot.users[0].extra["password"], "x");
    }
}
