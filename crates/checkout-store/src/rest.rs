//! REST client for the json-server document store.

use crate::call::StoreCall;
use crate::error::StoreError;
use crate::records::{Product, User};
use crate::store::OrderStore;
use crate::wire::{CartDoc, OrderDoc, ProductDoc, UserDoc, VoucherDoc};
use async_trait::async_trait;
use checkout_core::prelude::*;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Order store speaking the json-server REST API.
///
/// No automatic retries; callers decide using `StoreError::is_retryable`.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl RestStore {
    /// Create a client for `base_url` (e.g. `http://localhost:3001`).
    ///
    /// `timeout` bounds each HTTP request as a whole.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        call: StoreCall,
        collection: &'static str,
        id: Option<&str>,
        request: RequestBuilder,
    ) -> Result<T, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(call, self.timeout, e))?;
        let status = response.status();
        let url = response.url().to_string();
        debug!(call = %call, status = status.as_u16(), url = %url, "store response");

        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(collection, id.unwrap_or(url.as_str())));
        }
        if !status.is_success() {
            return Err(StoreError::Http {
                status: status.as_u16(),
                url,
            });
        }
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("{url}: {e}")))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        call: StoreCall,
        collection: &'static str,
        id: Option<&str>,
        path: &str,
    ) -> Result<T, StoreError> {
        let request = self.client.get(self.url(path));
        self.send(call, collection, id, request).await
    }

    async fn user_orders(&self, call: StoreCall, user_id: &UserId) -> Result<Vec<Order>, StoreError> {
        let request = self
            .client
            .get(self.url("orders"))
            .query(&[("userId", user_id.as_str())]);
        let docs: Vec<OrderDoc> = self.send(call, "orders", None, request).await?;
        Ok(docs.into_iter().map(Order::from).collect())
    }
}

fn transport_error(call: StoreCall, after: Duration, e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout { call, after }
    } else if e.is_decode() {
        StoreError::Decode(e.to_string())
    } else {
        StoreError::Connection(e.to_string())
    }
}

#[async_trait]
impl OrderStore for RestStore {
    async fn get_voucher_by_code(&self, code: &str) -> Result<Option<Voucher>, StoreError> {
        let code = normalize_code(code);
        let request = self
            .client
            .get(self.url("vouchers"))
            .query(&[("code", code.as_str())]);
        let docs: Vec<VoucherDoc> = self
            .send(StoreCall::GetVoucher, "vouchers", None, request)
            .await?;
        docs.into_iter()
            .find(|d| normalize_code(&d.code) == code)
            .map(|d| d.into_voucher(CATALOG_CURRENCY))
            .transpose()
    }

    async fn list_vouchers(&self) -> Result<Vec<Voucher>, StoreError> {
        let docs: Vec<VoucherDoc> = self
            .get(StoreCall::ListVouchers, "vouchers", None, "vouchers")
            .await?;
        docs.into_iter().map(|d| d.into_voucher(CATALOG_CURRENCY)).collect()
    }

    async fn mark_voucher_used(&self, voucher_id: &VoucherId, user_id: &UserId) -> Result<(), StoreError> {
        let path = format!("vouchers/{voucher_id}");
        let mut doc: VoucherDoc = self
            .get(StoreCall::MarkVoucherUsed, "vouchers", Some(voucher_id.as_str()), &path)
            .await?;
        if doc.used_by.contains(user_id) {
            return Ok(());
        }
        doc.used_by.push(user_id.clone());
        let request = self
            .client
            .patch(self.url(&path))
            .json(&json!({ "usedBy": doc.used_by }));
        let _: serde_json::Value = self
            .send(StoreCall::MarkVoucherUsed, "vouchers", Some(voucher_id.as_str()), request)
            .await?;
        Ok(())
    }

    async fn get_user(&self, user_id: &UserId) -> Result<User, StoreError> {
        let doc: UserDoc = self
            .get(
                StoreCall::GetUser,
                "users",
                Some(user_id.as_str()),
                &format!("users/{user_id}"),
            )
            .await?;
        Ok(doc.into())
    }

    async fn list_pending_orders(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError> {
        let orders = self.user_orders(StoreCall::ListPendingOrders, user_id).await?;
        Ok(orders.into_iter().filter(Order::is_pending).collect())
    }

    async fn list_orders(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError> {
        self.user_orders(StoreCall::ListOrders, user_id).await
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Order, StoreError> {
        let doc: OrderDoc = self
            .get(
                StoreCall::GetOrder,
                "orders",
                Some(order_id.as_str()),
                &format!("orders/{order_id}"),
            )
            .await?;
        Ok(doc.into())
    }

    async fn create_order(&self, order: &Order) -> Result<Order, StoreError> {
        let request = self.client.post(self.url("orders")).json(&OrderDoc::from(order));
        let doc: OrderDoc = self
            .send(StoreCall::CreateOrder, "orders", None, request)
            .await?;
        Ok(doc.into())
    }

    async fn update_order(&self, order: &Order) -> Result<Order, StoreError> {
        let request = self
            .client
            .put(self.url(&format!("orders/{}", order.id)))
            .json(&OrderDoc::from(order));
        let doc: OrderDoc = self
            .send(StoreCall::UpdateOrder, "orders", Some(order.id.as_str()), request)
            .await?;
        Ok(doc.into())
    }

    async fn get_product(&self, product_id: &ProductId) -> Result<Product, StoreError> {
        let doc: ProductDoc = self
            .get(
                StoreCall::GetProduct,
                "products",
                Some(product_id.as_str()),
                &format!("products/{product_id}"),
            )
            .await?;
        Ok(doc.into_product(CATALOG_CURRENCY))
    }

    async fn update_product_stock(&self, product_id: &ProductId, stock: i64) -> Result<(), StoreError> {
        let request = self
            .client
            .patch(self.url(&format!("products/{product_id}")))
            .json(&json!({ "stock": stock }));
        let _: serde_json::Value = self
            .send(StoreCall::UpdateStock, "products", Some(product_id.as_str()), request)
            .await?;
        Ok(())
    }

    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartLine>, StoreError> {
        let request = self
            .client
            .get(self.url("cart"))
            .query(&[("userId", user_id.as_str())]);
        let docs: Vec<CartDoc> = self.send(StoreCall::ListCart, "cart", None, request).await?;
        Ok(docs.iter().map(|d| d.to_line(CATALOG_CURRENCY)).collect())
    }

    async fn remove_cart_line(&self, line_id: &CartLineId, user_id: &UserId) -> Result<(), StoreError> {
        debug!(line_id = %line_id, user_id = %user_id, "removing cart line");
        let path = format!("cart/{line_id}");
        let line: CartDoc = self
            .get(StoreCall::RemoveCartLine, "cart", Some(line_id.as_str()), &path)
            .await?;
        if !line.belongs_to(user_id) {
            return Err(StoreError::not_found("cart", line_id));
        }
        let request = self.client.delete(self.url(&path));
        let _: serde_json::Value = self
            .send(StoreCall::RemoveCartLine, "cart", Some(line_id.as_str()), request)
            .await?;
        Ok(())
    }
}
