//! The order store seam.

use crate::error::StoreError;
use crate::records::{Product, User};
use async_trait::async_trait;
use checkout_core::prelude::*;

/// Persistence collaborator for checkout.
///
/// Every method is one round trip to the backing document store. Nothing
/// here is transactional; callers own ordering and consistency.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Look a voucher up by code. Codes compare uppercased.
    async fn get_voucher_by_code(&self, code: &str) -> Result<Option<Voucher>, StoreError>;

    /// Every voucher.
    async fn list_vouchers(&self) -> Result<Vec<Voucher>, StoreError>;

    /// Append a user to a voucher's `used_by`. Idempotent.
    async fn mark_voucher_used(&self, voucher_id: &VoucherId, user_id: &UserId) -> Result<(), StoreError>;

    async fn get_user(&self, user_id: &UserId) -> Result<User, StoreError>;

    /// The user's orders still counting against the pending cap.
    async fn list_pending_orders(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError>;

    /// All of the user's orders.
    async fn list_orders(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError>;

    async fn get_order(&self, order_id: &OrderId) -> Result<Order, StoreError>;

    /// Persist a new order and return it as stored.
    async fn create_order(&self, order: &Order) -> Result<Order, StoreError>;

    /// Replace a stored order.
    async fn update_order(&self, order: &Order) -> Result<Order, StoreError>;

    async fn get_product(&self, product_id: &ProductId) -> Result<Product, StoreError>;

    /// Set a product's stock level.
    async fn update_product_stock(&self, product_id: &ProductId, stock: i64) -> Result<(), StoreError>;

    /// The user's live cart.
    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartLine>, StoreError>;

    async fn remove_cart_line(&self, line_id: &CartLineId, user_id: &UserId) -> Result<(), StoreError>;
}
