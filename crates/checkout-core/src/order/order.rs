//! Persisted orders.

use crate::cart::{compute_subtotal, CartLine};
use crate::error::CheckoutError;
use crate::ids::{OrderId, ProductId, UserId};
use crate::money::{Currency, Money};
use crate::order::{OrderDraft, ShippingAddress};
use crate::payment::{PaymentMethod, PaymentMode, PaymentStatus};
use crate::pricing::compute_total;
use crate::shipping::ShippingMethodCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order placed, awaiting processing.
    #[default]
    Pending,
    /// Placed with an online method, waiting for the payment provider.
    AwaitingPayment,
    /// Order confirmed.
    Confirmed,
    /// Order being prepared.
    Processing,
    /// Order shipped.
    Shipped,
    /// Order delivered.
    Delivered,
    /// Order cancelled.
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::AwaitingPayment => "awaiting_payment",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::AwaitingPayment => "Awaiting payment",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Counts against the per-user pending order cap.
    pub fn is_pending(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::AwaitingPayment)
    }

    pub fn all() -> [OrderStatus; 7] {
        [
            OrderStatus::Pending,
            OrderStatus::AwaitingPayment,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ]
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        OrderStatus::all()
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| format!("unknown order status: {s}"))
    }
}

/// One entry in an order's status log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub note: String,
}

/// Units taken from a product's stock when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReservation {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A placed order.
///
/// Lines are a snapshot taken at commit and are decoupled from the live
/// cart. The total never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,
    /// Customer.
    pub user_id: UserId,
    /// Purchased lines.
    pub lines: Vec<CartLine>,
    /// Shipping method used.
    pub shipping_method: ShippingMethodCode,
    /// Delivery address.
    pub shipping_address: ShippingAddress,
    /// How the customer pays.
    pub payment_method: PaymentMethod,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Order status.
    pub order_status: OrderStatus,
    /// Append-only status log.
    pub status_history: Vec<StatusEntry>,
    /// Sum of line totals.
    pub subtotal: Money,
    /// Shipping fee.
    pub shipping_fee: Money,
    /// Voucher discount.
    pub discount: Money,
    /// Amount payable.
    pub total: Money,
    /// Order currency.
    pub currency: Currency,
    /// Code of the voucher used, if any.
    #[serde(default)]
    pub voucher_code: Option<String>,
    /// Customer note.
    #[serde(default)]
    pub note: Option<String>,
    /// Stock actually removed at placement, per product. Only tracked while
    /// an online payment is outstanding.
    #[serde(default)]
    pub reserved_stock: Vec<StockReservation>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

static ORDER_SEQ: AtomicU64 = AtomicU64::new(0);

impl Order {
    /// Generate a new order id.
    pub fn generate_id(now: DateTime<Utc>) -> OrderId {
        let seq = ORDER_SEQ.fetch_add(1, Ordering::Relaxed);
        OrderId::new(format!("ORD-{}-{}", now.timestamp_millis(), seq))
    }

    /// Build the order record for a draft.
    ///
    /// Cash-on-delivery orders start `Pending`; online payments start
    /// `AwaitingPayment` until the provider confirms.
    pub fn from_draft(id: OrderId, user_id: UserId, draft: &OrderDraft, now: DateTime<Utc>) -> Self {
        let breakdown = draft.breakdown();
        let status = match draft.payment_method().mode() {
            PaymentMode::OnDelivery => OrderStatus::Pending,
            PaymentMode::Online => OrderStatus::AwaitingPayment,
        };
        Self {
            id,
            user_id,
            lines: draft.lines().to_vec(),
            shipping_method: draft.shipping_method(),
            shipping_address: draft.shipping_address().clone(),
            payment_method: draft.payment_method(),
            payment_status: PaymentStatus::Unpaid,
            order_status: status,
            status_history: vec![StatusEntry {
                status,
                timestamp: now,
                note: "Order placed".to_string(),
            }],
            subtotal: breakdown.subtotal,
            shipping_fee: breakdown.shipping_fee,
            discount: breakdown.discount,
            total: breakdown.total,
            currency: draft.currency(),
            voucher_code: draft.voucher().map(|v| v.code.clone()),
            note: draft.note().map(str::to_string),
            reserved_stock: Vec::new(),
            created_at: now,
        }
    }

    /// Move to a new status and append it to the history.
    ///
    /// Any status may follow any other. Existing entries are never touched.
    pub fn record_status(&mut self, status: OrderStatus, note: Option<&str>, now: DateTime<Utc>) {
        let note = match note {
            Some(note) if !note.trim().is_empty() => note.to_string(),
            _ => format!("Status changed to {status}"),
        };
        self.order_status = status;
        self.status_history.push(StatusEntry {
            status,
            timestamp: now,
            note,
        });
    }

    pub fn is_pending(&self) -> bool {
        self.order_status.is_pending()
    }

    /// Note `quantity` units of a product as taken from stock.
    pub fn reserve(&mut self, product_id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            return;
        }
        match self.reserved_stock.iter_mut().find(|r| &r.product_id == product_id) {
            Some(reservation) => reservation.quantity += quantity,
            None => self.reserved_stock.push(StockReservation {
                product_id: product_id.clone(),
                quantity,
            }),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Get total item count.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn contains_product(&self, product_id: &ProductId) -> bool {
        self.lines.iter().any(|l| &l.product_id == product_id)
    }

    /// Re-derive the total from the line snapshot and compare it with the
    /// stored one.
    pub fn verify_total(&self) -> Result<(), CheckoutError> {
        let subtotal = compute_subtotal(&self.lines, self.currency)?;
        let derived = compute_total(subtotal, self.shipping_fee, self.discount)?;
        if subtotal != self.subtotal || derived != self.total {
            return Err(CheckoutError::TotalMismatch {
                stored: self.total.amount,
                derived: derived.amount,
            });
        }
        Ok(())
    }
}
