//! Document shapes used by the JSON document store.
//!
//! Money travels as a plain integer in the store currency and dates as
//! ISO-8601 strings. Fields this crate does not model are kept in `extra` so
//! a document survives a read-modify-write untouched.

use crate::error::StoreError;
use crate::records::{Product, User};
use checkout_core::prelude::*;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The whole database, as found in a json-server `db.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub products: Vec<ProductDoc>,
    #[serde(default)]
    pub users: Vec<UserDoc>,
    #[serde(default)]
    pub cart: Vec<CartDoc>,
    #[serde(default)]
    pub orders: Vec<OrderDoc>,
    #[serde(default)]
    pub vouchers: Vec<VoucherDoc>,
    /// Collections checkout never touches.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDoc {
    pub id: ProductId,
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductDoc {
    pub fn into_product(self, currency: Currency) -> Product {
        Product {
            id: self.id,
            name: self.name,
            price: Money::new(self.price, currency),
            stock: self.stock,
        }
    }
}

impl From<&Product> for ProductDoc {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            price: p.price.amount,
            stock: p.stock,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDoc {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<UserDoc> for User {
    fn from(doc: UserDoc) -> Self {
        User {
            id: doc.id,
            name: doc.name,
            email: doc.email,
            phone: doc.phone,
        }
    }
}

impl From<&User> for UserDoc {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
            phone: u.phone.clone(),
            extra: Map::new(),
        }
    }
}

/// A cart line document. Also the shape of an order item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDoc {
    pub id: CartLineId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub product_id: ProductId,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CartDoc {
    pub fn from_line(line: &CartLine, user_id: Option<&UserId>) -> Self {
        Self {
            id: line.id.clone(),
            user_id: user_id.cloned(),
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            price: line.unit_price.amount,
            quantity: line.quantity,
            size: line.size.clone(),
            stock: line.stock,
            extra: Map::new(),
        }
    }

    /// Whether the line sits in `user_id`'s cart.
    pub fn belongs_to(&self, user_id: &UserId) -> bool {
        self.user_id.as_ref() == Some(user_id)
    }

    pub fn to_line(&self, currency: Currency) -> CartLine {
        CartLine::new(
            self.id.clone(),
            self.product_id.clone(),
            self.name.clone(),
            Money::new(self.price, currency),
            self.quantity,
            self.size.clone(),
            self.stock,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDoc {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<CartDoc>,
    pub shipping_method: ShippingMethodCode,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    #[serde(default)]
    pub status_history: Vec<StatusEntry>,
    pub subtotal: i64,
    pub shipping_fee: i64,
    #[serde(default)]
    pub discount: i64,
    pub total: i64,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voucher_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reserved_stock: Vec<ReservationDoc>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<&Order> for OrderDoc {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id.clone(),
            user_id: o.user_id.clone(),
            items: o.lines.iter().map(|l| CartDoc::from_line(l, None)).collect(),
            shipping_method: o.shipping_method,
            shipping_address: o.shipping_address.clone(),
            payment_method: o.payment_method,
            payment_status: o.payment_status,
            status: o.order_status,
            status_history: o.status_history.clone(),
            subtotal: o.subtotal.amount,
            shipping_fee: o.shipping_fee.amount,
            discount: o.discount.amount,
            total: o.total.amount,
            currency: o.currency,
            voucher_code: o.voucher_code.clone(),
            note: o.note.clone(),
            reserved_stock: o.reserved_stock.iter().map(ReservationDoc::from).collect(),
            created_at: o.created_at,
            extra: Map::new(),
        }
    }
}

impl From<OrderDoc> for Order {
    fn from(doc: OrderDoc) -> Self {
        let currency = doc.currency;
        Order {
            id: doc.id,
            user_id: doc.user_id,
            lines: doc.items.iter().map(|i| i.to_line(currency)).collect(),
            shipping_method: doc.shipping_method,
            shipping_address: doc.shipping_address,
            payment_method: doc.payment_method,
            payment_status: doc.payment_status,
            order_status: doc.status,
            status_history: doc.status_history,
            subtotal: Money::new(doc.subtotal, currency),
            shipping_fee: Money::new(doc.shipping_fee, currency),
            discount: Money::new(doc.discount, currency),
            total: Money::new(doc.total, currency),
            currency,
            voucher_code: doc.voucher_code,
            note: doc.note,
            reserved_stock: doc.reserved_stock.into_iter().map(StockReservation::from).collect(),
            created_at: doc.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDoc {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl From<&StockReservation> for ReservationDoc {
    fn from(r: &StockReservation) -> Self {
        Self {
            product_id: r.product_id.clone(),
            quantity: r.quantity,
        }
    }
}

impl From<ReservationDoc> for StockReservation {
    fn from(doc: ReservationDoc) -> Self {
        Self {
            product_id: doc.product_id,
            quantity: doc.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherDoc {
    pub id: VoucherId,
    pub code: String,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(default)]
    pub min_order: i64,
    pub start_date: String,
    pub end_date: String,
    /// Legacy single owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eligible_user_ids: Vec<UserId>,
    #[serde(default)]
    pub used_by: Vec<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VoucherDoc {
    pub fn into_voucher(self, currency: Currency) -> Result<Voucher, StoreError> {
        let discount = match self.discount_type {
            DiscountType::Fixed => {
                if !self.discount.fract().is_zero() {
                    return Err(StoreError::Decode(format!(
                        "voucher {}: fixed discount {} is not a whole amount",
                        self.code, self.discount
                    )));
                }
                let amount = self
                    .discount
                    .try_into()
                    .map_err(|_| StoreError::Decode(format!("voucher {}: discount out of range", self.code)))?;
                DiscountValue::Fixed(Money::new(amount, currency))
            }
            DiscountType::Percentage => DiscountValue::Percentage(self.discount),
        };

        let mut eligible_user_ids = self.eligible_user_ids;
        if let Some(owner) = self.user_id {
            if !eligible_user_ids.contains(&owner) {
                eligible_user_ids.push(owner);
            }
        }

        Ok(Voucher {
            id: self.id,
            code: normalize_code(&self.code),
            discount,
            min_order: Money::new(self.min_order, currency),
            starts_at: parse_date(&self.start_date)?,
            ends_at: parse_date(&self.end_date)?,
            eligible_user_ids,
            used_by: self.used_by,
            description: self.description,
        })
    }
}

impl From<&Voucher> for VoucherDoc {
    fn from(v: &Voucher) -> Self {
        let (discount_type, discount) = match v.discount {
            DiscountValue::Fixed(amount) => (DiscountType::Fixed, Decimal::from(amount.amount)),
            DiscountValue::Percentage(p) => (DiscountType::Percentage, p),
        };
        Self {
            id: v.id.clone(),
            code: v.code.clone(),
            discount_type,
            discount,
            min_order: v.min_order.amount,
            start_date: v.starts_at.to_rfc3339(),
            end_date: v.ends_at.to_rfc3339(),
            user_id: None,
            eligible_user_ids: v.eligible_user_ids.clone(),
            used_by: v.used_by.clone(),
            description: v.description.clone(),
            extra: Map::new(),
        }
    }
}

/// Parse an ISO-8601 timestamp. A bare date means midnight UTC.
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| StoreError::Decode(format!("invalid date: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_voucher_doc_from_store_json() {
        let doc: VoucherDoc = serde_json::from_value(json!({
            "id": 3,
            "code": "sale10",
            "type": "percentage",
            "discount": 10,
            "minOrder": 400000,
            "startDate": "2025-01-01",
            "endDate": "2025-12-31T23:59:59Z",
            "userId": "7",
            "usedBy": ["2"]
        }))
        .unwrap();

        let voucher = doc.into_voucher(Currency::VND).unwrap();
        assert_eq!(voucher.id, VoucherId::new("3"));
        assert_eq!(voucher.code, "SALE10");
        assert_eq!(voucher.discount, DiscountValue::Percentage(Decimal::from(10)));
        assert_eq!(voucher.min_order, Money::vnd(400_000));
        assert_eq!(voucher.starts_at, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(voucher.eligible_user_ids, vec![UserId::new("7")]);
        assert_eq!(voucher.used_by, vec![UserId::new("2")]);
    }

    #[test]
    fn test_fixed_voucher_amount() {
        let doc: VoucherDoc = serde_json::from_value(json!({
            "id": "v1",
            "code": "FLAT50K",
            "type": "fixed",
            "discount": 50000,
            "startDate": "2025-01-01",
            "endDate": "2025-02-01"
        }))
        .unwrap();
        let voucher = doc.into_voucher(Currency::VND).unwrap();
        assert_eq!(voucher.discount, DiscountValue::Fixed(Money::vnd(50_000)));
        assert!(voucher.eligible_user_ids.is_empty());
    }

    #[test]
    fn test_cart_line_owner() {
        let doc: CartDoc = serde_json::from_value(json!({
            "id": "c1",
            "userId": 1,
            "productId": 1,
            "name": "Linen Shirt",
            "price": 250000,
            "quantity": 2
        }))
        .unwrap();
        assert!(doc.belongs_to(&UserId::new("1")));
        assert!(!doc.belongs_to(&UserId::new("2")));
    }

    #[test]
    fn test_fractional_fixed_amount_is_decode_error() {
        let doc: VoucherDoc = serde_json::from_value(json!({
            "id": "v1",
            "code": "FLAT50K",
            "type": "fixed",
            "discount": 50000.5,
            "startDate": "2025-01-01",
            "endDate": "2025-02-01"
        }))
        .unwrap();
        assert!(matches!(doc.into_voucher(Currency::VND), Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_bad_date_is_decode_error() {
        assert!(matches!(parse_date("next tuesday"), Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_unknown_fields_survive() {
        let doc: ProductDoc = serde_json::from_value(json!({
            "id": 1,
            "name": "Linen Shirt",
            "price": 250000,
            "stock": 4,
            "imageUrl": "/img/shirt.jpg"
        }))
        .unwrap();
        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["imageUrl"], "/img/shirt.jpg");
        assert_eq!(back["id"], "1");
    }
}
