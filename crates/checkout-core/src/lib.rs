//! Checkout pricing and voucher validation for the fashion storefront.
//!
//! Pure domain logic, no I/O:
//!
//! - **Cart**: cart lines, merging, subtotal aggregation
//! - **Shipping**: the flat-fee shipping catalog
//! - **Vouchers**: definitions and the ordered eligibility checks
//! - **Pricing**: subtotal, shipping, discount and total
//! - **Orders**: checkout drafts and placed orders with their status log
//!
//! # Example
//!
//! ```rust,ignore
//! use checkout_core::prelude::*;
//!
//! let lines = vec![CartLine::new("c1", "p1", "Linen Shirt", Money::vnd(250_000), 2, "M", 10)];
//! let mut draft = OrderDraft::new(lines, ShippingMethodCode::Standard, PaymentMethod::Cod)?;
//!
//! let applied = validate_voucher(Some(&voucher), "sale10", &user, draft.order_total(), now)?;
//! draft.apply_voucher(applied)?;
//! println!("Total: {}", draft.total().display());
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod order;
pub mod payment;
pub mod pricing;
pub mod session;
pub mod shipping;
pub mod voucher;

pub use error::CheckoutError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CheckoutError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Cart
    pub use crate::cart::{compute_subtotal, Cart, CartLine};

    // Shipping and payment
    pub use crate::payment::{PaymentMethod, PaymentMode, PaymentStatus};
    pub use crate::shipping::{resolve_shipping_fee, ShippingMethod, ShippingMethodCode, CATALOG_CURRENCY};

    // Vouchers
    pub use crate::voucher::{
        available_vouchers, normalize_code, validate_voucher, AppliedVoucher, DiscountType,
        DiscountValue, Voucher, VoucherRejection,
    };

    // Pricing and orders
    pub use crate::order::{
        Order, OrderDraft, OrderStatus, ShippingAddress, StatusEntry, StockReservation,
    };
    pub use crate::pricing::{compute_total, PriceBreakdown};
    pub use crate::session::Session;
}
