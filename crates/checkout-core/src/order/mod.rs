//! Order drafts and placed orders.

mod address;
mod draft;
mod order;

pub use address::ShippingAddress;
pub use draft::OrderDraft;
pub use order::{Order, OrderStatus, StatusEntry, StockReservation};
