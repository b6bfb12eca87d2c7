//! Shopping cart module.
//!
//! Contains cart lines, the live cart, and subtotal aggregation.

mod cart;
mod line;

pub use cart::Cart;
pub use line::{compute_subtotal, CartLine};
