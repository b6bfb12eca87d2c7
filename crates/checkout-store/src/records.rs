//! Records the store returns besides the core domain types.

use checkout_core::{Money, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A catalog product, as far as checkout cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: i64,
}

/// A storefront account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}
