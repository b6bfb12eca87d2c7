//! Shipping method catalog.

use crate::error::CheckoutError;
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shipping method codes offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethodCode {
    /// Standard delivery.
    #[default]
    Standard,
    /// Express delivery.
    Express,
    /// Pick up in store.
    Store,
}

impl ShippingMethodCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingMethodCode::Standard => "standard",
            ShippingMethodCode::Express => "express",
            ShippingMethodCode::Store => "store",
        }
    }
}

impl fmt::Display for ShippingMethodCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingMethodCode {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(ShippingMethodCode::Standard),
            "express" => Ok(ShippingMethodCode::Express),
            "store" => Ok(ShippingMethodCode::Store),
            _ => Err(CheckoutError::UnknownShippingMethod(s.to_string())),
        }
    }
}

/// A shipping method option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShippingMethod {
    /// Method code.
    pub code: ShippingMethodCode,
    /// Display name.
    pub label: &'static str,
    /// Flat fee.
    pub fee: Money,
    /// Delivery estimate for display.
    pub estimate_label: &'static str,
}

/// Currency the catalog is priced in. Checkouts are priced in it too.
pub const CATALOG_CURRENCY: Currency = Currency::VND;

const CATALOG: [ShippingMethod; 3] = [
    ShippingMethod {
        code: ShippingMethodCode::Standard,
        label: "Standard delivery",
        fee: Money {
            amount: 30_000,
            currency: CATALOG_CURRENCY,
        },
        estimate_label: "3-5 days",
    },
    ShippingMethod {
        code: ShippingMethodCode::Express,
        label: "Express delivery",
        fee: Money {
            amount: 60_000,
            currency: CATALOG_CURRENCY,
        },
        estimate_label: "1-2 days",
    },
    ShippingMethod {
        code: ShippingMethodCode::Store,
        label: "Store pickup",
        fee: Money {
            amount: 0,
            currency: CATALOG_CURRENCY,
        },
        estimate_label: "Same day",
    },
];

impl ShippingMethod {
    /// All methods, in display order.
    pub fn catalog() -> &'static [ShippingMethod] {
        &CATALOG
    }

    /// Look up a method by code.
    pub fn get(code: ShippingMethodCode) -> &'static ShippingMethod {
        match code {
            ShippingMethodCode::Standard => &CATALOG[0],
            ShippingMethodCode::Express => &CATALOG[1],
            ShippingMethodCode::Store => &CATALOG[2],
        }
    }

    /// Look up a method by its wire code.
    pub fn find(code: &str) -> Result<&'static ShippingMethod, CheckoutError> {
        code.parse::<ShippingMethodCode>().map(Self::get)
    }

    /// Check if this is free shipping.
    pub fn is_free(&self) -> bool {
        self.fee.is_zero()
    }
}

/// Flat fee for a shipping method.
pub fn resolve_shipping_fee(code: ShippingMethodCode) -> Money {
    ShippingMethod::get(code).fee
}
