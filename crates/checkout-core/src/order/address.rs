//! Shipping address captured at checkout.

use crate::error::CheckoutError;
use serde::{Deserialize, Serialize};

/// Where the order is delivered.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShippingAddress {
    /// Recipient name.
    pub name: String,
    /// Contact phone.
    pub phone: String,
    /// Contact email (optional).
    #[serde(default)]
    pub email: String,
    /// Province or city.
    pub province: String,
    /// District.
    pub district: String,
    /// Street address.
    pub address: String,
}

impl ShippingAddress {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        province: impl Into<String>,
        district: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: String::new(),
            province: province.into(),
            district: district.into(),
            address: address.into(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("phone", &self.phone),
            ("province", &self.province),
            ("district", &self.district),
            ("address", &self.address),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// `IncompleteAddress` listing the blank fields.
    pub fn ensure_complete(&self) -> Result<(), CheckoutError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CheckoutError::IncompleteAddress(missing.join(", ")))
        }
    }
}
