//! Payment methods and payment status.

use crate::error::CheckoutError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    #[serde(rename = "cod")]
    Cod,
    /// Bank transfer.
    #[serde(rename = "bank")]
    BankTransfer,
    /// E-wallet.
    #[serde(rename = "e-wallet")]
    EWallet,
    /// Credit or debit card.
    #[serde(rename = "card")]
    Card,
    /// QR code payment.
    #[serde(rename = "qr")]
    Qr,
}

/// When payment is settled relative to order commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Paid when the parcel is delivered; the order commits immediately.
    OnDelivery,
    /// Paid through an external provider; the order waits for confirmation.
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::BankTransfer => "bank",
            PaymentMethod::EWallet => "e-wallet",
            PaymentMethod::Card => "card",
            PaymentMethod::Qr => "qr",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "Cash on delivery",
            PaymentMethod::BankTransfer => "Bank transfer",
            PaymentMethod::EWallet => "E-wallet",
            PaymentMethod::Card => "Credit/debit card",
            PaymentMethod::Qr => "QR code",
        }
    }

    pub fn mode(&self) -> PaymentMode {
        match self {
            PaymentMethod::Cod => PaymentMode::OnDelivery,
            _ => PaymentMode::Online,
        }
    }

    pub fn all() -> [PaymentMethod; 5] {
        [
            PaymentMethod::Cod,
            PaymentMethod::BankTransfer,
            PaymentMethod::EWallet,
            PaymentMethod::Card,
            PaymentMethod::Qr,
        ]
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        PaymentMethod::all()
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| CheckoutError::UnknownPaymentMethod(s.to_string()))
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Not paid yet.
    #[default]
    Unpaid,
    /// Payment received.
    Paid,
    /// Online payment failed or was abandoned.
    Failed,
    /// Payment returned to the customer.
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}
