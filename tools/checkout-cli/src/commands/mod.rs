//! CLI command implementations.

pub mod config;
pub mod orders;
pub mod payment;
pub mod place;
pub mod quote;
pub mod vouchers;

use anyhow::{bail, Context as _, Result};
use checkout_core::prelude::*;
use clap::{Args, Subcommand};

use crate::context::Engine;

/// Which cart lines to check out, and how.
#[derive(Args, Clone)]
pub struct DraftArgs {
    /// Customer id.
    #[arg(short, long)]
    pub user: String,

    /// Cart line ids to check out (default: the whole cart).
    #[arg(short, long, value_delimiter = ',')]
    pub lines: Vec<String>,

    /// Shipping method: standard, express or store.
    #[arg(short, long, default_value = "standard")]
    pub shipping: String,

    /// Payment method: cod, bank, e-wallet, card or qr.
    #[arg(short, long, default_value = "cod")]
    pub payment: String,

    /// Voucher code to apply.
    #[arg(long)]
    pub voucher: Option<String>,
}

impl DraftArgs {
    pub fn session(&self) -> Session {
        Session::user(UserId::new(self.user.as_str()))
    }

    /// Build a draft from the user's stored cart.
    pub async fn draft(&self, engine: &Engine, session: &Session) -> Result<OrderDraft> {
        let shipping: ShippingMethodCode = self.shipping.parse()?;
        let payment: PaymentMethod = self.payment.parse()?;

        let cart = engine.cart(session).await.context("Failed to load cart")?;
        if cart.is_empty() {
            bail!("Cart is empty for user {}", self.user);
        }
        let lines = if self.lines.is_empty() {
            cart.lines.clone()
        } else {
            let ids: Vec<CartLineId> = self.lines.iter().map(|id| CartLineId::new(id.as_str())).collect();
            cart.select(&ids)?
        };

        Ok(OrderDraft::new(lines, shipping, payment)?)
    }
}

/// Arguments for the quote command.
#[derive(Args)]
pub struct QuoteArgs {
    #[command(flatten)]
    pub draft: DraftArgs,
}

/// Arguments for the place command.
#[derive(Args)]
pub struct PlaceArgs {
    #[command(flatten)]
    pub draft: DraftArgs,

    /// Recipient name.
    #[arg(long)]
    pub name: String,

    /// Recipient phone.
    #[arg(long)]
    pub phone: String,

    /// Recipient email.
    #[arg(long)]
    pub email: Option<String>,

    /// Province or city.
    #[arg(long)]
    pub province: String,

    /// District.
    #[arg(long)]
    pub district: String,

    /// Street address.
    #[arg(long)]
    pub address: String,

    /// Note for the shop.
    #[arg(long)]
    pub note: Option<String>,

    /// Skip confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

impl PlaceArgs {
    pub fn shipping_address(&self) -> ShippingAddress {
        let address = ShippingAddress::new(
            self.name.as_str(),
            self.phone.as_str(),
            self.province.as_str(),
            self.district.as_str(),
            self.address.as_str(),
        );
        match &self.email {
            Some(email) => address.with_email(email.as_str()),
            None => address,
        }
    }
}

/// Arguments for the vouchers command.
#[derive(Args)]
pub struct VouchersArgs {
    /// Customer id.
    #[arg(short, long)]
    pub user: String,
}

/// Arguments for the orders command.
#[derive(Args)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub command: OrdersCommand,
}

#[derive(Subcommand)]
pub enum OrdersCommand {
    /// List a customer's orders, newest first.
    List {
        /// Customer id.
        #[arg(short, long)]
        user: String,
    },
    /// Move an order to a new status.
    Status {
        /// Order id.
        order: String,
        /// New status (pending, awaiting-payment, confirmed, processing,
        /// shipped, delivered, cancelled).
        status: String,
        /// Note for the status log.
        #[arg(short, long)]
        note: Option<String>,
    },
}

/// Arguments for the payment command.
#[derive(Args)]
pub struct PaymentArgs {
    #[command(subcommand)]
    pub command: PaymentCommand,
}

#[derive(Subcommand)]
pub enum PaymentCommand {
    /// Record that the payment provider accepted the payment.
    Confirm {
        /// Order id.
        order: String,
    },
    /// Record a failed payment; cancels the order and restocks.
    Fail {
        /// Order id.
        order: String,
        /// Reason reported by the provider.
        #[arg(short, long, default_value = "declined")]
        reason: String,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Get a config value.
    Get {
        /// Config key (dot-separated).
        key: String,
    },
    /// Set a config value.
    Set {
        /// Config key (dot-separated).
        key: String,
        /// Value to set.
        value: String,
    },
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
