//! Checkout engine: vouchers, order placement and order lifecycle.
//!
//! ```rust,ignore
//! use checkout_engine::{CheckoutEngine, EngineConfig};
//! use checkout_store::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::load("db.json").await?);
//! let engine = CheckoutEngine::with_config(store, EngineConfig::default());
//!
//! engine.apply_voucher(&session, &mut draft, "SALE10", Utc::now()).await?;
//! let placement = engine.place_order(&session, &draft, Utc::now()).await?;
//! ```

mod config;
mod engine;
mod error;
mod orders;
mod payment;
mod vouchers;

pub use config::{EngineConfig, DEFAULT_MAX_PENDING_ORDERS};
pub use engine::{CheckoutEngine, Placement, PostCommitStep, PostCommitWarning};
pub use error::{EngineError, OrderSubmissionError};
