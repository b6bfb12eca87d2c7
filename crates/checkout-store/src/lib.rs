//! Order store collaborator for checkout.
//!
//! This crate provides:
//! - `OrderStore` - the async persistence seam
//! - `MemoryStore` - in-process store seeded from a json-server snapshot
//! - `RestStore` - client for the json-server REST API
//! - `StoreCall` / `TimeoutConfig` - per-call timeouts

mod call;
mod error;
mod memory;
mod records;
mod rest;
mod store;
pub mod wire;

pub use call::{StoreCall, TimeoutConfig};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use records::{Product, User};
pub use rest::RestStore;
pub use store::OrderStore;
