//! Logging setup for the checkout crates.
//!
//! Everything logs through `tracing`; this crate installs the subscriber.

mod logging;

pub use logging::*;
