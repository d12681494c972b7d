//! Product catalog module.
//!
//! This crate contains the catalog entry read by the forecaster when it turns
//! product ids into display names (no IO, no storage).

pub mod product;

pub use product::{Product, UNKNOWN_PRODUCT_NAME};
