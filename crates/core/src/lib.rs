//! `salescast-core`: shared building blocks.
//!
//! This crate contains **pure** primitives (no infrastructure concerns) used by
//! the catalog, sales and forecasting crates.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ProductId, RunId};
