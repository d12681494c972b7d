//! Data source and sink contracts consumed by the forecast runner.
//!
//! The runner only ever talks to these traits; the in-memory implementation
//! backs tests and local runs, the Postgres implementation backs production.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use salescast_core::ProductId;
use salescast_products::Product;
use salescast_sales::{PredictionRecord, PurchaseDocument};

use crate::error::StoreError;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemorySalesStore;
pub use postgres::PostgresSalesStore;

/// Read access to the transaction history.
#[async_trait]
pub trait PurchaseHistory: Send + Sync {
    /// Up to `limit` purchase documents, newest first by insertion order.
    ///
    /// Only `type = "Purchase"` transactions are returned. Documents are not
    /// validated beyond their shape.
    async fn fetch_recent_purchases(&self, limit: usize) -> Result<Vec<PurchaseDocument>, StoreError>;

    /// Total purchases per product over the whole history.
    async fn purchase_counts(&self) -> Result<HashMap<ProductId, u64>, StoreError>;
}

/// Read access to the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Catalog entries for the given ids. Ids without an entry are simply absent.
    async fn lookup_products(
        &self,
        ids: &BTreeSet<ProductId>,
    ) -> Result<HashMap<ProductId, Product>, StoreError>;

    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn count_products(&self) -> Result<usize, StoreError>;
}

/// Storage for the live prediction generation.
#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn clear_predictions(&self) -> Result<(), StoreError>;

    async fn insert_predictions(&self, records: &[PredictionRecord]) -> Result<(), StoreError>;

    /// Replace the live generation with `records`.
    ///
    /// The default is clear-then-insert: a failure between the two steps
    /// leaves the store empty. Implementations that can do better override it.
    async fn replace_predictions(&self, records: &[PredictionRecord]) -> Result<(), StoreError> {
        self.clear_predictions().await?;
        self.insert_predictions(records).await
    }

    async fn list_predictions(&self) -> Result<Vec<PredictionRecord>, StoreError>;
}
