use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use salescast_core::{DomainResult, ProductId};
use salescast_products::Product;
use salescast_sales::{PredictionRecord, PurchaseDocument, PurchaseEvent};

use super::{PredictionStore, ProductCatalog, PurchaseHistory};
use crate::error::StoreError;

/// In-memory sales store for tests/dev.
///
/// Transactions are kept as documents in insertion order; the store assigns
/// each one its `sequence`, the same way a document store assigns ids.
#[derive(Debug, Default)]
pub struct InMemorySalesStore {
    transactions: RwLock<Vec<PurchaseDocument>>,
    products: RwLock<BTreeMap<ProductId, Product>>,
    predictions: RwLock<Vec<PredictionRecord>>,
}

impl InMemorySalesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction document and return the sequence it was given.
    pub fn insert_document(&self, mut doc: PurchaseDocument) -> Result<i64, StoreError> {
        let mut txs = write(&self.transactions)?;
        let sequence = txs.len() as i64 + 1;
        doc.sequence = Some(sequence);
        txs.push(doc);
        Ok(sequence)
    }

    /// Append a raw JSON transaction. Documents with the wrong shape are refused.
    pub fn insert_json(&self, raw: JsonValue) -> Result<DomainResult<i64>, StoreError> {
        match PurchaseDocument::from_json(raw) {
            Ok(doc) => self.insert_document(doc).map(Ok),
            Err(e) => Ok(Err(e)),
        }
    }

    pub fn insert_purchase(&self, event: &PurchaseEvent) -> Result<i64, StoreError> {
        self.insert_document(event.to_document())
    }

    pub fn upsert_product(&self, product: Product) -> Result<(), StoreError> {
        write(&self.products)?.insert(product.id().clone(), product);
        Ok(())
    }

    pub fn transaction_count(&self) -> Result<usize, StoreError> {
        Ok(read(&self.transactions)?.len())
    }
}

#[async_trait]
impl PurchaseHistory for InMemorySalesStore {
    async fn fetch_recent_purchases(&self, limit: usize) -> Result<Vec<PurchaseDocument>, StoreError> {
        let txs = read(&self.transactions)?;
        Ok(txs
            .iter()
            .rev()
            .filter(|doc| doc.is_purchase())
            .take(limit)
            .cloned()
            .collect())
    }

    async fn purchase_counts(&self) -> Result<HashMap<ProductId, u64>, StoreError> {
        let txs = read(&self.transactions)?;
        let mut counts = HashMap::new();
        for doc in txs.iter().filter(|doc| doc.is_purchase()) {
            let Some(id) = doc.product_id.as_deref().and_then(|raw| ProductId::new(raw).ok()) else {
                continue;
            };
            *counts.entry(id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[async_trait]
impl ProductCatalog for InMemorySalesStore {
    async fn lookup_products(
        &self,
        ids: &BTreeSet<ProductId>,
    ) -> Result<HashMap<ProductId, Product>, StoreError> {
        let products = read(&self.products)?;
        Ok(ids
            .iter()
            .filter_map(|id| products.get(id).map(|p| (id.clone(), p.clone())))
            .collect())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(read(&self.products)?.values().cloned().collect())
    }

    async fn count_products(&self) -> Result<usize, StoreError> {
        Ok(read(&self.products)?.len())
    }
}

#[async_trait]
impl PredictionStore for InMemorySalesStore {
    async fn clear_predictions(&self) -> Result<(), StoreError> {
        write(&self.predictions)?.clear();
        Ok(())
    }

    async fn insert_predictions(&self, records: &[PredictionRecord]) -> Result<(), StoreError> {
        write(&self.predictions)?.extend_from_slice(records);
        Ok(())
    }

    /// Swaps the generation under a single write lock; readers never observe
    /// an empty intermediate state.
    async fn replace_predictions(&self, records: &[PredictionRecord]) -> Result<(), StoreError> {
        *write(&self.predictions)? = records.to_vec();
        Ok(())
    }

    async fn list_predictions(&self) -> Result<Vec<PredictionRecord>, StoreError> {
        Ok(read(&self.predictions)?.clone())
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read()
        .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write()
        .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
}
