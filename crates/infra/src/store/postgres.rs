//! Postgres-backed sales store.
//!
//! Table contract (schema management lives outside this crate):
//!
//! | Table | Columns |
//! |-------|---------|
//! | `transactions` | `seq BIGINT` (insertion order), `transaction_id TEXT`, `product_id TEXT NULL`, `type TEXT`, `amount NUMERIC NULL` |
//! | `products` | `id TEXT`, `name TEXT`, `price NUMERIC` |
//! | `sales_predictions` | `product_id TEXT`, `product_name TEXT`, `predicted_sales INTEGER` |
//!
//! `transactions` columns are read leniently: a value that is NULL or does not
//! decode becomes an absent field on the returned [`PurchaseDocument`], and the
//! runner decides whether the document is usable.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{instrument, warn, Span};

use salescast_core::ProductId;
use salescast_products::Product;
use salescast_sales::{PredictionRecord, PurchaseDocument, TransactionKind};

use super::{PredictionStore, ProductCatalog, PurchaseHistory};
use crate::error::{map_sqlx_error, StoreError};

/// Newest purchases first. Rows without a sequence sort last (Postgres puts
/// NULLs first under DESC) so they never displace ordered purchases.
const FETCH_RECENT_PURCHASES_SQL: &str = r#"
    SELECT seq, transaction_id, product_id, type, amount
    FROM transactions
    WHERE type = $1
    ORDER BY seq DESC NULLS LAST
    LIMIT $2
"#;

/// Open a small pool; a forecast run issues one statement at a time.
pub async fn connect(database_url: &str) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Postgres-backed implementation of all three store contracts.
///
/// ## Thread Safety
///
/// Uses SQLx connection pool which is thread-safe (Arc + Send + Sync).
///
/// ## Replace semantics
///
/// `replace_predictions` deletes and inserts inside one transaction, so a
/// failure at any point leaves the previous generation in place.
#[derive(Debug, Clone)]
pub struct PostgresSalesStore {
    pool: Arc<PgPool>,
}

impl PostgresSalesStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn insert_batch(
        tx: &mut Transaction<'_, Postgres>,
        records: &[PredictionRecord],
    ) -> Result<u64, StoreError> {
        let mut ids = Vec::with_capacity(records.len());
        let mut names = Vec::with_capacity(records.len());
        let mut counts = Vec::with_capacity(records.len());
        for r in records {
            ids.push(r.product_id.to_string());
            names.push(r.product_name.clone());
            counts.push(i32::try_from(r.predicted_sales).map_err(|_| {
                StoreError::Decode(format!(
                    "predicted_sales {} for {} does not fit INTEGER",
                    r.predicted_sales, r.product_id
                ))
            })?);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO sales_predictions (product_id, product_name, predicted_sales)
            SELECT * FROM UNNEST($1::text[], $2::text[], $3::int4[])
            "#,
        )
        .bind(&ids)
        .bind(&names)
        .bind(&counts)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert_predictions", e))?;

        Ok(result.rows_affected())
    }
}

fn product_columns(row: &PgRow) -> Result<(String, String, Decimal), sqlx::Error> {
    Ok((row.try_get("id")?, row.try_get("name")?, row.try_get("price")?))
}

fn product_from_row(row: &PgRow) -> Option<Product> {
    product_from_columns(product_columns(row))
}

fn product_from_columns(columns: Result<(String, String, Decimal), sqlx::Error>) -> Option<Product> {
    let (id, name, price) = match columns {
        Ok(columns) => columns,
        Err(e) => {
            warn!(error = %e, "skipping undecodable catalog row");
            return None;
        }
    };

    let built = ProductId::new(id.clone()).and_then(|pid| Product::new(pid, name, price));
    match built {
        Ok(product) => Some(product),
        Err(e) => {
            warn!(product_id = %id, error = %e, "skipping invalid catalog entry");
            None
        }
    }
}

fn document_from_row(row: &PgRow) -> PurchaseDocument {
    PurchaseDocument {
        sequence: row.try_get::<Option<i64>, _>("seq").ok().flatten(),
        transaction_id: row.try_get::<Option<String>, _>("transaction_id").ok().flatten(),
        product_id: row.try_get::<Option<String>, _>("product_id").ok().flatten(),
        kind: row.try_get::<Option<String>, _>("type").ok().flatten(),
        amount: row.try_get::<Option<Decimal>, _>("amount").ok().flatten(),
    }
}

#[async_trait]
impl PurchaseHistory for PostgresSalesStore {
    #[instrument(skip(self), fields(fetched = tracing::field::Empty), err)]
    async fn fetch_recent_purchases(&self, limit: usize) -> Result<Vec<PurchaseDocument>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(FETCH_RECENT_PURCHASES_SQL)
            .bind(TransactionKind::Purchase.as_str())
            .bind(limit)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_recent_purchases", e))?;

        Span::current().record("fetched", rows.len());
        Ok(rows.iter().map(document_from_row).collect())
    }

    #[instrument(skip(self), err)]
    async fn purchase_counts(&self) -> Result<HashMap<ProductId, u64>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, COUNT(*) AS sales
            FROM transactions
            WHERE type = $1 AND product_id IS NOT NULL
            GROUP BY product_id
            "#,
        )
        .bind(TransactionKind::Purchase.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("purchase_counts", e))?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in rows {
            let raw: String = row
                .try_get("product_id")
                .map_err(|e| map_sqlx_error("purchase_counts", e))?;
            let sales: i64 = row
                .try_get("sales")
                .map_err(|e| map_sqlx_error("purchase_counts", e))?;
            match ProductId::new(raw) {
                Ok(id) => {
                    counts.insert(id, sales.max(0) as u64);
                }
                Err(e) => warn!(error = %e, "skipping purchases with blank product id"),
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl ProductCatalog for PostgresSalesStore {
    #[instrument(skip(self, ids), fields(requested = ids.len()), err)]
    async fn lookup_products(
        &self,
        ids: &BTreeSet<ProductId>,
    ) -> Result<HashMap<ProductId, Product>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let wanted: Vec<String> = ids.iter().map(ToString::to_string).collect();

        let rows = sqlx::query("SELECT id, name, price FROM products WHERE id = ANY($1)")
            .bind(&wanted)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("lookup_products", e))?;

        Ok(rows
            .iter()
            .filter_map(product_from_row)
            .map(|p| (p.id().clone(), p))
            .collect())
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query("SELECT id, name, price FROM products ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        Ok(rows.iter().filter_map(product_from_row).collect())
    }

    #[instrument(skip(self), err)]
    async fn count_products(&self) -> Result<usize, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_products", e))?;
        Ok(total.max(0) as usize)
    }
}

#[async_trait]
impl PredictionStore for PostgresSalesStore {
    #[instrument(skip(self), err)]
    async fn clear_predictions(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sales_predictions")
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("clear_predictions", e))?;
        Ok(())
    }

    #[instrument(skip(self, records), fields(records = records.len()), err)]
    async fn insert_predictions(&self, records: &[PredictionRecord]) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Self::insert_batch(&mut tx, records).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self, records), fields(records = records.len(), deleted = tracing::field::Empty), err)]
    async fn replace_predictions(&self, records: &[PredictionRecord]) -> Result<(), StoreError> {
        // Dropping `tx` on any early return rolls the transaction back.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let deleted = sqlx::query("DELETE FROM sales_predictions")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_predictions", e))?
            .rows_affected();
        Span::current().record("deleted", deleted);

        Self::insert_batch(&mut tx, records).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), err)]
    async fn list_predictions(&self) -> Result<Vec<PredictionRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, product_name, predicted_sales
            FROM sales_predictions
            ORDER BY predicted_sales DESC, product_id
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_predictions", e))?;

        rows.iter()
            .map(|row| {
                let raw_id: String = row
                    .try_get("product_id")
                    .map_err(|e| map_sqlx_error("list_predictions", e))?;
                let product_name: String = row
                    .try_get("product_name")
                    .map_err(|e| map_sqlx_error("list_predictions", e))?;
                let predicted: i32 = row
                    .try_get("predicted_sales")
                    .map_err(|e| map_sqlx_error("list_predictions", e))?;

                Ok(PredictionRecord {
                    product_id: ProductId::new(raw_id).map_err(|e| StoreError::Decode(e.to_string()))?,
                    product_name,
                    predicted_sales: u32::try_from(predicted).map_err(|_| {
                        StoreError::Decode(format!("negative predicted_sales {predicted}"))
                    })?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn recent_purchases_put_missing_sequences_last() {
        let normalized = FETCH_RECENT_PURCHASES_SQL.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(normalized.contains("ORDER BY seq DESC NULLS LAST"));
    }

    #[test]
    fn undecodable_catalog_row_is_skipped() {
        let columns = Err(sqlx::Error::ColumnNotFound("price".to_string()));
        assert!(product_from_columns(columns).is_none());
    }

    #[test]
    fn invalid_catalog_entry_is_skipped() {
        let columns = Ok(("p-1".to_string(), "  ".to_string(), dec!(4)));
        assert!(product_from_columns(columns).is_none());
    }

    #[test]
    fn valid_catalog_row_builds_product() {
        let columns = Ok(("p-1".to_string(), "Panel".to_string(), dec!(120.50)));
        let product = product_from_columns(columns).unwrap();
        assert_eq!(product.id().as_str(), "p-1");
        assert_eq!(product.name(), "Panel");
        assert_eq!(product.price(), dec!(120.50));
    }
}
