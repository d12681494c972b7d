//! Read-only reporting over the stores.

use serde::Serialize;

use salescast_core::ProductId;

use crate::error::StoreError;
use crate::store::{ProductCatalog, PurchaseHistory};

/// Lifetime purchase count of one catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesStatistic {
    pub product_id: ProductId,
    pub product_name: String,
    pub sales_count: u64,
}

/// Every catalog product with its total purchases, best sellers first.
///
/// Products that never sold are listed with a count of 0. Purchases of ids
/// missing from the catalog are not reported. Ties are broken by product id.
pub async fn sales_statistics<H, C>(history: &H, catalog: &C) -> Result<Vec<SalesStatistic>, StoreError>
where
    H: PurchaseHistory + ?Sized,
    C: ProductCatalog + ?Sized,
{
    let counts = history.purchase_counts().await?;
    let mut stats: Vec<SalesStatistic> = catalog
        .list_products()
        .await?
        .into_iter()
        .map(|product| SalesStatistic {
            sales_count: counts.get(product.id()).copied().unwrap_or(0),
            product_name: product.name().to_string(),
            product_id: product.id().clone(),
        })
        .collect();

    stats.sort_by(|a, b| {
        b.sales_count
            .cmp(&a.sales_count)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySalesStore;
    use rust_decimal_macros::dec;
    use salescast_products::Product;
    use salescast_sales::{PurchaseEvent, TransactionId};

    fn pid(raw: &str) -> ProductId {
        ProductId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn lists_every_product_ordered_by_sales() {
        let store = InMemorySalesStore::new();
        for (id, name) in [("a", "Alpha"), ("b", "Beta"), ("c", "Gamma")] {
            store
                .upsert_product(Product::new(pid(id), name, dec!(5)).unwrap())
                .unwrap();
        }
        for product in ["b", "a", "b", "ghost"] {
            store
                .insert_purchase(&PurchaseEvent {
                    transaction_id: TransactionId::new(),
                    product_id: pid(product),
                    amount: dec!(1),
                    sequence: 0,
                })
                .unwrap();
        }

        let stats = sales_statistics(&store, &store).await.unwrap();
        let rows: Vec<(&str, &str, u64)> = stats
            .iter()
            .map(|s| (s.product_id.as_str(), s.product_name.as_str(), s.sales_count))
            .collect();
        assert_eq!(
            rows,
            vec![("b", "Beta", 2), ("a", "Alpha", 1), ("c", "Gamma", 0)]
        );
    }

    #[tokio::test]
    async fn empty_catalog_has_no_statistics() {
        let store = InMemorySalesStore::new();
        assert!(sales_statistics(&store, &store).await.unwrap().is_empty());
    }
}
