use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use salescast_core::ProductId;
use salescast_products::{Product, UNKNOWN_PRODUCT_NAME};

/// One line of the live sales forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    pub product_id: ProductId,
    pub product_name: String,
    pub predicted_sales: u32,
}

/// Attach display names to predicted counts.
///
/// Ids without a catalog entry get [`UNKNOWN_PRODUCT_NAME`]; resolution never
/// fails. Output order follows the input order.
pub fn resolve_prediction_records<'a, I>(
    counts: I,
    catalog: &HashMap<ProductId, Product>,
) -> Vec<PredictionRecord>
where
    I: IntoIterator<Item = (&'a ProductId, u32)>,
{
    counts
        .into_iter()
        .map(|(product_id, predicted_sales)| PredictionRecord {
            product_id: product_id.clone(),
            product_name: catalog
                .get(product_id)
                .map(|p| p.name().to_string())
                .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string()),
            predicted_sales,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pid(raw: &str) -> ProductId {
        ProductId::new(raw).unwrap()
    }

    #[test]
    fn known_ids_take_catalog_names() {
        let a = pid("a");
        let mut catalog = HashMap::new();
        catalog.insert(a.clone(), Product::new(a.clone(), "Heat Pump", dec!(900)).unwrap());

        let records = resolve_prediction_records([(&a, 12)], &catalog);
        assert_eq!(
            records,
            vec![PredictionRecord {
                product_id: a,
                product_name: "Heat Pump".to_string(),
                predicted_sales: 12,
            }]
        );
    }

    #[test]
    fn unknown_ids_fall_back_to_placeholder() {
        let a = pid("a");
        let ghost = pid("ghost");
        let mut catalog = HashMap::new();
        catalog.insert(a.clone(), Product::new(a.clone(), "Heat Pump", dec!(900)).unwrap());

        let records = resolve_prediction_records([(&a, 3), (&ghost, 4)], &catalog);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].product_id, ghost);
        assert_eq!(records[1].product_name, "Unknown Product");
        assert_eq!(records[1].predicted_sales, 4);
    }

    #[test]
    fn empty_catalog_resolves_everything_to_placeholder() {
        let ids = [pid("x"), pid("y")];
        let records =
            resolve_prediction_records(ids.iter().map(|id| (id, 1)), &HashMap::new());
        assert!(records.iter().all(|r| r.product_name == UNKNOWN_PRODUCT_NAME));
    }

    #[test]
    fn serializes_with_store_field_names() {
        let record = PredictionRecord {
            product_id: pid("p-1"),
            product_name: "Battery".to_string(),
            predicted_sales: 9,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"productId": "p-1", "productName": "Battery", "predictedSales": 9})
        );
    }
}
