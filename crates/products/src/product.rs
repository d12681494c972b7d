use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use salescast_core::{DomainError, DomainResult, ProductId};

/// Display name used when a product id has no catalog entry.
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";

/// Catalog entry: a sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProductRecord", into = "ProductRecord")]
pub struct Product {
    id: ProductId,
    name: String,
    price: Decimal,
}

impl Product {
    /// Build a validated catalog entry.
    ///
    /// The name must be non-blank and the price non-negative.
    pub fn new(id: ProductId, name: impl Into<String>, price: Decimal) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation(format!("product {id}: name must not be blank")));
        }
        if price.is_sign_negative() && !price.is_zero() {
            return Err(DomainError::validation(format!(
                "product {id}: price must not be negative (got {price})"
            )));
        }
        Ok(Self { id, name, price })
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Decimal {
        self.price
    }
}

/// Serialized shape of a catalog entry (`{ "id", "name", "price" }`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProductRecord {
    id: ProductId,
    name: String,
    price: Decimal,
}

impl TryFrom<ProductRecord> for Product {
    type Error = DomainError;

    fn try_from(r: ProductRecord) -> Result<Self, Self::Error> {
        Product::new(r.id, r.name, r.price)
    }
}

impl From<Product> for ProductRecord {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            price: p.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pid(raw: &str) -> ProductId {
        ProductId::new(raw).unwrap()
    }

    #[test]
    fn valid_product_is_accepted() {
        let p = Product::new(pid("p-1"), "Solar Panel", dec!(149.99)).unwrap();
        assert_eq!(p.id().as_str(), "p-1");
        assert_eq!(p.name(), "Solar Panel");
        assert_eq!(p.price(), dec!(149.99));
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = Product::new(pid("p-1"), "  ", dec!(1)).unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("name") => {}
            other => panic!("expected name validation error, got {other:?}"),
        }
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = Product::new(pid("p-1"), "Battery", dec!(-0.01)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("price")));
    }

    #[test]
    fn zero_price_is_allowed() {
        assert!(Product::new(pid("p-1"), "Freebie", Decimal::ZERO).is_ok());
    }

    #[test]
    fn deserialization_validates() {
        let ok: Product =
            serde_json::from_str(r#"{"id":"p-9","name":"Inverter","price":"320.00"}"#).unwrap();
        assert_eq!(ok.name(), "Inverter");

        let bad = serde_json::from_str::<Product>(r#"{"id":"p-9","name":"","price":"1"}"#);
        assert!(bad.is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: any non-blank name with a non-negative price builds a product
            /// that keeps exactly the given values.
            #[test]
            fn non_negative_prices_roundtrip(
                name in "[A-Za-z][A-Za-z0-9 ]{0,30}",
                cents in 0i64..10_000_000i64,
            ) {
                let price = Decimal::new(cents, 2);
                let p = Product::new(pid("p-prop"), name.clone(), price).unwrap();
                prop_assert_eq!(p.name(), name.as_str());
                prop_assert_eq!(p.price(), price);
            }
        }
    }
}
