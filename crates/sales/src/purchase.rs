use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use salescast_core::{DomainError, DomainResult, ProductId};

/// Transaction identifier as issued by the wallet/store (UUID).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TransactionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s.trim())
            .map(Self)
            .map_err(|e| DomainError::invalid_id(format!("TransactionId: {e}")))
    }
}

/// Kind of a wallet transaction. Only purchases feed the forecaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Purchase,
    Sell,
    Mint,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "Purchase",
            TransactionKind::Sell => "Sell",
            TransactionKind::Mint => "Mint",
            TransactionKind::Transfer => "Transfer",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Purchase" => Ok(Self::Purchase),
            "Sell" => Ok(Self::Sell),
            "Mint" => Ok(Self::Mint),
            "Transfer" => Ok(Self::Transfer),
            other => Err(DomainError::validation(format!("unknown transaction type '{other}'"))),
        }
    }
}

/// A validated, immutable purchase from the transaction history.
///
/// `sequence` is the store's monotonically increasing insertion key; larger
/// means more recent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseEvent {
    pub transaction_id: TransactionId,
    pub product_id: ProductId,
    pub amount: Decimal,
    pub sequence: i64,
}

impl PurchaseEvent {
    /// Render the event in its stored document shape.
    pub fn to_document(&self) -> PurchaseDocument {
        PurchaseDocument {
            sequence: Some(self.sequence),
            transaction_id: Some(self.transaction_id.to_string()),
            product_id: Some(self.product_id.to_string()),
            kind: Some(TransactionKind::Purchase.as_str().to_string()),
            amount: Some(self.amount),
        }
    }
}

/// A transaction record exactly as the store holds it.
///
/// Every field is optional: the store is schema-less, so nothing is trusted
/// until [`PurchaseEvent::try_from`] has checked it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDocument {
    #[serde(default)]
    pub sequence: Option<i64>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

impl PurchaseDocument {
    /// Decode a raw JSON document. Shape errors are reported as validation failures.
    pub fn from_json(value: JsonValue) -> DomainResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| DomainError::validation(format!("malformed purchase document: {e}")))
    }

    pub fn is_purchase(&self) -> bool {
        self.kind.as_deref() == Some(TransactionKind::Purchase.as_str())
    }
}

impl TryFrom<PurchaseDocument> for PurchaseEvent {
    type Error = DomainError;

    fn try_from(doc: PurchaseDocument) -> Result<Self, Self::Error> {
        let sequence = doc.sequence.ok_or(DomainError::missing("sequence"))?;

        let kind: TransactionKind = doc
            .kind
            .as_deref()
            .ok_or(DomainError::missing("type"))?
            .parse()?;
        if kind != TransactionKind::Purchase {
            return Err(DomainError::validation(format!(
                "transaction {sequence} is a {}, not a purchase",
                kind.as_str()
            )));
        }

        let transaction_id: TransactionId = doc
            .transaction_id
            .as_deref()
            .ok_or(DomainError::missing("transactionId"))?
            .parse()?;

        let product_id = ProductId::new(doc.product_id.ok_or(DomainError::missing("productId"))?)?;

        let amount = doc.amount.ok_or(DomainError::missing("amount"))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::validation(format!(
                "transaction {transaction_id}: amount must not be negative (got {amount})"
            )));
        }

        Ok(Self {
            transaction_id,
            product_id,
            amount,
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn valid_doc() -> JsonValue {
        json!({
            "sequence": 42,
            "transactionId": "0192e3c4-5b6a-7c8d-9e0f-a1b2c3d4e5f6",
            "productId": "6752f1c0a1",
            "type": "Purchase",
            "amount": 25.5,
        })
    }

    #[test]
    fn valid_document_becomes_event() {
        let doc = PurchaseDocument::from_json(valid_doc()).unwrap();
        assert!(doc.is_purchase());

        let event = PurchaseEvent::try_from(doc).unwrap();
        assert_eq!(event.sequence, 42);
        assert_eq!(event.product_id.as_str(), "6752f1c0a1");
        assert_eq!(event.amount, dec!(25.5));
        assert_eq!(
            event.transaction_id.to_string(),
            "0192e3c4-5b6a-7c8d-9e0f-a1b2c3d4e5f6"
        );
    }

    #[test]
    fn amount_may_be_a_string() {
        let mut raw = valid_doc();
        raw["amount"] = json!("12.00");
        let event = PurchaseEvent::try_from(PurchaseDocument::from_json(raw).unwrap()).unwrap();
        assert_eq!(event.amount, dec!(12.00));
    }

    #[test]
    fn missing_product_id_is_rejected() {
        let mut raw = valid_doc();
        raw.as_object_mut().unwrap().remove("productId");
        let err = PurchaseEvent::try_from(PurchaseDocument::from_json(raw).unwrap()).unwrap_err();
        assert_eq!(err, DomainError::MissingField("productId"));
    }

    #[test]
    fn null_product_id_is_rejected() {
        let mut raw = valid_doc();
        raw["productId"] = JsonValue::Null;
        let err = PurchaseEvent::try_from(PurchaseDocument::from_json(raw).unwrap()).unwrap_err();
        assert_eq!(err, DomainError::MissingField("productId"));
    }

    #[test]
    fn malformed_transaction_id_is_rejected() {
        let mut raw = valid_doc();
        raw["transactionId"] = json!("tx-1");
        let err = PurchaseEvent::try_from(PurchaseDocument::from_json(raw).unwrap()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(msg) if msg.starts_with("TransactionId")));
    }

    #[test]
    fn non_purchase_kind_is_rejected() {
        let mut raw = valid_doc();
        raw["type"] = json!("Mint");
        let doc = PurchaseDocument::from_json(raw).unwrap();
        assert!(!doc.is_purchase());
        assert!(matches!(
            PurchaseEvent::try_from(doc),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn wrongly_typed_field_fails_decoding() {
        let mut raw = valid_doc();
        raw["sequence"] = json!("not a number");
        assert!(matches!(
            PurchaseDocument::from_json(raw),
            Err(DomainError::Validation(msg)) if msg.starts_with("malformed")
        ));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let mut raw = valid_doc();
        raw["amount"] = json!(-3);
        let err = PurchaseEvent::try_from(PurchaseDocument::from_json(raw).unwrap()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("amount")));
    }

    #[test]
    fn event_document_roundtrip() {
        let event = PurchaseEvent {
            transaction_id: TransactionId::new(),
            product_id: ProductId::new("p-7").unwrap(),
            amount: dec!(3.10),
            sequence: 7,
        };
        assert_eq!(PurchaseEvent::try_from(event.to_document()).unwrap(), event);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: any valid purchase survives the trip through its stored
            /// document shape unchanged.
            #[test]
            fn stored_document_validates_back_to_the_same_event(
                sequence in any::<i64>(),
                cents in 0i64..1_000_000_000i64,
                raw_id in any::<u128>(),
                product in "[a-z0-9][a-z0-9-]{0,20}",
            ) {
                let event = PurchaseEvent {
                    transaction_id: TransactionId(Uuid::from_u128(raw_id)),
                    product_id: ProductId::new(product).unwrap(),
                    amount: Decimal::new(cents, 2),
                    sequence,
                };
                prop_assert_eq!(PurchaseEvent::try_from(event.to_document()), Ok(event));
            }
        }
    }
}
