//! Sales module.
//!
//! Purchase history as consumed by the forecaster, and the prediction records
//! it produces. Pure domain logic: validation and name resolution, no IO.

pub mod prediction;
pub mod purchase;

pub use prediction::{resolve_prediction_records, PredictionRecord};
pub use purchase::{PurchaseDocument, PurchaseEvent, TransactionId, TransactionKind};
