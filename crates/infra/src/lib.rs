//! Infrastructure layer: stores, configuration, and the forecast runner.

pub mod ai;
pub mod config;
pub mod error;
pub mod reports;
pub mod store;

pub use ai::{RunError, RunOutcome, RunSummary, SalesForecastRunner, SkipReason};
pub use config::{ConfigError, ForecastConfig, ForecastMode};
pub use error::StoreError;
pub use reports::{sales_statistics, SalesStatistic};
pub use store::{InMemorySalesStore, PostgresSalesStore, PredictionStore, ProductCatalog, PurchaseHistory};
