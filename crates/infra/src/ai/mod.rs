//! Forecast orchestration.
//!
//! The runner pulls history from the stores, hands it to the forecasting job
//! and writes the result back. It holds no state between runs.

pub mod sales_forecast_runner;

pub use sales_forecast_runner::{RunError, RunOutcome, RunSummary, SalesForecastRunner, SkipReason};
