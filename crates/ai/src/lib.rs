//! `salescast-ai`
//!
//! **Responsibility:** the forecasting model.
//!
//! This crate is pure computation:
//! - It does not know where purchases come from or where predictions go.
//! - Inputs are snapshots handed in by callers (infra/runner).
//! - Randomness is always injected so runs can be reproduced with a seed.
//!
//! Pipeline: [`distribution`] (window split + empirical distribution) →
//! [`sampler`] (weighted draws) → [`scorer`] (held-out accuracy).

pub mod distribution;
pub mod job;
pub mod result;
pub mod sales_forecast;
pub mod sampler;
pub mod scorer;

pub use distribution::{split_window, EmpiricalDistribution, WindowPolicy, WindowSplit};
pub use job::AiJob;
pub use result::AiError;
pub use sales_forecast::{SalesForecast, SalesForecastJob, SalesWindow};
pub use sampler::{sample, PredictionCount, DEFAULT_DRAWS};
pub use scorer::{clamp_accuracy, raw_accuracy, score, AccuracyReport, ActualCount, CLAMP_FALLBACK_RANGE};
