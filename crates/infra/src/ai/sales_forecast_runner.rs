use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use salescast_ai::{AccuracyReport, AiError, AiJob, SalesForecastJob, SalesWindow, WindowPolicy, DEFAULT_DRAWS};
use salescast_core::{DomainError, ProductId, RunId};
use salescast_sales::{resolve_prediction_records, PurchaseEvent};

use crate::config::ForecastConfig;
use crate::error::StoreError;
use crate::store::{PredictionStore, ProductCatalog, PurchaseHistory};

/// Why a run finished without touching the prediction store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    EmptyCatalog,
    NoPurchases { skipped_documents: usize },
    InsufficientData { required: usize, available: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyCatalog => f.write_str("No products found in the catalog."),
            SkipReason::NoPurchases { .. } => f.write_str("No 'Purchase' transactions found."),
            SkipReason::InsufficientData {
                required,
                available,
            } => write!(
                f,
                "Not enough purchase history: {required} purchases required, {available} available."
            ),
        }
    }
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    /// Prediction records written; 0 means the sink was left alone.
    pub inserted: usize,
    pub training_size: usize,
    pub held_out_size: usize,
    /// Malformed documents passed over while filling the window.
    pub skipped_documents: usize,
    pub accuracy: Option<AccuracyReport>,
}

impl RunSummary {
    /// Human-readable result lines, in print order.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(2);
        if self.inserted == 0 {
            lines.push("No predictions to insert.".to_string());
        } else {
            lines.push(format!("Inserted {} sales predictions.", self.inserted));
        }
        if let Some(accuracy) = &self.accuracy {
            lines.push(accuracy.to_string());
        }
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed(RunSummary),
    Skipped(SkipReason),
}

impl RunOutcome {
    pub fn report_lines(&self) -> Vec<String> {
        match self {
            RunOutcome::Completed(summary) => summary.report_lines(),
            RunOutcome::Skipped(reason) => vec![reason.to_string()],
        }
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            RunOutcome::Completed(summary) => Some(summary),
            RunOutcome::Skipped(_) => None,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum RunError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("forecast failed: {0}")]
    Ai(AiError),
}

/// One-shot sales forecast batch job.
///
/// - Source: the most recent `policy.window` valid purchases; malformed
///   documents are skipped and replaced from older history.
/// - Sink: the live prediction generation, replaced wholesale.
/// - Not enough history is a skipped run, never a failure.
/// - Store errors end the run and propagate; nothing is retried.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesForecastRunner {
    pub policy: WindowPolicy,
    pub draws: u32,
}

impl Default for SalesForecastRunner {
    fn default() -> Self {
        Self {
            policy: WindowPolicy::default(),
            draws: DEFAULT_DRAWS,
        }
    }
}

impl SalesForecastRunner {
    pub fn new(policy: WindowPolicy, draws: u32) -> Self {
        Self { policy, draws }
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new(config.policy(), config.draws)
    }

    pub async fn run_once<H, C, S, R>(
        &self,
        history: &H,
        catalog: &C,
        sink: &S,
        rng: &mut R,
    ) -> Result<RunOutcome, RunError>
    where
        H: PurchaseHistory + ?Sized,
        C: ProductCatalog + ?Sized,
        S: PredictionStore + ?Sized,
        R: Rng + ?Sized,
    {
        self.policy.validate().map_err(RunError::Ai)?;

        if catalog.count_products().await? == 0 {
            warn!("sales forecast skipped: product catalog is empty");
            return Ok(RunOutcome::Skipped(SkipReason::EmptyCatalog));
        }

        let window_size = self.policy.window;
        let (mut events, rejected) = collect_valid_purchases(history, window_size).await?;
        let skipped_documents = rejected.len();
        for (sequence, e) in &rejected {
            warn!(sequence = ?sequence, error = %e, "skipping malformed purchase document");
        }

        if events.is_empty() {
            warn!(skipped_documents, "sales forecast skipped: no valid purchases");
            return Ok(RunOutcome::Skipped(SkipReason::NoPurchases { skipped_documents }));
        }

        // Stores promise newest-first, but the window split depends on it.
        events.sort_by_key(|e| Reverse(e.sequence));
        events.truncate(window_size);
        let window: SalesWindow = events.into_iter().map(|e| e.product_id).collect();

        let job = SalesForecastJob::new(window)
            .with_policy(self.policy)
            .with_draws(self.draws);

        let forecast = match job.run(rng) {
            Ok(forecast) => forecast,
            Err(AiError::InsufficientData {
                required,
                available,
            }) => {
                info!(required, available, "sales forecast skipped: not enough purchase history");
                return Ok(RunOutcome::Skipped(SkipReason::InsufficientData {
                    required,
                    available,
                }));
            }
            Err(AiError::NoData) => {
                info!("sales forecast skipped: no purchase history");
                return Ok(RunOutcome::Skipped(SkipReason::NoPurchases { skipped_documents }));
            }
            Err(e) => return Err(RunError::Ai(e)),
        };

        let ids: BTreeSet<ProductId> = forecast.predicted.product_ids().cloned().collect();
        let names = catalog.lookup_products(&ids).await?;
        let records = resolve_prediction_records(forecast.predicted.iter(), &names);

        if !records.is_empty() {
            sink.replace_predictions(&records).await?;
        }

        let summary = RunSummary {
            run_id: RunId::new(),
            generated_at: Utc::now(),
            inserted: records.len(),
            training_size: forecast.training_size,
            held_out_size: forecast.held_out_size,
            skipped_documents,
            accuracy: forecast.accuracy,
        };

        info!(
            run_id = %summary.run_id,
            inserted = summary.inserted,
            training = summary.training_size,
            held_out = summary.held_out_size,
            support = forecast.support_size,
            skipped_documents,
            accuracy = ?summary.accuracy.as_ref().and_then(AccuracyReport::reported),
            "sales forecast completed"
        );
        if let Some(AccuracyReport::Clamped { raw, reported }) = summary.accuracy {
            warn!(raw, reported, "accuracy above 100% replaced by fallback value");
        }

        Ok(RunOutcome::Completed(summary))
    }
}

/// Fetch until `window` valid purchases are collected or history runs out.
///
/// Each malformed document widens the next fetch by one, so skipped documents
/// are replaced by older purchases instead of shrinking the window.
async fn collect_valid_purchases<H>(
    history: &H,
    window: usize,
) -> Result<(Vec<PurchaseEvent>, Vec<(Option<i64>, DomainError)>), StoreError>
where
    H: PurchaseHistory + ?Sized,
{
    let mut limit = window;
    loop {
        let documents = history.fetch_recent_purchases(limit).await?;
        let exhausted = documents.len() < limit;

        let mut events = Vec::with_capacity(documents.len());
        let mut rejected = Vec::new();
        for doc in documents {
            let sequence = doc.sequence;
            match PurchaseEvent::try_from(doc) {
                Ok(event) => events.push(event),
                Err(e) => rejected.push((sequence, e)),
            }
        }

        if exhausted || events.len() >= window {
            return Ok((events, rejected));
        }
        limit = window.saturating_add(rejected.len());
    }
}
