use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use salescast_core::ProductId;

use crate::result::AiError;

/// How the fetched history window is sized and split.
///
/// The newest `held_out` purchases are kept aside for scoring; everything
/// older in the window is training data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPolicy {
    /// Number of most recent purchases fetched per run (W).
    pub window: usize,
    /// Number of newest purchases held out for scoring (K). Zero disables scoring.
    pub held_out: usize,
    /// Refuse to run unless exactly `window` purchases are available.
    pub require_full_window: bool,
}

impl WindowPolicy {
    /// Train on the last 100 purchases, whatever is available, no scoring.
    pub const fn basic() -> Self {
        Self {
            window: 100,
            held_out: 0,
            require_full_window: false,
        }
    }

    /// Train on purchases 101..=200 (newest first) and score against the newest 100.
    pub const fn extended() -> Self {
        Self {
            window: 200,
            held_out: 100,
            require_full_window: true,
        }
    }

    pub fn validate(&self) -> Result<(), AiError> {
        if self.window == 0 {
            return Err(AiError::InvalidInput("window must be >= 1".to_string()));
        }
        if self.held_out >= self.window {
            return Err(AiError::InvalidInput(format!(
                "held_out ({}) must be smaller than window ({}) to leave training data",
                self.held_out, self.window
            )));
        }
        Ok(())
    }

    pub fn scores(&self) -> bool {
        self.held_out > 0
    }
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self::extended()
    }
}

/// Disjoint views of one history window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSplit<'a> {
    /// Newest purchases, used only for scoring.
    pub held_out: &'a [ProductId],
    /// Older tail, used only to build the distribution.
    pub training: &'a [ProductId],
}

/// Split a newest-first history into held-out and training slices.
///
/// Anything beyond `policy.window` is ignored.
pub fn split_window<'a>(
    newest_first: &'a [ProductId],
    policy: &WindowPolicy,
) -> Result<WindowSplit<'a>, AiError> {
    policy.validate()?;

    let window = &newest_first[..newest_first.len().min(policy.window)];
    if window.is_empty() {
        return Err(AiError::NoData);
    }

    if policy.require_full_window && window.len() < policy.window {
        return Err(AiError::InsufficientData {
            required: policy.window,
            available: window.len(),
        });
    }

    let held = policy.held_out.min(window.len());
    let (held_out, training) = window.split_at(held);
    if training.is_empty() {
        return Err(AiError::InsufficientData {
            required: held + 1,
            available: window.len(),
        });
    }

    Ok(WindowSplit { held_out, training })
}

/// Discrete probability distribution over product ids, built from a training
/// slice by relative frequency.
///
/// Support is exactly the set of distinct ids seen in training, stored in id
/// order so that sampling with a seeded generator is reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalDistribution {
    support: Vec<(ProductId, f64)>,
    observations: usize,
}

impl EmpiricalDistribution {
    pub fn from_training(training: &[ProductId]) -> Result<Self, AiError> {
        if training.is_empty() {
            return Err(AiError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let mut tally: BTreeMap<&ProductId, usize> = BTreeMap::new();
        for id in training {
            *tally.entry(id).or_insert(0) += 1;
        }

        let total = training.len() as f64;
        let support = tally
            .into_iter()
            .map(|(id, count)| (id.clone(), count as f64 / total))
            .collect();

        Ok(Self {
            support,
            observations: training.len(),
        })
    }

    /// Probability of `id`; zero for ids never seen in training.
    pub fn probability(&self, id: &ProductId) -> f64 {
        self.support
            .binary_search_by(|(p, _)| p.cmp(id))
            .map(|idx| self.support[idx].1)
            .unwrap_or(0.0)
    }

    pub fn support(&self) -> impl Iterator<Item = (&ProductId, f64)> + '_ {
        self.support.iter().map(|(id, p)| (id, *p))
    }

    pub fn weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.support.iter().map(|(_, p)| *p)
    }

    /// Number of distinct products with non-zero probability.
    pub fn len(&self) -> usize {
        self.support.len()
    }

    pub fn is_empty(&self) -> bool {
        self.support.is_empty()
    }

    /// Number of purchases the distribution was built from.
    pub fn observations(&self) -> usize {
        self.observations
    }
}
