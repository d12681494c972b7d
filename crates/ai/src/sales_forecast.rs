use rand::Rng;
use serde::Serialize;

use salescast_core::ProductId;

use crate::distribution::{split_window, EmpiricalDistribution, WindowPolicy};
use crate::job::AiJob;
use crate::result::AiError;
use crate::sampler::{sample, PredictionCount, DEFAULT_DRAWS};
use crate::scorer::{score, AccuracyReport, ActualCount};

/// Purchase history snapshot handed to the forecaster: the product id of each
/// purchase, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesWindow {
    newest_first: Vec<ProductId>,
}

impl SalesWindow {
    pub fn new(newest_first: Vec<ProductId>) -> Self {
        Self { newest_first }
    }

    pub fn product_ids(&self) -> &[ProductId] {
        &self.newest_first
    }

    pub fn len(&self) -> usize {
        self.newest_first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.newest_first.is_empty()
    }
}

impl FromIterator<ProductId> for SalesWindow {
    fn from_iter<T: IntoIterator<Item = ProductId>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Output of one forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesForecast {
    pub predicted: PredictionCount,
    /// `None` when the policy holds nothing out.
    pub accuracy: Option<AccuracyReport>,
    pub training_size: usize,
    pub held_out_size: usize,
    /// Distinct products the distribution could draw from.
    pub support_size: usize,
}

/// Historical-distribution forecast.
///
/// Model:
/// - Split the window into held-out (newest) and training (older) slices.
/// - Relative frequencies in training form the distribution.
/// - `draws` weighted draws with replacement form the prediction.
/// - If anything was held out, score the prediction against it.
#[derive(Debug, Clone)]
pub struct SalesForecastJob {
    input: SalesWindow,
    policy: WindowPolicy,
    draws: u32,
}

impl SalesForecastJob {
    pub fn new(input: SalesWindow) -> Self {
        Self {
            input,
            policy: WindowPolicy::default(),
            draws: DEFAULT_DRAWS,
        }
    }

    pub fn with_policy(mut self, policy: WindowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_draws(mut self, draws: u32) -> Self {
        self.draws = draws;
        self
    }

    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }
}

impl AiJob for SalesForecastJob {
    type Input = SalesWindow;
    type Output = SalesForecast;

    fn input(&self) -> &Self::Input {
        &self.input
    }

    fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SalesForecast, AiError> {
        let split = split_window(self.input.product_ids(), &self.policy)?;
        let distribution = EmpiricalDistribution::from_training(split.training)?;
        let predicted = sample(&distribution, self.draws, rng)?;

        let accuracy = if self.policy.scores() {
            Some(score(&predicted, &ActualCount::tally(split.held_out), rng))
        } else {
            None
        };

        Ok(SalesForecast {
            predicted,
            accuracy,
            training_size: split.training.len(),
            held_out_size: split.held_out.len(),
            support_size: distribution.len(),
        })
    }
}
