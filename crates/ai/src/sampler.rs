use std::collections::BTreeMap;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::Serialize;

use salescast_core::ProductId;

use crate::distribution::EmpiricalDistribution;
use crate::result::AiError;

/// Number of synthetic purchases drawn per run unless configured otherwise.
pub const DEFAULT_DRAWS: u32 = 100;

/// Per-product number of synthetic draws.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PredictionCount {
    counts: BTreeMap<ProductId, u32>,
}

impl PredictionCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: &ProductId) {
        match self.counts.get_mut(id) {
            Some(n) => *n += 1,
            None => {
                self.counts.insert(id.clone(), 1);
            }
        }
    }

    pub fn get(&self, id: &ProductId) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    /// Total number of draws recorded.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|n| u64::from(*n)).sum()
    }

    /// Number of distinct products drawn at least once.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Counts in product-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&ProductId, u32)> + '_ {
        self.counts.iter().map(|(id, n)| (id, *n))
    }

    pub fn product_ids(&self) -> impl Iterator<Item = &ProductId> + '_ {
        self.counts.keys()
    }
}

impl FromIterator<(ProductId, u32)> for PredictionCount {
    fn from_iter<T: IntoIterator<Item = (ProductId, u32)>>(iter: T) -> Self {
        let mut counts = BTreeMap::new();
        for (id, n) in iter {
            if n > 0 {
                *counts.entry(id).or_insert(0) += n;
            }
        }
        Self { counts }
    }
}

/// Draw `draws` products with replacement, each with probability proportional
/// to its weight in `dist`, and tally the results.
pub fn sample<R: Rng + ?Sized>(
    dist: &EmpiricalDistribution,
    draws: u32,
    rng: &mut R,
) -> Result<PredictionCount, AiError> {
    let index = WeightedIndex::new(dist.weights())
        .map_err(|e| AiError::InferenceFailed(format!("cannot sample from distribution: {e}")))?;
    let support: Vec<&ProductId> = dist.support().map(|(id, _)| id).collect();

    let mut predicted = PredictionCount::new();
    for _ in 0..draws {
        predicted.record(support[index.sample(rng)]);
    }
    Ok(predicted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pid(raw: &str) -> ProductId {
        ProductId::new(raw).unwrap()
    }

    fn dist(raw: &[&str]) -> EmpiricalDistribution {
        let training: Vec<ProductId> = raw.iter().map(|r| pid(r)).collect();
        EmpiricalDistribution::from_training(&training).unwrap()
    }

    #[test]
    fn draws_sum_to_requested_count() {
        let d = dist(&["a", "b", "b", "c"]);
        let mut rng = StdRng::seed_from_u64(7);
        let predicted = sample(&d, DEFAULT_DRAWS, &mut rng).unwrap();
        assert_eq!(predicted.total(), 100);
    }

    #[test]
    fn single_product_takes_every_draw() {
        let d = dist(&["only", "only", "only"]);
        let mut rng = StdRng::seed_from_u64(1);
        let predicted = sample(&d, 50, &mut rng).unwrap();
        assert_eq!(predicted.len(), 1);
        assert_eq!(predicted.get(&pid("only")), 50);
    }

    #[test]
    fn zero_draws_yield_empty_counts() {
        let d = dist(&["a"]);
        let mut rng = StdRng::seed_from_u64(1);
        let predicted = sample(&d, 0, &mut rng).unwrap();
        assert!(predicted.is_empty());
        assert_eq!(predicted.total(), 0);
    }

    #[test]
    fn same_seed_same_draws() {
        let d = dist(&["a", "b", "c", "c", "d"]);
        let first = sample(&d, 100, &mut StdRng::seed_from_u64(42)).unwrap();
        let second = sample(&d, 100, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn frequencies_track_weights() {
        // 3:1 weighting; over many draws the heavy product should dominate.
        let d = dist(&["heavy", "heavy", "heavy", "light"]);
        let mut rng = StdRng::seed_from_u64(2024);
        let predicted = sample(&d, 20_000, &mut rng).unwrap();
        let share = f64::from(predicted.get(&pid("heavy"))) / 20_000.0;
        assert!((share - 0.75).abs() < 0.02, "heavy share was {share}");
    }

    #[test]
    fn from_iter_merges_and_drops_zeroes() {
        let counts: PredictionCount =
            [(pid("a"), 2), (pid("b"), 0), (pid("a"), 3)].into_iter().collect();
        assert_eq!(counts.get(&pid("a")), 5);
        assert_eq!(counts.len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: for M draws the counts sum to M and every key is in the support.
        #[test]
        fn sampling_conserves_draws(
            raw in prop::collection::vec(0u8..15, 1..200),
            draws in 0u32..500,
            seed in any::<u64>(),
        ) {
            let training: Vec<ProductId> = raw.iter().map(|n| pid(&format!("prod-{n}"))).collect();
            let d = EmpiricalDistribution::from_training(&training).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);

            let predicted = sample(&d, draws, &mut rng).unwrap();
            prop_assert_eq!(predicted.total(), u64::from(draws));
            for id in predicted.product_ids() {
                prop_assert!(d.probability(id) > 0.0);
            }
        }
    }
}
