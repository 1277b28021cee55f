//! Model family abstraction and the built-in regressor.

use crate::error::{TrainingError, TrainingResult};
use crate::grid::ParamSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// A fittable regression model instance.
///
/// Serialization via `to_bytes` must not mutate the model.
pub trait Regressor: Send {
    fn fit(&mut self, features: &[Vec<f64>], target: &[f64]) -> TrainingResult<()>;

    fn predict(&self, features: &[Vec<f64>]) -> TrainingResult<Vec<f64>>;

    fn to_bytes(&self) -> TrainingResult<Vec<u8>>;
}

/// Constructs one fresh, independently owned model instance per candidate
/// configuration, so fits can run concurrently without shared mutable state.
pub trait ModelFamily: Send + Sync {
    fn name(&self) -> &'static str;

    fn build(&self, params: &ParamSet) -> TrainingResult<Box<dyn Regressor>>;
}

/// Bagged ensemble of depth-1 regression trees.
///
/// Each estimator fits one stump on a bootstrap sample of the rows over a
/// randomly chosen feature. Per-estimator RNGs are derived from the family
/// seed, so a given configuration always trains the same model.
pub struct StumpForestFamily {
    pub seed: u64,
}

impl Default for StumpForestFamily {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl ModelFamily for StumpForestFamily {
    fn name(&self) -> &'static str {
        "stump-forest"
    }

    fn build(&self, params: &ParamSet) -> TrainingResult<Box<dyn Regressor>> {
        let n_estimators = params.get_int("n_estimators")?;
        if n_estimators < 1 {
            return Err(TrainingError::InvalidParams(format!(
                "n_estimators must be >= 1, got {n_estimators}"
            )));
        }
        for (name, _) in &params.0 {
            if name != "n_estimators" {
                return Err(TrainingError::InvalidParams(format!(
                    "unknown parameter for stump-forest: {name}"
                )));
            }
        }
        Ok(Box::new(StumpForest::new(n_estimators as usize, self.seed)))
    }
}

/// A single axis-aligned split with constant leaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stump {
    feature: usize,
    threshold: f64,
    left: f64,
    right: f64,
}

impl Stump {
    fn predict_row(&self, row: &[f64]) -> f64 {
        if row[self.feature] <= self.threshold {
            self.left
        } else {
            self.right
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StumpForest {
    n_estimators: usize,
    seed: u64,
    stumps: Vec<Stump>,
}

impl StumpForest {
    pub fn new(n_estimators: usize, seed: u64) -> Self {
        Self { n_estimators, seed, stumps: Vec::new() }
    }

    pub fn from_bytes(bytes: &[u8]) -> TrainingResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl Regressor for StumpForest {
    fn fit(&mut self, features: &[Vec<f64>], target: &[f64]) -> TrainingResult<()> {
        if features.len() != target.len() {
            return Err(TrainingError::Model(format!(
                "feature/target row mismatch: {} vs {}",
                features.len(),
                target.len()
            )));
        }
        if features.is_empty() || features[0].is_empty() {
            return Err(TrainingError::Model("cannot fit on empty data".to_string()));
        }

        let n_rows = features.len();
        let n_features = features[0].len();
        let mut stumps = Vec::with_capacity(self.n_estimators);
        for i in 0..self.n_estimators {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(i as u64));
            let sample: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
            let feature = rng.gen_range(0..n_features);
            stumps.push(fit_stump(features, target, &sample, feature));
        }
        self.stumps = stumps;
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> TrainingResult<Vec<f64>> {
        if self.stumps.is_empty() {
            return Err(TrainingError::Model("predict called before fit".to_string()));
        }
        Ok(features
            .iter()
            .map(|row| {
                let sum: f64 = self.stumps.iter().map(|s| s.predict_row(row)).sum();
                sum / self.stumps.len() as f64
            })
            .collect())
    }

    fn to_bytes(&self) -> TrainingResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Fits one stump on the sampled rows over a fixed feature, minimizing the
/// sum of squared errors across candidate thresholds.
fn fit_stump(features: &[Vec<f64>], target: &[f64], sample: &[usize], feature: usize) -> Stump {
    let mut pairs: Vec<(f64, f64)> =
        sample.iter().map(|&i| (features[i][feature], target[i])).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mean = pairs.iter().map(|(_, y)| y).sum::<f64>() / pairs.len() as f64;
    let mut best = Stump { feature, threshold: f64::INFINITY, left: mean, right: mean };
    let mut best_sse = sse(&pairs, &best);

    // Candidate thresholds at up to 15 evenly spaced split positions.
    let max_splits = 15.min(pairs.len().saturating_sub(1));
    if max_splits == 0 {
        return best;
    }
    let step = (pairs.len() - 1).div_ceil(max_splits).max(1);
    for split in (1..pairs.len()).step_by(step) {
        let (lo, hi) = (pairs[split - 1].0, pairs[split].0);
        if lo == hi {
            continue;
        }
        let threshold = f64::midpoint(lo, hi);
        let (left_sum, left_n) = pairs[..split]
            .iter()
            .fold((0.0, 0usize), |(s, n), (_, y)| (s + y, n + 1));
        let (right_sum, right_n) = pairs[split..]
            .iter()
            .fold((0.0, 0usize), |(s, n), (_, y)| (s + y, n + 1));
        let candidate = Stump {
            feature,
            threshold,
            left: left_sum / left_n as f64,
            right: right_sum / right_n as f64,
        };
        let candidate_sse = sse(&pairs, &candidate);
        if candidate_sse < best_sse {
            best_sse = candidate_sse;
            best = candidate;
        }
    }
    best
}

fn sse(pairs: &[(f64, f64)], stump: &Stump) -> f64 {
    pairs
        .iter()
        .map(|(x, y)| {
            let pred = if *x <= stump.threshold { stump.left } else { stump.right };
            (y - pred).powi(2)
        })
        .sum()
}
