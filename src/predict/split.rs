//! Reproducible train/test partitioning.
//!
//! The test set size is `ceil(test_fraction × n)`. Row indices are shuffled with
//! a `StdRng` seeded from the config, so the same seed and the same `n` always
//! give the same partition.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::domain::SplitConfig;
use crate::error::PipelineError;

/// Row indices of each partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn train_test_split(n: usize, config: &SplitConfig) -> Result<TrainTestSplit, PipelineError> {
    let fraction = config.test_fraction;
    if !(fraction.is_finite() && fraction > 0.0 && fraction < 1.0) {
        return Err(PipelineError::invalid(format!(
            "test fraction must lie in (0, 1), got {fraction}"
        )));
    }
    if n < 2 {
        return Err(PipelineError::InsufficientData {
            operation: "train/test split",
            required: 2,
            actual: n,
        });
    }

    let n_test = (fraction * n as f64).ceil() as usize;
    if n_test >= n {
        return Err(PipelineError::invalid(format!(
            "test fraction {fraction} leaves no training rows out of {n}"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(TrainTestSplit { train, test: indices })
}
