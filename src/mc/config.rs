//! Monte Carlo driver configuration.

use serde::{Deserialize, Serialize};

/// Uniform Monte Carlo configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct McConfig {
    /// Depth budget for sampled trees.
    pub maxsteps: u32,

    /// Number of trees to sample and evaluate.
    pub n_samples: usize,

    /// Retry cap per sample before the run fails with `SamplingExhausted`.
    pub max_retries: usize,

    /// Seed for the driver RNG.
    pub seed: u64,
}

impl Default for McConfig {
    fn default() -> Self {
        Self {
            maxsteps: 20,
            n_samples: 1000,
            max_retries: 100,
            seed: 42,
        }
    }
}

impl McConfig {
    /// Set the depth budget.
    #[must_use]
    pub fn with_maxsteps(mut self, maxsteps: u32) -> Self {
        self.maxsteps = maxsteps;
        self
    }

    /// Set the sample count.
    #[must_use]
    pub fn with_n_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = n_samples;
        self
    }

    /// Set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Parallel Monte Carlo configuration: independent workers combined by
/// minimum fitness.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PmcConfig {
    /// Per-worker MC configuration; worker seeds are forked from `mc.seed`.
    pub mc: McConfig,

    /// Number of independent workers.
    pub n_threads: usize,
}

impl Default for PmcConfig {
    fn default() -> Self {
        Self {
            mc: McConfig::default(),
            n_threads: 4,
        }
    }
}

impl PmcConfig {
    /// Set the worker count.
    #[must_use]
    pub fn with_n_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = n_threads;
        self
    }
}
