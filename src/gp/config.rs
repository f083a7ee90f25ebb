//! Genetic programming driver configuration.

use serde::{Deserialize, Serialize};

use crate::expr::Expr;

/// GP configuration parameters.
///
/// The breeding fractions (`top_keep`, `crossover_frac`, `mutate_frac`,
/// `rand_frac`) are taken of `pop_size` and floored independently; any
/// shortfall is filled with tournament-selected clones.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GpConfig {
    /// Population size, held constant across generations.
    pub pop_size: usize,

    /// Maximum tree depth for every individual.
    pub maxdepth: u32,

    /// Number of generations to run.
    pub iterations: usize,

    /// Individuals sampled per tournament; the winner is the best of the
    /// sample.
    pub tournament_size: usize,

    /// Fraction of the population copied unchanged (elitism).
    pub top_keep: f64,

    /// Fraction of the population produced by crossover.
    pub crossover_frac: f64,

    /// Fraction of the population produced by mutation.
    pub mutate_frac: f64,

    /// Fraction of the population freshly sampled each generation.
    pub rand_frac: f64,

    /// Cap on consecutive failed breeding or sampling attempts.
    pub max_retries: usize,

    /// Expression substituted when a fitness evaluation fails.
    pub default_expr: Expr,

    /// Seed for the driver RNG.
    pub seed: u64,
}

impl Default for GpConfig {
    fn default() -> Self {
        Self {
            pop_size: 100,
            maxdepth: 10,
            iterations: 40,
            tournament_size: 5,
            top_keep: 0.1,
            crossover_frac: 0.4,
            mutate_frac: 0.2,
            rand_frac: 0.2,
            max_retries: 100,
            default_expr: Expr::Num(0),
            seed: 42,
        }
    }
}

impl GpConfig {
    /// Set the population size.
    #[must_use]
    pub fn with_pop_size(mut self, pop_size: usize) -> Self {
        self.pop_size = pop_size;
        self
    }

    /// Set the depth limit.
    #[must_use]
    pub fn with_maxdepth(mut self, maxdepth: u32) -> Self {
        self.maxdepth = maxdepth;
        self
    }

    /// Set the generation count.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the tournament size.
    #[must_use]
    pub fn with_tournament_size(mut self, tournament_size: usize) -> Self {
        self.tournament_size = tournament_size;
        self
    }

    /// Set the breeding fractions.
    #[must_use]
    pub fn with_fractions(
        mut self,
        top_keep: f64,
        crossover: f64,
        mutate: f64,
        rand: f64,
    ) -> Self {
        self.top_keep = top_keep;
        self.crossover_frac = crossover;
        self.mutate_frac = mutate;
        self.rand_frac = rand;
        self
    }

    /// Set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
