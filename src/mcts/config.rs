//! MCTS driver configuration.

use serde::{Deserialize, Serialize};

/// MCTS configuration parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MctsConfig {
    /// Depth budget for derivation trees.
    pub maxsteps: u32,

    /// Number of search iterations (select / expand / rollout / backup).
    pub n_iters: usize,

    /// Rollout step cap; a rollout that has not completed its derivation
    /// by then scores `max_neg_reward`.
    pub searchdepth: u32,

    /// UCT exploration constant.
    pub exploration_const: f64,

    /// Initial Q value for unvisited edges.
    pub q0: f64,

    /// Reward for reaching an incomplete or dead-end terminal.
    pub max_neg_reward: f64,

    /// Reward per non-terminal step (typically 0 or slightly negative).
    pub step_reward: f64,

    /// Discount factor for future rewards (1.0 = no discount).
    pub gamma: f64,

    /// Back up a running max over observed returns instead of the mean.
    pub maxmod: bool,

    /// Maximum nodes to allocate in the tree.
    pub max_nodes: usize,

    /// Seed for the driver RNG.
    pub seed: u64,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            maxsteps: 20,
            n_iters: 1000,
            searchdepth: 20,
            exploration_const: std::f64::consts::SQRT_2,
            q0: 0.0,
            max_neg_reward: -100.0,
            step_reward: 0.0,
            gamma: 1.0,
            maxmod: false,
            max_nodes: 100_000,
            seed: 42,
        }
    }
}

impl MctsConfig {
    /// Set the depth budget.
    #[must_use]
    pub fn with_maxsteps(mut self, maxsteps: u32) -> Self {
        self.maxsteps = maxsteps;
        self
    }

    /// Set the iteration count.
    #[must_use]
    pub fn with_n_iters(mut self, n_iters: usize) -> Self {
        self.n_iters = n_iters;
        self
    }

    /// Set the rollout step cap.
    #[must_use]
    pub fn with_searchdepth(mut self, searchdepth: u32) -> Self {
        self.searchdepth = searchdepth;
        self
    }

    /// Set the exploration constant.
    #[must_use]
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration_const = c;
        self
    }

    /// Switch between running-max and running-mean Q updates.
    #[must_use]
    pub fn with_maxmod(mut self, maxmod: bool) -> Self {
        self.maxmod = maxmod;
        self
    }

    /// Set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
