//! MCTS search statistics for diagnostics and tuning.

use serde::{Deserialize, Serialize};

/// Statistics collected during MCTS search.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MctsStats {
    /// Total iterations performed.
    pub iterations: u32,

    /// Nodes expanded (added to tree).
    pub nodes_expanded: u32,

    /// Rollouts performed.
    pub rollouts: u32,

    /// Complete derivations evaluated.
    pub evaluations: u32,

    /// Maximum depth reached during search.
    pub max_depth: u16,

    /// Total time spent searching (microseconds).
    pub time_us: u64,
}

impl MctsStats {
    /// Create new empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all statistics to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Calculate iterations per second.
    #[must_use]
    pub fn iterations_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.iterations as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }

    /// Calculate rollouts per second.
    #[must_use]
    pub fn rollouts_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.rollouts as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = MctsStats::new();
        assert_eq!(stats.iterations, 0);
        assert_eq!(stats.rollouts, 0);
        assert_eq!(stats.iterations_per_second(), 0.0);
    }

    #[test]
    fn test_stats_rates() {
        let mut stats = MctsStats::new();
        stats.iterations = 1000;
        stats.rollouts = 500;
        stats.time_us = 1_000_000;
        assert_eq!(stats.iterations_per_second(), 1000.0);
        assert_eq!(stats.rollouts_per_second(), 500.0);
    }

    #[test]
    fn test_stats_reset() {
        let mut stats = MctsStats::new();
        stats.iterations = 100;
        stats.reset();
        assert_eq!(stats.iterations, 0);
    }

    #[test]
    fn test_stats_serialization() {
        let mut stats = MctsStats::new();
        stats.evaluations = 42;
        let json = serde_json::to_string(&stats).unwrap();
        let back: MctsStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back.evaluations, 42);
    }
}
