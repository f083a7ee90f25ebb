//! Error taxonomy for grammar construction and search.
//!
//! Local errors (`IncompleteExpansion`, `RuleNotFound`, `DepthExceeded`,
//! `EvaluationFailed`) are recovered inside the drivers; everything else
//! halts the run and surfaces to the caller.

use thiserror::Error;

/// Errors raised by grammar construction, tree expansion, and the drivers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    /// A rule reference could not be resolved at grammar build time.
    #[error("unknown rule `{0}`")]
    UnknownRule(String),

    /// The min-depth fixpoint never stabilized for a rule: no derivation
    /// from it can reach all-terminal leaves.
    #[error("unproductive grammar: rule `{0}` can never complete")]
    UnproductiveGrammar(String),

    /// No legal action exists at a decision node under the remaining
    /// depth budget.
    #[error("no legal action at depth {depth} under target depth {target_depth}")]
    IncompleteExpansion { depth: u32, target_depth: u32 },

    /// `rand_with_retry` hit its retry cap without producing a complete tree.
    #[error("sampling exhausted after {0} retries")]
    SamplingExhausted(usize),

    /// Crossover found no node in the second parent matching the chosen rule.
    #[error("no node with rule `{0}` in second parent")]
    RuleNotFound(String),

    /// A crossover product exceeded the depth limit.
    #[error("tree depth {depth} exceeds maximum {maxdepth}")]
    DepthExceeded { depth: u32, maxdepth: u32 },

    /// The user fitness function failed. Drivers map this to `+inf`.
    #[error("evaluation failed: {0}")]
    EvaluationFailed(String),
}

impl SearchError {
    /// Errors that drivers recover from locally (retry or substitute)
    /// rather than propagating.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SearchError::IncompleteExpansion { .. }
                | SearchError::RuleNotFound(_)
                | SearchError::DepthExceeded { .. }
                | SearchError::EvaluationFailed(_)
        )
    }
}
