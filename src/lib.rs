//! # exprsearch
//!
//! A grammar-driven expression-search engine: cooperating search drivers
//! that discover expressions of a user-supplied context-free grammar
//! minimizing a user-supplied fitness function.
//!
//! ## Design Principles
//!
//! 1. **Arena trees**: Derivation trees and the MCTS tree store nodes in
//!    flat vectors addressed by integer IDs. Copying is a vector clone,
//!    crossover a subtree splice; no reference counting, no back-pointers.
//!
//! 2. **Deterministic given a seed**: Every driver owns a forkable
//!    ChaCha8 RNG; the same seed, grammar, and fitness function
//!    reproduce a run exactly.
//!
//! 3. **Depth-bounded by construction**: Min-depth tables computed at
//!    grammar build time prune every choice that cannot complete under
//!    the remaining budget, so random generation always terminates.
//!
//! 4. **User code behind traits**: Problems implement [`ExprProblem`];
//!    telemetry flows through the [`SearchObserver`] sink; batch fitness
//!    evaluation is swappable via the GP `Evaluator` seam.
//!
//! ## Modules
//!
//! - `grammar`: BNF rules in arena form; min-depth fixpoint tables
//! - `tree`: derivation trees, linear action view, random generation
//! - `expr`: the folded expression value handed to fitness functions
//! - `mc`: uniform Monte Carlo driver and its parallel combinator
//! - `gp`: tree-based genetic programming driver
//! - `mcts`: UCT search over the derivation-tree MDP
//! - `problem`: the driver/user contract and the uniform result record
//! - `observer`: event sink for telemetry
//! - `error`: the error taxonomy
//! - `rng`: deterministic forkable RNG

pub mod error;
pub mod expr;
pub mod grammar;
pub mod gp;
pub mod mc;
pub mod mcts;
pub mod observer;
pub mod problem;
pub mod rng;
pub mod tree;

// Re-export commonly used types
pub use crate::error::SearchError;
pub use crate::expr::Expr;
pub use crate::grammar::{Grammar, GrammarBuilder, MinDepth, Rule, RuleExpr, RuleId};
pub use crate::tree::{
    generate, rand_with_retry, Action, DerivNode, DerivationTree, LinearDerivTree, NodeId,
};
pub use crate::problem::{ExprProblem, SearchResult};
pub use crate::observer::{NullObserver, SearchObserver};
pub use crate::rng::SearchRng;

pub use crate::mc::{McConfig, McSearch, ParallelMcSearch, PmcConfig};
pub use crate::gp::{
    Evaluator, GpConfig, GpIndividual, GpSearch, ParallelEvaluator, SequentialEvaluator,
};
pub use crate::mcts::{MctsConfig, MctsSearch, MctsStats, MctsTree};
