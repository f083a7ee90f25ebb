//! Monte Carlo Tree Search over the derivation-tree MDP.
//!
//! ## Overview
//!
//! - **Arena tree**: states in a flat vector addressed by `StateId`
//! - **Deterministic MDP**: a state is the linear action sequence; the
//!   search tree is a trie of sequences, states rebuilt during descent
//! - **UCT selection** with unexplored-first priority and configurable
//!   exploration constant
//! - **Mean or max backup** (`maxmod`) of discounted returns
//! - **Exhaustion-aware**: finished subtrees are skipped and the run
//!   stops early once the root is exhausted
//!
//! ## Usage
//!
//! ```rust,ignore
//! use exprsearch::mcts::{MctsConfig, MctsSearch};
//!
//! let config = MctsConfig::default().with_maxsteps(10).with_n_iters(2000);
//! let mut search = MctsSearch::new(problem, config);
//! let result = search.run()?;
//! println!("best: {} (fitness {})", result.expr, result.fitness);
//! ```

pub mod config;
pub mod node;
pub mod search;
pub mod stats;
pub mod tree;

pub use config::MctsConfig;
pub use node::{MctsEdge, MctsNode, StateId};
pub use search::MctsSearch;
pub use stats::MctsStats;
pub use tree::{MctsTree, TreeStats};
