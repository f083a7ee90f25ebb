//! Derivation trees: the mutable parse structure every driver searches over.
//!
//! - `node`: arena node and the 1-based [`Action`] selector
//! - `derivation`: the tree itself (expansion, folding, subtree surgery)
//! - `linear`: tree + recorded action sequence, the MDP state
//! - `generate`: depth-bounded uniform random generation

pub mod derivation;
pub mod generate;
pub mod linear;
pub mod node;

pub use derivation::DerivationTree;
pub use generate::{generate, rand_with_retry};
pub use linear::LinearDerivTree;
pub use node::{Action, DerivNode, NodeId};
