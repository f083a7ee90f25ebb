//! Derivation-tree node and the action type.
//!
//! Nodes live in an arena inside `DerivationTree` and are addressed by
//! [`NodeId`] indices; algorithms traverse top-down, so no parent pointers
//! are stored and depth is recorded rather than derived.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::grammar::RuleId;

/// Index into a derivation tree's node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new node ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw index value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// 1-based branch selector at a decision node.
///
/// Action `k` picks the k-th alternative of an `Or` rule, or the k-th
/// integer of a `Range` rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action(pub u16);

impl Action {
    /// Create an action; `k` is 1-based.
    #[must_use]
    pub const fn new(k: u16) -> Self {
        debug_assert!(k >= 1);
        Self(k)
    }

    /// Action for the 0-based alternative index `i`.
    #[must_use]
    pub fn from_index(i: usize) -> Self {
        Self(i as u16 + 1)
    }

    /// 0-based alternative index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in a derivation tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DerivNode {
    /// The production governing this node.
    pub rule: RuleId,

    /// Distance from the root (root = 1).
    pub depth: u32,

    /// The action chosen here, if the rule is a choice. `None` while the
    /// node is still open.
    pub action: Option<Action>,

    /// Ordered child nodes.
    pub children: SmallVec<[NodeId; 4]>,
}

impl DerivNode {
    /// Create a fresh, unexpanded node.
    #[must_use]
    pub fn new(rule: RuleId, depth: u32) -> Self {
        Self {
            rule,
            depth,
            action: None,
            children: SmallVec::new(),
        }
    }
}
