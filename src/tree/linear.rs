//! Linear view of a derivation tree for MDP use.
//!
//! Records actions in visitation order; because non-decision nodes cascade
//! deterministically and open decisions are served breadth-first, the
//! action sequence alone reconstructs the tree.

use std::sync::Arc;

use super::derivation::DerivationTree;
use super::node::Action;
use crate::grammar::Grammar;

/// A derivation tree plus its recorded action sequence.
#[derive(Clone, Debug)]
pub struct LinearDerivTree {
    tree: DerivationTree,
    actions: Vec<Action>,
}

impl LinearDerivTree {
    /// Create an empty linear tree (root installed, no actions taken).
    #[must_use]
    pub fn new(grammar: Arc<Grammar>, maxsteps: u32) -> Self {
        Self {
            tree: DerivationTree::new(grammar, maxsteps),
            actions: Vec::new(),
        }
    }

    /// The underlying derivation tree.
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &DerivationTree {
        &self.tree
    }

    /// Actions taken so far, in visitation order.
    #[inline]
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Apply an action at the current open decision and record it.
    pub fn expand(&mut self, action: Action) {
        self.tree.expand(action);
        self.actions.push(action);
    }

    /// Legal actions at the current open decision under the tree budget.
    #[must_use]
    pub fn legal_actions(&self) -> smallvec::SmallVec<[Action; 8]> {
        self.tree.legal_actions()
    }

    /// The tree is complete: every decision has been made.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.tree.is_complete()
    }

    /// The state cannot advance: an open decision has no legal action
    /// under the depth budget.
    #[must_use]
    pub fn is_dead_end(&self) -> bool {
        !self.is_complete() && self.legal_actions().is_empty()
    }

    /// Terminal for the derivation MDP: complete, or stuck at the budget.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.is_complete() || self.legal_actions().is_empty()
    }

    /// Rebuild a linear tree by replaying a recorded action sequence on a
    /// fresh tree.
    #[must_use]
    pub fn replay(grammar: Arc<Grammar>, maxsteps: u32, actions: &[Action]) -> Self {
        let mut linear = Self::new(grammar, maxsteps);
        for &action in actions {
            linear.expand(action);
        }
        linear
    }
}
