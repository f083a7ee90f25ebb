//! MCTS node and edge structures.
//!
//! Arena-based with index references (`StateId`): each node corresponds
//! to one derivation state, each edge to one grammar action.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::tree::Action;

/// Index into the MCTS tree's node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateId(pub u32);

impl StateId {
    /// Sentinel value representing no state.
    pub const NONE: StateId = StateId(u32::MAX);

    /// Create a new state ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Check if this is the NONE sentinel.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
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

impl std::fmt::Display for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "StateId(NONE)")
        } else {
            write!(f, "StateId({})", self.0)
        }
    }
}

/// Edge representing one action out of a derivation state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MctsEdge {
    /// The grammar action this edge takes.
    pub action: Action,

    /// Child state (NONE until expanded).
    pub child: StateId,

    /// Visit count N(s,a).
    pub n: u32,

    /// Empirical value Q(s,a), initialized to the configured q0.
    pub q: f64,
}

impl MctsEdge {
    /// Create an unexpanded edge with initial value `q0`.
    #[must_use]
    pub fn new(action: Action, q0: f64) -> Self {
        Self {
            action,
            child: StateId::NONE,
            n: 0,
            q: q0,
        }
    }

    /// Check if this edge has been expanded (child exists).
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        !self.child.is_none()
    }
}

/// A node in the MCTS tree: one derivation state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MctsNode {
    /// Parent state (NONE for root).
    pub parent: StateId,

    /// Depth in the MCTS tree (root = 0); equals the number of actions
    /// taken from the empty derivation.
    pub depth: u16,

    /// Total visits N(s).
    pub n: u32,

    /// Terminal state: the derivation completed or dead-ended here.
    pub is_terminal: bool,

    /// Cached terminal value (`-fitness` on completion, the failure
    /// penalty on a dead end); set when the node is created terminal.
    pub terminal_value: Option<f64>,

    /// Every reachable path below is terminal and visited; the driver
    /// stops once the root is exhausted.
    pub exhausted: bool,

    /// Outgoing edges, one per legal action.
    pub edges: SmallVec<[MctsEdge; 8]>,
}

impl MctsNode {
    /// Create a new non-terminal node.
    #[must_use]
    pub fn new(parent: StateId, depth: u16) -> Self {
        Self {
            parent,
            depth,
            n: 0,
            is_terminal: false,
            terminal_value: None,
            exhausted: false,
            edges: SmallVec::new(),
        }
    }

    /// Create a root node.
    #[must_use]
    pub fn root() -> Self {
        Self::new(StateId::NONE, 0)
    }

    /// Mark terminal with its cached value; terminal nodes are exhausted.
    pub fn make_terminal(&mut self, value: f64) {
        self.is_terminal = true;
        self.terminal_value = Some(value);
        self.exhausted = true;
    }

    /// Check if any edges are unexpanded.
    #[must_use]
    pub fn has_unexpanded(&self) -> bool {
        self.edges.iter().any(|e| !e.is_expanded())
    }

    /// Indices of unexpanded edges.
    pub fn unexpanded_edges(&self) -> impl Iterator<Item = usize> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_expanded())
            .map(|(i, _)| i)
    }
}
