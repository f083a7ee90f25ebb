//! Arena-based derivation tree.
//!
//! Nodes live in a flat `Vec<DerivNode>` addressed by `NodeId` indices;
//! copying a tree clones two vectors, and crossover is a subtree splice.
//! Non-decision nodes (terminals, references, sequences) are expanded
//! deterministically the moment they are created, so the open frontier
//! only ever holds unexpanded decision nodes, in breadth-first discovery
//! order. A tree is complete when the frontier is empty.

use std::collections::VecDeque;
use std::sync::Arc;

use smallvec::SmallVec;

use super::node::{Action, DerivNode, NodeId};
use crate::expr::Expr;
use crate::grammar::{Grammar, RuleExpr, RuleId};

/// A mutable derivation tree over a grammar.
///
/// Created with the root installed and cascaded; driven to completion by
/// repeated [`DerivationTree::expand`] calls, one per open decision.
#[derive(Clone, Debug)]
pub struct DerivationTree {
    grammar: Arc<Grammar>,
    maxsteps: u32,
    nodes: Vec<DerivNode>,
    root: NodeId,
    frontier: VecDeque<NodeId>,
}

impl DerivationTree {
    /// Create a tree for the grammar's start symbol with depth budget
    /// `maxsteps`, cascading deterministic expansions from the root.
    #[must_use]
    pub fn new(grammar: Arc<Grammar>, maxsteps: u32) -> Self {
        let mut tree = Self {
            grammar,
            maxsteps,
            nodes: Vec::with_capacity(64),
            root: NodeId::new(0),
            frontier: VecDeque::new(),
        };
        tree.install_root();
        tree
    }

    fn install_root(&mut self) {
        let start = self.grammar.start();
        self.nodes.push(DerivNode::new(start, 1));
        self.cascade(self.root);
    }

    /// The grammar this tree derives from.
    #[inline]
    #[must_use]
    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    /// The depth budget.
    #[inline]
    #[must_use]
    pub fn maxsteps(&self) -> u32 {
        self.maxsteps
    }

    /// The root node ID (always 0).
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by ID.
    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> &DerivNode {
        &self.nodes[id.index()]
    }

    /// Arena size, including nodes orphaned by subtree surgery.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty (never, once constructed).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of open (unexpanded) decision nodes.
    #[must_use]
    pub fn num_open(&self) -> usize {
        self.frontier.len()
    }

    /// A tree is complete when no unexpanded decision node remains.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.frontier.is_empty()
    }

    /// The next decision node to expand, if any.
    #[must_use]
    pub fn frontier_head(&self) -> Option<NodeId> {
        self.frontier.front().copied()
    }

    /// Legal actions at the frontier head under the tree's own budget.
    #[must_use]
    pub fn legal_actions(&self) -> SmallVec<[Action; 8]> {
        self.legal_actions_bounded(self.maxsteps)
    }

    /// Legal actions at the frontier head under `target_depth`.
    ///
    /// Action `a` is legal when a complete subtree fits the budget:
    /// `node.depth + min_depth_action(a) - 1 <= target_depth`.
    #[must_use]
    pub fn legal_actions_bounded(&self, target_depth: u32) -> SmallVec<[Action; 8]> {
        let mut legal = SmallVec::new();
        let Some(id) = self.frontier_head() else {
            return legal;
        };
        let node = self.get(id);
        let md = self.grammar.min_depth();
        for k in 0..self.grammar.num_actions(node.rule) {
            if node.depth + md.of_action(node.rule, k) - 1 <= target_depth {
                legal.push(Action::from_index(k));
            }
        }
        legal
    }

    /// Expand the frontier head with the chosen action.
    ///
    /// For an `Or` decision the chosen alternative is materialized and
    /// cascaded; for a `Range` the node becomes a leaf carrying the value.
    /// New decision nodes join the back of the frontier.
    ///
    /// # Panics
    ///
    /// Panics if the tree is complete or the action is out of range.
    pub fn expand(&mut self, action: Action) {
        let Some(id) = self.frontier.pop_front() else {
            panic!("expand called on a complete tree");
        };
        let grammar = Arc::clone(&self.grammar);
        let rule = self.nodes[id.index()].rule;
        assert!(
            action.index() < grammar.num_actions(rule),
            "action {action} out of range for {rule}"
        );
        self.nodes[id.index()].action = Some(action);

        if let RuleExpr::Or(alts) = grammar.expr(rule) {
            let child_rule = alts[action.index()];
            let depth = self.nodes[id.index()].depth + 1;
            let child = self.alloc(DerivNode::new(child_rule, depth));
            self.nodes[id.index()].children.push(child);
            self.cascade(child);
        }
    }

    /// Return the tree to its just-initialized state, keeping allocations.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.frontier.clear();
        self.install_root();
    }

    /// Maximum leaf depth over the reachable tree.
    #[must_use]
    pub fn max_depth(&self) -> u32 {
        self.reachable()
            .into_iter()
            .map(|id| self.get(id).depth)
            .max()
            .unwrap_or(0)
    }

    /// Fold the tree into an expression value.
    ///
    /// Returns `None` while the tree is incomplete.
    #[must_use]
    pub fn expr(&self) -> Option<Expr> {
        if !self.is_complete() {
            return None;
        }
        Some(self.fold(self.root))
    }

    fn fold(&self, id: NodeId) -> Expr {
        let node = self.get(id);
        match self.grammar.expr(node.rule) {
            RuleExpr::Terminal(value) => Expr::Atom(value.clone()),
            RuleExpr::Range(lo, _) => {
                let k = node.action.map_or(0, |a| a.index() as i64);
                Expr::Num(lo + k)
            }
            // Single-child rules are transparent.
            RuleExpr::Ref(_) | RuleExpr::Or(_) => self.fold(node.children[0]),
            RuleExpr::And(_) => {
                Expr::Seq(node.children.iter().map(|&c| self.fold(c)).collect())
            }
        }
    }

    /// The linear action sequence that reconstructs this tree.
    ///
    /// Replays the frontier discipline over the existing structure:
    /// decisions are emitted in the order they were served, so replaying
    /// the returned sequence on a fresh tree rebuilds an identical one.
    /// For an incomplete tree the sequence covers the decisions made so
    /// far.
    #[must_use]
    pub fn action_sequence(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        let mut frontier = VecDeque::new();
        self.discover(self.root, &mut frontier);
        while let Some(id) = frontier.pop_front() {
            let node = self.get(id);
            let Some(action) = node.action else {
                break; // first open decision: nothing beyond it was expanded
            };
            actions.push(action);
            for &child in node.children.iter() {
                self.discover(child, &mut frontier);
            }
        }
        actions
    }

    /// Walk deterministic nodes from `start`, queueing decisions in the
    /// order the cascade discovered them.
    fn discover(&self, start: NodeId, frontier: &mut VecDeque<NodeId>) {
        let mut work = VecDeque::new();
        work.push_back(start);
        while let Some(id) = work.pop_front() {
            let node = self.get(id);
            if self.grammar.is_decision(node.rule) {
                frontier.push_back(id);
            } else {
                work.extend(node.children.iter().copied());
            }
        }
    }

    /// IDs of all nodes reachable from the root, in breadth-first order.
    #[must_use]
    pub fn reachable(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::new();
        queue.push_back(self.root);
        while let Some(id) = queue.pop_front() {
            out.push(id);
            queue.extend(self.get(id).children.iter().copied());
        }
        out
    }

    /// Reachable nodes whose rule is a named non-terminal.
    #[must_use]
    pub fn named_nodes(&self) -> Vec<NodeId> {
        self.reachable()
            .into_iter()
            .filter(|&id| self.grammar.name_of(self.get(id).rule).is_some())
            .collect()
    }

    /// Reachable nodes governed by `rule`.
    #[must_use]
    pub fn nodes_with_rule(&self, rule: RuleId) -> Vec<NodeId> {
        self.reachable()
            .into_iter()
            .filter(|&id| self.get(id).rule == rule)
            .collect()
    }

    /// Reopen a node: discard its subtree and chosen action, and requeue
    /// whatever the cascade leaves open. Frontier entries inside the
    /// discarded subtree are dropped. Orphaned nodes stay in the arena
    /// until [`DerivationTree::compacted`].
    pub fn truncate(&mut self, id: NodeId) {
        let mut removed = vec![id];
        let mut queue: VecDeque<NodeId> = self.get(id).children.iter().copied().collect();
        while let Some(n) = queue.pop_front() {
            removed.push(n);
            queue.extend(self.get(n).children.iter().copied());
        }
        self.frontier.retain(|n| !removed.contains(n));

        let node = &mut self.nodes[id.index()];
        node.action = None;
        node.children.clear();
        self.cascade(id);
    }

    /// Deep copy with orphaned nodes dropped and IDs renumbered.
    #[must_use]
    pub fn compacted(&self) -> Self {
        let order = self.reachable();
        let mut remap = vec![NodeId::new(u32::MAX); self.nodes.len()];
        for (new_idx, &old) in order.iter().enumerate() {
            remap[old.index()] = NodeId::new(new_idx as u32);
        }
        let nodes = order
            .iter()
            .map(|&old| {
                let node = self.get(old);
                DerivNode {
                    rule: node.rule,
                    depth: node.depth,
                    action: node.action,
                    children: node.children.iter().map(|c| remap[c.index()]).collect(),
                }
            })
            .collect();
        let frontier = self.frontier.iter().map(|n| remap[n.index()]).collect();

        Self {
            grammar: Arc::clone(&self.grammar),
            maxsteps: self.maxsteps,
            nodes,
            root: self.root,
            frontier,
        }
    }

    /// Swap the subtrees rooted at `n1` in `t1` and `n2` in `t2`.
    ///
    /// Both nodes must share a rule; each keeps its own depth while the
    /// chosen action and children change hands, with transplanted depths
    /// rebased onto the destination.
    pub fn swap_subtrees(t1: &mut Self, n1: NodeId, t2: &mut Self, n2: NodeId) {
        debug_assert_eq!(t1.get(n1).rule, t2.get(n2).rule, "rule mismatch in swap");
        let s1 = t1.extract_subtree(n1);
        let s2 = t2.extract_subtree(n2);
        t1.implant(n1, &s2);
        t2.implant(n2, &s1);
    }

    /// Copy the subtree rooted at `id` into a standalone buffer with
    /// local indices (root at 0) and source-absolute depths.
    fn extract_subtree(&self, id: NodeId) -> SubtreeCopy {
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(id);
        while let Some(n) = queue.pop_front() {
            order.push(n);
            queue.extend(self.get(n).children.iter().copied());
        }
        let mut local = vec![0u32; self.nodes.len()];
        for (i, &n) in order.iter().enumerate() {
            local[n.index()] = i as u32;
        }
        let nodes = order
            .iter()
            .map(|&n| {
                let node = self.get(n);
                DerivNode {
                    rule: node.rule,
                    depth: node.depth,
                    action: node.action,
                    children: node
                        .children
                        .iter()
                        .map(|c| NodeId::new(local[c.index()]))
                        .collect(),
                }
            })
            .collect();
        SubtreeCopy { nodes }
    }

    /// Replace the subtree at `at` with a copy of `sub`, rebasing depths.
    fn implant(&mut self, at: NodeId, sub: &SubtreeCopy) {
        let shift = self.get(at).depth as i64 - sub.nodes[0].depth as i64;

        // Allocate all non-root subtree nodes, recording their new IDs.
        let base = self.nodes.len() as u32;
        let to_arena =
            |local: NodeId| -> NodeId { NodeId::new(base + local.raw() - 1) };
        for node in &sub.nodes[1..] {
            let copied = DerivNode {
                rule: node.rule,
                depth: (node.depth as i64 + shift) as u32,
                action: node.action,
                children: node.children.iter().map(|&c| to_arena(c)).collect(),
            };
            self.nodes.push(copied);
        }

        let node = &mut self.nodes[at.index()];
        node.action = sub.nodes[0].action;
        node.children = sub.nodes[0].children.iter().map(|&c| to_arena(c)).collect();
    }
}

/// A detached subtree: local indices, root at 0.
struct SubtreeCopy {
    nodes: Vec<DerivNode>,
}

impl DerivationTree {
    /// Allocate a node, returning its ID.
    fn alloc(&mut self, node: DerivNode) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Deterministically expand every non-decision node reachable from
    /// `seed`, queueing decision nodes at the back of the frontier in
    /// breadth-first discovery order. Single-alternative choices are
    /// forced immediately and never reach the frontier.
    fn cascade(&mut self, seed: NodeId) {
        let grammar = Arc::clone(&self.grammar);
        let mut work = VecDeque::new();
        work.push_back(seed);

        while let Some(id) = work.pop_front() {
            let rule = self.nodes[id.index()].rule;
            let depth = self.nodes[id.index()].depth;
            match grammar.expr(rule) {
                RuleExpr::Terminal(_) => {}
                RuleExpr::Range(_, _) => {
                    if grammar.num_actions(rule) == 1 {
                        self.nodes[id.index()].action = Some(Action::new(1));
                    } else {
                        self.frontier.push_back(id);
                    }
                }
                RuleExpr::Or(alts) => {
                    if alts.len() == 1 {
                        let child = self.alloc(DerivNode::new(alts[0], depth + 1));
                        let node = &mut self.nodes[id.index()];
                        node.action = Some(Action::new(1));
                        node.children.push(child);
                        work.push_back(child);
                    } else {
                        self.frontier.push_back(id);
                    }
                }
                RuleExpr::Ref(r) => {
                    let child = self.alloc(DerivNode::new(*r, depth + 1));
                    self.nodes[id.index()].children.push(child);
                    work.push_back(child);
                }
                RuleExpr::And(seq) => {
                    let child_rules: Vec<RuleId> = seq.iter().copied().collect();
                    for child_rule in child_rules {
                        let child = self.alloc(DerivNode::new(child_rule, depth + 1));
                        self.nodes[id.index()].children.push(child);
                        work.push_back(child);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarBuilder, Rule};

    fn arith() -> Arc<Grammar> {
        Arc::new(
            GrammarBuilder::new()
                .rule("start", Rule::reference("expr"))
                .rule(
                    "expr",
                    Rule::or(vec![
                        Rule::reference("num"),
                        Rule::and(vec![
                            Rule::reference("expr"),
                            Rule::reference("op"),
                            Rule::reference("expr"),
                        ]),
                    ]),
                )
                .rule(
                    "op",
                    Rule::or(vec![
                        Rule::terminal("+"),
                        Rule::terminal("*"),
                        Rule::terminal("-"),
                    ]),
                )
                .rule("num", Rule::range(1, 3))
                .build("start")
                .unwrap(),
        )
    }

    #[test]
    fn test_new_tree_has_open_decision() {
        let tree = DerivationTree::new(arith(), 10);
        // Root (a reference) cascades down to the `expr` choice.
        assert!(!tree.is_complete());
        assert_eq!(tree.num_open(), 1);
        let head = tree.frontier_head().unwrap();
        assert_eq!(
            tree.grammar().name_of(tree.get(head).rule),
            Some("expr")
        );
    }

    #[test]
    fn test_expand_to_single_num() {
        let mut tree = DerivationTree::new(arith(), 10);
        tree.expand(Action::new(1)); // expr -> num
        assert!(!tree.is_complete());
        tree.expand(Action::new(2)); // num -> 2
        assert!(tree.is_complete());
        assert_eq!(tree.expr(), Some(Expr::Num(2)));
        assert_eq!(tree.max_depth(), 3);
    }

    #[test]
    fn test_expand_binop_breadth_first() {
        let mut tree = DerivationTree::new(arith(), 10);
        tree.expand(Action::new(2)); // expr -> expr op expr
        // Frontier now holds: left expr, op, right expr.
        assert_eq!(tree.num_open(), 3);
        tree.expand(Action::new(1)); // left expr -> num
        tree.expand(Action::new(1)); // op -> "+"
        tree.expand(Action::new(1)); // right expr -> num
        assert_eq!(tree.num_open(), 2);
        tree.expand(Action::new(1)); // left num -> 1
        tree.expand(Action::new(3)); // right num -> 3
        assert!(tree.is_complete());
        assert_eq!(
            tree.expr().unwrap().to_string(),
            "1 + 3"
        );
    }

    #[test]
    fn test_legal_actions_respect_budget() {
        // Budget so tight the recursive alternative cannot fit.
        let mut tree = DerivationTree::new(arith(), 3);
        let legal = tree.legal_actions();
        assert_eq!(legal.as_slice(), &[Action::new(1)]);

        tree.expand(Action::new(1));
        // Range node: every value fits in the remaining budget.
        assert_eq!(tree.legal_actions().len(), 3);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut tree = DerivationTree::new(arith(), 10);
        tree.expand(Action::new(1));
        tree.expand(Action::new(1));
        assert!(tree.is_complete());

        tree.reset();
        assert!(!tree.is_complete());
        assert_eq!(tree.num_open(), 1);
        assert_eq!(tree.expr(), None);
    }

    #[test]
    fn test_truncate_reopens_subtree() {
        let mut tree = DerivationTree::new(arith(), 10);
        tree.expand(Action::new(1)); // expr -> num
        tree.expand(Action::new(2)); // num -> 2
        assert!(tree.is_complete());

        // Reopen the expr choice; the whole derivation below is discarded.
        let expr_node = tree.named_nodes()
            .into_iter()
            .find(|&id| tree.grammar().name_of(tree.get(id).rule) == Some("expr"))
            .unwrap();
        tree.truncate(expr_node);
        assert!(!tree.is_complete());
        assert_eq!(tree.frontier_head(), Some(expr_node));

        tree.expand(Action::new(1));
        tree.expand(Action::new(3));
        assert_eq!(tree.expr(), Some(Expr::Num(3)));
    }

    #[test]
    fn test_compacted_drops_orphans() {
        let mut tree = DerivationTree::new(arith(), 10);
        tree.expand(Action::new(2));
        for _ in 0..3 {
            tree.expand(Action::new(1));
        }
        tree.expand(Action::new(1));
        tree.expand(Action::new(2));
        assert!(tree.is_complete());
        let expr_before = tree.expr();

        // Mutating the op leaves orphans behind.
        let op_node = tree.reachable()
            .into_iter()
            .find(|&id| tree.grammar().name_of(tree.get(id).rule) == Some("op"))
            .unwrap();
        tree.truncate(op_node);
        tree.expand(Action::new(3)); // op -> "-"
        assert!(tree.len() > tree.reachable().len());

        let compact = tree.compacted();
        assert_eq!(compact.len(), compact.reachable().len());
        assert_eq!(compact.expr().unwrap().to_string(), "1 - 2");
        assert_ne!(Some(compact.expr().unwrap()), expr_before);
    }

    #[test]
    fn test_swap_subtrees() {
        let grammar = arith();
        // t1 = 1 + 2
        let mut t1 = DerivationTree::new(Arc::clone(&grammar), 10);
        t1.expand(Action::new(2));
        t1.expand(Action::new(1));
        t1.expand(Action::new(1));
        t1.expand(Action::new(1));
        t1.expand(Action::new(1));
        t1.expand(Action::new(2));
        assert_eq!(t1.expr().unwrap().to_string(), "1 + 2");

        // t2 = 3
        let mut t2 = DerivationTree::new(Arc::clone(&grammar), 10);
        t2.expand(Action::new(1));
        t2.expand(Action::new(3));
        assert_eq!(t2.expr().unwrap().to_string(), "3");

        // Swap t1's left operand with t2's whole expr.
        let expr_rule = grammar.rule_id("expr").unwrap();
        let n1 = t1.nodes_with_rule(expr_rule)[1]; // left operand
        let n2 = t2.nodes_with_rule(expr_rule)[0];
        DerivationTree::swap_subtrees(&mut t1, n1, &mut t2, n2);

        assert!(t1.is_complete());
        assert!(t2.is_complete());
        assert_eq!(t1.expr().unwrap().to_string(), "3 + 2");
        assert_eq!(t2.expr().unwrap().to_string(), "1");
    }

    #[test]
    fn test_action_sequence_roundtrip() {
        let grammar = arith();
        let mut tree = DerivationTree::new(Arc::clone(&grammar), 10);
        let taken = [2, 2, 1, 1, 1, 2, 1, 2, 1, 3];
        for a in taken {
            tree.expand(Action::new(a));
        }
        assert!(tree.is_complete());

        let seq = tree.action_sequence();
        assert_eq!(
            seq,
            taken.map(Action::new).to_vec(),
            "sequence must match the order actions were taken"
        );

        // Replay on a fresh tree rebuilds an identical expression.
        let mut fresh = DerivationTree::new(Arc::clone(&grammar), 10);
        for a in seq {
            fresh.expand(a);
        }
        assert_eq!(fresh.expr(), tree.expr());
    }

    #[test]
    fn test_action_sequence_survives_surgery() {
        let grammar = arith();
        let mut tree = DerivationTree::new(Arc::clone(&grammar), 10);
        for a in [2, 1, 1, 1, 1, 2] {
            tree.expand(Action::new(a));
        }
        // Mutate the op; arena order no longer matches creation order.
        let op_node = tree.reachable()
            .into_iter()
            .find(|&id| tree.grammar().name_of(tree.get(id).rule) == Some("op"))
            .unwrap();
        tree.truncate(op_node);
        tree.expand(Action::new(2)); // op -> "*"

        let seq = tree.action_sequence();
        let mut fresh = DerivationTree::new(Arc::clone(&grammar), 10);
        for a in seq {
            fresh.expand(a);
        }
        assert_eq!(fresh.expr(), tree.expr());
        assert_eq!(fresh.expr().unwrap().to_string(), "1 * 2");
    }

    #[test]
    fn test_swap_rebases_depths() {
        let grammar = arith();
        let mut t1 = DerivationTree::new(Arc::clone(&grammar), 10);
        t1.expand(Action::new(2));
        t1.expand(Action::new(1));
        t1.expand(Action::new(1));
        t1.expand(Action::new(1));
        t1.expand(Action::new(1));
        t1.expand(Action::new(2));

        let mut t2 = DerivationTree::new(Arc::clone(&grammar), 10);
        t2.expand(Action::new(1));
        t2.expand(Action::new(3));

        let expr_rule = grammar.rule_id("expr").unwrap();
        let n1 = t1.nodes_with_rule(expr_rule)[1];
        let n2 = t2.nodes_with_rule(expr_rule)[0];
        let d1 = t1.get(n1).depth;
        let d2 = t2.get(n2).depth;
        DerivationTree::swap_subtrees(&mut t1, n1, &mut t2, n2);

        // Depths at the splice points are unchanged; children line up.
        assert_eq!(t1.get(n1).depth, d1);
        assert_eq!(t2.get(n2).depth, d2);
        for &c in t1.get(n1).children.iter() {
            assert_eq!(t1.get(c).depth, d1 + 1);
        }
    }
}
