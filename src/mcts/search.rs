//! UCT search over the derivation-tree MDP.
//!
//! States are linear derivation trees; actions are grammar actions at the
//! current open decision. Transitions are deterministic, so the search
//! tree is a trie of action sequences: each iteration rebuilds the state
//! by applying edge actions while descending, expands one node, rolls out
//! uniformly to a terminal, and backs the discounted return up the path.

use std::sync::Arc;
use std::time::Instant;

use super::config::MctsConfig;
use super::node::{MctsEdge, MctsNode, StateId};
use super::stats::MctsStats;
use super::tree::MctsTree;
use crate::error::SearchError;
use crate::grammar::Grammar;
use crate::observer::{unix_now, NullObserver, SearchObserver};
use crate::problem::{ExprProblem, SearchResult};
use crate::rng::SearchRng;
use crate::tree::LinearDerivTree;

/// MCTS driver.
pub struct MctsSearch<P: ExprProblem> {
    problem: P,
    config: MctsConfig,
    tree: MctsTree,
    rng: SearchRng,
    observer: Box<dyn SearchObserver>,
    stats: MctsStats,
}

impl<P: ExprProblem> MctsSearch<P> {
    /// Create a new MCTS driver.
    pub fn new(problem: P, config: MctsConfig) -> Self {
        let rng = SearchRng::new(config.seed);
        let tree = MctsTree::with_capacity(config.max_nodes.min(1 << 16));
        Self {
            problem,
            config,
            tree,
            rng,
            observer: Box::new(NullObserver),
            stats: MctsStats::default(),
        }
    }

    /// Attach an observer sink.
    #[must_use]
    pub fn with_observer<O: SearchObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// The problem.
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Search statistics.
    #[must_use]
    pub fn stats(&self) -> &MctsStats {
        &self.stats
    }

    /// The search tree.
    #[must_use]
    pub fn tree(&self) -> &MctsTree {
        &self.tree
    }

    /// Run the search: iterate until `n_iters`, the node budget, or an
    /// exhausted root.
    pub fn run(&mut self) -> Result<SearchResult, SearchError> {
        self.problem.on_start();
        self.emit_parameters();
        let start = Instant::now();
        self.observer.compute_info("starttime", &unix_now());
        self.stats.reset();
        self.tree.reset();

        let grammar = Arc::clone(self.problem.grammar());
        let root_state = LinearDerivTree::new(Arc::clone(&grammar), self.config.maxsteps);
        let mut result = SearchResult::unevaluated(root_state.tree().clone());

        // Degenerate roots: a grammar with no decisions completes
        // immediately; a budget below the grammar minimum never starts.
        if root_state.is_complete() {
            if let Some(expr) = root_state.tree().expr() {
                let fitness = match self.problem.fitness(&expr) {
                    Ok(f) => f,
                    Err(err) => {
                        log::debug!("fitness evaluation failed: {err}");
                        f64::INFINITY
                    }
                };
                result.total_evals = 1;
                result.consider(fitness, 1, || {
                    (expr.clone(), Vec::new(), root_state.tree().compacted())
                });
            }
            self.observer.result(&result);
            return Ok(result);
        }
        self.init_node_edges(self.tree.root(), &root_state);
        if self.tree.root_node().edges.is_empty() {
            log::warn!(
                "no legal action at the root under maxsteps {}",
                self.config.maxsteps
            );
            self.observer.result(&result);
            return Ok(result);
        }

        for i in 1..=self.config.n_iters {
            if self.tree.root_node().exhausted {
                self.observer.verbose("root exhausted, stopping early");
                break;
            }
            if self.tree.len() >= self.config.max_nodes {
                self.observer.verbose("node budget reached, stopping early");
                break;
            }
            self.observer.iteration(i);
            self.iteration(&grammar, &mut result);
            self.stats.iterations += 1;

            self.observer.mcts_tree(i, &self.tree, &root_state);
            self.observer.current_best(
                result.total_evals,
                result.fitness,
                &result.expr,
                &result.actions,
            );
            self.observer
                .elapsed_cpu_s(result.total_evals, start.elapsed().as_secs_f64());
        }

        self.stats.time_us = start.elapsed().as_micros() as u64;
        self.observer.compute_info("endtime", &unix_now());
        self.observer
            .compute_info("cpu_time", &start.elapsed().as_secs_f64().to_string());
        self.observer.result(&result);
        Ok(result)
    }

    fn emit_parameters(&mut self) {
        let c = &self.config;
        self.observer.parameter("maxsteps", &c.maxsteps.to_string());
        self.observer.parameter("n_iters", &c.n_iters.to_string());
        self.observer
            .parameter("searchdepth", &c.searchdepth.to_string());
        self.observer
            .parameter("exploration_const", &c.exploration_const.to_string());
        self.observer.parameter("q0", &c.q0.to_string());
        self.observer
            .parameter("max_neg_reward", &c.max_neg_reward.to_string());
        self.observer
            .parameter("step_reward", &c.step_reward.to_string());
        self.observer.parameter("gamma", &c.gamma.to_string());
        self.observer.parameter("maxmod", &c.maxmod.to_string());
        self.observer.parameter("seed", &c.seed.to_string());
    }

    /// One iteration: select by UCT, expand one node, roll out, back up.
    fn iteration(&mut self, grammar: &Arc<Grammar>, result: &mut SearchResult) {
        let mut state = LinearDerivTree::new(Arc::clone(grammar), self.config.maxsteps);
        let mut path: Vec<(StateId, usize)> = Vec::new();
        let mut current = self.tree.root();

        let leaf_return = loop {
            let node = self.tree.get(current);

            // Terminal revisit: the edge into it earns the cached value.
            if node.is_terminal {
                break node.terminal_value.unwrap_or(self.config.max_neg_reward);
            }

            if node.has_unexpanded() {
                // === EXPANSION ===
                let edge_idx = self.select_unexpanded(current);
                let action = self.tree.get(current).edges[edge_idx].action;
                path.push((current, edge_idx));
                state.expand(action);

                let depth = self.tree.get(current).depth + 1;
                let child = self.tree.alloc(MctsNode::new(current, depth));
                self.tree.get_mut(current).edges[edge_idx].child = child;
                self.tree.get_mut(child).n = 1;
                self.stats.nodes_expanded += 1;
                if depth > self.stats.max_depth {
                    self.stats.max_depth = depth;
                }

                if state.is_complete() {
                    let value = self.evaluate_complete(&state, result);
                    self.tree.get_mut(child).make_terminal(value);
                    break value;
                }
                if state.legal_actions().is_empty() {
                    let value = self.config.max_neg_reward;
                    self.tree.get_mut(child).make_terminal(value);
                    break value;
                }

                self.init_node_edges(child, &state);

                // === ROLLOUT ===
                let rollout_return = self.rollout(&mut state, result);
                break self.config.step_reward + self.config.gamma * rollout_return;
            }

            // === SELECTION ===
            let edge_idx = self.select_uct(current);
            let (action, child) = {
                let edge = &self.tree.get(current).edges[edge_idx];
                (edge.action, edge.child)
            };
            path.push((current, edge_idx));
            state.expand(action);
            current = child;
        };

        self.backup(&path, leaf_return);
    }

    /// Populate a node's edges from the state's legal actions.
    fn init_node_edges(&mut self, id: StateId, state: &LinearDerivTree) {
        let q0 = self.config.q0;
        let edges = state
            .legal_actions()
            .iter()
            .map(|&a| MctsEdge::new(a, q0))
            .collect();
        self.tree.get_mut(id).edges = edges;
    }

    /// Pick an unexpanded edge uniformly.
    fn select_unexpanded(&mut self, id: StateId) -> usize {
        let unexpanded: Vec<usize> = self.tree.get(id).unexpanded_edges().collect();
        if unexpanded.len() == 1 {
            unexpanded[0]
        } else {
            unexpanded[self.rng.gen_range_usize(0..unexpanded.len())]
        }
    }

    /// UCT over expanded edges, skipping exhausted subtrees.
    fn select_uct(&self, id: StateId) -> usize {
        let node = self.tree.get(id);
        let ln_parent = (node.n.max(1) as f64).ln();

        let score = |edge: &MctsEdge| {
            if edge.n == 0 {
                f64::INFINITY
            } else {
                edge.q
                    + self.config.exploration_const * (ln_parent / edge.n as f64).sqrt()
            }
        };

        let mut best = None;
        let mut best_score = f64::NEG_INFINITY;
        for (i, edge) in node.edges.iter().enumerate() {
            if edge.is_expanded() && self.tree.get(edge.child).exhausted {
                continue;
            }
            let s = score(edge);
            if s > best_score || best.is_none() {
                best_score = s;
                best = Some(i);
            }
        }
        // All children exhausted: any edge works, values are settled.
        best.unwrap_or(0)
    }

    /// Uniform random rollout from a non-terminal state, capped at
    /// `searchdepth` steps. Returns the discounted return from `state`.
    fn rollout(&mut self, state: &mut LinearDerivTree, result: &mut SearchResult) -> f64 {
        self.stats.rollouts += 1;
        let mut ret = 0.0;
        let mut discount = 1.0;
        let mut steps = 0;

        loop {
            let legal = state.legal_actions();
            if legal.is_empty() || steps >= self.config.searchdepth {
                ret += discount * self.config.max_neg_reward;
                break;
            }
            let pick = legal[self.rng.gen_range_usize(0..legal.len())];
            state.expand(pick);
            steps += 1;

            if state.is_complete() {
                ret += discount * self.evaluate_complete(state, result);
                break;
            }
            ret += discount * self.config.step_reward;
            discount *= self.config.gamma;
        }
        ret
    }

    /// Score a completed derivation; returns its reward (`-fitness`, or
    /// the failure penalty when evaluation fails).
    fn evaluate_complete(
        &mut self,
        state: &LinearDerivTree,
        result: &mut SearchResult,
    ) -> f64 {
        let expr = state.tree().expr().expect("state is complete");
        let fitness = match self.problem.fitness(&expr) {
            Ok(f) => f,
            Err(err) => {
                log::debug!("fitness evaluation failed: {err}");
                f64::INFINITY
            }
        };
        self.stats.evaluations += 1;
        result.total_evals += 1;

        if fitness.is_finite() {
            result.consider(fitness, result.total_evals, || {
                (expr.clone(), state.actions().to_vec(), state.tree().compacted())
            });
            -fitness
        } else {
            self.config.max_neg_reward
        }
    }

    /// Back the return up the path, updating visit counts, Q values, and
    /// exhaustion flags.
    fn backup(&mut self, path: &[(StateId, usize)], leaf_return: f64) {
        let last = path.len().saturating_sub(1);
        let mut ret = leaf_return;

        for (i, &(sid, edge_idx)) in path.iter().enumerate().rev() {
            if i != last {
                ret = self.config.step_reward + self.config.gamma * ret;
            }
            let node = self.tree.get_mut(sid);
            node.n += 1;
            let edge = &mut node.edges[edge_idx];
            edge.n += 1;
            if self.config.maxmod {
                edge.q = if edge.n == 1 { ret } else { edge.q.max(ret) };
            } else {
                edge.q += (ret - edge.q) / f64::from(edge.n);
            }
        }

        // Exhaustion propagates while every child of a node is settled.
        for &(sid, _) in path.iter().rev() {
            let node = self.tree.get(sid);
            let settled = !node.edges.is_empty()
                && node
                    .edges
                    .iter()
                    .all(|e| e.is_expanded() && self.tree.get(e.child).exhausted);
            if settled {
                self.tree.get_mut(sid).exhausted = true;
            } else {
                break;
            }
        }
    }
}
