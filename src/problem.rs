//! Problem interface: the contract between drivers and user code.
//!
//! Users implement [`ExprProblem`] to supply a grammar and a fitness
//! function (lower is better); any side data the fitness needs lives in
//! the implementing type.

use std::sync::Arc;

use crate::error::SearchError;
use crate::expr::Expr;
use crate::grammar::Grammar;
use crate::tree::{Action, DerivationTree};

/// A user-supplied expression-search problem.
///
/// ## Implementation notes
///
/// - `fitness` must be deterministic for reproducible searches.
/// - `fitness` may fail with `EvaluationFailed`; drivers treat the
///   individual as dominated (`+inf`) rather than aborting the run.
/// - `on_start` is called once at the top of each driver run.
pub trait ExprProblem {
    /// The grammar expressions are drawn from.
    fn grammar(&self) -> &Arc<Grammar>;

    /// Score an expression; lower is better.
    fn fitness(&self, expr: &Expr) -> Result<f64, SearchError>;

    /// One-time setup hook, called at the start of a run.
    fn on_start(&mut self) {}
}

/// Uniform result record returned by every driver.
#[derive(Clone, Debug)]
pub struct SearchResult {
    /// The best expression found.
    pub expr: Expr,

    /// Its fitness (lower is better).
    pub fitness: f64,

    /// Evaluation count at which the best was first found.
    pub best_at_eval: usize,

    /// Total fitness evaluations performed.
    pub total_evals: usize,

    /// The linear action sequence reproducing the best tree.
    pub actions: Vec<Action>,

    /// The best derivation tree itself.
    pub tree: DerivationTree,
}

impl SearchResult {
    /// Track a candidate: replace the incumbent on strict improvement.
    ///
    /// Returns true when the candidate became the new best.
    pub(crate) fn consider(
        &mut self,
        fitness: f64,
        nevals: usize,
        make: impl FnOnce() -> (Expr, Vec<Action>, DerivationTree),
    ) -> bool {
        if fitness < self.fitness {
            let (expr, actions, tree) = make();
            self.expr = expr;
            self.fitness = fitness;
            self.best_at_eval = nevals;
            self.actions = actions;
            self.tree = tree;
            true
        } else {
            false
        }
    }

    /// A placeholder result with infinite fitness, used as the initial
    /// incumbent before any evaluation.
    pub(crate) fn unevaluated(tree: DerivationTree) -> Self {
        Self {
            expr: Expr::Seq(Vec::new()),
            fitness: f64::INFINITY,
            best_at_eval: 0,
            total_evals: 0,
            actions: Vec::new(),
            tree,
        }
    }
}
