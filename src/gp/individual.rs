//! GP population members.

use crate::expr::Expr;
use crate::tree::DerivationTree;

/// One member of a GP population: a complete derivation tree, its folded
/// expression, and a fitness slot filled at most once.
#[derive(Clone, Debug)]
pub struct GpIndividual {
    /// The complete derivation tree.
    pub tree: DerivationTree,

    /// The folded expression (replaced by the default on a failed
    /// evaluation).
    pub expr: Expr,

    /// Fitness, absent until evaluated; never recomputed once present.
    pub fitness: Option<f64>,
}

impl GpIndividual {
    /// Wrap a complete tree.
    ///
    /// # Panics
    ///
    /// Panics if the tree is incomplete.
    #[must_use]
    pub fn from_complete(tree: DerivationTree) -> Self {
        let expr = tree.expr().expect("individual requires a complete tree");
        Self {
            tree,
            expr,
            fitness: None,
        }
    }

    /// Fitness with unevaluated individuals ranked last.
    #[inline]
    #[must_use]
    pub fn fitness_or_inf(&self) -> f64 {
        self.fitness.unwrap_or(f64::INFINITY)
    }
}

/// Sort a population ascending by fitness (lower is better), stably.
pub fn sort_by_fitness(pop: &mut [GpIndividual]) {
    pop.sort_by(|a, b| a.fitness_or_inf().total_cmp(&b.fitness_or_inf()));
}
