//! Fitness evaluation seam.
//!
//! Individuals are independent once generated, so batch evaluation is a
//! trait: the default walks the batch sequentially; the parallel
//! implementation fans out with rayon and only requires that the problem
//! be callable concurrently for distinct inputs.

use rayon::prelude::*;

use super::individual::GpIndividual;
use crate::expr::Expr;
use crate::problem::ExprProblem;

/// Batch fitness evaluator for GP populations.
///
/// Implementations must fill every empty fitness slot. A failed
/// evaluation gets fitness `+inf` and the default expression; the
/// individual stays in the population but is dominated.
pub trait Evaluator<P: ExprProblem>: Send + Sync {
    /// Evaluate every unevaluated individual in `batch`.
    ///
    /// Returns the number of evaluations performed.
    fn evaluate(&self, problem: &P, batch: &mut [GpIndividual], default_expr: &Expr) -> usize;
}

fn evaluate_one<P: ExprProblem>(
    problem: &P,
    individual: &mut GpIndividual,
    default_expr: &Expr,
) {
    match problem.fitness(&individual.expr) {
        Ok(f) => individual.fitness = Some(f),
        Err(err) => {
            log::debug!("fitness evaluation failed: {err}");
            individual.fitness = Some(f64::INFINITY);
            individual.expr = default_expr.clone();
        }
    }
}

/// One-at-a-time evaluation on the driver thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialEvaluator;

impl<P: ExprProblem> Evaluator<P> for SequentialEvaluator {
    fn evaluate(&self, problem: &P, batch: &mut [GpIndividual], default_expr: &Expr) -> usize {
        let mut evaluated = 0;
        for individual in batch.iter_mut().filter(|i| i.fitness.is_none()) {
            evaluate_one(problem, individual, default_expr);
            evaluated += 1;
        }
        evaluated
    }
}

/// Rayon-parallel evaluation; results land in each individual's own slot,
/// so workers share nothing mutable.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParallelEvaluator;

impl<P: ExprProblem + Sync> Evaluator<P> for ParallelEvaluator {
    fn evaluate(&self, problem: &P, batch: &mut [GpIndividual], default_expr: &Expr) -> usize {
        batch
            .par_iter_mut()
            .filter(|i| i.fitness.is_none())
            .map(|individual| {
                evaluate_one(problem, individual, default_expr);
                1
            })
            .sum()
    }
}
