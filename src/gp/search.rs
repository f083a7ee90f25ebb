//! Tree-based genetic programming driver.
//!
//! Ramped initialization, deterministic best-of-N tournaments over the
//! sorted population, rule-matched single-point crossover, subtree
//! mutation, elitism, and fresh random blood each generation.

use std::sync::Arc;
use std::time::Instant;

use super::config::GpConfig;
use super::evaluate::{Evaluator, SequentialEvaluator};
use super::individual::{sort_by_fitness, GpIndividual};
use crate::error::SearchError;
use crate::observer::{unix_now, NullObserver, SearchObserver};
use crate::problem::{ExprProblem, SearchResult};
use crate::rng::SearchRng;
use crate::tree::{generate, rand_with_retry, DerivationTree};

/// Genetic programming driver.
pub struct GpSearch<P: ExprProblem> {
    problem: P,
    config: GpConfig,
    rng: SearchRng,
    observer: Box<dyn SearchObserver>,
    evaluator: Box<dyn Evaluator<P>>,
}

impl<P: ExprProblem> GpSearch<P> {
    /// Create a new GP driver with sequential evaluation.
    pub fn new(problem: P, config: GpConfig) -> Self {
        let rng = SearchRng::new(config.seed);
        Self {
            problem,
            config,
            rng,
            observer: Box::new(NullObserver),
            evaluator: Box::new(SequentialEvaluator),
        }
    }

    /// Attach an observer sink.
    #[must_use]
    pub fn with_observer<O: SearchObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Swap in a different batch evaluator (e.g. `ParallelEvaluator`).
    #[must_use]
    pub fn with_evaluator<E: Evaluator<P> + 'static>(mut self, evaluator: E) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &GpConfig {
        &self.config
    }

    /// The problem.
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Run the search for the configured number of generations.
    pub fn run(&mut self) -> Result<SearchResult, SearchError> {
        self.problem.on_start();
        self.emit_parameters();
        let start = Instant::now();
        self.observer.compute_info("starttime", &unix_now());

        let grammar = Arc::clone(self.problem.grammar());
        let mut pop = self.ramped_init(&grammar)?;
        let mut result =
            SearchResult::unevaluated(DerivationTree::new(grammar, self.config.maxdepth));
        let mut total_evals = 0;

        for iter in 1..=self.config.iterations {
            self.observer.iteration(iter);
            if iter > 1 {
                pop = self.next_generation(pop)?;
            }

            total_evals += self.evaluator.evaluate(
                &self.problem,
                &mut pop,
                &self.config.default_expr,
            );
            sort_by_fitness(&mut pop);

            let best = &pop[0];
            result.total_evals = total_evals;
            result.consider(best.fitness_or_inf(), total_evals, || {
                (
                    best.expr.clone(),
                    best.tree.action_sequence(),
                    best.tree.compacted(),
                )
            });

            self.observer.fitness(iter, pop[0].fitness_or_inf());
            self.observer.code(iter, &pop[0].expr.to_string());
            self.observer.population(iter, &pop);
            self.observer
                .current_best(total_evals, result.fitness, &result.expr, &[]);
            self.observer
                .elapsed_cpu_s(total_evals, start.elapsed().as_secs_f64());
        }

        self.observer.compute_info("endtime", &unix_now());
        self.observer
            .compute_info("cpu_time", &start.elapsed().as_secs_f64().to_string());
        self.observer.result(&result);
        Ok(result)
    }

    fn emit_parameters(&mut self) {
        let c = &self.config;
        self.observer.parameter("pop_size", &c.pop_size.to_string());
        self.observer.parameter("maxdepth", &c.maxdepth.to_string());
        self.observer.parameter("iterations", &c.iterations.to_string());
        self.observer
            .parameter("tournament_size", &c.tournament_size.to_string());
        self.observer.parameter("top_keep", &c.top_keep.to_string());
        self.observer
            .parameter("crossover_frac", &c.crossover_frac.to_string());
        self.observer
            .parameter("mutate_frac", &c.mutate_frac.to_string());
        self.observer.parameter("rand_frac", &c.rand_frac.to_string());
        self.observer.parameter("seed", &c.seed.to_string());
    }

    /// Fill the population cycling target depths from the grammar's
    /// minimum up to `maxdepth`.
    fn ramped_init(
        &mut self,
        grammar: &Arc<crate::grammar::Grammar>,
    ) -> Result<Vec<GpIndividual>, SearchError> {
        let lo = grammar.min_depth().of_rule(grammar.start());
        let hi = self.config.maxdepth.max(lo);
        let mut pop = Vec::with_capacity(self.config.pop_size);
        let mut depth = lo;
        for _ in 0..self.config.pop_size {
            let mut tree = DerivationTree::new(Arc::clone(grammar), self.config.maxdepth);
            rand_with_retry(&mut tree, &mut self.rng, depth, self.config.max_retries)?;
            pop.push(GpIndividual::from_complete(tree));
            depth = if depth >= hi { lo } else { depth + 1 };
        }
        Ok(pop)
    }

    /// Deterministic best-of-N tournament over the sorted population:
    /// the winner is the smallest sampled index.
    fn tournament(&mut self, pop_len: usize) -> usize {
        let sample = self
            .rng
            .sample_indices(pop_len, self.config.tournament_size);
        sample.into_iter().min().unwrap_or(0)
    }

    /// Breed the next generation from a sorted population.
    fn next_generation(
        &mut self,
        pop: Vec<GpIndividual>,
    ) -> Result<Vec<GpIndividual>, SearchError> {
        let n = self.config.pop_size;
        let n_elite = (self.config.top_keep * n as f64).floor() as usize;
        let n_cross = (self.config.crossover_frac * n as f64).floor() as usize;
        let n_mutate = (self.config.mutate_frac * n as f64).floor() as usize;
        let n_rand = (self.config.rand_frac * n as f64).floor() as usize;

        let mut next = Vec::with_capacity(n);

        // Elitism: the top individuals carry over with their fitness.
        next.extend(pop.iter().take(n_elite).cloned());

        // Crossover: failed attempts do not count as children.
        let mut produced = 0;
        let mut failures = 0;
        while produced < n_cross {
            let p1 = self.tournament(pop.len());
            let p2 = self.tournament(pop.len());
            match self.crossover(&pop[p1], &pop[p2]) {
                Ok((c1, c2)) => {
                    failures = 0;
                    produced += 1;
                    next.push(c1);
                    if produced < n_cross {
                        produced += 1;
                        next.push(c2);
                    }
                }
                Err(err) if err.is_recoverable() => {
                    log::trace!("crossover attempt failed: {err}");
                    failures += 1;
                    if failures > self.config.max_retries {
                        return Err(SearchError::SamplingExhausted(failures));
                    }
                }
                Err(err) => return Err(err),
            }
        }

        // Mutation: retried at a fresh point on IncompleteExpansion.
        let mut produced = 0;
        let mut failures = 0;
        while produced < n_mutate {
            let p = self.tournament(pop.len());
            match self.mutate(&pop[p]) {
                Ok(child) => {
                    failures = 0;
                    produced += 1;
                    next.push(child);
                }
                Err(err) if err.is_recoverable() => {
                    log::trace!("mutation attempt failed: {err}");
                    failures += 1;
                    if failures > self.config.max_retries {
                        return Err(SearchError::SamplingExhausted(failures));
                    }
                }
                Err(err) => return Err(err),
            }
        }

        // Fresh random individuals.
        let grammar = Arc::clone(self.problem.grammar());
        for _ in 0..n_rand {
            let mut tree = DerivationTree::new(Arc::clone(&grammar), self.config.maxdepth);
            rand_with_retry(
                &mut tree,
                &mut self.rng,
                self.config.maxdepth,
                self.config.max_retries,
            )?;
            next.push(GpIndividual::from_complete(tree));
        }

        // Fill with tournament winners, then trim any overshoot.
        while next.len() < n {
            let p = self.tournament(pop.len());
            next.push(pop[p].clone());
        }
        next.truncate(n);

        Ok(next)
    }

    /// Single-point, rule-matched crossover.
    ///
    /// Picks a random named-rule node in a copy of the first parent,
    /// a matching-rule node in a copy of the second, and swaps the
    /// subtrees. Either child exceeding `maxdepth` rejects the attempt.
    fn crossover(
        &mut self,
        p1: &GpIndividual,
        p2: &GpIndividual,
    ) -> Result<(GpIndividual, GpIndividual), SearchError> {
        let mut c1 = p1.tree.clone();
        let mut c2 = p2.tree.clone();

        let sites = c1.named_nodes();
        let n1 = sites[self.rng.gen_range_usize(0..sites.len())];
        let rule = c1.get(n1).rule;

        let matches = c2.nodes_with_rule(rule);
        if matches.is_empty() {
            let name = c1
                .grammar()
                .name_of(rule)
                .unwrap_or("<anonymous>")
                .to_string();
            return Err(SearchError::RuleNotFound(name));
        }
        let n2 = matches[self.rng.gen_range_usize(0..matches.len())];

        DerivationTree::swap_subtrees(&mut c1, n1, &mut c2, n2);

        for child in [&c1, &c2] {
            let depth = child.max_depth();
            if depth > self.config.maxdepth {
                return Err(SearchError::DepthExceeded {
                    depth,
                    maxdepth: self.config.maxdepth,
                });
            }
        }

        Ok((
            GpIndividual::from_complete(c1.compacted()),
            GpIndividual::from_complete(c2.compacted()),
        ))
    }

    /// Subtree mutation: reopen a uniformly random node and regrow it
    /// under the depth limit.
    fn mutate(&mut self, parent: &GpIndividual) -> Result<GpIndividual, SearchError> {
        let mut tree = parent.tree.clone();
        let nodes = tree.reachable();
        let site = nodes[self.rng.gen_range_usize(0..nodes.len())];
        tree.truncate(site);
        generate(&mut tree, &mut self.rng, self.config.maxdepth)?;
        Ok(GpIndividual::from_complete(tree.compacted()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::grammar::{Grammar, GrammarBuilder, Rule};

    #[derive(Clone)]
    struct ArithTarget {
        grammar: Arc<Grammar>,
        target: f64,
    }

    impl ArithTarget {
        fn new(target: f64) -> Self {
            let grammar = Arc::new(
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
            );
            Self { grammar, target }
        }

        fn eval(expr: &Expr) -> f64 {
            match expr {
                Expr::Num(n) => *n as f64,
                Expr::Atom(_) => f64::NAN,
                Expr::Seq(items) => {
                    let lhs = Self::eval(&items[0]);
                    let rhs = Self::eval(&items[2]);
                    match &items[1] {
                        Expr::Atom(op) if op == "+" => lhs + rhs,
                        Expr::Atom(op) if op == "*" => lhs * rhs,
                        Expr::Atom(op) if op == "-" => lhs - rhs,
                        _ => f64::NAN,
                    }
                }
            }
        }
    }

    impl ExprProblem for ArithTarget {
        fn grammar(&self) -> &Arc<Grammar> {
            &self.grammar
        }

        fn fitness(&self, expr: &Expr) -> Result<f64, SearchError> {
            let value = Self::eval(expr);
            if value.is_nan() {
                return Err(SearchError::EvaluationFailed("bad expression".into()));
            }
            Ok((value - self.target).abs())
        }
    }

    #[test]
    fn test_gp_improves_towards_target() {
        let config = GpConfig::default()
            .with_pop_size(30)
            .with_maxdepth(6)
            .with_iterations(10)
            .with_seed(1);
        let mut search = GpSearch::new(ArithTarget::new(6.0), config);
        let result = search.run().unwrap();
        assert!(result.fitness <= 1.0, "fitness {} too high", result.fitness);
        assert!(result.total_evals > 0);
        assert!(result.best_at_eval <= result.total_evals);
    }

    #[test]
    fn test_gp_deterministic() {
        let config = GpConfig::default()
            .with_pop_size(20)
            .with_maxdepth(6)
            .with_iterations(5)
            .with_seed(7);
        let r1 = GpSearch::new(ArithTarget::new(5.0), config.clone()).run().unwrap();
        let r2 = GpSearch::new(ArithTarget::new(5.0), config).run().unwrap();
        assert_eq!(r1.expr, r2.expr);
        assert_eq!(r1.fitness, r2.fitness);
        assert_eq!(r1.total_evals, r2.total_evals);
    }

    #[test]
    fn test_crossover_children_are_complete_and_bounded() {
        let config = GpConfig::default().with_maxdepth(6).with_seed(3);
        let mut search = GpSearch::new(ArithTarget::new(5.0), config);
        let grammar = Arc::clone(search.problem().grammar());
        let mut pop = search.ramped_init(&grammar).unwrap();
        sort_by_fitness(&mut pop);

        let mut successes = 0;
        for i in 0..pop.len() - 1 {
            if let Ok((c1, c2)) = search.crossover(&pop[i], &pop[i + 1]) {
                successes += 1;
                for c in [&c1, &c2] {
                    assert!(c.tree.is_complete());
                    assert!(c.tree.max_depth() <= 6);
                }
            }
        }
        assert!(successes > 0, "no crossover succeeded");
    }

    #[test]
    fn test_mutation_closure() {
        let config = GpConfig::default().with_maxdepth(6).with_seed(11);
        let mut search = GpSearch::new(ArithTarget::new(5.0), config);
        let grammar = Arc::clone(search.problem().grammar());
        let pop = search.ramped_init(&grammar).unwrap();

        for parent in pop.iter().take(10) {
            match search.mutate(parent) {
                Ok(child) => {
                    assert!(child.tree.is_complete());
                    assert!(child.tree.max_depth() <= 6);
                }
                Err(err) => {
                    assert!(matches!(err, SearchError::IncompleteExpansion { .. }));
                }
            }
        }
    }

    #[test]
    fn test_tournament_prefers_low_indices() {
        let config = GpConfig::default().with_tournament_size(5).with_seed(2);
        let mut search = GpSearch::new(ArithTarget::new(5.0), config);
        // Winner is the minimum of a 5-sample: can never be in the last 4.
        for _ in 0..50 {
            let w = search.tournament(20);
            assert!(w <= 15);
        }
    }
}
