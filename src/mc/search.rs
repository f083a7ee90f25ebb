//! Uniform Monte Carlo search: sample complete random trees, keep the best.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use super::config::{McConfig, PmcConfig};
use crate::error::SearchError;
use crate::observer::{unix_now, NullObserver, SearchObserver};
use crate::problem::{ExprProblem, SearchResult};
use crate::rng::SearchRng;
use crate::tree::{rand_with_retry, DerivationTree};

/// Uniform Monte Carlo driver.
///
/// Samples `n_samples` depth-bounded random trees and returns the best.
pub struct McSearch<P: ExprProblem> {
    problem: P,
    config: McConfig,
    rng: SearchRng,
    observer: Box<dyn SearchObserver>,
}

impl<P: ExprProblem> McSearch<P> {
    /// Create a new MC driver.
    pub fn new(problem: P, config: McConfig) -> Self {
        let rng = SearchRng::new(config.seed);
        Self {
            problem,
            config,
            rng,
            observer: Box::new(NullObserver),
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
    pub fn config(&self) -> &McConfig {
        &self.config
    }

    /// The problem.
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Run the search to `n_samples` evaluations.
    pub fn run(&mut self) -> Result<SearchResult, SearchError> {
        self.problem.on_start();
        self.observer
            .parameter("maxsteps", &self.config.maxsteps.to_string());
        self.observer
            .parameter("n_samples", &self.config.n_samples.to_string());
        self.observer.parameter("seed", &self.config.seed.to_string());

        let start = Instant::now();
        self.observer.compute_info("starttime", &unix_now());

        let grammar = Arc::clone(self.problem.grammar());
        let mut tree = DerivationTree::new(grammar, self.config.maxsteps);
        let mut result = SearchResult::unevaluated(tree.clone());

        for i in 1..=self.config.n_samples {
            self.observer.iteration(i);
            rand_with_retry(
                &mut tree,
                &mut self.rng,
                self.config.maxsteps,
                self.config.max_retries,
            )?;
            let expr = tree.expr().expect("generated tree is complete");
            let fitness = match self.problem.fitness(&expr) {
                Ok(f) => f,
                Err(err) => {
                    log::debug!("fitness evaluation failed: {err}");
                    f64::INFINITY
                }
            };
            result.total_evals = i;
            result.consider(fitness, i, || {
                (expr.clone(), tree.action_sequence(), tree.compacted())
            });
            self.observer
                .current_best(i, result.fitness, &result.expr, &[]);
            self.observer.elapsed_cpu_s(i, start.elapsed().as_secs_f64());
        }

        self.observer.compute_info("endtime", &unix_now());
        self.observer
            .compute_info("cpu_time", &start.elapsed().as_secs_f64().to_string());
        self.observer.result(&result);
        Ok(result)
    }
}

/// Parallel Monte Carlo: `n_threads` independent MC runs combined by
/// minimum fitness.
///
/// Workers share nothing; each owns a clone of the problem and an RNG
/// forked deterministically from the master seed, so the combined result
/// is reproducible.
pub struct ParallelMcSearch<P: ExprProblem + Clone + Send + Sync> {
    problem: P,
    config: PmcConfig,
    observer: Box<dyn SearchObserver>,
}

impl<P: ExprProblem + Clone + Send + Sync> ParallelMcSearch<P> {
    /// Create a new PMC driver.
    pub fn new(problem: P, config: PmcConfig) -> Self {
        Self {
            problem,
            config,
            observer: Box::new(NullObserver),
        }
    }

    /// Attach an observer sink. Workers run silent; only run-level events
    /// (`parameters`, `result`) are emitted here.
    #[must_use]
    pub fn with_observer<O: SearchObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &PmcConfig {
        &self.config
    }

    /// Run all workers and combine.
    pub fn run(&mut self) -> Result<SearchResult, SearchError> {
        assert!(self.config.n_threads >= 1, "PMC needs at least one worker");
        self.observer
            .parameter("n_threads", &self.config.n_threads.to_string());
        self.observer
            .parameter("seed", &self.config.mc.seed.to_string());

        let mut master = SearchRng::new(self.config.mc.seed);
        let seeds: Vec<u64> = (0..self.config.n_threads)
            .map(|_| master.fork().seed())
            .collect();

        // Borrow only Sync pieces into the worker closure; the observer
        // stays on this thread.
        let problem = &self.problem;
        let mc = &self.config.mc;
        let worker_results: Vec<Result<SearchResult, SearchError>> = seeds
            .par_iter()
            .map(|&seed| {
                McSearch::new(problem.clone(), mc.clone().with_seed(seed)).run()
            })
            .collect();

        let mut total_evals = 0;
        let mut best: Option<SearchResult> = None;
        for worker in worker_results {
            let worker = worker?;
            total_evals += worker.total_evals;
            let improves = best
                .as_ref()
                .map_or(true, |b| worker.fitness < b.fitness);
            if improves {
                best = Some(worker);
            }
        }

        let mut result = best.expect("at least one worker ran");
        result.total_evals = total_evals;
        self.observer.result(&result);
        Ok(result)
    }
}
