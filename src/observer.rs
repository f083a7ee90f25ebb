//! Observer sink for driver telemetry.
//!
//! Drivers emit named events through one method per event family; every
//! method has a no-op default, so observers implement only what they
//! consume. The core stays free of I/O and string formatting — sinks own
//! whatever logging, aggregation, or plotting happens downstream.

use crate::expr::Expr;
use crate::gp::GpIndividual;
use crate::mcts::MctsTree;
use crate::problem::SearchResult;
use crate::tree::{Action, LinearDerivTree};

/// Event sink for search drivers.
///
/// Payloads are borrowed; observers copy what they need to keep.
#[allow(unused_variables)]
pub trait SearchObserver {
    /// Free-form progress message.
    fn verbose(&mut self, msg: &str) {}

    /// Start of iteration `i` (1-based).
    fn iteration(&mut self, i: usize) {}

    /// CPU seconds elapsed after `nevals` evaluations.
    fn elapsed_cpu_s(&mut self, nevals: usize, seconds: f64) {}

    /// Best-so-far after `nevals` evaluations. `actions` is the linear
    /// action sequence where the driver tracks one (MCTS), else empty.
    fn current_best(&mut self, nevals: usize, fitness: f64, expr: &Expr, actions: &[Action]) {}

    /// Best fitness of iteration `iter`.
    fn fitness(&mut self, iter: usize, fitness: f64) {}

    /// Rendered best expression of iteration `iter`.
    fn code(&mut self, iter: usize, code: &str) {}

    /// GP population snapshot at iteration `iter`.
    fn population(&mut self, iter: usize, pop: &[GpIndividual]) {}

    /// Final result of a run.
    fn result(&mut self, result: &SearchResult) {}

    /// Run metadata (`starttime`, `endtime`, `cpu_time`).
    fn compute_info(&mut self, key: &str, value: &str) {}

    /// One driver parameter, echoed at run start.
    fn parameter(&mut self, key: &str, value: &str) {}

    /// MCTS tree snapshot at iteration `i`.
    fn mcts_tree(&mut self, i: usize, tree: &MctsTree, state: &LinearDerivTree) {}
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl SearchObserver for NullObserver {}

/// Seconds since the Unix epoch, for `starttime`/`endtime` compute info.
pub(crate) fn unix_now() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or_else(|_| "0".to_string(), |d| d.as_secs().to_string())
}
