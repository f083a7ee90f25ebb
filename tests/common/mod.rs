//! Shared fixtures: the standard arith grammar and a target-value problem.
//!
//! Grammar: `start = expr; expr = num | expr op expr; op = + | * | -;
//! num = 1 | 2 | 3`.

// Not every suite uses every fixture.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use exprsearch::{
    Action, Expr, ExprProblem, Grammar, GrammarBuilder, Rule, SearchError, SearchObserver,
};

/// Build the standard arith grammar.
pub fn arith_grammar() -> Arc<Grammar> {
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

/// Evaluate an arith expression by structure.
pub fn eval_arith(expr: &Expr) -> f64 {
    match expr {
        Expr::Num(n) => *n as f64,
        Expr::Atom(_) => f64::NAN,
        Expr::Seq(items) => {
            let lhs = eval_arith(&items[0]);
            let rhs = eval_arith(&items[2]);
            match &items[1] {
                Expr::Atom(op) if op == "+" => lhs + rhs,
                Expr::Atom(op) if op == "*" => lhs * rhs,
                Expr::Atom(op) if op == "-" => lhs - rhs,
                _ => f64::NAN,
            }
        }
    }
}

/// Problem: minimize `|evaluate(expr) - target|`.
#[derive(Clone)]
pub struct ArithTarget {
    grammar: Arc<Grammar>,
    pub target: f64,
}

impl ArithTarget {
    pub fn new(target: f64) -> Self {
        Self {
            grammar: arith_grammar(),
            target,
        }
    }
}

impl ExprProblem for ArithTarget {
    fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    fn fitness(&self, expr: &Expr) -> Result<f64, SearchError> {
        let value = eval_arith(expr);
        if value.is_nan() {
            return Err(SearchError::EvaluationFailed(format!(
                "cannot evaluate `{expr}`"
            )));
        }
        Ok((value - self.target).abs())
    }
}

/// Observer recording event series behind a shared handle, so tests can
/// clone it into a driver and inspect afterwards.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    inner: Arc<Mutex<Series>>,
}

#[derive(Clone, Debug, Default)]
struct Series {
    current_best: Vec<(usize, f64, String)>,
    fitness: Vec<(usize, f64)>,
}

impl Recorder {
    /// Recorded `current_best` events: `(nevals, fitness, expr)`.
    pub fn best_series(&self) -> Vec<(usize, f64, String)> {
        self.inner.lock().unwrap().current_best.clone()
    }

    /// Recorded `fitness` events: `(iter, fitness)`.
    pub fn fitness_series(&self) -> Vec<(usize, f64)> {
        self.inner.lock().unwrap().fitness.clone()
    }
}

impl SearchObserver for Recorder {
    fn current_best(&mut self, nevals: usize, fitness: f64, expr: &Expr, _actions: &[Action]) {
        self.inner
            .lock()
            .unwrap()
            .current_best
            .push((nevals, fitness, expr.to_string()));
    }

    fn fitness(&mut self, iter: usize, fitness: f64) {
        self.inner.lock().unwrap().fitness.push((iter, fitness));
    }
}
