//! Derivation tree integration tests: depth bounds, replay, subtree swaps.

mod common;

use std::sync::Arc;

use common::{arith_grammar, eval_arith};
use exprsearch::{
    generate, rand_with_retry, Action, DerivationTree, LinearDerivTree, SearchError, SearchRng,
};

// =============================================================================
// Depth Bound
// =============================================================================

#[test]
fn test_generated_trees_respect_every_budget() {
    let grammar = arith_grammar();
    let min = grammar.min_depth().of_rule(grammar.start());
    let mut rng = SearchRng::new(1);

    for target in min..min + 8 {
        for _ in 0..50 {
            let mut tree = DerivationTree::new(Arc::clone(&grammar), target);
            match generate(&mut tree, &mut rng, target) {
                Ok(()) => {
                    assert!(tree.is_complete());
                    assert!(
                        tree.max_depth() <= target,
                        "tree depth {} exceeds target {}",
                        tree.max_depth(),
                        target
                    );
                }
                Err(SearchError::IncompleteExpansion { .. }) => {
                    panic!("arith generation cannot dead-end at target {target}")
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
    }
}

#[test]
fn test_budget_below_minimum_always_fails() {
    let grammar = arith_grammar();
    let min = grammar.min_depth().of_rule(grammar.start());
    let mut tree = DerivationTree::new(Arc::clone(&grammar), min - 1);
    let mut rng = SearchRng::new(1);
    let err = rand_with_retry(&mut tree, &mut rng, min - 1, 20).unwrap_err();
    assert_eq!(err, SearchError::SamplingExhausted(20));
}

// =============================================================================
// Action Replay
// =============================================================================

#[test]
fn test_replay_reproduces_random_trees() {
    let grammar = arith_grammar();
    let mut rng = SearchRng::new(17);

    for _ in 0..100 {
        let mut tree = DerivationTree::new(Arc::clone(&grammar), 10);
        generate(&mut tree, &mut rng, 10).unwrap();

        let actions = tree.action_sequence();
        let replayed = LinearDerivTree::replay(Arc::clone(&grammar), 10, &actions);

        assert!(replayed.is_complete());
        assert_eq!(replayed.tree().expr(), tree.expr());
        assert_eq!(replayed.tree().max_depth(), tree.max_depth());
        assert_eq!(replayed.actions(), actions.as_slice());
    }
}

// =============================================================================
// Crossover Closure (hand-crafted swap)
// =============================================================================

/// Build `2 * 3` and `1` by explicit action sequences, swap their `expr`
/// subtrees, and check both results replay to themselves.
#[test]
fn test_handcrafted_subtree_swap() {
    let grammar = arith_grammar();

    // 2 * 3
    let mut t1 = DerivationTree::new(Arc::clone(&grammar), 10);
    for a in [2, 1, 2, 1, 2, 3] {
        t1.expand(Action::new(a));
    }
    assert_eq!(t1.expr().unwrap().to_string(), "2 * 3");

    // 1
    let mut t2 = DerivationTree::new(Arc::clone(&grammar), 10);
    for a in [1, 1] {
        t2.expand(Action::new(a));
    }
    assert_eq!(t2.expr().unwrap().to_string(), "1");

    let expr_rule = grammar.rule_id("expr").unwrap();
    // Swap t1's whole expr with t2's whole expr.
    let n1 = t1.nodes_with_rule(expr_rule)[0];
    let n2 = t2.nodes_with_rule(expr_rule)[0];
    DerivationTree::swap_subtrees(&mut t1, n1, &mut t2, n2);

    assert!(t1.is_complete());
    assert!(t2.is_complete());
    assert_eq!(t1.expr().unwrap().to_string(), "1");
    assert_eq!(t2.expr().unwrap().to_string(), "2 * 3");
    assert_eq!(eval_arith(&t2.expr().unwrap()), 6.0);

    // Replayed action sequences reproduce the swapped trees.
    for tree in [&t1, &t2] {
        let replayed =
            LinearDerivTree::replay(Arc::clone(&grammar), 10, &tree.action_sequence());
        assert_eq!(replayed.tree().expr(), tree.expr());
    }
}

#[test]
fn test_swap_keeps_depths_consistent() {
    let grammar = arith_grammar();

    let mut t1 = DerivationTree::new(Arc::clone(&grammar), 10);
    for a in [2, 1, 1, 1, 1, 2] {
        t1.expand(Action::new(a));
    }
    let mut t2 = DerivationTree::new(Arc::clone(&grammar), 10);
    for a in [1, 3] {
        t2.expand(Action::new(a));
    }

    let expr_rule = grammar.rule_id("expr").unwrap();
    let n1 = t1.nodes_with_rule(expr_rule)[1]; // left operand of the binop
    let n2 = t2.nodes_with_rule(expr_rule)[0];
    DerivationTree::swap_subtrees(&mut t1, n1, &mut t2, n2);

    // Every child sits exactly one level below its parent.
    for tree in [&t1, &t2] {
        for id in tree.reachable() {
            let node = tree.get(id);
            for &child in node.children.iter() {
                assert_eq!(tree.get(child).depth, node.depth + 1);
            }
        }
    }
    assert_eq!(t1.expr().unwrap().to_string(), "3 + 2");
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_generation_deterministic_across_runs() {
    let grammar = arith_grammar();
    let make = |seed| {
        let mut rng = SearchRng::new(seed);
        let mut exprs = Vec::new();
        for _ in 0..20 {
            let mut tree = DerivationTree::new(Arc::clone(&grammar), 8);
            generate(&mut tree, &mut rng, 8).unwrap();
            exprs.push(tree.expr().unwrap().to_string());
        }
        exprs
    };
    assert_eq!(make(123), make(123));
    assert_ne!(make(123), make(456));
}
