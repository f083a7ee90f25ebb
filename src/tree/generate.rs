//! Depth-bounded uniform random tree generation.
//!
//! The only source of randomness in tree construction: each open decision
//! picks uniformly among the actions the min-depth table allows under the
//! target depth. Every decision strictly shrinks some branch's remaining
//! budget, so generation always terminates.

use super::derivation::DerivationTree;
use crate::error::SearchError;
use crate::rng::SearchRng;

/// Drive `tree` to completion with uniform random legal choices, bounded
/// by `target_depth`.
///
/// Works on fresh trees and on partially open trees (mutation reuses it
/// after reopening a subtree). Fails with `IncompleteExpansion` when an
/// open decision has no legal action under the budget; the tree is left
/// incomplete and the caller decides whether to retry.
pub fn generate(
    tree: &mut DerivationTree,
    rng: &mut SearchRng,
    target_depth: u32,
) -> Result<(), SearchError> {
    while let Some(head) = tree.frontier_head() {
        let legal = tree.legal_actions_bounded(target_depth);
        if legal.is_empty() {
            return Err(SearchError::IncompleteExpansion {
                depth: tree.get(head).depth,
                target_depth,
            });
        }
        let pick = legal[rng.gen_range_usize(0..legal.len())];
        tree.expand(pick);
    }
    Ok(())
}

/// Repeatedly attempt [`generate`] from a fresh tree, resetting on
/// `IncompleteExpansion`, up to `retries` attempts.
pub fn rand_with_retry(
    tree: &mut DerivationTree,
    rng: &mut SearchRng,
    target_depth: u32,
    retries: usize,
) -> Result<(), SearchError> {
    for attempt in 0..retries {
        tree.reset();
        match generate(tree, rng, target_depth) {
            Ok(()) => return Ok(()),
            Err(SearchError::IncompleteExpansion { .. }) => {
                log::trace!("incomplete expansion, retry {}/{}", attempt + 1, retries);
            }
            Err(other) => return Err(other),
        }
    }
    Err(SearchError::SamplingExhausted(retries))
}
