//! Min-depth tables: the fixpoint over the rule arena.
//!
//! `of_rule` gives the minimum tree depth needed to complete a subtree
//! rooted at a rule; `of_action` gives the depth if a particular action is
//! taken at a decision. The generator and the MDP use these to prune
//! choices that cannot complete under the remaining depth budget.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::rule::{RuleExpr, RuleId};
use crate::error::SearchError;

/// Precomputed minimum completion depths, per rule and per decision action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MinDepth {
    by_rule: Vec<u32>,
    /// Per-alternative depths for `Or` rules; empty for everything else.
    by_action: Vec<Vec<u32>>,
}

impl MinDepth {
    /// Run the fixpoint over the rule arena.
    ///
    /// Base case: a terminal (and a range, whose value is immediate) has
    /// depth 1. `And` is 1 + max over children, `Or` 1 + min over children
    /// with a finite depth, `Ref` 1 + referent. Iterates until a full pass
    /// changes nothing; any rule still without a finite depth can never
    /// complete and the grammar is rejected.
    pub(crate) fn compute(
        exprs: &[RuleExpr],
        name_of: &FxHashMap<RuleId, String>,
    ) -> Result<Self, SearchError> {
        let mut depth: Vec<Option<u32>> = vec![None; exprs.len()];

        loop {
            let mut changed = false;
            for (i, expr) in exprs.iter().enumerate() {
                let new = match expr {
                    RuleExpr::Terminal(_) => Some(1),
                    RuleExpr::Range(lo, hi) => {
                        if lo <= hi {
                            Some(1)
                        } else {
                            None
                        }
                    }
                    RuleExpr::Ref(r) => depth[r.index()].map(|d| d + 1),
                    RuleExpr::And(children) => children
                        .iter()
                        .map(|c| depth[c.index()])
                        .collect::<Option<Vec<u32>>>()
                        .and_then(|ds| ds.into_iter().max())
                        .map(|d| d + 1),
                    RuleExpr::Or(children) => children
                        .iter()
                        .filter_map(|c| depth[c.index()])
                        .min()
                        .map(|d| d + 1),
                };
                if new.is_some() && new != depth[i] {
                    depth[i] = new;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        if let Some(bad) = depth.iter().position(Option::is_none) {
            return Err(SearchError::UnproductiveGrammar(unproductive_name(
                bad, &depth, name_of,
            )));
        }

        let by_rule: Vec<u32> = depth.into_iter().map(|d| d.unwrap_or(0)).collect();
        let by_action: Vec<Vec<u32>> = exprs
            .iter()
            .map(|expr| match expr {
                RuleExpr::Or(children) => children
                    .iter()
                    .map(|c| by_rule[c.index()] + 1)
                    .collect(),
                _ => Vec::new(),
            })
            .collect();

        Ok(Self { by_rule, by_action })
    }

    /// Minimum depth to complete a subtree rooted at `id`.
    #[inline]
    #[must_use]
    pub fn of_rule(&self, id: RuleId) -> u32 {
        self.by_rule[id.index()]
    }

    /// Minimum depth to complete a subtree rooted at `id` when the
    /// 0-based action `k` is taken there.
    ///
    /// Every range action has depth 1; non-decisions report `of_rule`.
    #[inline]
    #[must_use]
    pub fn of_action(&self, id: RuleId, k: usize) -> u32 {
        let table = &self.by_action[id.index()];
        if table.is_empty() {
            self.by_rule[id.index()]
        } else {
            table[k]
        }
    }
}

/// Error label for an unproductive arena entry: a named rule if one is
/// unproductive, else an anonymous tag.
fn unproductive_name(
    first: usize,
    depth: &[Option<u32>],
    name_of: &FxHashMap<RuleId, String>,
) -> String {
    depth
        .iter()
        .enumerate()
        .filter(|(_, d)| d.is_none())
        .find_map(|(i, _)| name_of.get(&RuleId::new(i as u32)).cloned())
        .unwrap_or_else(|| format!("<anonymous #{first}>"))
}
