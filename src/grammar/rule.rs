//! BNF grammar model: rule arena, named non-terminals, and the builder.
//!
//! The grammar is flattened at build time into an arena of [`RuleExpr`]
//! values addressed by [`RuleId`] indices. Named non-terminals map to the
//! `RuleId` of their body; references resolve to that same id, so two
//! nodes derive from the same rule iff their `RuleId`s are equal.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::mindepth::MinDepth;
use crate::error::SearchError;

/// Index into the grammar's rule arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub u32);

impl RuleId {
    /// Create a new rule ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw index value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RuleId({})", self.0)
    }
}

/// A production in arena form.
///
/// `Or` and `Range` are *decision* rules: they admit more than one action.
/// Everything else expands deterministically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RuleExpr {
    /// Literal value; contributes no children.
    Terminal(String),
    /// Reference to a named rule's body; one child.
    Ref(RuleId),
    /// Ordered sequence; one child per element.
    And(SmallVec<[RuleId; 4]>),
    /// Ordered choice; the chosen alternative becomes the single child.
    Or(SmallVec<[RuleId; 4]>),
    /// Inclusive integer range; the node becomes a leaf carrying the value.
    Range(i64, i64),
}

/// A compiled grammar: rule arena, name tables, and min-depth tables.
#[derive(Clone, Debug)]
pub struct Grammar {
    exprs: Vec<RuleExpr>,
    names: FxHashMap<String, RuleId>,
    name_of: FxHashMap<RuleId, String>,
    start: RuleId,
    min_depth: MinDepth,
}

impl Grammar {
    /// The start symbol's rule.
    #[inline]
    #[must_use]
    pub fn start(&self) -> RuleId {
        self.start
    }

    /// Get a rule expression by ID.
    #[inline]
    #[must_use]
    pub fn expr(&self, id: RuleId) -> &RuleExpr {
        &self.exprs[id.index()]
    }

    /// Number of rule expressions in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    /// True when the arena is empty (never, for a built grammar).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Resolve a named non-terminal.
    #[must_use]
    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.names.get(name).copied()
    }

    /// The name of a rule, if it is a named non-terminal.
    #[must_use]
    pub fn name_of(&self, id: RuleId) -> Option<&str> {
        self.name_of.get(&id).map(String::as_str)
    }

    /// Number of actions the rule admits (1 for non-decisions).
    #[must_use]
    pub fn num_actions(&self, id: RuleId) -> usize {
        match self.expr(id) {
            RuleExpr::Or(alts) => alts.len(),
            RuleExpr::Range(lo, hi) => (hi - lo + 1).max(0) as usize,
            _ => 1,
        }
    }

    /// True when the rule admits more than one action.
    #[must_use]
    pub fn is_decision(&self, id: RuleId) -> bool {
        self.num_actions(id) > 1
    }

    /// Min-depth tables computed at build time.
    #[inline]
    #[must_use]
    pub fn min_depth(&self) -> &MinDepth {
        &self.min_depth
    }

    /// Iterate over all named rules.
    pub fn named_rules(&self) -> impl Iterator<Item = (&str, RuleId)> {
        self.names.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

/// A production in builder form: references are by name and may be forward.
#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    /// Literal value.
    Terminal(String),
    /// Reference to a named rule.
    Ref(String),
    /// Ordered sequence.
    And(Vec<Rule>),
    /// Ordered choice among alternatives.
    Or(Vec<Rule>),
    /// Inclusive integer range.
    Range(i64, i64),
}

impl Rule {
    /// A terminal literal.
    pub fn terminal(value: impl Into<String>) -> Self {
        Rule::Terminal(value.into())
    }

    /// A reference to a named rule.
    pub fn reference(name: impl Into<String>) -> Self {
        Rule::Ref(name.into())
    }

    /// An ordered sequence of sub-rules.
    #[must_use]
    pub fn and(rules: Vec<Rule>) -> Self {
        Rule::And(rules)
    }

    /// An ordered choice among sub-rules.
    #[must_use]
    pub fn or(rules: Vec<Rule>) -> Self {
        Rule::Or(rules)
    }

    /// An inclusive integer range.
    #[must_use]
    pub fn range(lo: i64, hi: i64) -> Self {
        Rule::Range(lo, hi)
    }
}

/// Builder collecting named rules before flattening into a [`Grammar`].
///
/// Forward references are allowed; they resolve at [`GrammarBuilder::build`],
/// which also runs the min-depth fixpoint.
#[derive(Clone, Debug, Default)]
pub struct GrammarBuilder {
    rules: Vec<(String, Rule)>,
}

impl GrammarBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a named rule. Later definitions shadow earlier ones.
    pub fn rule(mut self, name: impl Into<String>, body: Rule) -> Self {
        self.rules.push((name.into(), body));
        self
    }

    /// Flatten into a [`Grammar`] with `start` as the start symbol.
    ///
    /// Fails with `UnknownRule` on an unresolved reference and with
    /// `UnproductiveGrammar` when the min-depth fixpoint leaves any rule
    /// without a finite completion depth.
    pub fn build(self, start: &str) -> Result<Grammar, SearchError> {
        let mut exprs: Vec<RuleExpr> = Vec::new();
        let mut names: FxHashMap<String, RuleId> = FxHashMap::default();

        // Pre-assign an arena slot per named rule so references resolve
        // regardless of definition order.
        for (name, _) in &self.rules {
            if !names.contains_key(name) {
                let id = RuleId::new(exprs.len() as u32);
                exprs.push(RuleExpr::Terminal(String::new())); // placeholder
                names.insert(name.clone(), id);
            }
        }

        for (name, body) in &self.rules {
            let flat = Self::flatten(body, &names, &mut exprs)?;
            let slot = names[name];
            exprs[slot.index()] = flat;
        }

        let start_id = names
            .get(start)
            .copied()
            .ok_or_else(|| SearchError::UnknownRule(start.to_string()))?;

        let name_of: FxHashMap<RuleId, String> =
            names.iter().map(|(n, id)| (*id, n.clone())).collect();

        let min_depth = MinDepth::compute(&exprs, &name_of)?;

        Ok(Grammar {
            exprs,
            names,
            name_of,
            start: start_id,
            min_depth,
        })
    }

    /// Flatten a builder rule into the arena, returning its expression.
    ///
    /// Sub-rules are allocated bottom-up; a bare `Ref` flattens to the
    /// referent's pre-assigned slot without allocating.
    fn flatten(
        rule: &Rule,
        names: &FxHashMap<String, RuleId>,
        exprs: &mut Vec<RuleExpr>,
    ) -> Result<RuleExpr, SearchError> {
        match rule {
            Rule::Terminal(value) => Ok(RuleExpr::Terminal(value.clone())),
            Rule::Range(lo, hi) => Ok(RuleExpr::Range(*lo, *hi)),
            Rule::Ref(name) => {
                let id = names
                    .get(name)
                    .copied()
                    .ok_or_else(|| SearchError::UnknownRule(name.clone()))?;
                Ok(RuleExpr::Ref(id))
            }
            Rule::And(subs) => {
                let children = Self::flatten_children(subs, names, exprs)?;
                Ok(RuleExpr::And(children))
            }
            Rule::Or(subs) => {
                let children = Self::flatten_children(subs, names, exprs)?;
                Ok(RuleExpr::Or(children))
            }
        }
    }

    fn flatten_children(
        subs: &[Rule],
        names: &FxHashMap<String, RuleId>,
        exprs: &mut Vec<RuleExpr>,
    ) -> Result<SmallVec<[RuleId; 4]>, SearchError> {
        let mut children = SmallVec::new();
        for sub in subs {
            // A direct reference points at the named slot; anything else
            // gets its own arena entry.
            let id = if let Rule::Ref(name) = sub {
                names
                    .get(name)
                    .copied()
                    .ok_or_else(|| SearchError::UnknownRule(name.clone()))?
            } else {
                let flat = Self::flatten(sub, names, exprs)?;
                let id = RuleId::new(exprs.len() as u32);
                exprs.push(flat);
                id
            };
            children.push(id);
        }
        Ok(children)
    }
}
