//! Grammar model: BNF rules in arena form plus min-depth tables.
//!
//! Users describe a grammar with [`GrammarBuilder`] and builder-form
//! [`Rule`] values; `build` flattens everything into a [`Grammar`] whose
//! productions are addressed by [`RuleId`] and runs the min-depth
//! fixpoint, rejecting grammars that can never complete.

pub mod mindepth;
pub mod rule;

pub use mindepth::MinDepth;
pub use rule::{Grammar, GrammarBuilder, Rule, RuleExpr, RuleId};
