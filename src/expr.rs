//! Expression values folded out of a complete derivation tree.
//!
//! Fitness functions receive an [`Expr`] and interpret it however the
//! problem demands; `Display` renders the terminal string the way external
//! formatters expect (space-separated leaves, in-order).

use serde::{Deserialize, Serialize};

/// An expression produced by folding a complete derivation tree.
///
/// `Atom` comes from a terminal literal, `Num` from a range decision,
/// `Seq` from a sequence rule. Single-child rules (references, choices)
/// are transparent: they fold to their child's expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Terminal literal.
    Atom(String),
    /// Integer chosen at a range decision.
    Num(i64),
    /// Ordered sequence from an `And` rule.
    Seq(Vec<Expr>),
}

impl Expr {
    /// Convenience constructor for an atom.
    pub fn atom(s: impl Into<String>) -> Self {
        Expr::Atom(s.into())
    }

    /// Number of leaves in this expression.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Expr::Atom(_) | Expr::Num(_) => 1,
            Expr::Seq(items) => items.iter().map(Expr::len).sum(),
        }
    }

    /// An expression is never empty; provided for clippy symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate the leaves left to right.
    pub fn leaves(&self) -> Vec<&Expr> {
        match self {
            Expr::Atom(_) | Expr::Num(_) => vec![self],
            Expr::Seq(items) => items.iter().flat_map(Expr::leaves).collect(),
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Atom(s) => write!(f, "{s}"),
            Expr::Num(n) => write!(f, "{n}"),
            Expr::Seq(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}
