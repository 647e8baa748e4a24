//! Filter expression trees.
//!
//! Expressions are immutable trees combined by the planner and interpreted
//! only by an execution adapter. A tree is evaluated in the scope of one
//! row; `Operand::Parent` reaches the immediate parent row of a join hop.
//!
//! The tree is recursive, so it derives serde rather than a zero-copy
//! archive format.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

impl CompareOp {
    /// Operator symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    /// Attribute of the row in scope.
    Field(String),
    /// Attribute of the immediate parent row.
    Parent(String),
    /// Literal value.
    Literal(Value),
}

impl Operand {
    /// Field reference.
    pub fn field(name: impl Into<String>) -> Self {
        Operand::Field(name.into())
    }

    /// Parent-row reference.
    pub fn parent(name: impl Into<String>) -> Self {
        Operand::Parent(name.into())
    }

    /// Literal value.
    pub fn literal(value: impl Into<Value>) -> Self {
        Operand::Literal(value.into())
    }
}

/// Boolean filter expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// Matches every row.
    True,
    /// Matches no row.
    False,
    /// Binary comparison.
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    /// Operand is one of the listed values.
    In { operand: Operand, values: Vec<Value> },
    /// Operand is null.
    IsNull(Operand),
    /// All conditions must be true.
    And(Vec<Expr>),
    /// At least one condition must be true.
    Or(Vec<Expr>),
    /// Negation.
    Not(Box<Expr>),
}

impl Expr {
    fn field_cmp(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Expr::Compare {
            left: Operand::Field(field.into()),
            op,
            right: Operand::Literal(value.into()),
        }
    }

    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field_cmp(field, CompareOp::Eq, value)
    }

    /// Create a not-equal filter.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field_cmp(field, CompareOp::Ne, value)
    }

    /// Create a less-than filter.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field_cmp(field, CompareOp::Lt, value)
    }

    /// Create a less-than-or-equal filter.
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field_cmp(field, CompareOp::Le, value)
    }

    /// Create a greater-than filter.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field_cmp(field, CompareOp::Gt, value)
    }

    /// Create a greater-than-or-equal filter.
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field_cmp(field, CompareOp::Ge, value)
    }

    /// Correlated equality: `field == parent.parent_field`.
    pub fn field_eq_parent(field: impl Into<String>, parent_field: impl Into<String>) -> Self {
        Expr::Compare {
            left: Operand::Field(field.into()),
            op: CompareOp::Eq,
            right: Operand::Parent(parent_field.into()),
        }
    }

    /// Create an IN filter.
    pub fn in_values(field: impl Into<String>, values: Vec<Value>) -> Self {
        Expr::In {
            operand: Operand::Field(field.into()),
            values,
        }
    }

    /// Create an IS NULL filter.
    pub fn is_null(field: impl Into<String>) -> Self {
        Expr::IsNull(Operand::Field(field.into()))
    }

    /// Create an IS NOT NULL filter.
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Expr::not(Expr::is_null(field))
    }

    /// Negate an expression, folding constants.
    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expr) -> Self {
        match expr {
            Expr::True => Expr::False,
            Expr::False => Expr::True,
            Expr::Not(inner) => *inner,
            other => Expr::Not(Box::new(other)),
        }
    }

    /// Conjoin expressions.
    ///
    /// Nested `And` nodes are flattened, `True` terms dropped, and any
    /// `False` term collapses the whole conjunction.
    pub fn and_all(exprs: impl IntoIterator<Item = Expr>) -> Self {
        let mut terms = Vec::new();
        for expr in exprs {
            match expr {
                Expr::True => {}
                Expr::False => return Expr::False,
                Expr::And(inner) => terms.extend(inner),
                other => terms.push(other),
            }
        }
        match terms.len() {
            0 => Expr::True,
            1 => terms.remove(0),
            _ => Expr::And(terms),
        }
    }

    /// Disjoin expressions, folding constants the same way as [`Expr::and_all`].
    pub fn or_any(exprs: impl IntoIterator<Item = Expr>) -> Self {
        let mut terms = Vec::new();
        for expr in exprs {
            match expr {
                Expr::False => {}
                Expr::True => return Expr::True,
                Expr::Or(inner) => terms.extend(inner),
                other => terms.push(other),
            }
        }
        match terms.len() {
            0 => Expr::False,
            1 => terms.remove(0),
            _ => Expr::Or(terms),
        }
    }

    /// Conjoin two expressions.
    pub fn conjoin(self, other: Expr) -> Self {
        Expr::and_all([self, other])
    }

    /// Check if this expression is the constant `True`.
    pub fn is_true(&self) -> bool {
        matches!(self, Expr::True)
    }

    /// Check if this expression is the constant `False`.
    pub fn is_false(&self) -> bool {
        matches!(self, Expr::False)
    }

    /// Attribute names referenced on the row in scope.
    pub fn fields(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect(&mut out, &mut BTreeSet::new());
        out
    }

    /// Attribute names referenced on the parent row.
    pub fn parent_fields(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect(&mut BTreeSet::new(), &mut out);
        out
    }

    fn collect(&self, fields: &mut BTreeSet<String>, parents: &mut BTreeSet<String>) {
        match self {
            Expr::True | Expr::False => {}
            Expr::Compare { left, right, .. } => {
                left.collect(fields, parents);
                right.collect(fields, parents);
            }
            Expr::In { operand, .. } | Expr::IsNull(operand) => operand.collect(fields, parents),
            Expr::And(exprs) | Expr::Or(exprs) => {
                for expr in exprs {
                    expr.collect(fields, parents);
                }
            }
            Expr::Not(inner) => inner.collect(fields, parents),
        }
    }
}

impl Operand {
    fn collect(&self, fields: &mut BTreeSet<String>, parents: &mut BTreeSet<String>) {
        match self {
            Operand::Field(name) => {
                fields.insert(name.clone());
            }
            Operand::Parent(name) => {
                parents.insert(name.clone());
            }
            Operand::Literal(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_all_flattens_and_folds() {
        let expr = Expr::and_all([
            Expr::True,
            Expr::and_all([Expr::eq("a", 1), Expr::eq("b", 2)]),
            Expr::eq("c", 3),
        ]);
        match expr {
            Expr::And(terms) => assert_eq!(terms.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }

        assert!(Expr::and_all([Expr::eq("a", 1), Expr::False]).is_false());
        assert!(Expr::and_all(Vec::new()).is_true());
        assert_eq!(Expr::and_all([Expr::True, Expr::eq("a", 1)]), Expr::eq("a", 1));
    }

    #[test]
    fn test_or_any_folds() {
        assert!(Expr::or_any([Expr::eq("a", 1), Expr::True]).is_true());
        assert!(Expr::or_any(Vec::new()).is_false());
        assert_eq!(Expr::or_any([Expr::False, Expr::eq("a", 1)]), Expr::eq("a", 1));
    }

    #[test]
    fn test_not_folds() {
        assert!(Expr::not(Expr::True).is_false());
        assert_eq!(Expr::not(Expr::not(Expr::eq("a", 1))), Expr::eq("a", 1));
    }

    #[test]
    fn test_referenced_fields() {
        let expr = Expr::and_all([
            Expr::field_eq_parent("thing", "thing"),
            Expr::eq("public", true),
            Expr::not(Expr::is_null("score")),
        ]);

        let fields: Vec<_> = expr.fields().into_iter().collect();
        assert_eq!(fields, vec!["public", "score", "thing"]);

        let parents: Vec<_> = expr.parent_fields().into_iter().collect();
        assert_eq!(parents, vec!["thing"]);
    }

    #[test]
    fn test_expr_json_roundtrip() {
        let expr = Expr::and_all([Expr::eq("public", true), Expr::field_eq_parent("a", "b")]);
        let json = serde_json::to_string(&expr).unwrap();
        let decoded: Expr = serde_json::from_str(&json).unwrap();
        assert_eq!(expr, decoded);
    }
}
