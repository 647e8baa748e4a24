//! Three-valued filter evaluation.
//!
//! Comparisons involving null or incomparable values are unknown. Unknown
//! propagates through `And`/`Or`/`Not` by Kleene logic and only collapses
//! to "no match" at the top level.

use std::cmp::Ordering;

use relagg_proto::{CompareOp, Expr, Operand, Value};

use super::executor::ExecutionError;
use crate::storage::Row;

/// Truth value of a filter under three-valued logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truth {
    /// Definitely true.
    True,
    /// Definitely false.
    False,
    /// Null or incomparable operands.
    Unknown,
}

impl Truth {
    fn from_bool(b: bool) -> Self {
        if b {
            Truth::True
        } else {
            Truth::False
        }
    }

    fn not(self) -> Self {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Unknown => Truth::Unknown,
        }
    }
}

/// Evaluates filter expressions against rows.
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Check whether `row` matches `filter`; unknown counts as no match.
    ///
    /// `parent` is the row of the previous hop and backs `Operand::Parent`.
    pub fn matches(filter: &Expr, row: &Row, parent: Option<&Row>) -> Result<bool, ExecutionError> {
        Ok(Self::evaluate(filter, row, parent)? == Truth::True)
    }

    /// Evaluate a filter to a truth value.
    pub fn evaluate(filter: &Expr, row: &Row, parent: Option<&Row>) -> Result<Truth, ExecutionError> {
        match filter {
            Expr::True => Ok(Truth::True),
            Expr::False => Ok(Truth::False),
            Expr::Compare { left, op, right } => {
                let left = Self::operand(left, row, parent)?;
                let right = Self::operand(right, row, parent)?;
                Ok(Self::compare(left, *op, right))
            }
            Expr::In { operand, values } => {
                let value = Self::operand(operand, row, parent)?;
                if value.is_null() {
                    return Ok(Truth::Unknown);
                }
                if values.iter().any(|v| value.loosely_equals(v)) {
                    Ok(Truth::True)
                } else if values.iter().any(Value::is_null) {
                    Ok(Truth::Unknown)
                } else {
                    Ok(Truth::False)
                }
            }
            Expr::IsNull(operand) => Ok(Truth::from_bool(
                Self::operand(operand, row, parent)?.is_null(),
            )),
            Expr::And(exprs) => {
                let mut result = Truth::True;
                for expr in exprs {
                    match Self::evaluate(expr, row, parent)? {
                        Truth::False => return Ok(Truth::False),
                        Truth::Unknown => result = Truth::Unknown,
                        Truth::True => {}
                    }
                }
                Ok(result)
            }
            Expr::Or(exprs) => {
                let mut result = Truth::False;
                for expr in exprs {
                    match Self::evaluate(expr, row, parent)? {
                        Truth::True => return Ok(Truth::True),
                        Truth::Unknown => result = Truth::Unknown,
                        Truth::False => {}
                    }
                }
                Ok(result)
            }
            Expr::Not(inner) => Ok(Self::evaluate(inner, row, parent)?.not()),
        }
    }

    fn operand<'a>(
        operand: &'a Operand,
        row: &'a Row,
        parent: Option<&'a Row>,
    ) -> Result<&'a Value, ExecutionError> {
        match operand {
            Operand::Field(name) => Ok(row.get(name).unwrap_or(&Value::Null)),
            Operand::Parent(name) => parent
                .map(|p| p.get(name).unwrap_or(&Value::Null))
                .ok_or_else(|| {
                    ExecutionError::Evaluation(format!(
                        "parent reference '{name}' evaluated without a parent row"
                    ))
                }),
            Operand::Literal(value) => Ok(value),
        }
    }

    fn compare(left: &Value, op: CompareOp, right: &Value) -> Truth {
        let Some(ordering) = left.compare(right) else {
            return Truth::Unknown;
        };
        Truth::from_bool(match op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_comparisons() {
        let r = row(&[("age", Value::Int64(30)), ("name", Value::from("ada"))]);

        assert!(FilterEvaluator::matches(&Expr::eq("age", 30), &r, None).unwrap());
        assert!(FilterEvaluator::matches(&Expr::ge("age", 30), &r, None).unwrap());
        assert!(!FilterEvaluator::matches(&Expr::lt("age", 30), &r, None).unwrap());
        assert!(FilterEvaluator::matches(&Expr::ne("name", "bob"), &r, None).unwrap());
        assert!(FilterEvaluator::matches(
            &Expr::le("age", Decimal::new(305, 1)),
            &r,
            None
        )
        .unwrap());
    }

    #[test]
    fn test_null_is_unknown() {
        let r = row(&[("score", Value::Null)]);

        assert_eq!(
            FilterEvaluator::evaluate(&Expr::eq("score", 1), &r, None).unwrap(),
            Truth::Unknown
        );
        // NOT unknown is still unknown, so neither side matches.
        assert!(!FilterEvaluator::matches(&Expr::eq("score", 1), &r, None).unwrap());
        assert!(!FilterEvaluator::matches(&Expr::not(Expr::eq("score", 1)), &r, None).unwrap());
        assert!(FilterEvaluator::matches(&Expr::is_null("score"), &r, None).unwrap());
        // Missing fields read as null.
        assert!(FilterEvaluator::matches(&Expr::is_null("absent"), &r, None).unwrap());
    }

    #[test]
    fn test_kleene_connectives() {
        let r = row(&[("a", Value::Null), ("b", Value::Int64(1))]);
        let unknown = Expr::eq("a", 1);

        let or = Expr::or_any([unknown.clone(), Expr::eq("b", 1)]);
        assert!(FilterEvaluator::matches(&or, &r, None).unwrap());

        let and = Expr::and_all([unknown.clone(), Expr::eq("b", 2)]);
        assert_eq!(FilterEvaluator::evaluate(&and, &r, None).unwrap(), Truth::False);

        let and = Expr::and_all([unknown, Expr::eq("b", 1)]);
        assert_eq!(FilterEvaluator::evaluate(&and, &r, None).unwrap(), Truth::Unknown);
    }

    #[test]
    fn test_in_values() {
        let r = row(&[("team", Value::Int64(2))]);
        let hit = Expr::in_values("team", vec![Value::Int64(1), Value::Int64(2)]);
        let miss_with_null = Expr::in_values("team", vec![Value::Int64(1), Value::Null]);

        assert!(FilterEvaluator::matches(&hit, &r, None).unwrap());
        assert_eq!(
            FilterEvaluator::evaluate(&miss_with_null, &r, None).unwrap(),
            Truth::Unknown
        );
    }

    #[test]
    fn test_parent_reference() {
        let parent = row(&[("thing", Value::from("x"))]);
        let child = row(&[("thing", Value::from("x"))]);
        let other = row(&[("thing", Value::from("y"))]);
        let filter = Expr::field_eq_parent("thing", "thing");

        assert!(FilterEvaluator::matches(&filter, &child, Some(&parent)).unwrap());
        assert!(!FilterEvaluator::matches(&filter, &other, Some(&parent)).unwrap());
        assert!(matches!(
            FilterEvaluator::matches(&filter, &child, None),
            Err(ExecutionError::Evaluation(_))
        ));
    }
}
