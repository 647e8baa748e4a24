//! Null-aware aggregate accumulation with exact arithmetic.

use std::cmp::Ordering;

use relagg_proto::{AggregateKind, Value};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::executor::ExecutionError;

/// Folds leaf values into one aggregate value.
///
/// Null inputs are skipped by every kind. Sums are accumulated as exact
/// decimals and the average divides the exact sum by the exact count of
/// non-null inputs.
#[derive(Debug, Clone)]
pub struct Accumulator {
    kind: AggregateKind,
    count: u64,
    sum: Decimal,
    integral: bool,
    best: Option<Value>,
}

impl Accumulator {
    /// Create an accumulator for `kind`.
    pub fn new(kind: AggregateKind) -> Self {
        Self {
            kind,
            count: 0,
            sum: Decimal::ZERO,
            integral: true,
            best: None,
        }
    }

    /// Feed one matched row.
    ///
    /// `None` means the aggregate reads no field (plain row count);
    /// `Some(Value::Null)` is a row whose field is null and is skipped.
    pub fn push(&mut self, value: Option<&Value>) -> Result<(), ExecutionError> {
        let value = match value {
            None if self.kind == AggregateKind::Count => {
                self.count += 1;
                return Ok(());
            }
            None | Some(Value::Null) => return Ok(()),
            Some(value) => value,
        };

        match self.kind {
            AggregateKind::Count => self.count += 1,
            AggregateKind::Sum | AggregateKind::Avg => {
                let decimal = value.as_decimal().ok_or(ExecutionError::TypeMismatch {
                    expected: "numeric",
                    actual: value.kind_name(),
                })?;
                self.integral &= matches!(value, Value::Int64(_));
                self.sum = self
                    .sum
                    .checked_add(decimal)
                    .ok_or(ExecutionError::Overflow(self.kind.name()))?;
                self.count += 1;
            }
            AggregateKind::Min | AggregateKind::Max => {
                let replace = match &self.best {
                    None => true,
                    Some(best) => {
                        let ordering =
                            value.compare(best).ok_or(ExecutionError::TypeMismatch {
                                expected: best.kind_name(),
                                actual: value.kind_name(),
                            })?;
                        if self.kind == AggregateKind::Min {
                            ordering == Ordering::Less
                        } else {
                            ordering == Ordering::Greater
                        }
                    }
                };
                if replace {
                    self.best = Some(value.clone());
                }
                self.count += 1;
            }
        }
        Ok(())
    }

    /// Number of non-null inputs accepted so far.
    pub fn len(&self) -> u64 {
        self.count
    }

    /// Check if no input has been accepted.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Produce the aggregate value.
    pub fn finish(self) -> Result<Value, ExecutionError> {
        if self.kind == AggregateKind::Count {
            let count = i64::try_from(self.count).map_err(|_| ExecutionError::Overflow("count"))?;
            return Ok(Value::Int64(count));
        }
        if self.count == 0 {
            return Ok(Value::Null);
        }

        match self.kind {
            AggregateKind::Sum if self.integral => self
                .sum
                .to_i64()
                .map(Value::Int64)
                .ok_or(ExecutionError::Overflow("sum")),
            AggregateKind::Sum => Ok(Value::Decimal(self.sum)),
            AggregateKind::Avg => self
                .sum
                .checked_div(Decimal::from(self.count))
                .map(|avg| Value::Decimal(avg.normalize()))
                .ok_or(ExecutionError::Overflow("avg")),
            _ => Ok(self.best.unwrap_or(Value::Null)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(kind: AggregateKind, values: &[Value]) -> Value {
        let mut acc = Accumulator::new(kind);
        for value in values {
            acc.push(Some(value)).unwrap();
        }
        acc.finish().unwrap()
    }

    fn dec(num: i64, scale: u32) -> Value {
        Value::Decimal(Decimal::new(num, scale))
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(run(AggregateKind::Count, &[]), Value::Int64(0));
        for kind in [
            AggregateKind::Sum,
            AggregateKind::Min,
            AggregateKind::Max,
            AggregateKind::Avg,
        ] {
            assert_eq!(run(kind, &[]), Value::Null);
            assert_eq!(run(kind, &[Value::Null, Value::Null]), Value::Null);
        }
    }

    #[test]
    fn test_count_rows_and_fields() {
        let mut acc = Accumulator::new(AggregateKind::Count);
        acc.push(None).unwrap();
        acc.push(None).unwrap();
        assert_eq!(acc.finish().unwrap(), Value::Int64(2));

        let values = [Value::Int64(1), Value::Null, Value::Int64(3)];
        assert_eq!(run(AggregateKind::Count, &values), Value::Int64(2));
    }

    #[test]
    fn test_nulls_skipped() {
        let values = [Value::Int64(10), Value::Int64(20), Value::Null];
        assert_eq!(run(AggregateKind::Min, &values), Value::Int64(10));
        assert_eq!(run(AggregateKind::Max, &values), Value::Int64(20));
        assert_eq!(run(AggregateKind::Sum, &values), Value::Int64(30));
        assert_eq!(run(AggregateKind::Avg, &values), dec(15, 0));
    }

    #[test]
    fn test_exact_decimal_average() {
        let values = [dec(1, 1), dec(2, 1), dec(4, 1)];
        assert_eq!(run(AggregateKind::Sum, &values), dec(7, 1));

        let values = [dec(1, 1), dec(2, 1)];
        assert_eq!(run(AggregateKind::Avg, &values), dec(15, 2));
    }

    #[test]
    fn test_mixed_numeric_sum_is_decimal() {
        let values = [Value::Int64(1), dec(25, 1)];
        assert_eq!(run(AggregateKind::Sum, &values), dec(35, 1));
    }

    #[test]
    fn test_min_max_strings() {
        let values = [Value::from("pear"), Value::from("apple"), Value::Null];
        assert_eq!(run(AggregateKind::Min, &values), Value::from("apple"));
        assert_eq!(run(AggregateKind::Max, &values), Value::from("pear"));
    }

    #[test]
    fn test_type_mismatch() {
        let mut acc = Accumulator::new(AggregateKind::Sum);
        assert!(matches!(
            acc.push(Some(&Value::from("x"))),
            Err(ExecutionError::TypeMismatch { .. })
        ));

        let mut acc = Accumulator::new(AggregateKind::Max);
        acc.push(Some(&Value::Int64(1))).unwrap();
        assert!(acc.push(Some(&Value::Bool(true))).is_err());
    }

    #[test]
    fn test_sum_overflow() {
        let mut acc = Accumulator::new(AggregateKind::Sum);
        acc.push(Some(&Value::Decimal(Decimal::MAX))).unwrap();
        assert!(matches!(
            acc.push(Some(&Value::Decimal(Decimal::MAX))),
            Err(ExecutionError::Overflow(_))
        ));
    }
}
