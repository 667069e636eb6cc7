//! Comparator evaluation over predicate values.
//!
//! Equality is exact in both type and value. Ordering is only defined
//! between two values of the same type:
//!
//! - numbers compare numerically (NaN is unordered)
//! - strings compare by Unicode scalar value
//! - booleans order `false < true`
//! - `null` is equal to itself
//!
//! Every ordering comparison across types is `false`, so `x < 1` and
//! `x >= 1` can both be false for the same `x`.

use std::cmp::Ordering;

use crate::ast::{Comparator, Value};

impl Value {
    /// Ordering between two values of the same type, `None` otherwise
    pub fn same_type_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl Comparator {
    /// Evaluate `actual <op> expected`
    pub fn evaluate(self, actual: &Value, expected: &Value) -> bool {
        match self {
            Comparator::Eq => actual == expected,
            Comparator::Neq => actual != expected,
            Comparator::Lt => actual.same_type_cmp(expected) == Some(Ordering::Less),
            Comparator::Lte => matches!(
                actual.same_type_cmp(expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Comparator::Gt => actual.same_type_cmp(expected) == Some(Ordering::Greater),
            Comparator::Gte => matches!(
                actual.same_type_cmp(expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}
