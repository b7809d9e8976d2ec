//! Numeric bound specifications and the bounds predicate evaluator
//!
//! A bound is an interval whose ends may be open or closed, or a list of
//! intervals whose union is the accepted range. Endpoints may be infinite.
//! Integer values and endpoints are compared exactly, without widening to
//! `f64`.

use crate::error::{CheckError, Result};
use crate::number::Number;
use crate::predicate::Predicate;
use crate::types::TypeChecker;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

const TUPLE_FORMAT: &str = "bound tuples are (low, high) or (low, high, (include_low, include_high))";

fn closed_end() -> bool {
    true
}

/// One numeric interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub low: Number,
    pub high: Number,
    /// Whether `low` itself is accepted (default: true)
    #[serde(default = "closed_end")]
    pub include_low: bool,
    /// Whether `high` itself is accepted (default: true)
    #[serde(default = "closed_end")]
    pub include_high: bool,
}

impl Interval {
    /// Interval with explicit inclusivity for each end
    pub fn new(
        low: impl Into<Number>,
        high: impl Into<Number>,
        (include_low, include_high): (bool, bool),
    ) -> Self {
        Self {
            low: low.into(),
            high: high.into(),
            include_low,
            include_high,
        }
    }

    /// `[low, high]`
    pub fn closed(low: impl Into<Number>, high: impl Into<Number>) -> Self {
        Self::new(low, high, (true, true))
    }

    /// `(low, high)`
    pub fn open(low: impl Into<Number>, high: impl Into<Number>) -> Self {
        Self::new(low, high, (false, false))
    }

    /// Whether `x` lies in this interval. NaN lies in no interval.
    pub fn contains(&self, x: impl Into<Number>) -> bool {
        let x = x.into();
        let above_low = if self.include_low {
            self.low <= x
        } else {
            self.low < x
        };
        let below_high = if self.include_high {
            x <= self.high
        } else {
            x < self.high
        };
        above_low && below_high
    }

    /// Parse the tuple notation `(low, high)` or
    /// `(low, high, (include_low, include_high))`
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Tuple(parts) = value else {
            return Err(CheckError::specification(format!(
                "{}, got {}",
                TUPLE_FORMAT, value
            )));
        };

        match parts.as_slice() {
            [low, high] => Ok(Self::closed(endpoint(low)?, endpoint(high)?)),
            [low, high, Value::Tuple(flags)] => match flags.as_slice() {
                [Value::Bool(include_low), Value::Bool(include_high)] => Ok(Self::new(
                    endpoint(low)?,
                    endpoint(high)?,
                    (*include_low, *include_high),
                )),
                _ => Err(CheckError::specification(format!(
                    "inclusivity must be a pair of booleans, got {}",
                    parts[2]
                ))),
            },
            _ => Err(CheckError::specification(format!(
                "{}, got {}",
                TUPLE_FORMAT, value
            ))),
        }
    }
}

fn endpoint(value: &Value) -> Result<Number> {
    value.as_number().ok_or_else(|| {
        CheckError::specification(format!(
            "bound endpoints must be numeric, got {} ({})",
            value,
            value.class_name()
        ))
    })
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.include_low { "[" } else { "(" };
        let close = if self.include_high { "]" } else { ")" };
        write!(f, "{}{}, {}{}", open, self.low, self.high, close)
    }
}

/// Declared numeric bounds: one interval, or a union of intervals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundSpec {
    Interval(Interval),
    /// Accepts a value lying in at least one interval
    Union(Vec<Interval>),
}

impl BoundSpec {
    pub fn closed(low: impl Into<Number>, high: impl Into<Number>) -> Self {
        BoundSpec::Interval(Interval::closed(low, high))
    }

    pub fn interval(
        low: impl Into<Number>,
        high: impl Into<Number>,
        inclusive: (bool, bool),
    ) -> Self {
        BoundSpec::Interval(Interval::new(low, high, inclusive))
    }

    pub fn union(intervals: impl IntoIterator<Item = Interval>) -> Self {
        BoundSpec::Union(intervals.into_iter().collect())
    }

    /// Parse the tuple notation.
    ///
    /// A list, or a tuple made only of tuples, is a union of intervals.
    /// Anything else must be a single interval tuple.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::List(items) => Self::parse_union(items),
            Value::Tuple(items) if items.iter().all(|v| matches!(v, Value::Tuple(_))) => {
                Self::parse_union(items)
            }
            other => Interval::from_value(other).map(BoundSpec::Interval),
        }
    }

    fn parse_union(items: &[Value]) -> Result<Self> {
        items
            .iter()
            .map(Interval::from_value)
            .collect::<Result<Vec<_>>>()
            .map(BoundSpec::Union)
    }

    pub fn intervals(&self) -> &[Interval] {
        match self {
            BoundSpec::Interval(interval) => std::slice::from_ref(interval),
            BoundSpec::Union(intervals) => intervals,
        }
    }

    /// Whether `x` lies in at least one interval
    pub fn contains(&self, x: impl Into<Number>) -> bool {
        let x = x.into();
        self.intervals().iter().any(|i| i.contains(x))
    }

    /// Whether a numeric value lies within bounds.
    ///
    /// Non-numeric values are a type mismatch rather than a bounds failure.
    pub fn in_bounds(&self, value: &Value) -> Result<bool> {
        let x = value.as_number().ok_or_else(|| {
            CheckError::type_mismatch(TypeChecker::scalar().spec().to_string(), value.class_name())
        })?;
        Ok(self.contains(x))
    }

    /// Fail with a bounds violation if `value` lies outside every interval
    pub fn assert_in_bounds(&self, value: &Value) -> Result<()> {
        if self.in_bounds(value)? {
            Ok(())
        } else {
            Err(CheckError::out_of_bounds(value.to_string(), self.to_string()))
        }
    }
}

impl fmt::Display for BoundSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundSpec::Interval(interval) => write!(f, "{}", interval),
            BoundSpec::Union(intervals) if intervals.is_empty() => write!(f, "empty"),
            BoundSpec::Union(intervals) => {
                for (i, interval) in intervals.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", interval)?;
                }
                Ok(())
            }
        }
    }
}

impl From<Interval> for BoundSpec {
    fn from(interval: Interval) -> Self {
        BoundSpec::Interval(interval)
    }
}

impl Predicate for BoundSpec {
    fn check(&self, value: &Value) -> Result<()> {
        self.assert_in_bounds(value)
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

/// Ready-made bounds predicates
///
/// ```rust
/// use runtime_check::{BoundChecker, Interval, Predicate, Value};
///
/// let checker = BoundChecker::any_of([Interval::closed(0.0, 1.0), Interval::closed(2.0, 4.0)]);
/// assert!(checker.check(&Value::from(3)).is_ok());
/// assert!(checker.check(&Value::from(1.5)).unwrap_err().is_out_of_bounds());
/// assert!(BoundChecker::probability().check(&Value::from(0.5)).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BoundChecker {
    spec: BoundSpec,
}

impl BoundChecker {
    pub fn new(spec: impl Into<BoundSpec>) -> Self {
        Self { spec: spec.into() }
    }

    /// Build a checker from the tuple notation
    pub fn from_value(value: &Value) -> Result<Self> {
        BoundSpec::from_value(value).map(Self::new)
    }

    /// Accept a value lying in any of `intervals`
    pub fn any_of(intervals: impl IntoIterator<Item = Interval>) -> Self {
        Self::new(BoundSpec::union(intervals))
    }

    /// `[0, +inf]`
    pub fn positive() -> Self {
        Self::new(Interval::closed(0.0, f64::INFINITY))
    }

    /// `[-inf, 0]`
    pub fn negative() -> Self {
        Self::new(Interval::closed(f64::NEG_INFINITY, 0.0))
    }

    /// `(0, +inf]`
    pub fn positive_not_zero() -> Self {
        Self::new(Interval::new(0.0, f64::INFINITY, (false, true)))
    }

    /// `[-inf, 0)`
    pub fn negative_not_zero() -> Self {
        Self::new(Interval::new(f64::NEG_INFINITY, 0.0, (true, false)))
    }

    /// `[0, 1]`
    pub fn probability() -> Self {
        Self::new(Interval::closed(0.0, 1.0))
    }

    pub fn spec(&self) -> &BoundSpec {
        &self.spec
    }
}

impl Predicate for BoundChecker {
    fn check(&self, value: &Value) -> Result<()> {
        self.spec.assert_in_bounds(value)
    }

    fn describe(&self) -> String {
        self.spec.to_string()
    }
}
