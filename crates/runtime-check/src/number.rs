//! Exact numeric view used by bounds checks
//!
//! Integers keep their `i64` value and are never widened to `f64` for a
//! comparison, so ordering between an integer and a float is exact even past
//! 2^53.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 2^63, the first float above every `i64`
const I64_END: f64 = 9_223_372_036_854_775_808.0;

/// An integer or a float, compared exactly across kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn is_nan(&self) -> bool {
        matches!(self, Number::Float(x) if x.is_nan())
    }

    /// Nearest float; lossy for integers beyond 2^53
    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(x) => x,
        }
    }
}

fn cmp_int_float(i: i64, x: f64) -> Option<Ordering> {
    if x.is_nan() {
        return None;
    }
    if x >= I64_END {
        return Some(Ordering::Less);
    }
    if x < -I64_END {
        return Some(Ordering::Greater);
    }
    // `whole` is integral and within i64 range, so the cast is exact
    let whole = x.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0f64.partial_cmp(&(x - whole)),
        unequal => Some(unequal),
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (*self, *other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (Number::Float(a), Number::Float(b)) => a.partial_cmp(&b),
            (Number::Int(a), Number::Float(b)) => cmp_int_float(a, b),
            (Number::Float(a), Number::Int(b)) => cmp_int_float(b, a).map(Ordering::reverse),
        }
    }
}

/// Numeric equality: `Int(1) == Float(1.0)`
impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<i64> for Number {
    fn from(i: i64) -> Self {
        Number::Int(i)
    }
}

impl From<i32> for Number {
    fn from(i: i32) -> Self {
        Number::Int(i64::from(i))
    }
}

impl From<f64> for Number {
    fn from(x: f64) -> Self {
        Number::Float(x)
    }
}
