//! The predicate abstraction shared by every checker
//!
//! A predicate answers one question about a [`Value`]: does it satisfy the
//! declared constraint? Type specs, bound specs, the named checkers and
//! arbitrary closures all implement [`Predicate`], which is what lets
//! [`enforce_annotations`](crate::enforce_annotations) attach any mix of
//! them to a parameter.

use crate::error::Result;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Trait for implementing value predicates
///
/// Predicates are pure: they never modify the value and hold no state that
/// changes between calls.
pub trait Predicate: Send + Sync {
    /// Check a value, returning an error describing the first violation
    fn check(&self, value: &Value) -> Result<()>;

    /// Human-readable description of what this predicate accepts
    fn describe(&self) -> String;
}

/// A shared predicate for dynamic dispatch
pub type SharedPredicate = Arc<dyn Predicate>;

/// Erase a predicate's type so it can sit in a mixed annotation list
pub fn shared(predicate: impl Predicate + 'static) -> SharedPredicate {
    Arc::new(predicate)
}

impl<P: Predicate + ?Sized> Predicate for Arc<P> {
    fn check(&self, value: &Value) -> Result<()> {
        (**self).check(value)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<P: Predicate + ?Sized> Predicate for Box<P> {
    fn check(&self, value: &Value) -> Result<()> {
        (**self).check(value)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Predicate backed by a closure
pub struct FnPredicate<F> {
    description: String,
    func: F,
}

impl<F> fmt::Debug for FnPredicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPredicate")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<F> Predicate for FnPredicate<F>
where
    F: Fn(&Value) -> Result<()> + Send + Sync,
{
    fn check(&self, value: &Value) -> Result<()> {
        (self.func)(value)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

/// Wrap a closure as a predicate
///
/// # Example
///
/// ```rust
/// use runtime_check::{predicate_fn, CheckError, Predicate, Value};
///
/// let non_empty = predicate_fn("non-empty str", |v| match v {
///     Value::Str(s) if !s.is_empty() => Ok(()),
///     other => Err(CheckError::type_mismatch("non-empty str", other.class_name())),
/// });
/// assert!(non_empty.check(&Value::from("x")).is_ok());
/// assert!(non_empty.check(&Value::from("")).is_err());
/// ```
pub fn predicate_fn<F>(description: impl Into<String>, func: F) -> FnPredicate<F>
where
    F: Fn(&Value) -> Result<()> + Send + Sync,
{
    FnPredicate {
        description: description.into(),
        func,
    }
}
