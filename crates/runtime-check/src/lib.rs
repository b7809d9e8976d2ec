//! Runtime type and bounds checking
//!
//! Declare what a callable expects of its arguments and return value, and
//! have every call verified against those declarations.
//!
//! ## Features
//!
//! - **Type checking**: atomic types, unions, type variables, lists, sets,
//!   mappings, tuples, callables, iterators and `None`
//! - **Deep checking**: optionally validate every container element
//! - **Bounds checking**: open, closed and half-open intervals, with
//!   disjoint unions of intervals
//! - **Call wrapping**: pre-checks on arguments, post-checks on the return
//!   value, with type-only, bounds-only or mixed predicates
//!
//! ## Architecture
//!
//! 1. **Values** (`value`): the dynamic [`Value`] model handed to checkers.
//! 2. **Types** (`types`): [`TypeSpec`] and the type predicate evaluator.
//! 3. **Bounds** (`bounds`): [`BoundSpec`] and the bounds predicate evaluator,
//!    comparing through the exact [`Number`] view.
//! 4. **Predicates** (`predicate`): the [`Predicate`] trait tying them together.
//! 5. **Wrappers** (`wrappers`): [`Checked`] callables and the three
//!    decorating functions.
//! 6. **Settings** (`config`): [`CheckSettings`] from TOML or the environment.
//!
//! ## Example
//!
//! ```rust
//! use runtime_check::{
//!     check_bound_at_run, Annotations, BoundSpec, CallArgs, Interval, Signature, Value,
//! };
//!
//! let scale = check_bound_at_run(
//!     Signature::new("scale").param("a").param("b"),
//!     Annotations::new()
//!         .arg("a", BoundSpec::interval(0.0, f64::INFINITY, (false, true)))
//!         .arg("b", BoundSpec::closed(0.0, 1.0))
//!         .returns(BoundSpec::union([
//!             Interval::closed(0.0, 100.0),
//!             Interval::closed(200.0, 300.0),
//!         ])),
//!     |args| {
//!         let a = args["a"].as_f64().unwrap_or_default();
//!         let b = args["b"].as_f64().unwrap_or_default();
//!         Value::from(if a < b * 100.0 { b * 100.0 } else { a.min(100.0) })
//!     },
//! )
//! .unwrap();
//!
//! assert_eq!(scale.call(CallArgs::new().arg(100).arg(0.5)).unwrap(), Value::from(100.0));
//! assert!(scale.call(CallArgs::new().arg(0).arg(0.5)).unwrap_err().is_out_of_bounds());
//! ```

pub mod bounds;
pub mod config;
pub mod error;
pub mod number;
pub mod predicate;
pub mod types;
pub mod value;
pub mod wrappers;

pub use bounds::{BoundChecker, BoundSpec, Interval};
pub use config::{CheckSettings, DEEP_ENV_VAR};
pub use error::{CheckError, CheckTarget, Result};
pub use number::Number;
pub use predicate::{predicate_fn, shared, FnPredicate, Predicate, SharedPredicate};
pub use types::{is_deep, set_deep, Depth, TypeChecker, TypeSpec, TypeTag};
pub use value::{Function, LazyIter, Object, Value};
pub use wrappers::{
    check_bound_at_run, check_type_at_run, enforce_annotations, Annotation, Annotations,
    BoundArgument, BoundArguments, CallArgs, Checked, Parameter, Signature,
};

/// Library version (from Cargo.toml)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
