//! Call interception: checking arguments and return values around a call
//!
//! A [`Checked`] callable pairs a body with its declared [`Signature`] and a
//! set of [`Annotations`]. Each call binds the supplied arguments to
//! parameter names, runs the pre-checks, invokes the body, then runs the
//! post-check on the returned value.
//!
//! Three entry points pick the kind of annotation:
//!
//! - [`check_type_at_run`]: every annotation is a [`TypeSpec`]
//! - [`check_bound_at_run`]: every annotation is a [`BoundSpec`]
//! - [`enforce_annotations`]: every annotation is an arbitrary
//!   [`Predicate`], so type and bound checks can be mixed per parameter
//!
//! # Example
//!
//! ```rust
//! use runtime_check::{check_type_at_run, Annotations, CallArgs, Signature, TypeSpec, Value};
//!
//! let add_ten = check_type_at_run(
//!     Signature::new("add_ten").param("a"),
//!     Annotations::new().arg("a", TypeSpec::int()).returns(TypeSpec::str()),
//!     |args| match &args["a"] {
//!         Value::Int(a) => Value::from((a + 10).to_string()),
//!         _ => Value::None,
//!     },
//! )
//! .unwrap();
//!
//! assert_eq!(add_ten.call(CallArgs::new().arg(5)).unwrap(), Value::from("15"));
//! assert!(add_ten.call(CallArgs::new().arg("x")).unwrap_err().is_type_mismatch());
//! ```

use crate::bounds::BoundSpec;
use crate::error::{CheckError, CheckTarget, Result};
use crate::predicate::{Predicate, SharedPredicate};
use crate::types::TypeSpec;
use crate::value::Value;
use std::collections::HashMap;
use std::ops::Index;

/// A declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub default: Option<Value>,
}

/// Declared parameter list of a callable, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    name: String,
    params: Vec<Parameter>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Add a required parameter
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(Parameter {
            name: name.into(),
            default: None,
        });
        self
    }

    /// Add a parameter that falls back to `default` when not supplied
    pub fn param_with_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.params.push(Parameter {
            name: name.into(),
            default: Some(default.into()),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    /// Reject parameter lists no call could bind sensibly
    fn validate(&self) -> Result<()> {
        let mut seen_default = false;
        for (i, param) in self.params.iter().enumerate() {
            if self.params[..i].iter().any(|p| p.name == param.name) {
                return Err(CheckError::specification(format!(
                    "duplicate parameter '{}' in {}()",
                    param.name, self.name
                )));
            }
            match (&param.default, seen_default) {
                (Some(_), _) => seen_default = true,
                (None, true) => {
                    return Err(CheckError::specification(format!(
                        "parameter '{}' without a default follows a parameter with one in {}()",
                        param.name, self.name
                    )))
                }
                (None, false) => {}
            }
        }
        Ok(())
    }

    /// Bind positional then keyword arguments to parameter names.
    ///
    /// Parameters left unbound take their default; a parameter with no
    /// default that is left unbound is an error, as are surplus positional
    /// arguments, unknown keywords and parameters given twice.
    pub fn bind(&self, args: CallArgs) -> Result<BoundArguments> {
        let CallArgs { positional, keyword } = args;

        if positional.len() > self.params.len() {
            return Err(CheckError::binding(format!(
                "{}() takes {} positional argument(s) but {} were given",
                self.name,
                self.params.len(),
                positional.len()
            )));
        }

        let mut slots: Vec<Option<Value>> = vec![None; self.params.len()];
        for (slot, value) in slots.iter_mut().zip(positional) {
            *slot = Some(value);
        }

        for (name, value) in keyword {
            let idx = self.position(&name).ok_or_else(|| {
                CheckError::binding(format!(
                    "{}() got an unexpected keyword argument '{}'",
                    self.name, name
                ))
            })?;
            if slots[idx].is_some() {
                return Err(CheckError::binding(format!(
                    "{}() got multiple values for argument '{}'",
                    self.name, name
                )));
            }
            slots[idx] = Some(value);
        }

        let mut arguments = Vec::with_capacity(self.params.len());
        for (param, slot) in self.params.iter().zip(slots) {
            let argument = match (slot, &param.default) {
                (Some(value), _) => BoundArgument {
                    name: param.name.clone(),
                    value,
                    supplied: true,
                },
                (None, Some(default)) => BoundArgument {
                    name: param.name.clone(),
                    value: default.clone(),
                    supplied: false,
                },
                (None, None) => {
                    return Err(CheckError::binding(format!(
                        "{}() missing required argument '{}'",
                        self.name, param.name
                    )))
                }
            };
            arguments.push(argument);
        }

        Ok(BoundArguments { arguments })
    }
}

/// Arguments of one call, before binding
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Add a keyword argument
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.push((name.into(), value.into()));
        self
    }

    /// Positional arguments only
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            positional: values.into_iter().collect(),
            keyword: Vec::new(),
        }
    }
}

impl From<Vec<Value>> for CallArgs {
    fn from(values: Vec<Value>) -> Self {
        Self::positional(values)
    }
}

/// One parameter bound to its value
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArgument {
    pub name: String,
    pub value: Value,
    /// False when the value came from the parameter's default
    pub supplied: bool,
}

/// Arguments bound to parameter names, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArguments {
    arguments: Vec<BoundArgument>,
}

impl BoundArguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.arguments
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundArgument> {
        self.arguments.iter()
    }

    /// Arguments the caller passed explicitly
    pub fn supplied(&self) -> impl Iterator<Item = &BoundArgument> {
        self.arguments.iter().filter(|a| a.supplied)
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}

impl Index<&str> for BoundArguments {
    type Output = Value;

    /// Panics if the signature has no parameter called `name`
    fn index(&self, name: &str) -> &Value {
        match self.get(name) {
            Some(value) => value,
            None => panic!("no parameter named '{}'", name),
        }
    }
}

/// Constraint attached to one parameter or to the return value
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation<P> {
    One(P),
    /// Every predicate must hold
    All(Vec<P>),
}

impl<P: Predicate> Annotation<P> {
    /// Run the predicate(s), stopping at the first failure
    pub fn check(&self, value: &Value) -> Result<()> {
        match self {
            Annotation::One(predicate) => predicate.check(value),
            Annotation::All(predicates) => predicates.iter().try_for_each(|p| p.check(value)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Annotation::One(predicate) => predicate.describe(),
            Annotation::All(predicates) => predicates
                .iter()
                .map(|p| p.describe())
                .collect::<Vec<_>>()
                .join(" and "),
        }
    }
}

/// Declared constraints of a callable, keyed by parameter name
#[derive(Debug, Clone, PartialEq)]
pub struct Annotations<P> {
    params: HashMap<String, Annotation<P>>,
    ret: Option<Annotation<P>>,
}

impl<P> Default for Annotations<P> {
    fn default() -> Self {
        Self {
            params: HashMap::new(),
            ret: None,
        }
    }
}

impl<P> Annotations<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain a parameter with a single predicate
    pub fn arg(mut self, name: impl Into<String>, predicate: P) -> Self {
        self.params.insert(name.into(), Annotation::One(predicate));
        self
    }

    /// Constrain a parameter with several predicates that must all hold
    pub fn arg_all(mut self, name: impl Into<String>, predicates: impl IntoIterator<Item = P>) -> Self {
        self.params
            .insert(name.into(), Annotation::All(predicates.into_iter().collect()));
        self
    }

    /// Constrain the return value with a single predicate
    pub fn returns(mut self, predicate: P) -> Self {
        self.ret = Some(Annotation::One(predicate));
        self
    }

    /// Constrain the return value with several predicates that must all hold
    pub fn returns_all(mut self, predicates: impl IntoIterator<Item = P>) -> Self {
        self.ret = Some(Annotation::All(predicates.into_iter().collect()));
        self
    }

    pub fn param(&self, name: &str) -> Option<&Annotation<P>> {
        self.params.get(name)
    }

    pub fn return_annotation(&self) -> Option<&Annotation<P>> {
        self.ret.as_ref()
    }

    pub fn len(&self) -> usize {
        self.params.len() + usize::from(self.ret.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A callable whose arguments and return value are checked on every call
pub struct Checked<P, F> {
    signature: Signature,
    annotations: Annotations<P>,
    body: F,
}

impl<P, F> std::fmt::Debug for Checked<P, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checked")
            .field("signature", &self.signature)
            .field("annotated", &self.annotations.len())
            .finish_non_exhaustive()
    }
}

impl<P, F> Checked<P, F>
where
    P: Predicate,
    F: Fn(&BoundArguments) -> Value,
{
    /// Wrap `body`, validating the declarations up front
    pub fn new(signature: Signature, annotations: Annotations<P>, body: F) -> Result<Self> {
        signature.validate()?;
        let mut unknown: Vec<&str> = annotations
            .params
            .keys()
            .filter(|name| signature.position(name).is_none())
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            return Err(CheckError::specification(format!(
                "{}() has no parameter(s) named {}",
                signature.name,
                unknown.join(", ")
            )));
        }

        tracing::debug!(
            function = %signature.name,
            params = signature.params.len(),
            annotated = annotations.len(),
            "Wrapped callable with runtime checks"
        );

        Ok(Self {
            signature,
            annotations,
            body,
        })
    }

    /// Call the wrapped body.
    ///
    /// Explicitly supplied arguments are checked before the body runs, so a
    /// failing pre-check means the body never executes. The post-check runs
    /// after the body, so its side effects have already happened when it
    /// fails. Values from parameter defaults are not checked.
    pub fn call(&self, args: CallArgs) -> Result<Value> {
        let bound = self.signature.bind(args)?;

        for argument in bound.supplied() {
            if let Some(annotation) = self.annotations.param(&argument.name) {
                annotation
                    .check(&argument.value)
                    .map_err(|e| e.at(CheckTarget::Argument(argument.name.clone())))?;
                tracing::trace!(
                    function = %self.signature.name,
                    argument = %argument.name,
                    "Pre-check passed"
                );
            }
        }

        let result = (self.body)(&bound);

        if let Some(annotation) = self.annotations.return_annotation() {
            annotation
                .check(&result)
                .map_err(|e| e.at(CheckTarget::Return))?;
            tracing::trace!(function = %self.signature.name, "Post-check passed");
        }

        Ok(result)
    }

    /// Name of the wrapped callable
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn annotations(&self) -> &Annotations<P> {
        &self.annotations
    }

    /// Turn into a plain closure
    pub fn into_fn(self) -> impl Fn(CallArgs) -> Result<Value> {
        move |args| self.call(args)
    }
}

/// Check every annotated argument and the return value against type specs
pub fn check_type_at_run<F>(
    signature: Signature,
    annotations: Annotations<TypeSpec>,
    body: F,
) -> Result<Checked<TypeSpec, F>>
where
    F: Fn(&BoundArguments) -> Value,
{
    Checked::new(signature, annotations, body)
}

/// Check every annotated argument and the return value against numeric bounds
pub fn check_bound_at_run<F>(
    signature: Signature,
    annotations: Annotations<BoundSpec>,
    body: F,
) -> Result<Checked<BoundSpec, F>>
where
    F: Fn(&BoundArguments) -> Value,
{
    Checked::new(signature, annotations, body)
}

/// Check every annotated argument and the return value with arbitrary predicates
pub fn enforce_annotations<F>(
    signature: Signature,
    annotations: Annotations<SharedPredicate>,
    body: F,
) -> Result<Checked<SharedPredicate, F>>
where
    F: Fn(&BoundArguments) -> Value,
{
    Checked::new(signature, annotations, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::{BoundChecker, Interval};
    use crate::predicate::shared;
    use crate::types::TypeChecker;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sig_abc() -> Signature {
        Signature::new("f")
            .param("a")
            .param("b")
            .param_with_default("c", Value::None)
    }

    #[test]
    fn test_bind_positional_and_keyword() {
        let bound = sig_abc()
            .bind(CallArgs::new().arg(1).kwarg("b", "x"))
            .unwrap();
        assert_eq!(bound.len(), 3);
        assert_eq!(bound["a"], Value::from(1));
        assert_eq!(bound["b"], Value::from("x"));
        assert_eq!(bound["c"], Value::None);
        let supplied: Vec<&str> = bound.supplied().map(|a| a.name.as_str()).collect();
        assert_eq!(supplied, vec!["a", "b"]);
    }

    #[test]
    fn test_bind_errors() {
        let cases = vec![
            CallArgs::new().arg(1),
            CallArgs::positional([Value::from(1), Value::from(2), Value::from(3), Value::from(4)]),
            CallArgs::new().arg(1).arg(2).kwarg("d", 0),
            CallArgs::new().arg(1).arg(2).kwarg("a", 0),
            CallArgs::new().kwarg("a", 1).kwarg("a", 2).kwarg("b", 3),
        ];
        for args in cases {
            let err = sig_abc().bind(args.clone()).unwrap_err();
            assert!(matches!(err, CheckError::Binding(_)), "{:?} should not bind", args);
        }
    }

    #[test]
    fn test_binding_messages() {
        let err = sig_abc().bind(CallArgs::new().arg(1)).unwrap_err();
        assert_eq!(err.to_string(), "Cannot bind arguments: f() missing required argument 'b'");

        let err = sig_abc()
            .bind(CallArgs::new().arg(1).arg(2).kwarg("zz", 0))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot bind arguments: f() got an unexpected keyword argument 'zz'"
        );
    }

    #[test]
    fn test_invalid_signatures() {
        let dup = Signature::new("g").param("a").param("a");
        let err = check_type_at_run(dup, Annotations::new(), |_| Value::None).unwrap_err();
        assert!(err.is_specification());

        let order = Signature::new("g").param_with_default("a", 0).param("b");
        let err = check_type_at_run(order, Annotations::new(), |_| Value::None).unwrap_err();
        assert!(err.is_specification());
    }

    #[test]
    fn test_unknown_annotation_is_rejected_at_decoration() {
        let err = check_type_at_run(
            Signature::new("g").param("a"),
            Annotations::new().arg("b", TypeSpec::int()),
            |_| Value::None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CheckError::Specification("g() has no parameter(s) named b".into())
        );
    }

    #[test]
    fn test_pre_check_failure_skips_body() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let f = check_type_at_run(
            Signature::new("f").param("a"),
            Annotations::new().arg("a", TypeSpec::int()).returns(TypeSpec::str()),
            move |args| {
                counter.fetch_add(1, Ordering::SeqCst);
                match &args["a"] {
                    Value::Int(a) => Value::from((a + 10).to_string()),
                    _ => Value::None,
                }
            },
        )
        .unwrap();

        let err = f.call(CallArgs::new().arg("x")).unwrap_err();
        assert_eq!(
            err,
            CheckError::TypeMismatch {
                target: CheckTarget::Argument("a".into()),
                expected: "int".into(),
                actual: "str".into(),
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(f.call(CallArgs::new().arg(5)).unwrap(), Value::from("15"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_post_check_failure_after_body() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let f = check_bound_at_run(
            Signature::new("identity").param("a"),
            Annotations::new().returns(BoundSpec::closed(0.0, 1.0)),
            move |args| {
                counter.fetch_add(1, Ordering::SeqCst);
                args["a"].clone()
            },
        )
        .unwrap();

        let err = f.call(CallArgs::new().arg(1000)).unwrap_err();
        assert!(err.is_out_of_bounds());
        assert_eq!(err.target(), Some(&CheckTarget::Return));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_defaults_are_not_checked() {
        let f = check_type_at_run(
            Signature::new("f").param_with_default("a", "not an int"),
            Annotations::new().arg("a", TypeSpec::int()),
            |args| args["a"].clone(),
        )
        .unwrap();
        assert_eq!(f.call(CallArgs::new()).unwrap(), Value::from("not an int"));
        assert!(f.call(CallArgs::new().arg("still not")).is_err());
        assert_eq!(f.call(CallArgs::new().kwarg("a", 3)).unwrap(), Value::from(3));
    }

    #[test]
    fn test_all_annotations_must_hold() {
        let f = enforce_annotations(
            Signature::new("dual").param("a"),
            Annotations::new().arg_all(
                "a",
                [shared(BoundChecker::probability()), shared(TypeChecker::scalar())],
            ),
            |args| args["a"].clone(),
        )
        .unwrap();

        assert!(f.call(CallArgs::new().arg(0.5)).is_ok());
        assert!(f.call(CallArgs::new().arg(1.001)).unwrap_err().is_out_of_bounds());
        assert!(f.call(CallArgs::new().arg("")).unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_bounds_list_is_union_but_annotation_list_is_all() {
        let union = BoundSpec::union([Interval::closed(0.0, 1.0), Interval::closed(2.0, 3.0)]);
        let f = check_bound_at_run(
            Signature::new("f").param("a"),
            Annotations::new().arg_all("a", [union, BoundSpec::closed(0.5, 10.0)]),
            |args| args["a"].clone(),
        )
        .unwrap();

        assert!(f.call(CallArgs::new().arg(2.5)).is_ok());
        assert!(f.call(CallArgs::new().arg(0.75)).is_ok());
        assert!(f.call(CallArgs::new().arg(0.25)).is_err());
        assert!(f.call(CallArgs::new().arg(1.5)).is_err());
    }

    #[test]
    fn test_annotation_describe() {
        let ann: Annotation<TypeSpec> = Annotation::All(vec![TypeSpec::int(), TypeSpec::Any]);
        assert_eq!(ann.describe(), "int and Any");
    }

    #[test]
    fn test_identity_metadata_and_into_fn() {
        let f = check_type_at_run(
            Signature::new("named").param("x"),
            Annotations::new(),
            |args| args["x"].clone(),
        )
        .unwrap();
        assert_eq!(f.name(), "named");
        assert_eq!(f.signature().params().len(), 1);
        assert!(f.annotations().is_empty());

        let plain = f.into_fn();
        assert_eq!(plain(CallArgs::new().arg(7)).unwrap(), Value::from(7));
    }

    #[test]
    fn test_checked_is_shareable_across_threads() {
        let f = Arc::new(
            check_bound_at_run(
                Signature::new("half").param("x"),
                Annotations::new().arg("x", BoundSpec::closed(0.0, 100.0)),
                |args| Value::from(args["x"].as_f64().unwrap_or(0.0) / 2.0),
            )
            .unwrap(),
        );

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let f = Arc::clone(&f);
                std::thread::spawn(move || f.call(CallArgs::new().arg(i * 10)))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
    }
}
