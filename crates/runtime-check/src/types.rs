//! Type specifications and the type predicate evaluator
//!
//! A [`TypeSpec`] describes which runtime shapes a value may take. Container
//! specs carry optional element specs; those are only inspected when deep
//! checking is enabled, either per call through [`TypeSpec::matches_with`] or
//! process-wide through [`set_deep`].

use crate::error::{CheckError, Result};
use crate::predicate::Predicate;
use crate::value::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

static DEEP: AtomicBool = AtomicBool::new(false);

/// Enable or disable deep (element-wise) checking for the whole process.
///
/// The flag is read without synchronization at check time. Toggling it while
/// other threads are validating may give those threads a mix of shallow and
/// deep results within one pass.
pub fn set_deep(deep: bool) {
    let previous = DEEP.swap(deep, Ordering::Relaxed);
    if previous != deep {
        tracing::debug!(deep, "Deep type checking toggled");
    }
}

/// Current value of the process-wide deep checking flag (default: off)
pub fn is_deep() -> bool {
    DEEP.load(Ordering::Relaxed)
}

/// How far container checks descend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// Only the container category is checked
    Shallow,
    /// Every element is checked against the declared element specs
    Deep,
}

impl Depth {
    /// Depth selected by the process-wide flag
    pub fn current() -> Self {
        if is_deep() {
            Depth::Deep
        } else {
            Depth::Shallow
        }
    }
}

/// Atomic (non-generic) runtime types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    Bool,
    /// Integers; booleans are instances too
    Int,
    Float,
    Str,
    /// Dense numeric array
    Array,
    /// Anything that can be iterated: strings, containers, arrays, iterators
    Iterable,
    /// Host-defined class, matched against an object's class and bases
    Class(String),
}

impl TypeTag {
    /// Whether `value` is an instance of this type
    pub fn is_instance(&self, value: &Value) -> bool {
        match self {
            TypeTag::Bool => matches!(value, Value::Bool(_)),
            TypeTag::Int => matches!(value, Value::Int(_) | Value::Bool(_)),
            TypeTag::Float => matches!(value, Value::Float(_)),
            TypeTag::Str => matches!(value, Value::Str(_)),
            TypeTag::Array => matches!(value, Value::Array(_)),
            TypeTag::Iterable => value.is_iterable(),
            TypeTag::Class(name) => matches!(value, Value::Object(obj) if obj.is_instance_of(name)),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::Int => write!(f, "int"),
            TypeTag::Float => write!(f, "float"),
            TypeTag::Str => write!(f, "str"),
            TypeTag::Array => write!(f, "ndarray"),
            TypeTag::Iterable => write!(f, "Iterable"),
            TypeTag::Class(name) => write!(f, "{}", name),
        }
    }
}

/// Declarative description of acceptable value types
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    /// Matches every value
    Any,
    Atomic(TypeTag),
    /// Matches if any member matches
    Union(Vec<TypeSpec>),
    /// Type variable restricted to a closed set of alternatives
    Constrained {
        name: String,
        constraints: Vec<TypeSpec>,
    },
    SequenceOf(Option<Box<TypeSpec>>),
    SetOf(Option<Box<TypeSpec>>),
    MappingOf(Option<Box<(TypeSpec, TypeSpec)>>),
    /// Fixed-arity tuple; when element specs are given the arity must match
    TupleOf(Option<Vec<TypeSpec>>),
    /// Any invokable value; the signature is never inspected
    Callable,
    IteratorLike,
    /// Lazy map iterator
    MappingLike,
    NoneType,
}

impl TypeSpec {
    pub fn bool() -> Self {
        TypeSpec::Atomic(TypeTag::Bool)
    }

    pub fn int() -> Self {
        TypeSpec::Atomic(TypeTag::Int)
    }

    pub fn float() -> Self {
        TypeSpec::Atomic(TypeTag::Float)
    }

    pub fn str() -> Self {
        TypeSpec::Atomic(TypeTag::Str)
    }

    pub fn array() -> Self {
        TypeSpec::Atomic(TypeTag::Array)
    }

    pub fn iterable() -> Self {
        TypeSpec::Atomic(TypeTag::Iterable)
    }

    pub fn class(name: impl Into<String>) -> Self {
        TypeSpec::Atomic(TypeTag::Class(name.into()))
    }

    pub fn union(specs: impl IntoIterator<Item = TypeSpec>) -> Self {
        TypeSpec::Union(specs.into_iter().collect())
    }

    /// `spec` or `None`
    pub fn optional(spec: TypeSpec) -> Self {
        TypeSpec::Union(vec![spec, TypeSpec::NoneType])
    }

    /// A type variable bound to at least two alternatives
    pub fn constrained(
        name: impl Into<String>,
        constraints: impl IntoIterator<Item = TypeSpec>,
    ) -> Result<Self> {
        let name = name.into();
        let constraints: Vec<TypeSpec> = constraints.into_iter().collect();
        if constraints.len() < 2 {
            return Err(CheckError::specification(format!(
                "type variable '{}' needs at least two constraints, got {}",
                name,
                constraints.len()
            )));
        }
        Ok(TypeSpec::Constrained { name, constraints })
    }

    /// Any list, elements unchecked
    pub fn list() -> Self {
        TypeSpec::SequenceOf(None)
    }

    pub fn list_of(elem: TypeSpec) -> Self {
        TypeSpec::SequenceOf(Some(Box::new(elem)))
    }

    /// Any set, elements unchecked
    pub fn set() -> Self {
        TypeSpec::SetOf(None)
    }

    pub fn set_of(elem: TypeSpec) -> Self {
        TypeSpec::SetOf(Some(Box::new(elem)))
    }

    /// Any mapping, keys and values unchecked
    pub fn dict() -> Self {
        TypeSpec::MappingOf(None)
    }

    pub fn dict_of(key: TypeSpec, val: TypeSpec) -> Self {
        TypeSpec::MappingOf(Some(Box::new((key, val))))
    }

    /// Any tuple, arity and elements unchecked
    pub fn tuple() -> Self {
        TypeSpec::TupleOf(None)
    }

    pub fn tuple_of(elems: impl IntoIterator<Item = TypeSpec>) -> Self {
        TypeSpec::TupleOf(Some(elems.into_iter().collect()))
    }

    /// Check `value` using the process-wide depth setting
    pub fn matches(&self, value: &Value) -> bool {
        self.matches_with(value, Depth::current())
    }

    /// Check `value` with an explicit depth.
    ///
    /// Cases are tried in a fixed order: `Any`, unions, type variables,
    /// containers, callables, iterator categories, `None`, and finally atomic
    /// instance checks. `None` never satisfies an atomic type.
    pub fn matches_with(&self, value: &Value, depth: Depth) -> bool {
        let deep = depth == Depth::Deep;
        match self {
            TypeSpec::Any => true,
            TypeSpec::Union(specs) => specs.iter().any(|s| s.matches_with(value, depth)),
            TypeSpec::Constrained { constraints, .. } => {
                constraints.iter().any(|c| c.matches_with(value, depth))
            }
            TypeSpec::SequenceOf(elem) => match value {
                Value::List(items) => match elem {
                    Some(elem) if deep => items.iter().all(|v| elem.matches_with(v, depth)),
                    _ => true,
                },
                _ => false,
            },
            TypeSpec::SetOf(elem) => match value {
                Value::Set(items) => match elem {
                    Some(elem) if deep => items.iter().all(|v| elem.matches_with(v, depth)),
                    _ => true,
                },
                _ => false,
            },
            TypeSpec::MappingOf(kv) => match value {
                Value::Dict(entries) => match kv.as_deref() {
                    Some((key_spec, val_spec)) if deep => entries.iter().all(|(k, v)| {
                        key_spec.matches_with(k, depth) && val_spec.matches_with(v, depth)
                    }),
                    _ => true,
                },
                _ => false,
            },
            TypeSpec::TupleOf(elems) => match value {
                Value::Tuple(items) => match elems {
                    Some(elems) if elems.len() != items.len() => false,
                    Some(elems) if deep => elems
                        .iter()
                        .zip(items)
                        .all(|(spec, v)| spec.matches_with(v, depth)),
                    _ => true,
                },
                _ => false,
            },
            TypeSpec::Callable => matches!(value, Value::Callable(_)),
            TypeSpec::MappingLike => {
                matches!(value, Value::Iterator(it) if it.is_lazy_map())
            }
            TypeSpec::IteratorLike => matches!(value, Value::Iterator(_)),
            TypeSpec::NoneType => value.is_none(),
            TypeSpec::Atomic(_) if value.is_none() => false,
            TypeSpec::Atomic(tag) => tag.is_instance(value),
        }
    }

    /// Fail with a type mismatch if `value` does not match
    pub fn assert_matches(&self, value: &Value) -> Result<()> {
        if self.matches(value) {
            Ok(())
        } else {
            Err(CheckError::type_mismatch(self.to_string(), value.class_name()))
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, specs: &[TypeSpec]) -> fmt::Result {
    for (i, spec) in specs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", spec)?;
    }
    Ok(())
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Any => write!(f, "Any"),
            TypeSpec::Atomic(tag) => write!(f, "{}", tag),
            TypeSpec::Union(specs) => match specs.as_slice() {
                [inner, TypeSpec::NoneType] | [TypeSpec::NoneType, inner] => {
                    write!(f, "Optional[{}]", inner)
                }
                _ => {
                    write!(f, "Union[")?;
                    write_list(f, specs)?;
                    write!(f, "]")
                }
            },
            TypeSpec::Constrained { name, .. } => write!(f, "~{}", name),
            TypeSpec::SequenceOf(None) => write!(f, "List"),
            TypeSpec::SequenceOf(Some(elem)) => write!(f, "List[{}]", elem),
            TypeSpec::SetOf(None) => write!(f, "Set"),
            TypeSpec::SetOf(Some(elem)) => write!(f, "Set[{}]", elem),
            TypeSpec::MappingOf(None) => write!(f, "Dict"),
            TypeSpec::MappingOf(Some(kv)) => write!(f, "Dict[{}, {}]", kv.0, kv.1),
            TypeSpec::TupleOf(None) => write!(f, "Tuple"),
            TypeSpec::TupleOf(Some(elems)) if elems.is_empty() => write!(f, "Tuple[()]"),
            TypeSpec::TupleOf(Some(elems)) => {
                write!(f, "Tuple[")?;
                write_list(f, elems)?;
                write!(f, "]")
            }
            TypeSpec::Callable => write!(f, "Callable"),
            TypeSpec::IteratorLike => write!(f, "Iterator"),
            TypeSpec::MappingLike => write!(f, "Mapping"),
            TypeSpec::NoneType => write!(f, "None"),
        }
    }
}

impl From<TypeTag> for TypeSpec {
    fn from(tag: TypeTag) -> Self {
        TypeSpec::Atomic(tag)
    }
}

impl Predicate for TypeSpec {
    fn check(&self, value: &Value) -> Result<()> {
        self.assert_matches(value)
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

/// Ready-made type predicates
///
/// ```rust
/// use runtime_check::{Predicate, TypeChecker, TypeSpec, Value};
///
/// let number = TypeChecker::any_of([TypeSpec::int(), TypeSpec::float()]);
/// assert!(number.check(&Value::from(0.5)).is_ok());
/// assert!(TypeChecker::scalar().check(&Value::from("0.5")).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TypeChecker {
    spec: TypeSpec,
}

impl TypeChecker {
    pub fn new(spec: TypeSpec) -> Self {
        Self { spec }
    }

    /// Accept a value matching any of `specs`
    pub fn any_of(specs: impl IntoIterator<Item = TypeSpec>) -> Self {
        Self::new(TypeSpec::union(specs))
    }

    /// Integers and floats
    pub fn scalar() -> Self {
        Self::any_of([TypeSpec::int(), TypeSpec::float()])
    }

    /// Dense numeric arrays
    pub fn numpy_array() -> Self {
        Self::new(TypeSpec::array())
    }

    /// Arrays and any other iterable value
    pub fn iterable() -> Self {
        Self::any_of([TypeSpec::array(), TypeSpec::iterable()])
    }

    pub fn spec(&self) -> &TypeSpec {
        &self.spec
    }

    pub fn matches(&self, value: &Value) -> bool {
        self.spec.matches(value)
    }
}

impl Predicate for TypeChecker {
    fn check(&self, value: &Value) -> Result<()> {
        self.spec.assert_matches(value)
    }

    fn describe(&self) -> String {
        self.spec.to_string()
    }
}
