//! Dynamic values handed to the checkers
//!
//! Checks run against a closed [`Value`] model rather than arbitrary Rust
//! types. Hosts convert their arguments into `Value`s at the call boundary
//! (most scalars have a `From` impl) and the checkers inspect the runtime
//! category of each value.

use crate::number::Number;
use ndarray::ArrayD;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Shared host function carried by [`Value::Callable`]
#[derive(Clone)]
pub struct Function {
    name: String,
    func: Arc<dyn Fn(&[Value]) -> Value + Send + Sync>,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.func)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function").field("name", &self.name).finish()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

type BoxedIter = Box<dyn Iterator<Item = Value> + Send>;

/// A lazy, one-shot iterator value.
///
/// Clones share the same underlying cursor. Iterators built with
/// [`Value::map`] are lazy maps: they apply a function to each item as it is
/// pulled.
#[derive(Clone)]
pub struct LazyIter {
    inner: Arc<Mutex<BoxedIter>>,
    mapped: bool,
}

impl LazyIter {
    fn new(inner: BoxedIter, mapped: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(inner)),
            mapped,
        }
    }

    /// Whether this iterator was produced by mapping a function over items
    pub fn is_lazy_map(&self) -> bool {
        self.mapped
    }

    /// Pull the next item, advancing every clone of this iterator
    pub fn next_value(&self) -> Option<Value> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.next()
    }
}

impl fmt::Debug for LazyIter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyIter")
            .field("mapped", &self.mapped)
            .finish_non_exhaustive()
    }
}

impl PartialEq for LazyIter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Instance of a host-defined class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    class: String,
    bases: Vec<String>,
}

impl Object {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            bases: Vec::new(),
        }
    }

    /// Declare a base class this object is also an instance of
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.bases.push(base.into());
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// Whether the object's class, or any of its bases, is `name`
    pub fn is_instance_of(&self, name: &str) -> bool {
        self.class == name || self.bases.iter().any(|b| b == name)
    }
}

/// A runtime value subject to checking
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null sentinel
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Ordered, growable sequence
    List(Vec<Value>),
    /// Fixed-arity ordered sequence
    Tuple(Vec<Value>),
    /// Unordered collection of unique elements
    Set(Vec<Value>),
    /// Key to value mapping with unique keys, in insertion order
    Dict(Vec<(Value, Value)>),
    /// Dense numeric array
    Array(ArrayD<f64>),
    Callable(Function),
    Iterator(LazyIter),
    Object(Object),
}

impl Value {
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(items.into_iter().collect())
    }

    /// Build a set, dropping duplicate elements
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Value::Set(unique)
    }

    /// Build a mapping; a repeated key keeps its first position and its last value
    pub fn dict(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut entries: Vec<(Value, Value)> = Vec::new();
        for (key, val) in pairs {
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = val,
                None => entries.push((key, val)),
            }
        }
        Value::Dict(entries)
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn function<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Value::Callable(Function::new(name, func))
    }

    /// A plain iterator over the given items
    pub fn iter(items: impl IntoIterator<Item = Value>) -> Self {
        let items: Vec<Value> = items.into_iter().collect();
        Value::Iterator(LazyIter::new(Box::new(items.into_iter()), false))
    }

    /// A lazy map applying `func` to each item as it is pulled
    pub fn map(func: Function, items: impl IntoIterator<Item = Value>) -> Self {
        let items: Vec<Value> = items.into_iter().collect();
        let mapped = items.into_iter().map(move |v| func.call(std::slice::from_ref(&v)));
        Value::Iterator(LazyIter::new(Box::new(mapped), true))
    }

    pub fn object(class: impl Into<String>) -> Self {
        Value::Object(Object::new(class))
    }

    /// Runtime class name, used in diagnostics
    pub fn class_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
            Value::Array(_) => "ndarray",
            Value::Callable(_) => "function",
            Value::Iterator(it) if it.is_lazy_map() => "map",
            Value::Iterator(_) => "iterator",
            Value::Object(obj) => obj.class(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Exact numeric view. Booleans count as the integers 0 and 1;
    /// everything else is non-numeric.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(x) => Some(Number::Float(*x)),
            _ => None,
        }
    }

    /// Numeric view as a float, lossy for integers beyond 2^53
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(Number::to_f64)
    }

    /// Whether iterating over this value is meaningful
    pub fn is_iterable(&self) -> bool {
        matches!(
            self,
            Value::Str(_)
                | Value::List(_)
                | Value::Tuple(_)
                | Value::Set(_)
                | Value::Dict(_)
                | Value::Array(_)
                | Value::Iterator(_)
        )
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "'")?;
    for c in s.chars() {
        match c {
            '\'' => write!(f, "\\'")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "'")
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write_quoted(f, s),
            Value::List(items) => {
                write!(f, "[")?;
                write_seq(f, items)?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_seq(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Set(items) if items.is_empty() => write!(f, "set()"),
            Value::Set(items) => {
                write!(f, "{{")?;
                write_seq(f, items)?;
                write!(f, "}}")
            }
            Value::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Array(arr) => write!(f, "array(shape={:?})", arr.shape()),
            Value::Callable(func) => write!(f, "<function {}>", func.name()),
            Value::Iterator(it) if it.is_lazy_map() => write!(f, "<map object>"),
            Value::Iterator(_) => write!(f, "<iterator object>"),
            Value::Object(obj) => write!(f, "<{} object>", obj.class()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<ArrayD<f64>> for Value {
    fn from(arr: ArrayD<f64>) -> Self {
        Value::Array(arr)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_names() {
        assert_eq!(Value::None.class_name(), "NoneType");
        assert_eq!(Value::from(1).class_name(), "int");
        assert_eq!(Value::from(1.0).class_name(), "float");
        assert_eq!(Value::from(true).class_name(), "bool");
        assert_eq!(Value::tuple([]).class_name(), "tuple");
        assert_eq!(Value::iter([Value::from(1)]).class_name(), "iterator");
        assert_eq!(Value::object("Point").class_name(), "Point");
    }

    #[test]
    fn test_set_drops_duplicates() {
        let set = Value::set([Value::from(1), Value::from(2), Value::from(1)]);
        assert_eq!(set, Value::Set(vec![Value::from(1), Value::from(2)]));
    }

    #[test]
    fn test_dict_last_value_wins() {
        let dict = Value::dict([
            (Value::from("a"), Value::from(1)),
            (Value::from("b"), Value::from(2)),
            (Value::from("a"), Value::from(3)),
        ]);
        assert_eq!(
            dict,
            Value::Dict(vec![
                (Value::from("a"), Value::from(3)),
                (Value::from("b"), Value::from(2)),
            ])
        );
    }

    #[test]
    fn test_lazy_map_applies_function() {
        let inc = Function::new("inc", |args| match args.first() {
            Some(Value::Int(i)) => Value::Int(i + 1),
            _ => Value::None,
        });
        let mapped = Value::map(inc, [Value::from(1), Value::from(2)]);
        let Value::Iterator(it) = &mapped else {
            panic!("expected an iterator");
        };
        assert!(it.is_lazy_map());
        assert_eq!(mapped.class_name(), "map");
        assert_eq!(it.next_value(), Some(Value::from(2)));
        assert_eq!(it.next_value(), Some(Value::from(3)));
        assert_eq!(it.next_value(), None);
    }

    #[test]
    fn test_display_matches_literal_notation() {
        assert_eq!(Value::tuple([Value::from(1)]).to_string(), "(1,)");
        assert_eq!(
            Value::tuple([Value::from(0), Value::from(0.0), Value::from("")]).to_string(),
            "(0, 0.0, '')"
        );
        assert_eq!(Value::set([]).to_string(), "set()");
        assert_eq!(Value::str("it's").to_string(), r"'it\'s'");
        assert_eq!(Value::from("a\\b\n").to_string(), r"'a\\b\n'");
        assert_eq!(Value::from(f64::INFINITY).to_string(), "inf");
    }

    #[test]
    fn test_numeric_view() {
        assert_eq!(Value::from(3).as_f64(), Some(3.0));
        assert_eq!(Value::from(0.5).as_f64(), Some(0.5));
        assert_eq!(Value::from(true).as_f64(), Some(1.0));
        assert_eq!(Value::from(false).as_number(), Some(Number::Int(0)));
        assert_eq!(Value::from(i64::MAX).as_number(), Some(Number::Int(i64::MAX)));
        assert_eq!(Value::from("1").as_f64(), None);
        assert_eq!(Value::None.as_number(), None);
    }

    #[test]
    fn test_function_value() {
        let value = Value::function("len", |args| Value::from(args.len() as i64));
        assert_eq!(value.class_name(), "function");
        assert_eq!(value.to_string(), "<function len>");
        let Value::Callable(func) = &value else {
            panic!("expected a callable");
        };
        assert_eq!(func.call(&[Value::None, Value::None]), Value::from(2));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::None);
        assert_eq!(Value::from(Some(2)), Value::Int(2));
    }
}
