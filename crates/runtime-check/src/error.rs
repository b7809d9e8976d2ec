//! Error types for runtime checking
//!
//! Every failed check surfaces as a [`CheckError`]. The variants are kept
//! distinct so callers can tell a malformed declaration apart from a value
//! that simply failed validation.

use std::fmt;
use thiserror::Error;

/// What a check was applied to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckTarget {
    /// A standalone value, checked outside of any wrapped call
    #[default]
    Value,
    /// A named argument of a wrapped call
    Argument(String),
    /// The return value of a wrapped call
    Return,
}

impl fmt::Display for CheckTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckTarget::Value => write!(f, "value"),
            CheckTarget::Argument(name) => write!(f, "argument '{}'", name),
            CheckTarget::Return => write!(f, "return"),
        }
    }
}

/// Main error type for checking operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckError {
    /// A declared type or bound specification is malformed
    #[error("Invalid specification: {0}")]
    Specification(String),

    /// A value does not belong to the declared type
    #[error("Expected {expected} for {target}, got {actual}")]
    TypeMismatch {
        target: CheckTarget,
        expected: String,
        actual: String,
    },

    /// A numeric value lies outside every declared interval
    #[error("Number out of bounds {value} for {target}, expected bounds {bounds}")]
    OutOfBounds {
        target: CheckTarget,
        value: String,
        bounds: String,
    },

    /// Call arguments could not be bound to the declared signature
    #[error("Cannot bind arguments: {0}")]
    Binding(String),

    /// Settings could not be loaded
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CheckError {
    /// Create a specification error
    pub fn specification(msg: impl Into<String>) -> Self {
        CheckError::Specification(msg.into())
    }

    /// Create a binding error
    pub fn binding(msg: impl Into<String>) -> Self {
        CheckError::Binding(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        CheckError::Configuration(msg.into())
    }

    /// Create a type mismatch for a standalone value
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        CheckError::TypeMismatch {
            target: CheckTarget::Value,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a bounds violation for a standalone value
    pub fn out_of_bounds(value: impl Into<String>, bounds: impl Into<String>) -> Self {
        CheckError::OutOfBounds {
            target: CheckTarget::Value,
            value: value.into(),
            bounds: bounds.into(),
        }
    }

    /// Attribute a value-level failure to an argument or the return slot.
    ///
    /// Errors that are not about a checked value are returned unchanged.
    pub fn at(self, target: CheckTarget) -> Self {
        match self {
            CheckError::TypeMismatch { expected, actual, .. } => CheckError::TypeMismatch {
                target,
                expected,
                actual,
            },
            CheckError::OutOfBounds { value, bounds, .. } => CheckError::OutOfBounds {
                target,
                value,
                bounds,
            },
            other => other,
        }
    }

    /// The target of a value-level failure, if any
    pub fn target(&self) -> Option<&CheckTarget> {
        match self {
            CheckError::TypeMismatch { target, .. } | CheckError::OutOfBounds { target, .. } => {
                Some(target)
            }
            _ => None,
        }
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, CheckError::TypeMismatch { .. })
    }

    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, CheckError::OutOfBounds { .. })
    }

    pub fn is_specification(&self) -> bool {
        matches!(self, CheckError::Specification(_))
    }

    /// Check if this error was caused by the checked value rather than by
    /// the declarations or the way the call was made
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            CheckError::TypeMismatch { .. } | CheckError::OutOfBounds { .. }
        )
    }
}

impl From<toml::de::Error> for CheckError {
    fn from(err: toml::de::Error) -> Self {
        CheckError::Configuration(format!("TOML error: {}", err))
    }
}

/// Result type alias for checking operations
pub type Result<T> = std::result::Result<T, CheckError>;
