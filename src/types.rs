//! Core types for spark-element.
//!
//! Property values are dynamically typed: a component declares a property
//! kind for attribute coercion, but the store itself holds [`Value`]s so that
//! change detection, snapshots and reflection work uniformly.

use std::fmt;

// =============================================================================
// Value
// =============================================================================

/// A reactive property value.
///
/// Equality is strict: `Number(NaN)` never equals itself. The default change
/// comparator treats NaN → NaN as unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Never assigned.
    #[default]
    Undefined,
    /// Explicitly empty.
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl Value {
    /// Truthiness used by class and style reflection.
    ///
    /// `Undefined`, `Null`, `false`, `0`, `NaN` and `""` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
        }
    }

    /// `Undefined` or `Null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attribute form of this value.
    ///
    /// `true` becomes the empty "present" attribute, `false` and nullish
    /// values mean "remove the attribute".
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            Self::Undefined | Self::Null | Self::Bool(false) => None,
            Self::Bool(true) => Some(String::new()),
            other => Some(other.to_string()),
        }
    }
}

/// Format a number the way markup expects: integral values without a
/// trailing `.0`.
fn format_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        f.write_str("0")
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        write!(f, "{n:.0}")
    } else {
        write!(f, "{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => format_number(*n, f),
            Self::Str(s) => f.write_str(s),
        }
    }
}

// =============================================================================
// From implementations for ergonomic construction
// =============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// `()` means null.
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

/// `None` means null.
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

// =============================================================================
// Property Kind - attribute coercion
// =============================================================================

/// Declared type of a property, used only to coerce attribute strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyKind {
    /// Attribute string is stored as-is.
    #[default]
    Any,
    String,
    /// Parsed as a float; unparsable text becomes NaN.
    Number,
    /// Presence of the attribute means `true`.
    Boolean,
}

impl PropertyKind {
    /// Coerce an attribute value (`None` = attribute removed).
    pub fn coerce(&self, attribute: Option<&str>) -> Value {
        match (self, attribute) {
            (Self::Boolean, attr) => Value::Bool(attr.is_some()),
            (_, None) => Value::Null,
            (Self::Number, Some(text)) => {
                Value::Number(text.trim().parse::<f64>().unwrap_or(f64::NAN))
            }
            (Self::String | Self::Any, Some(text)) => Value::Str(text.to_string()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
