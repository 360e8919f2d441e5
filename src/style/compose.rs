//! Style composition - the `css!` macro and the `unsafe_css` escape hatch.
//!
//! Only literal text, other style resources and numbers may be interpolated.
//! Anything else has to go through [`unsafe_css`], which makes the decision
//! to trust that text visible at the call site.

use std::fmt;

use super::resource::{ConstructionToken, StyleResource};
use crate::error::StyleError;
use crate::types::Value;

/// A value interpolated into a `css!` template.
#[derive(Debug, Clone)]
pub enum CssValue {
    Style(StyleResource),
    Number(f64),
    /// Rejected by [`compose`]; kept so the error can name the value.
    Other(String),
}

impl CssValue {
    fn text(&self) -> Result<String, StyleError> {
        match self {
            Self::Style(style) => Ok(style.css_text().to_string()),
            Self::Number(n) => Ok(Value::Number(*n).to_string()),
            Self::Other(value) => Err(StyleError::Interpolation {
                value: value.clone(),
            }),
        }
    }
}

impl From<StyleResource> for CssValue {
    fn from(style: StyleResource) -> Self {
        Self::Style(style)
    }
}

impl From<&StyleResource> for CssValue {
    fn from(style: &StyleResource) -> Self {
        Self::Style(style.clone())
    }
}

macro_rules! number_css_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for CssValue {
                fn from(n: $ty) -> Self {
                    Self::Number(n as f64)
                }
            }
        )*
    };
}

number_css_value!(i32, i64, u32, u64, usize, f32, f64);

impl From<&str> for CssValue {
    fn from(text: &str) -> Self {
        Self::Other(text.to_string())
    }
}

impl From<String> for CssValue {
    fn from(text: String) -> Self {
        Self::Other(text)
    }
}

impl From<Value> for CssValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => Self::Number(n),
            other => Self::Other(other.to_string()),
        }
    }
}

/// Join template `strings` with interpolated `values` into a new resource.
///
/// `strings` surround the values: `strings[0] values[0] strings[1] ...`.
pub fn compose(strings: &[&str], values: &[CssValue]) -> Result<StyleResource, StyleError> {
    let mut css_text = String::new();
    let mut strings = strings.iter();
    if let Some(head) = strings.next() {
        css_text.push_str(head);
    }
    for value in values {
        css_text.push_str(&value.text()?);
        if let Some(tail) = strings.next() {
            css_text.push_str(tail);
        }
    }
    for rest in strings {
        css_text.push_str(rest);
    }
    Ok(StyleResource::new(css_text, ConstructionToken::new()))
}

/// Wrap any value as a style resource, bypassing the literal-only rule.
///
/// This is unsafe in the security sense: untrusted text becomes effective
/// stylesheet content with no sanitization, and CSS can exfiltrate data to
/// an attacker-controlled site. Only use it with trusted input.
pub fn unsafe_css(value: impl fmt::Display) -> StyleResource {
    StyleResource::new(value.to_string(), ConstructionToken::new())
}

/// Compose a [`StyleResource`] from literal text and interpolated values.
///
/// Literals and values alternate, starting and ending with a literal:
///
/// ```ignore
/// let accent = css!("rebeccapurple")?;
/// let sheet = css!("a { color: ", accent, "; margin: ", 4, "px; }")?;
/// assert_eq!(sheet.css_text(), "a { color: rebeccapurple; margin: 4px; }");
/// ```
#[macro_export]
macro_rules! css {
    ($head:literal $(, $value:expr, $tail:literal)* $(,)?) => {
        $crate::style::compose(
            &[$head $(, $tail)*],
            &[$($crate::style::CssValue::from($value)),*],
        )
    };
}

// =============================================================================
// Tests
// =============================================================================
