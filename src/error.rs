//! Error types.

use thiserror::Error;

/// Errors raised by element definition and the imperative element surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementError {
    /// A property name was declared twice for the same component type.
    #[error("property `{property}` is already declared")]
    Redeclared { property: String },

    /// The operation needs a render target, which only exists once connected.
    #[error("element is not connected")]
    NotConnected,
}

/// Errors raised while composing style resources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    /// An interpolated value was neither a style resource nor a number.
    #[error(
        "value passed to `css!` must be a `css!` result or a number: {value}. \
         Use `unsafe_css` to pass non-literal values, but take care to ensure page security"
    )]
    Interpolation { value: String },
}

/// Error returned by a lifecycle hook.
///
/// Hook errors never abort the element: the cycle still settles and the
/// error is delivered on the scheduler's unhandled-error channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{hook} failed: {message}")]
pub struct HookError {
    pub hook: &'static str,
    pub message: String,
}

impl HookError {
    pub fn new(hook: &'static str, message: impl Into<String>) -> Self {
        Self {
            hook,
            message: message.into(),
        }
    }
}

/// Result alias for lifecycle hooks.
pub type HookResult<T = ()> = Result<T, HookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_error_display() {
        let err = HookError::new("render", "boom");
        assert_eq!(err.to_string(), "render failed: boom");
    }

    #[test]
    fn test_interpolation_error_mentions_escape_hatch() {
        let err = StyleError::Interpolation { value: "red".into() };
        let msg = err.to_string();
        assert!(msg.contains("red"));
        assert!(msg.contains("unsafe_css"));
    }
}
