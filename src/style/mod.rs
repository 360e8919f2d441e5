//! Style resources for components.
//!
//! Provides immutable, shareable CSS resources. A resource compiles to a
//! shared style sheet on platforms that support adopting them, and otherwise
//! falls back to a loadable link backed by a revoked transient location.
//!
//! # Example
//!
//! ```rust
//! use spark_element::{css, style::unsafe_css};
//!
//! let accent = css!("rebeccapurple").unwrap();
//! let sheet = css!(":host { color: ", accent, "; padding: ", 4, "px; }").unwrap();
//! assert_eq!(sheet.to_string(), ":host { color: rebeccapurple; padding: 4px; }");
//!
//! // Raw strings are rejected unless explicitly trusted.
//! assert!(css!(":host { color: ", "red", "; }").is_err());
//! assert!(css!(":host { color: ", unsafe_css("red"), "; }").is_ok());
//! ```

mod compose;
pub mod platform;
mod resource;

pub use compose::{compose, unsafe_css, CssValue};
pub use platform::{supports_adopting_style_sheets, CompiledStyleSheet};
pub use resource::{StyleLink, StyleResource};
