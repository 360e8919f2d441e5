//! Reflection primitives.
//!
//! Stateless helpers for turning property values into node attributes,
//! class lists and inline style text.

mod reflect;

pub use reflect::{class_string, reflect_attributes, style_string, AttributeTarget};
