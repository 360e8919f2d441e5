//! Attribute, class and style reflection helpers.
//!
//! Pure functions mapping named values onto node state. They keep no memory
//! of earlier calls; the node's current attributes are the only state.
//!
//! # Example
//!
//! ```ignore
//! let classes = class_string([("foo", Value::from(1)), ("bar", Value::from(0))]);
//! assert_eq!(classes, "foo");
//! ```

use heck::ToKebabCase;

use crate::types::Value;

/// Anything whose attributes can be set and removed.
pub trait AttributeTarget {
    fn set_attribute(&self, name: &str, value: &str);
    fn remove_attribute(&self, name: &str);
}

/// Reflect values onto `target`'s attributes.
///
/// `true` sets an empty "present" attribute, `false` and nullish values
/// remove it, anything else is set to its string form.
pub fn reflect_attributes<'a, T, I, V>(target: &T, values: I)
where
    T: AttributeTarget + ?Sized,
    I: IntoIterator<Item = (&'a str, V)>,
    V: Into<Value>,
{
    for (name, value) in values {
        let value: Value = value.into();
        match value.to_attribute() {
            Some(text) => target.set_attribute(name, &text),
            None => target.remove_attribute(name),
        }
    }
}

/// Space-separated keys whose values are truthy, in input order.
pub fn class_string<'a, I, V>(values: I) -> String
where
    I: IntoIterator<Item = (&'a str, V)>,
    V: Into<Value>,
{
    values
        .into_iter()
        .filter_map(|(name, value)| {
            let value: Value = value.into();
            value.is_truthy().then_some(name)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `kebab-key: value;` pairs, space-separated.
///
/// Non-empty strings and finite numbers (including `0`) are kept; booleans,
/// nullish values and empty strings are dropped. Custom properties (`--x`)
/// keep their name, and a leading capital marks a vendor prefix
/// (`WebkitTransform` → `-webkit-transform`).
pub fn style_string<'a, I, V>(values: I) -> String
where
    I: IntoIterator<Item = (&'a str, V)>,
    V: Into<Value>,
{
    values
        .into_iter()
        .filter_map(|(name, value)| {
            let value: Value = value.into();
            let keep = match &value {
                Value::Str(s) => !s.is_empty(),
                Value::Number(n) => n.is_finite(),
                Value::Undefined | Value::Null | Value::Bool(_) => false,
            };
            keep.then(|| format!("{}: {};", style_property(name), value))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn style_property(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    let kebab = name.to_kebab_case();
    if name.starts_with(|c: char| c.is_ascii_uppercase()) {
        format!("-{kebab}")
    } else {
        kebab
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct Attrs(RefCell<BTreeMap<String, String>>);

    impl AttributeTarget for Attrs {
        fn set_attribute(&self, name: &str, value: &str) {
            self.0.borrow_mut().insert(name.into(), value.into());
        }
        fn remove_attribute(&self, name: &str) {
            self.0.borrow_mut().remove(name);
        }
    }

    #[test]
    fn test_class_string() {
        assert_eq!(class_string([("a", 1), ("b", 1), ("c", 0)]), "a b");
        assert_eq!(class_string([("a", 0), ("b", 0)]), "");
    }

    #[test]
    fn test_class_string_preserves_order() {
        let classes = class_string([
            ("foo", Value::from(1)),
            ("bar", Value::from(true)),
            ("zonk", Value::from(true)),
        ]);
        assert_eq!(classes, "foo bar zonk");
    }

    #[test]
    fn test_style_string() {
        let style = style_string([
            ("transitionDuration", "100ms"),
            ("borderTop", "5px"),
            ("height", "0px"),
        ]);
        assert_eq!(style, "transition-duration: 100ms; border-top: 5px; height: 0px;");
    }

    #[test]
    fn test_style_string_omits_empty() {
        let style = style_string([
            ("transitionDuration", "0ms"),
            ("borderTop", ""),
            ("height", "0px"),
        ]);
        assert_eq!(style, "transition-duration: 0ms; height: 0px;");
        assert_eq!(style_string([("a", ""), ("b", "")]), "");
    }

    #[test]
    fn test_style_string_numbers_and_flags() {
        let style = style_string([
            ("opacity", Value::from(0)),
            ("zIndex", Value::from(3)),
            ("display", Value::from(true)),
            ("visibility", Value::from(false)),
            ("width", Value::Null),
            ("height", Value::from(f64::NAN)),
        ]);
        assert_eq!(style, "opacity: 0; z-index: 3;");
    }

    #[test]
    fn test_style_string_property_names() {
        let style = style_string([
            ("--main-color", "red"),
            ("WebkitTransform", "none"),
            ("borderTopWidth", "1px"),
        ]);
        assert_eq!(
            style,
            "--main-color: red; -webkit-transform: none; border-top-width: 1px;"
        );
    }

    #[test]
    fn test_reflect_attributes() {
        let target = Attrs::default();
        reflect_attributes(&target, [("foo", Value::from(5)), ("bar", Value::from(false))]);
        assert_eq!(target.0.borrow().get("foo").map(String::as_str), Some("5"));
        assert!(!target.0.borrow().contains_key("bar"));

        reflect_attributes(&target, [("bar", true)]);
        assert_eq!(target.0.borrow().get("bar").map(String::as_str), Some(""));

        reflect_attributes(&target, [("foo", Value::Null)]);
        assert!(!target.0.borrow().contains_key("foo"));
    }
}
