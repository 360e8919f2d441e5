//! Component definitions - declared reactive properties.
//!
//! Each component type declares its properties once. The resulting
//! [`Definition`] is cached per type and shared by every instance:
//! - Property name → descriptor (kind, attribute mapping, comparator)
//! - Attribute name → property name (reverse mapping for attribute changes)

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::ElementError;
use crate::types::{PropertyKind, Value};

// =============================================================================
// Change Detection
// =============================================================================

/// Comparator deciding whether a write is a change. Must be pure.
pub type ChangeComparator = fn(old: &Value, new: &Value) -> bool;

/// Default comparator: strict inequality, except that NaN → NaN is not a
/// change. Otherwise a NaN written from a render hook would reschedule forever.
pub fn not_equal(old: &Value, new: &Value) -> bool {
    match (old, new) {
        (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => false,
        _ => old != new,
    }
}

// =============================================================================
// Property Descriptor
// =============================================================================

/// Declaration of one reactive property.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    /// Kind used to coerce attribute strings.
    pub kind: PropertyKind,
    /// Attribute name override. `None` means the lowercased property name.
    pub attribute: Option<String>,
    /// Change detection.
    pub has_changed: ChangeComparator,
    /// Writes through `Element::set` go to `Component::set_accessor`.
    pub custom_accessor: bool,
}

impl Default for PropertyDescriptor {
    fn default() -> Self {
        Self {
            kind: PropertyKind::Any,
            attribute: None,
            has_changed: not_equal,
            custom_accessor: false,
        }
    }
}

impl PropertyDescriptor {
    pub fn new(kind: PropertyKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn string() -> Self {
        Self::new(PropertyKind::String)
    }

    pub fn number() -> Self {
        Self::new(PropertyKind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(PropertyKind::Boolean)
    }

    /// Map the property to a custom attribute name.
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute = Some(name.into());
        self
    }

    /// Replace the change comparator.
    pub fn has_changed(mut self, comparator: ChangeComparator) -> Self {
        self.has_changed = comparator;
        self
    }

    /// Route writes through the component's own accessor.
    pub fn custom_accessor(mut self) -> Self {
        self.custom_accessor = true;
        self
    }

    fn attribute_name(&self, property: &str) -> String {
        self.attribute
            .clone()
            .unwrap_or_else(|| property.to_ascii_lowercase())
    }
}

// =============================================================================
// Declarations
// =============================================================================

/// Declaration table filled by `Component::declare`.
#[derive(Debug, Default)]
pub struct Declarations {
    properties: IndexMap<String, PropertyDescriptor>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a reactive property. Declaring the same name twice is an error.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        descriptor: PropertyDescriptor,
    ) -> Result<&mut Self, ElementError> {
        let name = name.into();
        if self.properties.contains_key(&name) {
            return Err(ElementError::Redeclared { property: name });
        }
        self.properties.insert(name, descriptor);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

// =============================================================================
// Definition
// =============================================================================

/// Frozen declarations of one component type.
#[derive(Debug, Default)]
pub struct Definition {
    properties: IndexMap<String, PropertyDescriptor>,
    attribute_to_property: HashMap<String, String>,
}

impl Definition {
    fn from_declarations(declarations: Declarations) -> Self {
        let attribute_to_property = declarations
            .properties
            .iter()
            .map(|(name, desc)| (desc.attribute_name(name), name.clone()))
            .collect();
        Self {
            properties: declarations.properties,
            attribute_to_property,
        }
    }

    /// Descriptor for a declared property.
    pub fn descriptor(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(name)
    }

    /// Comparator for a property (default comparator when undeclared).
    pub fn comparator(&self, name: &str) -> ChangeComparator {
        self.descriptor(name)
            .map(|d| d.has_changed)
            .unwrap_or(not_equal)
    }

    /// Property that observes the given attribute.
    pub fn property_for_attribute(&self, attribute: &str) -> Option<&str> {
        self.attribute_to_property
            .get(attribute)
            .map(String::as_str)
    }

    /// Attribute names observed by this component type.
    pub fn observed_attributes(&self) -> Vec<String> {
        self.properties
            .iter()
            .map(|(name, desc)| desc.attribute_name(name))
            .collect()
    }

    /// Declared property names, in declaration order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }
}

// =============================================================================
// Definition Registry
// =============================================================================

thread_local! {
    /// Definitions built so far, keyed by component type.
    static DEFINITIONS: RefCell<HashMap<TypeId, Rc<Definition>>> = RefCell::new(HashMap::new());
}

/// Get the definition for a component type, building it on first use.
///
/// `declare` runs at most once per type; later calls return the cached
/// definition.
pub fn define_with<F>(type_id: TypeId, declare: F) -> Result<Rc<Definition>, ElementError>
where
    F: FnOnce(&mut Declarations) -> Result<(), ElementError>,
{
    let existing = DEFINITIONS.with(|defs| defs.borrow().get(&type_id).cloned());
    if let Some(definition) = existing {
        return Ok(definition);
    }

    let mut declarations = Declarations::new();
    declare(&mut declarations)?;
    let definition = Rc::new(Definition::from_declarations(declarations));

    DEFINITIONS.with(|defs| {
        defs.borrow_mut().insert(type_id, definition.clone());
    });
    tracing::debug!(properties = definition.properties.len(), "component defined");
    Ok(definition)
}

/// Check whether a component type has been defined.
pub fn is_defined(type_id: TypeId) -> bool {
    DEFINITIONS.with(|defs| defs.borrow().contains_key(&type_id))
}

/// Forget all definitions (for testing).
pub fn reset_definitions() {
    DEFINITIONS.with(|defs| defs.borrow_mut().clear());
}

// =============================================================================
// Tests
// =============================================================================
