//! Render targets - the nodes that receive committed output.
//!
//! Painting is owned by the template engine; this module only models the
//! boundary: an opaque [`TemplateResult`], the [`apply_template`] primitive
//! that commits it into a [`Node`], and the choice between an isolated
//! boundary and same-node rendering.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::config::RenderTargetMode;
use crate::primitives::AttributeTarget;

// =============================================================================
// Node
// =============================================================================

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    attributes: IndexMap<String, String>,
    content: String,
    shadow_root: Option<Node>,
}

/// Shared handle to a host node.
///
/// Clones refer to the same node. Only what the runtime touches is modeled:
/// attributes, committed content, and an optional isolated boundary.
#[derive(Clone, Default)]
pub struct Node {
    data: Rc<RefCell<NodeData>>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            data: Rc::new(RefCell::new(NodeData {
                tag: tag.into(),
                ..Default::default()
            })),
        }
    }

    pub fn tag(&self) -> String {
        self.data.borrow().tag.clone()
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.data.borrow().attributes.get(name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.data.borrow().attributes.contains_key(name)
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.data
            .borrow()
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Committed content (the template engine's output).
    pub fn content(&self) -> String {
        self.data.borrow().content.clone()
    }

    pub fn set_content(&self, content: impl Into<String>) {
        self.data.borrow_mut().content = content.into();
    }

    /// Attach an isolated boundary, or return the existing one.
    pub fn attach_shadow(&self) -> Node {
        let mut data = self.data.borrow_mut();
        data.shadow_root.get_or_insert_with(|| Node::new("#shadow-root")).clone()
    }

    pub fn shadow_root(&self) -> Option<Node> {
        self.data.borrow().shadow_root.clone()
    }

    /// Whether both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl AttributeTarget for Node {
    fn set_attribute(&self, name: &str, value: &str) {
        self.data
            .borrow_mut()
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn remove_attribute(&self, name: &str) {
        self.data.borrow_mut().attributes.shift_remove(name);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("Node")
            .field("tag", &data.tag)
            .field("attributes", &data.attributes)
            .field("content", &data.content)
            .field("shadow_root", &data.shadow_root.is_some())
            .finish()
    }
}

// =============================================================================
// Render Target
// =============================================================================

/// Node receiving an element's committed output.
#[derive(Debug, Clone)]
pub enum RenderTarget {
    /// Isolated boundary attached to the host.
    Isolated(Node),
    /// The host node itself.
    SameNode(Node),
}

impl RenderTarget {
    /// Build the target for `host` in the given mode.
    pub fn for_mode(mode: RenderTargetMode, host: &Node) -> Self {
        match mode {
            RenderTargetMode::Isolated => Self::Isolated(host.attach_shadow()),
            RenderTargetMode::SameNode => Self::SameNode(host.clone()),
        }
    }

    pub fn node(&self) -> &Node {
        match self {
            Self::Isolated(node) | Self::SameNode(node) => node,
        }
    }

    pub fn is_isolated(&self) -> bool {
        matches!(self, Self::Isolated(_))
    }
}

// =============================================================================
// Template Result
// =============================================================================

/// Opaque output of `render`, handed to the template engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateResult {
    markup: String,
}

impl TemplateResult {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }
}

impl From<String> for TemplateResult {
    fn from(markup: String) -> Self {
        Self { markup }
    }
}

impl From<&str> for TemplateResult {
    fn from(markup: &str) -> Self {
        Self::new(markup)
    }
}

impl fmt::Display for TemplateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.markup)
    }
}

/// Commit a template result into a target node.
pub fn apply_template(result: &TemplateResult, target: &RenderTarget) {
    target.node().set_content(result.markup());
}

// =============================================================================
// Tests
// =============================================================================
