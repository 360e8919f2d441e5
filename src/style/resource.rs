//! Style resources - immutable, lazily materialized CSS.
//!
//! A [`StyleResource`] wraps CSS text fixed at construction. The compiled
//! sheet and the fallback link are built on first use and then reused, so a
//! resource can be shared by every component that uses it.
//!
//! Resources can only be built by [`compose`](super::compose) (the `css!`
//! macro) and [`unsafe_css`](super::unsafe_css):
//!
//! ```compile_fail
//! // Not constructable from outside the style module.
//! let style = spark_element::style::StyleResource::new("div {}".into(), todo!());
//! ```

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::platform::{
    create_object_url, revoke_object_url, supports_adopting_style_sheets, CompiledStyleSheet,
};
use crate::pipeline::Node;
use crate::primitives::AttributeTarget;

/// Capability required to construct a [`StyleResource`]. Only this crate's
/// style factories can create one.
pub(super) struct ConstructionToken(());

impl ConstructionToken {
    pub(super) const fn new() -> Self {
        Self(())
    }
}

// =============================================================================
// Style Link
// =============================================================================

/// Loadable style resource for hosts that cannot adopt compiled sheets.
///
/// `href` points at a transient location that was revoked as soon as the link
/// was created; the link keeps its own copy of the content.
#[derive(Debug, PartialEq, Eq)]
pub struct StyleLink {
    href: String,
    content: Arc<str>,
}

impl StyleLink {
    pub fn rel(&self) -> &'static str {
        "stylesheet"
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

// =============================================================================
// Style Resource
// =============================================================================

struct StyleInner {
    css_text: Arc<str>,
    compiled: OnceCell<Option<Arc<CompiledStyleSheet>>>,
    fallback: OnceCell<Arc<StyleLink>>,
}

/// Immutable CSS text with memoized compiled and fallback forms.
///
/// Cloning shares the same resource.
#[derive(Clone)]
pub struct StyleResource {
    inner: Arc<StyleInner>,
}

impl StyleResource {
    pub(super) fn new(css_text: String, _token: ConstructionToken) -> Self {
        Self {
            inner: Arc::new(StyleInner {
                css_text: Arc::from(css_text),
                compiled: OnceCell::new(),
                fallback: OnceCell::new(),
            }),
        }
    }

    pub fn css_text(&self) -> &str {
        &self.inner.css_text
    }

    /// Compiled sheet, built on first access.
    ///
    /// `None` when the platform cannot adopt compiled sheets; use
    /// [`Self::fallback_resource`] instead.
    pub fn compiled_handle(&self) -> Option<Arc<CompiledStyleSheet>> {
        self.compiled_handle_with(supports_adopting_style_sheets())
    }

    pub(crate) fn compiled_handle_with(&self, supported: bool) -> Option<Arc<CompiledStyleSheet>> {
        self.inner
            .compiled
            .get_or_init(|| {
                if !supported {
                    return None;
                }
                let mut sheet = CompiledStyleSheet::new();
                sheet.replace_sync(&self.inner.css_text);
                tracing::trace!(rules = sheet.rules().len(), "compiled style sheet");
                Some(Arc::new(sheet))
            })
            .clone()
    }

    /// Loadable fallback, created on first call and reused afterwards.
    pub fn fallback_resource(&self) -> Arc<StyleLink> {
        self.inner
            .fallback
            .get_or_init(|| {
                let content = self.inner.css_text.clone();
                let href = create_object_url(content.clone(), "text/css");
                let link = StyleLink {
                    href: href.clone(),
                    content,
                };
                revoke_object_url(&href);
                Arc::new(link)
            })
            .clone()
    }

    /// `<link rel="stylesheet">` node pointing at the fallback location.
    pub fn create_link(&self) -> Node {
        let link = self.fallback_resource();
        let node = Node::new("link");
        node.set_attribute("rel", link.rel());
        node.set_attribute("href", link.href());
        node.set_content(link.content());
        node
    }

    /// Whether both handles share one resource.
    pub fn ptr_eq(&self, other: &StyleResource) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Display for StyleResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_text())
    }
}

impl fmt::Debug for StyleResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleResource")
            .field("css_text", &self.css_text())
            .field("compiled", &self.inner.compiled.get().is_some())
            .field("fallback", &self.inner.fallback.get().is_some())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
