//! # spark-element
//!
//! Reactive component runtime for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! configuration and settle notifications.
//!
//! ## Architecture
//!
//! A component declares reactive properties once per type. Each element
//! instance keeps a property store; writes that change a value invalidate the
//! element, and every invalidation made before the next microtask drain is
//! coalesced into one update cycle:
//!
//! ```text
//! set → invalidate → (microtask) → should_render → will_render → render
//!     → apply_render → did_render → settle (render_complete resolves)
//! ```
//!
//! Style resources are immutable CSS texts that compile lazily and are shared
//! between every component using them.
//!
//! ## Modules
//!
//! - [`types`] - Core types (Value, PropertyKind)
//! - [`engine`] - Definitions, property store, scheduler, completion, guard
//! - [`pipeline`] - Component lifecycle and render targets
//! - [`primitives`] - Attribute, class and style reflection
//! - [`style`] - Style resources and the `css!` macro
//! - [`config`] - Runtime configuration

pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod primitives;
pub mod style;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{ElementError, HookError, HookResult, StyleError};

pub use engine::{
    block_on, on_unhandled_error, run_microtasks, subscribe_diagnostics, ChangedProperties,
    Declarations, Diagnostic, Phase, PropertyDescriptor, PropertySnapshot, RenderComplete,
};

pub use pipeline::{
    Component, CycleState, Element, ElementHost, Node, RenderTarget, TemplateResult,
};

pub use primitives::{class_string, reflect_attributes, style_string, AttributeTarget};

pub use style::{unsafe_css, CssValue, StyleResource};
