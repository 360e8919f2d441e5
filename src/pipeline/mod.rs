//! Element pipeline
//!
//! Connects components to the nodes they render into.
//!
//! # Pipeline Architecture
//!
//! ```text
//! Element::set → PropertyStore → microtask flush → hooks → apply_template → RenderTarget
//! ```
//!
//! ## Key Design Principles
//!
//! - **Batched**: writes before the flush coalesce into one cycle
//! - **Snapshotted**: `render` sees the values as of the cycle start
//! - **Ordered**: hooks always run in the same sequence and never nest

pub mod lifecycle;
pub mod target;

pub use lifecycle::{Component, CycleState, Element, ElementHost};
pub use target::{apply_template, Node, RenderTarget, TemplateResult};
