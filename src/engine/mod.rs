//! Element engine - the state behind every element.
//!
//! The engine owns the data structures an update cycle works on:
//! - Definition: per-type property declarations, built once and cached
//! - Store: current values plus the pending change set
//! - Scheduler: the microtask queue and the unhandled-error channel
//! - Completion: the awaitable "render complete" handle of each cycle
//! - Guard: phase tracking and re-entrant write diagnostics
//!
//! # Architecture
//!
//! ```text
//! write ─▶ PropertyStore (changed?) ─▶ invalidate ─▶ queue_microtask
//!                                                        │
//!              CompletionSignal ◀── settle ◀── hooks ◀───┘
//! ```

pub mod completion;
pub mod definition;
pub mod guard;
pub mod scheduler;
pub mod store;

pub use completion::{CompletionSignal, RenderComplete};
pub use definition::{
    define_with, is_defined, not_equal, reset_definitions, ChangeComparator, Declarations,
    Definition, PropertyDescriptor,
};
pub use guard::{
    emitted_diagnostics, reset_diagnostics, subscribe_diagnostics, Diagnostic, Phase, Phases,
    ReentrancyGuard,
};
pub use scheduler::{
    block_on, on_unhandled_error, queue_microtask, queued_microtasks, report_unhandled,
    reset_error_handlers, run_microtasks,
};
pub use store::{ChangedProperties, PropertySnapshot, PropertyStore};
