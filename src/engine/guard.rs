//! Re-entrancy guard - diagnoses property writes made while rendering.
//!
//! From `will_render` through `did_render` an element is "rendering". A
//! property write in that window still takes effect and is batched into the
//! next cycle, but it is reported once on the diagnostic channel. The channel
//! is separate from normal logging: developer tooling subscribes with
//! [`subscribe_diagnostics`], and each record is also emitted as a `tracing`
//! event on the `spark_element::reentrancy` target.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config;

// =============================================================================
// Render Phases
// =============================================================================

bitflags::bitflags! {
    /// Set of render phases.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Phases: u8 {
        const NONE = 0;
        const SHOULD_RENDER = 1 << 0;
        const WILL_RENDER = 1 << 1;
        const RENDER = 1 << 2;
        const APPLY_RENDER = 1 << 3;
        const DID_RENDER = 1 << 4;
        /// Phases in which writes are diagnosed.
        const GUARDED = Self::WILL_RENDER.bits()
            | Self::RENDER.bits()
            | Self::APPLY_RENDER.bits()
            | Self::DID_RENDER.bits();
    }
}

/// One lifecycle phase of an update cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ShouldRender,
    WillRender,
    Render,
    ApplyRender,
    DidRender,
}

impl Phase {
    /// Hook name, as reported in diagnostics and errors.
    pub fn name(self) -> &'static str {
        match self {
            Self::ShouldRender => "should_render",
            Self::WillRender => "will_render",
            Self::Render => "render",
            Self::ApplyRender => "apply_render",
            Self::DidRender => "did_render",
        }
    }

    pub fn flag(self) -> Phases {
        match self {
            Self::ShouldRender => Phases::SHOULD_RENDER,
            Self::WillRender => Phases::WILL_RENDER,
            Self::Render => Phases::RENDER,
            Self::ApplyRender => Phases::APPLY_RENDER,
            Self::DidRender => Phases::DID_RENDER,
        }
    }

    pub fn is_guarded(self) -> bool {
        Phases::GUARDED.contains(self.flag())
    }
}

// =============================================================================
// Diagnostics Channel
// =============================================================================

/// Record of one re-entrant write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Element identifier.
    pub element: String,
    /// Property written.
    pub property: String,
    /// Phase that was running.
    pub phase: Phase,
}

pub type DiagnosticHandler = Rc<dyn Fn(&Diagnostic)>;

thread_local! {
    static HANDLERS: RefCell<Vec<(usize, DiagnosticHandler)>> = RefCell::new(Vec::new());
    static NEXT_ID: Cell<usize> = const { Cell::new(0) };
    static EMITTED: Cell<usize> = const { Cell::new(0) };
}

/// Subscribe to re-entrancy diagnostics. Returns an unsubscribe function.
pub fn subscribe_diagnostics(handler: impl Fn(&Diagnostic) + 'static) -> Box<dyn FnOnce()> {
    let id = NEXT_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    HANDLERS.with(|h| h.borrow_mut().push((id, Rc::new(handler))));

    Box::new(move || {
        HANDLERS.with(|h| h.borrow_mut().retain(|(hid, _)| *hid != id));
    })
}

/// Total diagnostics emitted on this thread.
pub fn emitted_diagnostics() -> usize {
    EMITTED.with(|e| e.get())
}

/// Clear handlers and the emitted counter (for testing).
pub fn reset_diagnostics() {
    HANDLERS.with(|h| h.borrow_mut().clear());
    EMITTED.with(|e| e.set(0));
}

fn emit(diagnostic: Diagnostic) {
    EMITTED.with(|e| e.set(e.get() + 1));
    tracing::warn!(
        target: "spark_element::reentrancy",
        element = %diagnostic.element,
        property = %diagnostic.property,
        phase = diagnostic.phase.name(),
        "property set while rendering; the change is deferred to the next update"
    );

    let handlers: Vec<DiagnosticHandler> =
        HANDLERS.with(|h| h.borrow().iter().map(|(_, h)| h.clone()).collect());
    for handler in handlers {
        handler(&diagnostic);
    }
}

// =============================================================================
// Reentrancy Guard
// =============================================================================

/// Tracks the phase an element is executing.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    phase: Cell<Option<Phase>>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self, phase: Phase) {
        tracing::trace!(phase = phase.name(), "entering phase");
        self.phase.set(Some(phase));
    }

    pub fn exit(&self) {
        self.phase.set(None);
    }

    /// Phase currently executing, if any.
    pub fn current(&self) -> Option<Phase> {
        self.phase.get()
    }

    /// Whether writes right now are re-entrant.
    pub fn is_rendering(&self) -> bool {
        self.phase.get().is_some_and(Phase::is_guarded)
    }

    /// Inspect a changing write. Returns `true` if it was flagged.
    pub fn check_write(&self, element: &str, property: &str) -> bool {
        let Some(phase) = self.phase.get().filter(|p| p.is_guarded()) else {
            return false;
        };
        if !config::reentrancy_diagnostics() {
            return false;
        }
        emit(Diagnostic {
            element: element.to_string(),
            property: property.to_string(),
            phase,
        });
        true
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guarded_phases() {
        assert!(!Phase::ShouldRender.is_guarded());
        assert!(Phase::WillRender.is_guarded());
        assert!(Phase::Render.is_guarded());
        assert!(Phase::ApplyRender.is_guarded());
        assert!(Phase::DidRender.is_guarded());
        assert_eq!(Phases::GUARDED.bits().count_ones(), 4);
    }

    #[test]
    fn test_write_outside_render_not_flagged() {
        reset_diagnostics();
        let guard = ReentrancyGuard::new();
        assert!(!guard.check_write("x-1", "foo"));

        guard.enter(Phase::ShouldRender);
        assert!(!guard.check_write("x-1", "foo"));
        assert_eq!(emitted_diagnostics(), 0);
    }

    #[test]
    fn test_write_during_render_flagged_once() {
        reset_diagnostics();
        crate::config::reset_config();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let unsubscribe = subscribe_diagnostics(move |d| s.borrow_mut().push(d.clone()));

        let guard = ReentrancyGuard::new();
        guard.enter(Phase::Render);
        assert!(guard.is_rendering());
        assert!(guard.check_write("x-1", "foo"));
        guard.enter(Phase::DidRender);
        assert!(guard.check_write("x-1", "zonk"));
        guard.exit();
        assert!(!guard.check_write("x-1", "late"));

        unsubscribe();
        assert_eq!(emitted_diagnostics(), 2);
        let seen = seen.borrow();
        assert_eq!(seen[0].property, "foo");
        assert_eq!(seen[0].phase, Phase::Render);
        assert_eq!(seen[1].phase, Phase::DidRender);
    }

    #[test]
    fn test_disabled_by_config() {
        reset_diagnostics();
        crate::config::set_reentrancy_diagnostics(false);
        let guard = ReentrancyGuard::new();
        guard.enter(Phase::Render);
        assert!(!guard.check_write("x-1", "foo"));
        assert_eq!(emitted_diagnostics(), 0);
        crate::config::reset_config();
    }
}
