//! Element lifecycle - batched update cycles and render hooks.
//!
//! An [`Element`] pairs a user [`Component`] with the runtime state it needs:
//! a property store, the update-cycle state machine, a completion signal and
//! a render target. Property writes invalidate the element; invalidations
//! before the next microtask drain coalesce into one cycle.
//!
//! # Cycle
//!
//! ```text
//! Idle ──invalidate──▶ Scheduled ──flush──▶ Running ──▶ Settled
//!                          ▲                   │
//!                          └── follow-up ◀─────┘ (writes made while running)
//! ```
//!
//! While `Running`, hooks run strictly in order:
//! `should_render → will_render → render → apply_render → did_render`.
//!
//! # Example
//!
//! ```ignore
//! struct Counter;
//!
//! impl Component for Counter {
//!     fn declare(props: &mut Declarations) -> Result<(), ElementError> {
//!         props.declare("count", PropertyDescriptor::number())?;
//!         Ok(())
//!     }
//!
//!     fn render(
//!         &mut self,
//!         _host: &ElementHost,
//!         props: &PropertySnapshot,
//!     ) -> HookResult<TemplateResult> {
//!         Ok(TemplateResult::new(props.get("count").to_string()))
//!     }
//! }
//!
//! let el = Element::new("x-counter", Counter)?;
//! el.set("count", 0);
//! el.connect();
//! el.set("count", 1);
//! block_on(el.render_complete());
//! ```

use std::any::TypeId;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

use super::target::{apply_template, Node, RenderTarget, TemplateResult};
use crate::config;
use crate::engine::completion::{CompletionSignal, RenderComplete};
use crate::engine::definition::{define_with, Declarations, Definition};
use crate::engine::guard::{Phase, ReentrancyGuard};
use crate::engine::scheduler;
use crate::engine::store::{ChangedProperties, PropertySnapshot, PropertyStore};
use crate::error::{ElementError, HookError, HookResult};
use crate::types::Value;

// =============================================================================
// Component Trait
// =============================================================================

/// Lifecycle hooks of a component. Only `render` is required.
///
/// Hooks receive the [`ElementHost`] for property access. Writes made from
/// `will_render` through `did_render` are reported as re-entrant and rendered
/// by a follow-up cycle.
pub trait Component: 'static {
    /// Declare reactive properties. Runs once per component type.
    fn declare(_properties: &mut Declarations) -> Result<(), ElementError>
    where
        Self: Sized,
    {
        Ok(())
    }

    /// Choose the node that receives rendered output. Called once, on first
    /// connect.
    fn create_render_target(&mut self, host: &Node) -> RenderTarget {
        RenderTarget::for_mode(config::render_target_mode(), host)
    }

    /// Gate for the cycle. Returning `false` skips every later phase.
    fn should_render(
        &mut self,
        _host: &ElementHost,
        _changed: &ChangedProperties,
    ) -> HookResult<bool> {
        Ok(true)
    }

    fn will_render(&mut self, _host: &ElementHost, _changed: &ChangedProperties) -> HookResult {
        Ok(())
    }

    /// Produce output from the property snapshot taken when the cycle started.
    fn render(
        &mut self,
        host: &ElementHost,
        props: &PropertySnapshot,
    ) -> HookResult<TemplateResult>;

    /// Commit output to the render target.
    fn apply_render(
        &mut self,
        _host: &ElementHost,
        result: &TemplateResult,
        target: &RenderTarget,
    ) -> HookResult {
        apply_template(result, target);
        Ok(())
    }

    fn did_render(
        &mut self,
        _host: &ElementHost,
        _changed: &ChangedProperties,
    ) -> HookResult {
        Ok(())
    }

    /// Runs once, after the first render settles. Writes made here are
    /// rendered before `connect` returns.
    fn ready(&mut self, _host: &ElementHost) -> HookResult {
        Ok(())
    }

    /// Setter for properties declared with `custom_accessor`. Implementations
    /// update their backing field and call `host.set_property`.
    fn set_accessor(&mut self, host: &ElementHost, name: &str, value: Value) {
        host.set_property(name, value);
    }

    /// Getter for properties declared with `custom_accessor`.
    fn get_accessor(&self, host: &ElementHost, name: &str) -> Value {
        host.get_property(name)
    }
}

// =============================================================================
// Cycle State
// =============================================================================

/// State of the element's current update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleState {
    /// No cycle has run yet.
    #[default]
    Idle,
    /// A flush is queued.
    Scheduled,
    /// Hooks are executing.
    Running,
    /// The last cycle finished.
    Settled,
}

/// Type-erased link from the host back to its element, used by scheduled
/// flushes.
trait Flush {
    fn flush_cycle(&self, cycle: u64);
}

// =============================================================================
// Element Host
// =============================================================================

/// Component-independent half of an element: properties, cycle state and
/// completion. Hooks receive it to read and write properties.
pub struct ElementHost {
    name: String,
    node: Node,
    store: RefCell<PropertyStore>,
    state: Cell<CycleState>,
    cycle: Cell<u64>,
    /// Invalidated while running or disconnected; render again when possible.
    needs_update: Cell<bool>,
    connected: Cell<bool>,
    ever_connected: Cell<bool>,
    completion: RefCell<CompletionSignal>,
    guard: ReentrancyGuard,
    target: RefCell<Option<RenderTarget>>,
    settled: Signal<u64>,
    element: Weak<dyn Flush>,
}

impl ElementHost {
    /// Element name (the host node's tag).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Host node.
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn definition(&self) -> Rc<Definition> {
        self.store.borrow().definition().clone()
    }

    /// Current value of a property. Valid at any time, including mid-render.
    pub fn get_property(&self, name: &str) -> Value {
        self.store.borrow().read(name)
    }

    /// Write a property through change detection and batching.
    ///
    /// Returns `true` if the value changed. Changing writes made while
    /// rendering are reported on the diagnostic channel.
    pub fn set_property(&self, name: &str, value: impl Into<Value>) -> bool {
        let changed = self.store.borrow_mut().write(name, value.into());
        if !changed {
            return false;
        }
        self.guard.check_write(&self.name, name);
        self.invalidate();
        true
    }

    /// Request an update cycle without changing a property.
    pub fn invalidate(&self) {
        match self.state.get() {
            CycleState::Scheduled => {}
            CycleState::Running => self.needs_update.set(true),
            CycleState::Idle | CycleState::Settled => {
                if self.connected.get() {
                    self.schedule();
                } else {
                    self.needs_update.set(true);
                }
            }
        }
    }

    /// Run the scheduled cycle now instead of waiting for the microtask.
    /// Does nothing when no cycle is scheduled.
    pub fn flush(&self) {
        if self.state.get() != CycleState::Scheduled {
            return;
        }
        if let Some(element) = self.element.upgrade() {
            element.flush_cycle(self.cycle.get());
        }
    }

    /// Future resolving when the pending cycle settles (or immediately if
    /// none is pending). Re-read it for each cycle to observe.
    pub fn render_complete(&self) -> RenderComplete {
        self.completion.borrow().current()
    }

    pub fn state(&self) -> CycleState {
        self.state.get()
    }

    /// Phase currently executing, if any.
    pub fn phase(&self) -> Option<Phase> {
        self.guard.current()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    pub fn render_target(&self) -> Option<RenderTarget> {
        self.target.borrow().clone()
    }

    /// Signal counting settled cycles, for reactive observers.
    pub fn settled_signal(&self) -> Signal<u64> {
        self.settled.clone()
    }

    fn schedule(&self) {
        let cycle = self.cycle.get() + 1;
        self.cycle.set(cycle);
        self.state.set(CycleState::Scheduled);
        self.completion.borrow_mut().begin();
        tracing::debug!(element = %self.name, cycle, "update scheduled");

        let element = self.element.clone();
        scheduler::queue_microtask(move || {
            if let Some(element) = element.upgrade() {
                element.flush_cycle(cycle);
            }
        });
    }

    fn settle(&self) {
        self.guard.exit();
        self.state.set(CycleState::Settled);
        self.completion.borrow_mut().resolve();
        tracing::debug!(element = %self.name, cycle = self.cycle.get(), "update settled");
        self.settled.set(self.settled.get() + 1);
    }
}

impl fmt::Debug for ElementHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementHost")
            .field("name", &self.name)
            .field("state", &self.state.get())
            .field("cycle", &self.cycle.get())
            .field("connected", &self.connected.get())
            .finish()
    }
}

// =============================================================================
// Element
// =============================================================================

struct ElementInner<C: Component> {
    host: ElementHost,
    component: RefCell<C>,
    ready_done: Cell<bool>,
}

impl<C: Component> ElementInner<C> {
    /// Run hooks for one cycle. The first error stops the remaining phases.
    fn run_phases(&self, changed: &ChangedProperties, props: &PropertySnapshot) -> HookResult {
        let host = &self.host;
        let mut component = self.component.borrow_mut();

        host.guard.enter(Phase::ShouldRender);
        if !component.should_render(host, changed)? {
            tracing::trace!(element = %host.name, "should_render declined");
            return Ok(());
        }

        host.guard.enter(Phase::WillRender);
        component.will_render(host, changed)?;

        host.guard.enter(Phase::Render);
        let result = component.render(host, props)?;

        host.guard.enter(Phase::ApplyRender);
        let target = host
            .render_target()
            .ok_or_else(|| HookError::new("apply_render", ElementError::NotConnected.to_string()))?;
        component.apply_render(host, &result, &target)?;

        host.guard.enter(Phase::DidRender);
        component.did_render(host, changed)?;
        Ok(())
    }
}

impl<C: Component> Flush for ElementInner<C> {
    fn flush_cycle(&self, cycle: u64) {
        let host = &self.host;
        if host.state.get() != CycleState::Scheduled || host.cycle.get() != cycle {
            return;
        }
        host.state.set(CycleState::Running);
        let (changed, props) = {
            let mut store = host.store.borrow_mut();
            (store.take_pending(), store.snapshot())
        };
        tracing::trace!(element = %host.name, cycle, changed = changed.len(), "update running");

        // A panicking hook is reported like a failed one so the cycle still
        // settles and later invalidations are not starved.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_phases(&changed, &props)))
            .unwrap_or_else(|payload| {
                let hook = host.guard.current().map_or("update", Phase::name);
                Err(HookError::new(hook, panic_message(payload.as_ref())))
            });
        host.settle();

        if let Err(err) = outcome {
            scheduler::report_unhandled(err);
        }

        let follow_up = host.needs_update.replace(false) || host.store.borrow().has_pending();
        if follow_up {
            host.invalidate();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked".to_string()
    }
}

/// A mounted component instance. Cloning shares the same element.
pub struct Element<C: Component> {
    inner: Rc<ElementInner<C>>,
}

impl<C: Component> Clone for Element<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Component> Element<C> {
    /// Create an element with a fresh host node named `tag`.
    pub fn new(tag: &str, component: C) -> Result<Self, ElementError> {
        Self::with_node(Node::new(tag), component)
    }

    /// Create an element backed by an existing host node.
    pub fn with_node(node: Node, component: C) -> Result<Self, ElementError> {
        let definition = define_with(TypeId::of::<C>(), C::declare)?;
        let name = node.tag();

        let inner = Rc::new_cyclic(|weak: &Weak<ElementInner<C>>| {
            let element: Weak<dyn Flush> = weak.clone();
            ElementInner {
                host: ElementHost {
                    name,
                    node,
                    store: RefCell::new(PropertyStore::new(definition)),
                    state: Cell::new(CycleState::Idle),
                    cycle: Cell::new(0),
                    needs_update: Cell::new(false),
                    connected: Cell::new(false),
                    ever_connected: Cell::new(false),
                    completion: RefCell::new(CompletionSignal::new()),
                    guard: ReentrancyGuard::new(),
                    target: RefCell::new(None),
                    settled: signal(0u64),
                    element,
                },
                component: RefCell::new(component),
                ready_done: Cell::new(false),
            }
        });
        Ok(Self { inner })
    }

    pub fn host(&self) -> &ElementHost {
        &self.inner.host
    }

    pub fn node(&self) -> &Node {
        &self.inner.host.node
    }

    /// Borrow the component.
    ///
    /// # Panics
    ///
    /// Panics if called from inside one of the component's own hooks.
    pub fn component(&self) -> Ref<'_, C> {
        self.inner.component.borrow()
    }

    /// Mutably borrow the component (same restriction as [`Self::component`]).
    pub fn component_mut(&self) -> RefMut<'_, C> {
        self.inner.component.borrow_mut()
    }

    /// Attach to the host: create the render target on first connect, render
    /// synchronously, then run `ready` once.
    pub fn connect(&self) {
        let host = &self.inner.host;
        if host.connected.get() {
            return;
        }
        host.connected.set(true);

        if host.target.borrow().is_none() {
            let target = self.inner.component.borrow_mut().create_render_target(&host.node);
            *host.target.borrow_mut() = Some(target);
        }

        let first = !host.ever_connected.replace(true);
        let needs_update = host.needs_update.replace(false);
        if first || needs_update || host.state.get() == CycleState::Scheduled {
            if host.state.get() != CycleState::Scheduled {
                host.schedule();
            }
            host.flush();
        }

        if !self.inner.ready_done.replace(true) {
            let outcome = self.inner.component.borrow_mut().ready(host);
            if let Err(err) = outcome {
                scheduler::report_unhandled(err);
            }
            host.flush();
        }
    }

    /// Detach from the host. An already scheduled cycle still runs; later
    /// writes accumulate and render on the next `connect`.
    pub fn disconnect(&self) {
        self.inner.host.connected.set(false);
    }

    /// Write a property, routing custom-accessor properties through the
    /// component.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        let host = &self.inner.host;
        if self.is_custom_accessor(name) {
            self.inner.component.borrow_mut().set_accessor(host, name, value);
        } else {
            host.set_property(name, value);
        }
    }

    /// Read a property, routing custom-accessor properties through the
    /// component.
    pub fn get(&self, name: &str) -> Value {
        let host = &self.inner.host;
        if self.is_custom_accessor(name) {
            self.inner.component.borrow().get_accessor(host, name)
        } else {
            host.get_property(name)
        }
    }

    /// Apply an attribute change (`None` = removed) to the property that
    /// observes it. Returns `false` for unobserved attributes.
    pub fn attribute_changed(&self, attribute: &str, value: Option<&str>) -> bool {
        let definition = self.inner.host.definition();
        let Some(property) = definition.property_for_attribute(attribute) else {
            return false;
        };
        let kind = definition
            .descriptor(property)
            .map(|d| d.kind)
            .unwrap_or_default();
        self.set(property, kind.coerce(value));
        true
    }

    pub fn invalidate(&self) {
        self.inner.host.invalidate();
    }

    /// Run the scheduled cycle synchronously.
    pub fn flush(&self) {
        self.inner.host.flush();
    }

    pub fn render_complete(&self) -> RenderComplete {
        self.inner.host.render_complete()
    }

    pub fn state(&self) -> CycleState {
        self.inner.host.state()
    }

    pub fn settled_signal(&self) -> Signal<u64> {
        self.inner.host.settled_signal()
    }

    fn is_custom_accessor(&self, name: &str) -> bool {
        self.inner
            .host
            .definition()
            .descriptor(name)
            .is_some_and(|d| d.custom_accessor)
    }
}

impl<C: Component> fmt::Debug for Element<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element").field("host", &self.inner.host).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
