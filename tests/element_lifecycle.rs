//! End-to-end element lifecycle tests.
//!
//! Each test mounts a small component, drives it through property and
//! attribute writes, and checks the committed output on its render target.
//!
//! Run with: cargo test --test element_lifecycle

use std::cell::RefCell;
use std::rc::Rc;

use spark_element::config::{reset_config, RenderTargetMode};
use spark_element::engine::{emitted_diagnostics, reset_diagnostics};
use spark_element::{
    block_on, class_string, reflect_attributes, run_microtasks, style_string, ChangedProperties,
    Component, CycleState, Declarations, Element, ElementError, ElementHost, HookResult, Node,
    PropertyDescriptor, PropertySnapshot, RenderTarget, TemplateResult, Value,
};

// =============================================================================
// HELPERS
// =============================================================================

fn shadow_content<C: Component>(el: &Element<C>) -> String {
    el.node()
        .shadow_root()
        .map(|root| root.content())
        .unwrap_or_default()
}

struct Static(&'static str);

impl Component for Static {
    fn render(&mut self, _: &ElementHost, _: &PropertySnapshot) -> HookResult<TemplateResult> {
        Ok(TemplateResult::new(self.0))
    }
}

/// Renders the `foo` string property.
struct Foo;

impl Component for Foo {
    fn declare(props: &mut Declarations) -> Result<(), ElementError> {
        props.declare("foo", PropertyDescriptor::string())?;
        Ok(())
    }

    fn render(&mut self, _: &ElementHost, props: &PropertySnapshot) -> HookResult<TemplateResult> {
        Ok(TemplateResult::new(props.get("foo").to_string()))
    }
}

// =============================================================================
// RENDER TARGETS
// =============================================================================

#[test]
fn test_renders_initial_content_into_isolated_target() {
    reset_config();
    let el = Element::new("x-1", Static("hello world")).unwrap();
    el.connect();

    assert!(el.node().shadow_root().is_some());
    assert_eq!(shadow_content(&el), "hello world");
    assert_eq!(el.node().content(), "");
}

struct LightDom;

impl Component for LightDom {
    fn create_render_target(&mut self, host: &Node) -> RenderTarget {
        RenderTarget::SameNode(host.clone())
    }

    fn render(&mut self, _: &ElementHost, _: &PropertySnapshot) -> HookResult<TemplateResult> {
        Ok("hello world".into())
    }
}

#[test]
fn test_can_render_into_same_node() {
    let el = Element::new("x-1a", LightDom).unwrap();
    el.connect();

    assert!(el.node().shadow_root().is_none());
    assert_eq!(el.node().content(), "hello world");
}

#[test]
fn test_same_node_mode_from_config() {
    spark_element::config::set_render_target_mode(RenderTargetMode::SameNode);
    let el = Element::new("x-1b", Static("plain")).unwrap();
    el.connect();
    reset_config();

    assert!(el.node().shadow_root().is_none());
    assert_eq!(el.node().content(), "plain");
}

#[test]
fn test_renders_into_existing_node() {
    let node = Node::new("x-2");
    let el = Element::with_node(node.clone(), Static("hello world")).unwrap();
    el.connect();

    assert!(el.node().ptr_eq(&node));
    assert_eq!(node.shadow_root().unwrap().content(), "hello world");
}

// =============================================================================
// PROPERTY AND ATTRIBUTE CHANGES
// =============================================================================

#[test]
fn test_renders_changes_when_properties_change() {
    let el = Element::new("x-3", Foo).unwrap();
    el.set("foo", "one");
    el.connect();
    assert_eq!(shadow_content(&el), "one");

    el.set("foo", "changed");
    assert_eq!(shadow_content(&el), "one");
    run_microtasks();
    assert_eq!(shadow_content(&el), "changed");
}

#[test]
fn test_renders_changes_when_attributes_change() {
    let el = Element::new("x-4", Foo).unwrap();
    el.set("foo", "one");
    el.connect();
    assert_eq!(shadow_content(&el), "one");

    assert!(el.attribute_changed("foo", Some("changed")));
    run_microtasks();
    assert_eq!(shadow_content(&el), "changed");

    assert!(!el.attribute_changed("unobserved", Some("x")));
    assert_eq!(el.state(), CycleState::Settled);
}

struct ReadyWrite;

impl Component for ReadyWrite {
    fn declare(props: &mut Declarations) -> Result<(), ElementError> {
        props.declare("foo", PropertyDescriptor::string())?;
        Ok(())
    }

    fn render(&mut self, _: &ElementHost, props: &PropertySnapshot) -> HookResult<TemplateResult> {
        Ok(TemplateResult::new(props.get("foo").to_string()))
    }

    fn ready(&mut self, host: &ElementHost) -> HookResult {
        host.set_property("foo", "changed");
        Ok(())
    }
}

#[test]
fn test_renders_changes_made_at_ready_time() {
    let el = Element::new("x-5", ReadyWrite).unwrap();
    el.set("foo", "one");
    el.connect();

    // Rendered before connect returns, no drain needed.
    assert_eq!(shadow_content(&el), "changed");
    assert_eq!(el.state(), CycleState::Settled);
}

#[derive(Default)]
struct Accessor {
    backing: Value,
    renders: usize,
}

impl Component for Accessor {
    fn declare(props: &mut Declarations) -> Result<(), ElementError> {
        props.declare("foo", PropertyDescriptor::number())?;
        props.declare("bar", PropertyDescriptor::number().custom_accessor())?;
        Ok(())
    }

    fn render(&mut self, _: &ElementHost, props: &PropertySnapshot) -> HookResult<TemplateResult> {
        self.renders += 1;
        Ok(TemplateResult::new(format!("{}{}", props.get("foo"), props.get("bar"))))
    }

    fn set_accessor(&mut self, host: &ElementHost, name: &str, value: Value) {
        self.backing = value.clone();
        host.set_property(name, value);
    }
}

#[test]
fn test_custom_accessor_can_trigger_rendering() {
    let el = Element::new("x-6", Accessor::default()).unwrap();
    el.set("foo", 0);
    el.connect();

    el.attribute_changed("bar", Some("20"));
    block_on(el.render_complete());

    assert_eq!(el.get("bar"), Value::from(20));
    assert_eq!(el.component().backing, Value::from(20));
    assert_eq!(shadow_content(&el), "020");
    assert_eq!(el.component().renders, 2);
}

#[test]
fn test_disconnected_writes_render_on_reconnect() {
    let el = Element::new("x-6a", Foo).unwrap();
    el.set("foo", "one");
    el.connect();
    el.disconnect();

    el.set("foo", "two");
    run_microtasks();
    assert_eq!(shadow_content(&el), "one");

    el.connect();
    assert_eq!(shadow_content(&el), "two");
}

// =============================================================================
// UPDATE CYCLES
// =============================================================================

struct Counter;

impl Component for Counter {
    fn declare(props: &mut Declarations) -> Result<(), ElementError> {
        props.declare("foo", PropertyDescriptor::number())?;
        Ok(())
    }

    fn render(&mut self, _: &ElementHost, props: &PropertySnapshot) -> HookResult<TemplateResult> {
        Ok(TemplateResult::new(props.get("foo").to_string()))
    }
}

#[test]
fn test_render_complete_waits_until_next_rendering() {
    let el = Element::new("x-8", Counter).unwrap();
    el.set("foo", 0);
    el.connect();

    for expected in ["1", "2", "3"] {
        let next = el.get("foo").as_f64().unwrap_or_default() + 1.0;
        el.set("foo", next);
        block_on(el.render_complete());
        assert_eq!(shadow_content(&el), expected);
    }
}

#[test]
fn test_render_complete_shared_by_all_awaiters() {
    let el = Element::new("x-8a", Counter).unwrap();
    el.connect();

    el.set("foo", 1);
    let first = el.render_complete();
    el.set("foo", 2);
    let second = el.render_complete();
    assert!(first.same_cycle(&second));

    block_on(async move {
        first.await;
        second.await;
    });
    assert_eq!(shadow_content(&el), "2");
}

struct Gate {
    renders: usize,
    allow: bool,
}

impl Component for Gate {
    fn declare(props: &mut Declarations) -> Result<(), ElementError> {
        props.declare("foo", PropertyDescriptor::number())?;
        Ok(())
    }

    fn should_render(&mut self, _: &ElementHost, _: &ChangedProperties) -> HookResult<bool> {
        Ok(self.allow)
    }

    fn render(&mut self, _: &ElementHost, _: &PropertySnapshot) -> HookResult<TemplateResult> {
        self.renders += 1;
        Ok("hi".into())
    }
}

#[test]
fn test_should_render_controls_rendering() {
    let el = Element::new("x-9", Gate { renders: 0, allow: true }).unwrap();
    el.connect();
    assert_eq!(el.component().renders, 1);

    el.invalidate();
    el.flush();
    assert_eq!(el.component().renders, 2);

    el.component_mut().allow = false;
    el.invalidate();
    el.flush();
    assert_eq!(el.component().renders, 2);

    el.component_mut().allow = true;
    el.invalidate();
    el.flush();
    assert_eq!(el.component().renders, 3);
}

#[derive(Default)]
struct Ordered {
    info: Rc<RefCell<Vec<&'static str>>>,
}

impl Component for Ordered {
    fn should_render(&mut self, _: &ElementHost, _: &ChangedProperties) -> HookResult<bool> {
        self.info.borrow_mut().push("should_render");
        Ok(true)
    }

    fn will_render(&mut self, _: &ElementHost, _: &ChangedProperties) -> HookResult {
        self.info.borrow_mut().push("will_render");
        Ok(())
    }

    fn render(&mut self, _: &ElementHost, _: &PropertySnapshot) -> HookResult<TemplateResult> {
        self.info.borrow_mut().push("render");
        Ok("hi".into())
    }

    fn apply_render(
        &mut self,
        _: &ElementHost,
        result: &TemplateResult,
        target: &RenderTarget,
    ) -> HookResult {
        self.info.borrow_mut().push("apply_render");
        spark_element::pipeline::apply_template(result, target);
        Ok(())
    }

    fn did_render(&mut self, _: &ElementHost, _: &ChangedProperties) -> HookResult {
        self.info.borrow_mut().push("did_render");
        Ok(())
    }
}

#[test]
fn test_render_lifecycle_order() {
    let component = Ordered::default();
    let info = component.info.clone();
    let el = Element::new("x-10", component).unwrap();
    el.connect();
    block_on(el.render_complete());

    assert_eq!(
        *info.borrow(),
        ["should_render", "will_render", "render", "apply_render", "did_render"]
    );
    assert_eq!(shadow_content(&el), "hi");
}

// =============================================================================
// REFLECTION
// =============================================================================

struct Reflecting;

impl Component for Reflecting {
    fn declare(props: &mut Declarations) -> Result<(), ElementError> {
        props.declare("foo", PropertyDescriptor::number())?;
        props.declare("bar", PropertyDescriptor::boolean())?;
        Ok(())
    }

    fn render(
        &mut self,
        host: &ElementHost,
        props: &PropertySnapshot,
    ) -> HookResult<TemplateResult> {
        let foo = props.get("foo").clone();
        let bar = props.get("bar").clone();
        reflect_attributes(host.node(), [("foo", foo.clone()), ("bar", bar.clone())]);
        Ok(TemplateResult::new(format!("{foo}{bar}")))
    }
}

#[test]
fn test_reflect_attributes_on_host() {
    let el = Element::new("x-11", Reflecting).unwrap();
    el.set("foo", 0);
    el.set("bar", true);
    el.connect();
    assert_eq!(el.node().get_attribute("foo").as_deref(), Some("0"));
    assert_eq!(el.node().get_attribute("bar").as_deref(), Some(""));

    el.set("foo", 5);
    el.set("bar", false);
    block_on(el.render_complete());
    assert_eq!(el.node().get_attribute("foo").as_deref(), Some("5"));
    assert!(!el.node().has_attribute("bar"));
}

struct Classes;

impl Component for Classes {
    fn declare(props: &mut Declarations) -> Result<(), ElementError> {
        props.declare("foo", PropertyDescriptor::number())?;
        props.declare("bar", PropertyDescriptor::boolean())?;
        props.declare("baz", PropertyDescriptor::boolean())?;
        Ok(())
    }

    fn render(&mut self, _: &ElementHost, props: &PropertySnapshot) -> HookResult<TemplateResult> {
        let classes = class_string([
            ("foo", props.get("foo").clone()),
            ("bar", props.get("bar").clone()),
            ("zonk", props.get("baz").clone()),
        ]);
        Ok(TemplateResult::new(classes))
    }
}

#[test]
fn test_class_string_updates_classes() {
    let el = Element::new("x-12", Classes).unwrap();
    el.set("foo", 0);
    el.set("bar", true);
    el.set("baz", false);
    el.connect();
    assert_eq!(shadow_content(&el), "bar");

    el.set("foo", 1);
    el.set("baz", true);
    block_on(el.render_complete());
    assert_eq!(shadow_content(&el), "foo bar zonk");

    el.set("bar", false);
    block_on(el.render_complete());
    assert_eq!(shadow_content(&el), "foo zonk");

    el.set("foo", 0);
    el.set("baz", false);
    block_on(el.render_complete());
    assert_eq!(shadow_content(&el), "");
}

struct Styles;

impl Component for Styles {
    fn render(&mut self, _: &ElementHost, props: &PropertySnapshot) -> HookResult<TemplateResult> {
        let style = style_string([
            ("transitionDuration", props.get("transitionDuration").clone()),
            ("borderTop", props.get("borderTop").clone()),
            ("height", props.get("zug").clone()),
        ]);
        Ok(TemplateResult::new(style))
    }
}

#[test]
fn test_style_string_updates_style() {
    let el = Element::new("x-13", Styles).unwrap();
    el.set("transitionDuration", "0ms");
    el.set("borderTop", "");
    el.set("zug", "0px");
    el.connect();
    assert_eq!(shadow_content(&el), "transition-duration: 0ms; height: 0px;");

    el.set("transitionDuration", "100ms");
    el.set("borderTop", "5px");
    block_on(el.render_complete());
    assert_eq!(
        shadow_content(&el),
        "transition-duration: 100ms; border-top: 5px; height: 0px;"
    );

    el.set("transitionDuration", "");
    el.set("borderTop", "");
    el.set("zug", "");
    block_on(el.render_complete());
    assert_eq!(shadow_content(&el), "");
}

// =============================================================================
// RE-ENTRANCY
// =============================================================================

#[derive(Default)]
struct Reentrant {
    toggle: bool,
}

impl Component for Reentrant {
    fn render(&mut self, host: &ElementHost, _: &PropertySnapshot) -> HookResult<TemplateResult> {
        host.set_property("foo", if self.toggle { "fooToggle" } else { "foo" });
        Ok("hi".into())
    }

    fn did_render(&mut self, host: &ElementHost, _: &ChangedProperties) -> HookResult {
        host.set_property("zonk", if self.toggle { "zonkToggle" } else { "zonk" });
        Ok(())
    }
}

#[test]
fn test_warns_when_setting_properties_reentrantly() {
    reset_config();
    reset_diagnostics();
    let el = Element::new("x-14", Reentrant::default()).unwrap();
    el.connect();
    assert_eq!(emitted_diagnostics(), 2);

    el.component_mut().toggle = true;
    el.invalidate();
    block_on(el.render_complete());
    assert_eq!(emitted_diagnostics(), 4);

    // The follow-up cycle writes the same values: no new diagnostics.
    run_microtasks();
    assert_eq!(emitted_diagnostics(), 4);
    assert_eq!(el.get("zonk"), Value::from("zonkToggle"));
    assert_eq!(shadow_content(&el), "hi");
}

// =============================================================================
// DEFINITIONS
// =============================================================================

struct Duplicate;

impl Component for Duplicate {
    fn declare(props: &mut Declarations) -> Result<(), ElementError> {
        props.declare("foo", PropertyDescriptor::new(Default::default()))?;
        props.declare("foo", PropertyDescriptor::number())?;
        Ok(())
    }

    fn render(&mut self, _: &ElementHost, _: &PropertySnapshot) -> HookResult<TemplateResult> {
        Ok(TemplateResult::default())
    }
}

#[test]
fn test_duplicate_declaration_rejected() {
    let err = Element::new("x-15", Duplicate).unwrap_err();
    assert_eq!(
        err,
        ElementError::Redeclared {
            property: "foo".into()
        }
    );
}

// =============================================================================
// HOOK FAILURES
// =============================================================================

struct FailsOnce {
    failed: bool,
}

impl Component for FailsOnce {
    fn will_render(&mut self, _: &ElementHost, _: &ChangedProperties) -> HookResult {
        if !self.failed {
            self.failed = true;
            return Err(spark_element::HookError::new("will_render", "first render fails"));
        }
        Ok(())
    }

    fn render(&mut self, _: &ElementHost, _: &PropertySnapshot) -> HookResult<TemplateResult> {
        Ok("recovered".into())
    }
}

#[test]
fn test_hook_failure_settles_and_reports() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let seen = errors.clone();
    let unsubscribe =
        spark_element::on_unhandled_error(move |err| seen.borrow_mut().push(err.hook));

    let el = Element::new("x-16", FailsOnce { failed: false }).unwrap();
    el.connect();
    assert_eq!(el.state(), CycleState::Settled);
    assert!(el.render_complete().is_settled());
    assert_eq!(shadow_content(&el), "");
    assert_eq!(*errors.borrow(), ["will_render"]);

    el.invalidate();
    block_on(el.render_complete());
    unsubscribe();
    assert_eq!(shadow_content(&el), "recovered");
    assert_eq!(errors.borrow().len(), 1);
}
