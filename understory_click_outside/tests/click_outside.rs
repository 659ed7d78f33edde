// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for `ClickOutside` on light-DOM elements.
//!
//! These drive the detector through `TreeDom`, either by full dispatch or by
//! invoking the registered listeners directly with hand-built events.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use understory_click_outside::adapters::tree::{ListenerOp, NodeId, TreeDom, TreeEvent};
use understory_click_outside::{
    ClickOutside, ClickOutsideBinding, ClickOutsideConfig, EventType, Listener, Platform,
};

struct Fixture {
    dom: Rc<TreeDom>,
    el: NodeId,
    outside: NodeId,
    calls: Rc<RefCell<Vec<TreeEvent>>>,
    detector: ClickOutside<TreeDom>,
}

impl Fixture {
    fn new(configure: impl FnOnce(Binding) -> Binding) -> Self {
        let dom = Rc::new(TreeDom::new());
        let el = dom.create_element();
        let outside = dom.create_element();
        dom.append_child(dom.body_id(), el);
        dom.append_child(dom.body_id(), outside);

        let calls = Rc::new(RefCell::new(Vec::new()));
        let binding = configure(recording_binding(&calls));
        let mut detector = ClickOutside::new(Rc::clone(&dom));
        detector.attach(el, binding);
        Self {
            dom,
            el,
            outside,
            calls,
            detector,
        }
    }

    fn body_listener(&self, event: EventType) -> Listener<TreeEvent> {
        let listeners = self.dom.listeners(self.dom.body_id(), event);
        assert_eq!(listeners.len(), 1, "expected one `{event}` listener on body");
        listeners[0].clone()
    }

    fn click(&self, target: NodeId) {
        self.dom.dispatch(EventType::MouseDown, target);
        self.dom.dispatch(EventType::Click, target);
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

type Binding = ClickOutsideBinding<NodeId, TreeEvent>;

fn recording_binding(calls: &Rc<RefCell<Vec<TreeEvent>>>) -> Binding {
    let calls = Rc::clone(calls);
    ClickOutsideBinding::new(move |event: &TreeEvent| calls.borrow_mut().push(*event))
}

fn active(binding: Binding) -> Binding {
    binding.with_close_conditional(|_| true)
}

#[test]
fn registers_and_unregisters_capture_listeners_on_body() {
    let mut fx = Fixture::new(|b| b);
    let body = fx.dom.body_id();
    let click = fx.body_listener(EventType::Click);
    let mousedown = fx.body_listener(EventType::MouseDown);

    let calls = fx.dom.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.op == ListenerOp::Add && c.node == body && c.capture));
    assert!(calls.iter().any(|c| c.event == EventType::Click && c.listener == click.id()));
    assert!(
        calls
            .iter()
            .any(|c| c.event == EventType::MouseDown && c.listener == mousedown.id())
    );

    fx.dom.clear_calls();
    assert!(fx.detector.detach(&fx.el));
    let calls = fx.dom.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.op == ListenerOp::Remove && c.node == body && c.capture));
    assert!(calls.iter().any(|c| c.event == EventType::Click && c.listener == click.id()));
    assert_eq!(fx.dom.listener_count(body), 0);
}

#[test]
fn calls_back_when_close_conditional_returns_true() {
    let fx = Fixture::new(active);
    let stranger = fx.dom.create_element();
    let event = TreeEvent::new(EventType::Click, stranger);

    fx.body_listener(EventType::Click).call(&event);
    assert_eq!(fx.call_count(), 0, "dispatch must be deferred");

    assert_eq!(fx.dom.run_macrotasks(), 1);
    assert_eq!(*fx.calls.borrow(), vec![event]);
}

#[test]
fn does_not_call_back_when_close_conditional_returns_false() {
    let fx = Fixture::new(|b| b.with_close_conditional(|_| false));
    fx.click(fx.outside);
    fx.body_listener(EventType::Click)
        .call(&TreeEvent::new(EventType::Click, fx.el));

    assert_eq!(fx.dom.run_macrotasks(), 0);
    assert_eq!(fx.call_count(), 0);
}

#[test]
fn does_not_call_back_without_close_conditional() {
    let fx = Fixture::new(|b| b);
    fx.click(fx.outside);
    fx.click(fx.dom.body_id());

    assert_eq!(fx.dom.run_macrotasks(), 0);
    assert_eq!(fx.call_count(), 0);
}

#[test]
fn does_not_call_back_when_clicking_the_element() {
    let fx = Fixture::new(active);
    fx.click(fx.el);

    fx.dom.run_macrotasks();
    assert_eq!(fx.call_count(), 0);
}

#[test]
fn does_not_call_back_when_clicking_inside_the_element() {
    let fx = Fixture::new(active);
    let child = fx.dom.create_element();
    fx.dom.append_child(fx.el, child);
    fx.click(child);

    fx.dom.run_macrotasks();
    assert_eq!(fx.call_count(), 0);
}

#[test]
fn does_not_call_back_when_clicking_included_elements() {
    let dom = Rc::new(TreeDom::new());
    let el = dom.create_element();
    let activator = dom.create_element();
    let label = dom.create_element();
    dom.append_child(dom.body_id(), el);
    dom.append_child(dom.body_id(), activator);
    dom.append_child(activator, label);

    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut detector = ClickOutside::new(Rc::clone(&dom));
    detector.attach(
        el,
        active(recording_binding(&calls)).with_include(move || vec![activator]),
    );

    dom.dispatch(EventType::MouseDown, label);
    dom.dispatch(EventType::Click, label);
    dom.run_macrotasks();
    assert!(calls.borrow().is_empty());
}

#[test]
fn empty_include_still_checks_the_element() {
    let fx = Fixture::new(|b| active(b).with_include(Vec::new));
    fx.click(fx.el);
    fx.dom.run_macrotasks();
    assert_eq!(fx.call_count(), 0);

    fx.click(fx.outside);
    fx.dom.run_macrotasks();
    assert_eq!(fx.call_count(), 1);
}

#[test]
fn ignores_events_without_a_target() {
    let fx = Fixture::new(active);
    fx.body_listener(EventType::MouseDown)
        .call(&TreeEvent::untargeted(EventType::MouseDown));
    fx.body_listener(EventType::Click)
        .call(&TreeEvent::untargeted(EventType::Click));

    assert_eq!(fx.dom.run_macrotasks(), 0);
    assert_eq!(fx.call_count(), 0);
}

#[test]
fn outside_click_fires_exactly_once_per_click() {
    let fx = Fixture::new(active);
    fx.click(fx.outside);
    assert_eq!(fx.dom.pending_macrotasks(), 1);
    fx.dom.run_macrotasks();
    assert_eq!(
        *fx.calls.borrow(),
        vec![TreeEvent::new(EventType::Click, fx.outside)]
    );

    fx.click(fx.outside);
    fx.dom.run_macrotasks();
    assert_eq!(fx.call_count(), 2);
}

#[test]
fn pointer_down_inside_then_click_outside_does_not_fire() {
    let fx = Fixture::new(active);
    fx.dom.dispatch(EventType::MouseDown, fx.el);
    assert_eq!(fx.detector.last_pointer_down_was_outside(&fx.el), Some(false));
    fx.dom.dispatch(EventType::Click, fx.outside);

    assert_eq!(fx.dom.run_macrotasks(), 0);
    assert_eq!(fx.call_count(), 0);
}

#[test]
fn pointer_down_outside_then_click_inside_does_not_fire() {
    let fx = Fixture::new(active);
    fx.dom.dispatch(EventType::MouseDown, fx.outside);
    assert_eq!(fx.detector.last_pointer_down_was_outside(&fx.el), Some(true));
    fx.dom.dispatch(EventType::Click, fx.el);

    assert_eq!(fx.dom.run_macrotasks(), 0);
    assert_eq!(fx.call_count(), 0);
}

#[test]
fn click_without_prior_pointer_down_counts_as_outside_origin() {
    let fx = Fixture::new(active);
    assert_eq!(fx.detector.last_pointer_down_was_outside(&fx.el), Some(true));
    fx.dom.dispatch(EventType::Click, fx.outside);

    fx.dom.run_macrotasks();
    assert_eq!(fx.call_count(), 1);
}

#[test]
fn activator_toggle_runs_before_deferred_dispatch() {
    // A menu whose activator sits outside it. Clicking the activator while the
    // menu is open closes the menu through the activator's own bubble-phase
    // handler; the detector must not close it a second time.
    let dom = Rc::new(TreeDom::new());
    let menu = dom.create_element();
    let activator = dom.create_element();
    dom.append_child(dom.body_id(), menu);
    dom.append_child(dom.body_id(), activator);

    let open = Rc::new(Cell::new(true));
    let closed_by_detector = Rc::new(Cell::new(0_u32));

    let toggle = Listener::new({
        let open = Rc::clone(&open);
        move |_: &TreeEvent| open.set(!open.get())
    });
    dom.add_listener(&activator, EventType::Click, &toggle, false)
        .unwrap();

    let mut detector = ClickOutside::new(Rc::clone(&dom));
    detector.attach(
        menu,
        ClickOutsideBinding::new({
            let open = Rc::clone(&open);
            let closed = Rc::clone(&closed_by_detector);
            move |_| {
                open.set(false);
                closed.set(closed.get() + 1);
            }
        })
        .with_close_conditional({
            let open = Rc::clone(&open);
            move |_| open.get()
        }),
    );

    dom.dispatch(EventType::MouseDown, activator);
    dom.dispatch(EventType::Click, activator);
    assert!(!open.get(), "activator closed the menu during bubble");
    assert_eq!(dom.pending_macrotasks(), 1);

    dom.run_macrotasks();
    assert!(!open.get());
    assert_eq!(closed_by_detector.get(), 0);
}

#[test]
fn detach_removes_only_its_own_listeners() {
    let mut fx = Fixture::new(active);
    let body = fx.dom.body_id();
    let unrelated = Listener::new(|_: &TreeEvent| {});
    fx.dom
        .add_listener(&body, EventType::Click, &unrelated, true)
        .unwrap();
    assert_eq!(fx.dom.listener_count(body), 3);

    assert!(fx.detector.detach(&fx.el));
    assert_eq!(fx.dom.listeners(body, EventType::Click), vec![unrelated]);
    assert!(!fx.detector.is_attached(&fx.el));
    assert_eq!(fx.detector.last_pointer_down_was_outside(&fx.el), None);
}

#[test]
fn detach_twice_is_a_no_op() {
    let mut fx = Fixture::new(active);
    assert!(fx.detector.detach(&fx.el));
    fx.dom.clear_calls();

    assert!(!fx.detector.detach(&fx.el));
    assert!(fx.dom.calls().is_empty());
}

#[test]
fn detach_without_attach_is_a_no_op() {
    let dom = Rc::new(TreeDom::new());
    let mut detector = ClickOutside::new(Rc::clone(&dom));
    let el = dom.create_element();

    assert!(!detector.detach(&el));
    assert!(dom.calls().is_empty());
}

#[test]
fn no_dispatch_after_detach() {
    let mut fx = Fixture::new(active);
    fx.detector.detach(&fx.el);
    fx.click(fx.outside);

    assert_eq!(fx.dom.run_macrotasks(), 0);
    assert_eq!(fx.call_count(), 0);
}

#[test]
fn pending_dispatch_still_fires_after_detach() {
    let mut fx = Fixture::new(active);
    fx.click(fx.outside);
    fx.detector.detach(&fx.el);

    assert_eq!(fx.dom.run_macrotasks(), 1);
    assert_eq!(fx.call_count(), 1);
}

#[test]
fn touch_mode_listens_for_touchstart_and_detaches_symmetrically() {
    let dom = Rc::new(TreeDom::new());
    let el = dom.create_element();
    let outside = dom.create_element();
    dom.append_child(dom.body_id(), el);
    dom.append_child(dom.body_id(), outside);

    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut detector = ClickOutside::with_config(Rc::clone(&dom), ClickOutsideConfig::touch());
    detector.attach(el, active(recording_binding(&calls)));

    let body = dom.body_id();
    assert!(dom.listeners(body, EventType::Click).is_empty());
    assert_eq!(dom.listeners(body, EventType::TouchStart).len(), 1);
    assert_eq!(dom.listeners(body, EventType::MouseDown).len(), 1);

    dom.dispatch(EventType::Click, outside);
    assert_eq!(dom.run_macrotasks(), 0);
    dom.dispatch(EventType::TouchStart, outside);
    assert_eq!(dom.run_macrotasks(), 1);
    assert_eq!(calls.borrow().len(), 1);

    // Switching modes after attach must not change what detach removes.
    detector.set_config(ClickOutsideConfig::default());
    dom.clear_calls();
    assert!(detector.detach(&el));
    let removed: Vec<_> = dom.calls().iter().map(|c| c.event).collect();
    assert!(removed.contains(&EventType::TouchStart));
    assert!(!removed.contains(&EventType::Click));
    assert_eq!(dom.listener_count(body), 0);
}

#[test]
fn rebind_swaps_the_binding_without_reregistering() {
    let mut fx = Fixture::new(|b| b);
    fx.dom.clear_calls();
    let calls = Rc::new(RefCell::new(Vec::new()));

    assert!(fx.detector.rebind(&fx.el, active(recording_binding(&calls))));
    assert!(fx.dom.calls().is_empty());

    fx.click(fx.outside);
    fx.dom.run_macrotasks();
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(fx.call_count(), 0);

    let stranger = fx.dom.create_element();
    assert!(!fx.detector.rebind(&stranger, Binding::inert()));
    fx.detector.detach(&fx.el);
}

#[test]
fn rebind_applies_to_pending_dispatch() {
    let fx = Fixture::new(active);
    fx.click(fx.outside);
    assert!(
        fx.detector
            .rebind(&fx.el, recording_binding(&fx.calls).with_close_conditional(|_| false))
    );

    fx.dom.run_macrotasks();
    assert_eq!(fx.call_count(), 0);
}

#[test]
fn handler_may_detach_through_shared_detector() {
    let dom = Rc::new(TreeDom::new());
    let el = dom.create_element();
    let outside = dom.create_element();
    dom.append_child(dom.body_id(), el);
    dom.append_child(dom.body_id(), outside);

    let detector = Rc::new(RefCell::new(ClickOutside::new(Rc::clone(&dom))));
    let binding = ClickOutsideBinding::new({
        let detector = Rc::downgrade(&detector);
        move |_| {
            if let Some(detector) = detector.upgrade() {
                detector.borrow_mut().detach(&el);
            }
        }
    })
    .with_close_conditional(|_| true);
    detector.borrow_mut().attach(el, binding);

    dom.dispatch(EventType::MouseDown, outside);
    dom.dispatch(EventType::Click, outside);
    dom.run_macrotasks();

    assert!(!detector.borrow().is_attached(&el));
    assert_eq!(dom.listener_count(dom.body_id()), 0);
}

#[test]
fn attaching_twice_replaces_the_previous_registration() {
    let mut fx = Fixture::new(active);
    let first = fx.body_listener(EventType::Click);

    fx.detector.attach(fx.el, active(recording_binding(&fx.calls)));
    let second = fx.body_listener(EventType::Click);
    assert_ne!(first, second);
    assert_eq!(fx.dom.listener_count(fx.dom.body_id()), 2);
    assert_eq!(fx.detector.attached_count(), 1);

    fx.click(fx.outside);
    fx.dom.run_macrotasks();
    assert_eq!(fx.call_count(), 1);
}

#[test]
fn several_elements_are_tracked_independently() {
    let dom = Rc::new(TreeDom::new());
    let a = dom.create_element();
    let b = dom.create_element();
    dom.append_child(dom.body_id(), a);
    dom.append_child(dom.body_id(), b);

    let hits_a = Rc::new(RefCell::new(Vec::new()));
    let hits_b = Rc::new(RefCell::new(Vec::new()));
    let mut detector = ClickOutside::new(Rc::clone(&dom));
    detector.attach(a, active(recording_binding(&hits_a)));
    detector.attach(b, active(recording_binding(&hits_b)));
    assert_eq!(detector.attached_count(), 2);

    dom.dispatch(EventType::MouseDown, a);
    dom.dispatch(EventType::Click, a);
    dom.run_macrotasks();
    assert!(hits_a.borrow().is_empty());
    assert_eq!(hits_b.borrow().len(), 1);

    detector.detach_all();
    assert_eq!(detector.attached_count(), 0);
    assert_eq!(dom.listener_count(dom.body_id()), 0);
}

#[test]
fn dropping_the_detector_removes_its_listeners() {
    let dom = Rc::new(TreeDom::new());
    let el = dom.create_element();
    dom.append_child(dom.body_id(), el);
    {
        let mut detector = ClickOutside::new(Rc::clone(&dom));
        detector.attach(el, ClickOutsideBinding::inert());
        assert_eq!(dom.listener_count(dom.body_id()), 2);
    }
    assert_eq!(dom.listener_count(dom.body_id()), 0);
}

#[test]
fn rejected_registration_is_skipped_without_panicking() {
    let dom = Rc::new(TreeDom::new());
    let el = dom.create_element();
    dom.append_child(dom.body_id(), el);
    dom.seal(dom.body_id());

    let mut detector = ClickOutside::new(Rc::clone(&dom));
    detector.attach(el, ClickOutsideBinding::inert());
    assert!(detector.is_attached(&el));
    assert_eq!(dom.listener_count(dom.body_id()), 0);

    // Removal fails on every root; detach still succeeds.
    assert!(detector.detach(&el));
}

#[test]
fn detach_after_body_removed_does_not_fail() {
    let dom = Rc::new(TreeDom::new());
    let el = dom.create_element();
    dom.append_child(dom.body_id(), el);

    let mut detector = ClickOutside::new(Rc::clone(&dom));
    detector.attach(el, ClickOutsideBinding::inert());
    dom.remove(dom.body_id());

    assert!(detector.detach(&el));
    // The body was not resolved at detach time, so its registrations remain.
    assert_eq!(dom.listener_count(dom.body_id()), 2);
}
