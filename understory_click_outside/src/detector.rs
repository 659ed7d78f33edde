// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The detector: attach/detach lifecycle and the two capture-phase listeners.
//!
//! ## Dispatch gate
//!
//! Each attached element gets a pointer-down listener and a primary-event
//! listener on every resolved root, both in the capture phase.
//!
//! 1) Pointer-down records whether the interaction started outside.
//! 2) The primary event is ignored unless pointer-down was outside and the
//!    event itself is outside.
//! 3) The handler is then queued with [`Platform::defer`]. When the task runs,
//!    the activity predicate is checked again and the handler is called only
//!    if it still holds.
//!
//! The deferral lets bubble-phase listeners on the clicked element, such as
//! an activator button toggling the same menu, update state first.
//!
//! ## Deferred dispatch is not cancellable
//!
//! A task queued before [`ClickOutside::detach`] still runs and still invokes
//! the handler if the activity predicate holds. Handlers must tolerate one
//! call after their element was detached.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use tracing::{debug, trace, warn};

use crate::binding::{ClickOutsideBinding, ClickOutsideConfig};
use crate::event::EventType;
use crate::outside::is_outside;
use crate::platform::{Listener, Platform};
use crate::roots::RootSet;

type SharedBinding<P> =
    Rc<RefCell<ClickOutsideBinding<<P as Platform>::Node, <P as Platform>::Event>>>;

/// Per-element state, alive between attach and detach.
struct InteractionState<P: Platform> {
    last_pointer_down_was_outside: Rc<Cell<bool>>,
    binding: SharedBinding<P>,
    on_click: Listener<P::Event>,
    on_pointer_down: Listener<P::Event>,
    click_event: EventType,
    pointer_down_event: EventType,
}

/// Detects interactions outside attached elements.
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use understory_click_outside::adapters::tree::TreeDom;
/// use understory_click_outside::{ClickOutside, ClickOutsideBinding, EventType};
///
/// let dom = Rc::new(TreeDom::new());
/// let menu = dom.create_element();
/// let elsewhere = dom.create_element();
/// dom.append_child(dom.body_id(), menu);
/// dom.append_child(dom.body_id(), elsewhere);
///
/// let open = Rc::new(Cell::new(true));
/// let mut detector = ClickOutside::new(Rc::clone(&dom));
/// detector.attach(
///     menu,
///     ClickOutsideBinding::new({
///         let open = Rc::clone(&open);
///         move |_event| open.set(false)
///     })
///     .with_close_conditional({
///         let open = Rc::clone(&open);
///         move |_event| open.get()
///     }),
/// );
///
/// dom.dispatch(EventType::MouseDown, elsewhere);
/// dom.dispatch(EventType::Click, elsewhere);
/// // The handler runs on a later turn.
/// assert!(open.get());
/// dom.run_macrotasks();
/// assert!(!open.get());
/// ```
pub struct ClickOutside<P: Platform> {
    platform: Rc<P>,
    config: ClickOutsideConfig,
    states: Vec<(P::Node, InteractionState<P>)>,
}

impl<P: Platform> ClickOutside<P> {
    /// Creates a detector with the default configuration.
    pub fn new(platform: Rc<P>) -> Self {
        Self::with_config(platform, ClickOutsideConfig::default())
    }

    /// Creates a detector with `config`.
    pub fn with_config(platform: Rc<P>, config: ClickOutsideConfig) -> Self {
        Self {
            platform,
            config,
            states: Vec::new(),
        }
    }

    /// The platform this detector registers listeners with.
    #[must_use]
    pub fn platform(&self) -> &Rc<P> {
        &self.platform
    }

    /// The current configuration.
    #[must_use]
    pub fn config(&self) -> ClickOutsideConfig {
        self.config
    }

    /// Replaces the configuration.
    ///
    /// Only later attaches are affected; attached elements keep the event
    /// types they were registered with.
    pub fn set_config(&mut self, config: ClickOutsideConfig) {
        self.config = config;
    }

    /// Returns `true` if `element` is attached.
    #[must_use]
    pub fn is_attached(&self, element: &P::Node) -> bool {
        self.position(element).is_some()
    }

    /// Number of attached elements.
    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.states.len()
    }

    /// Whether the last pointer-down seen for `element` was outside, or
    /// `None` if it is not attached.
    #[must_use]
    pub fn last_pointer_down_was_outside(&self, element: &P::Node) -> Option<bool> {
        self.position(element)
            .map(|i| self.states[i].1.last_pointer_down_was_outside.get())
    }

    /// Replaces the binding seen by `element`'s listeners, including by
    /// deferred dispatches that have not run yet.
    ///
    /// Returns `false` if `element` is not attached.
    pub fn rebind(
        &self,
        element: &P::Node,
        binding: ClickOutsideBinding<P::Node, P::Event>,
    ) -> bool {
        let Some(i) = self.position(element) else {
            return false;
        };
        *self.states[i].1.binding.borrow_mut() = binding;
        true
    }

    /// Removes the listeners registered for `element` and drops its state.
    ///
    /// Returns `false`, doing nothing, if `element` is not attached. Removal
    /// failures on individual roots are logged and skipped.
    pub fn detach(&mut self, element: &P::Node) -> bool {
        let Some(i) = self.position(element) else {
            trace!(element = ?element, "detach without attach");
            return false;
        };
        let (element, state) = self.states.swap_remove(i);

        let roots = RootSet::resolve(&*self.platform, &element);
        let targets = roots.targets();
        for root in &targets {
            for (event, listener) in [
                (state.click_event, &state.on_click),
                (state.pointer_down_event, &state.on_pointer_down),
            ] {
                if let Err(err) = self.platform.remove_listener(root, event, listener, true) {
                    debug!(root = ?root, %err, "listener already gone");
                }
            }
        }
        debug!(
            element = ?element,
            event = %state.click_event,
            roots = targets.len(),
            "click-outside detached"
        );
        true
    }

    /// Detaches every attached element.
    pub fn detach_all(&mut self) {
        while let Some((element, _)) = self.states.last() {
            let element = element.clone();
            self.detach(&element);
        }
    }

    fn position(&self, element: &P::Node) -> Option<usize> {
        self.states.iter().position(|(el, _)| el == element)
    }
}

impl<P: Platform + 'static> ClickOutside<P> {
    /// Starts watching `element`.
    ///
    /// Registers a capture-phase pointer-down listener and a capture-phase
    /// primary-event listener on the document body and, when `element` is in
    /// shadow trees, on every shadow root enclosing it. The primary event is
    /// chosen from the configured [`InputMode`](crate::InputMode).
    ///
    /// Attaching an element that is already attached first detaches it, so
    /// one element never holds two sets of listeners. This differs from
    /// directive-style hooks, where the caller guarantees a single attach and
    /// a second one would register duplicate listeners.
    pub fn attach(&mut self, element: P::Node, binding: ClickOutsideBinding<P::Node, P::Event>) {
        if self.detach(&element) {
            warn!(element = ?element, "element attached twice; replacing previous registration");
        }

        let click_event = self.config.input_mode.primary_event();
        let pointer_down_event = self.config.input_mode.pointer_down_event();
        let last_pointer_down_was_outside = Rc::new(Cell::new(true));
        let binding = Rc::new(RefCell::new(binding));

        let on_click = Listener::new({
            let platform = Rc::clone(&self.platform);
            let element = element.clone();
            let binding = Rc::clone(&binding);
            let last = Rc::clone(&last_pointer_down_was_outside);
            move |event: &P::Event| {
                on_click_outside(&platform, &element, &binding, last.get(), event);
            }
        });
        let on_pointer_down = Listener::new({
            let platform = Rc::clone(&self.platform);
            let element = element.clone();
            let binding = Rc::clone(&binding);
            let last = Rc::clone(&last_pointer_down_was_outside);
            move |event: &P::Event| {
                let snapshot = binding.borrow().clone();
                last.set(is_outside(&*platform, &element, &snapshot, event));
            }
        });

        let roots = RootSet::resolve(&*self.platform, &element);
        let targets = roots.targets();
        for root in &targets {
            for (event, listener) in [
                (click_event, &on_click),
                (pointer_down_event, &on_pointer_down),
            ] {
                if let Err(err) = self.platform.add_listener(root, event, listener, true) {
                    warn!(root = ?root, %err, "failed to register click-outside listener");
                }
            }
        }
        debug!(
            element = ?element,
            event = %click_event,
            roots = targets.len(),
            "click-outside attached"
        );

        self.states.push((
            element,
            InteractionState {
                last_pointer_down_was_outside,
                binding,
                on_click,
                on_pointer_down,
                click_event,
                pointer_down_event,
            },
        ));
    }
}

/// The primary-event listener body.
fn on_click_outside<P>(
    platform: &Rc<P>,
    element: &P::Node,
    binding: &SharedBinding<P>,
    last_pointer_down_was_outside: bool,
    event: &P::Event,
) where
    P: Platform + 'static,
{
    if !last_pointer_down_was_outside {
        trace!(element = ?element, "interaction started inside");
        return;
    }
    // Callbacks run on a snapshot so they may rebind without a borrow conflict.
    let snapshot = binding.borrow().clone();
    if !is_outside(&**platform, element, &snapshot, event) {
        return;
    }

    trace!(element = ?element, "outside interaction; deferring handler");
    let binding = Rc::clone(binding);
    let event = event.clone();
    platform.defer(Box::new(move || {
        let current = binding.borrow().clone();
        if !current.is_active(&event) {
            trace!("deactivated before deferred dispatch");
            return;
        }
        if let Some(handler) = current.handler() {
            handler(&event);
        }
    }));
}

impl<P: Platform> Drop for ClickOutside<P> {
    fn drop(&mut self) {
        self.detach_all();
    }
}

impl<P: Platform> fmt::Debug for ClickOutside<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickOutside")
            .field("config", &self.config)
            .field(
                "attached",
                &self.states.iter().map(|(el, _)| el).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
