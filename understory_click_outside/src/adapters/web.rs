// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser adapter: [`Platform`] over the live DOM via `web-sys`.
//!
//! - Shadow roots are recognized by type (`ShadowRoot`), not by probing for
//!   `host` and `mode` properties.
//! - Each [`Listener`] is wrapped in one JS closure, shared by all roots it is
//!   registered on and dropped once its last registration is removed.
//! - [`Platform::defer`] uses `setTimeout(…, 0)`.
//!
//! ```no_run
//! #[cfg(target_arch = "wasm32")]
//! fn watch(menu: web_sys::Element) {
//!     use std::rc::Rc;
//!     use understory_click_outside::adapters::web::WebPlatform;
//!     use understory_click_outside::{ClickOutside, ClickOutsideBinding};
//!
//!     let Some(platform) = WebPlatform::from_window() else { return };
//!     let mut detector = ClickOutside::new(Rc::new(platform));
//!     detector.attach(
//!         menu.into(),
//!         ClickOutsideBinding::new(|_event| {}).with_close_conditional(|_event| true),
//!     );
//!     // Keep `detector` alive for as long as the menu is mounted.
//!     std::mem::forget(detector);
//! }
//! ```

use alloc::format;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Document, Event, Node, ShadowRoot, Window};

use crate::error::ListenerError;
use crate::event::EventType;
use crate::platform::{Listener, ListenerId, Platform, Task};

struct JsListener {
    id: ListenerId,
    closure: Closure<dyn FnMut(Event)>,
    registrations: usize,
}

/// [`Platform`] backed by a browser window.
pub struct WebPlatform {
    window: Window,
    document: Document,
    closures: RefCell<Vec<JsListener>>,
}

impl WebPlatform {
    /// Wraps the global `window`, if there is one with a document.
    #[must_use]
    pub fn from_window() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self {
            window,
            document,
            closures: RefCell::new(Vec::new()),
        })
    }

    fn function_for(&self, listener: &Listener<Event>) -> js_sys::Function {
        let mut closures = self.closures.borrow_mut();
        if let Some(entry) = closures.iter_mut().find(|c| c.id == listener.id()) {
            entry.registrations += 1;
            return entry.closure.as_ref().unchecked_ref::<js_sys::Function>().clone();
        }
        let inner = listener.clone();
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| inner.call(&event));
        let function = closure.as_ref().unchecked_ref::<js_sys::Function>().clone();
        closures.push(JsListener {
            id: listener.id(),
            closure,
            registrations: 1,
        });
        function
    }

    fn existing_function(&self, listener: &Listener<Event>) -> Option<js_sys::Function> {
        self.closures
            .borrow()
            .iter()
            .find(|c| c.id == listener.id())
            .map(|c| c.closure.as_ref().unchecked_ref::<js_sys::Function>().clone())
    }

    fn release(&self, listener: &Listener<Event>) {
        let mut closures = self.closures.borrow_mut();
        if let Some(i) = closures.iter().position(|c| c.id == listener.id()) {
            closures[i].registrations = closures[i].registrations.saturating_sub(1);
            if closures[i].registrations == 0 {
                closures.swap_remove(i);
            }
        }
    }
}

impl fmt::Debug for WebPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebPlatform")
            .field("closures", &self.closures.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Platform for WebPlatform {
    type Node = Node;
    type Event = Event;

    fn body(&self) -> Option<Node> {
        self.document.body().map(Into::into)
    }

    fn root_node(&self, node: &Node) -> Node {
        node.get_root_node()
    }

    fn shadow_host(&self, node: &Node) -> Option<Node> {
        node.dyn_ref::<ShadowRoot>().map(|root| root.host().into())
    }

    fn contains(&self, ancestor: &Node, node: &Node) -> bool {
        ancestor.contains(Some(node))
    }

    fn event_target(&self, event: &Event) -> Option<Node> {
        event.target()?.dyn_into::<Node>().ok()
    }

    fn add_listener(
        &self,
        target: &Node,
        event: EventType,
        listener: &Listener<Event>,
        capture: bool,
    ) -> Result<(), ListenerError> {
        let function = self.function_for(listener);
        target
            .add_event_listener_with_callback_and_bool(event.as_str(), &function, capture)
            .map_err(|err| {
                self.release(listener);
                ListenerError::Rejected {
                    event,
                    reason: format!("{err:?}"),
                }
            })
    }

    fn remove_listener(
        &self,
        target: &Node,
        event: EventType,
        listener: &Listener<Event>,
        capture: bool,
    ) -> Result<(), ListenerError> {
        let Some(function) = self.existing_function(listener) else {
            return Err(ListenerError::NotRegistered { event });
        };
        let result = target
            .remove_event_listener_with_callback_and_bool(event.as_str(), &function, capture)
            .map_err(|err| ListenerError::Rejected {
                event,
                reason: format!("{err:?}"),
            });
        self.release(listener);
        result
    }

    fn defer(&self, task: Task) {
        let callback = Closure::once_into_js(move || task());
        if let Err(err) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), 0)
        {
            tracing::warn!(?err, "setTimeout failed; deferred click-outside dispatch dropped");
        }
    }
}
