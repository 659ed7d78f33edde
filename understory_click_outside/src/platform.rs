// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The platform seam: everything the detector needs from a DOM-like host.
//!
//! The detector does not walk trees, register listeners or run timers itself.
//! A [`Platform`] implementation supplies those operations, whether it wraps
//! a browser document or an in-memory tree (see [`adapters`](crate::adapters)).
//!
//! ## Listener identity
//!
//! A [`Listener`] is a cheaply clonable handle with a stable [`ListenerId`].
//! Clones share the id. Platforms must treat two listeners as the same
//! registration exactly when their ids match, so that a removal with the
//! handle stored at attach time undoes that registration and nothing else.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ListenerError;
use crate::event::EventType;

/// Work queued with [`Platform::defer`].
pub type Task = Box<dyn FnOnce()>;

static NEXT_LISTENER_ID: AtomicUsize = AtomicUsize::new(0);

/// Stable identity of a [`Listener`] and all of its clones.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(usize);

/// An event listener handle.
pub struct Listener<E> {
    id: ListenerId,
    func: Rc<dyn Fn(&E)>,
}

impl<E> Listener<E> {
    /// Wraps `func` in a listener with a fresh identity.
    pub fn new(func: impl Fn(&E) + 'static) -> Self {
        Self {
            id: ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed)),
            func: Rc::new(func),
        }
    }

    /// Returns the identity shared by this listener and its clones.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Invokes the listener.
    pub fn call(&self, event: &E) {
        (self.func)(event);
    }
}

impl<E> Clone for Listener<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            func: Rc::clone(&self.func),
        }
    }
}

impl<E> PartialEq for Listener<E> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<E> Eq for Listener<E> {}

impl<E> fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// DOM-like host operations consumed by [`ClickOutside`](crate::ClickOutside).
///
/// All methods take `&self`: listeners run re-entrantly during dispatch and
/// may call back into the platform, so implementations keep their mutable
/// state behind interior mutability.
pub trait Platform {
    /// Node handle. Equality is node identity.
    type Node: Clone + PartialEq + fmt::Debug + 'static;
    /// Event payload delivered to listeners.
    type Event: Clone + 'static;

    /// The document body, if the document currently has one.
    fn body(&self) -> Option<Self::Node>;

    /// The root of the tree containing `node`: the document, a shadow root, or
    /// the topmost ancestor of a detached subtree. Does not cross shadow
    /// boundaries.
    fn root_node(&self, node: &Self::Node) -> Self::Node;

    /// Capability check for shadow roots.
    ///
    /// Returns the host element if `node` is a shadow root, `None` otherwise.
    fn shadow_host(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Inclusive containment: `true` if `node` is `ancestor` or one of its
    /// descendants within the same tree.
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;

    /// The target of `event` as seen by the listener it was delivered to.
    ///
    /// Returns `None` for events without a node target, such as synthetic
    /// events that lack the expected shape.
    fn event_target(&self, event: &Self::Event) -> Option<Self::Node>;

    /// Registers `listener` for `event` on `target`.
    fn add_listener(
        &self,
        target: &Self::Node,
        event: EventType,
        listener: &Listener<Self::Event>,
        capture: bool,
    ) -> Result<(), ListenerError>;

    /// Removes the registration made with the same `target`, `event`,
    /// listener identity and `capture` flag.
    fn remove_listener(
        &self,
        target: &Self::Node,
        event: EventType,
        listener: &Listener<Self::Event>,
        capture: bool,
    ) -> Result<(), ListenerError>;

    /// Queues `task` to run on a later turn of the event loop, after the
    /// current event has finished dispatching.
    fn defer(&self, task: Task);
}
