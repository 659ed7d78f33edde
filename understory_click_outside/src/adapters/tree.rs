// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless tree adapter: an in-memory DOM implementing [`Platform`].
//!
//! [`TreeDom`] models just enough of a document for outside-interaction
//! detection: a document with a body, elements, shadow roots attached to
//! hosts, per-node listener lists and a FIFO macrotask queue.
//!
//! ## Dispatch
//!
//! [`TreeDom::dispatch`] follows the DOM event path:
//!
//! - The path runs from the target up to the document, continuing from a
//!   shadow root to its host.
//! - Capture listeners run root → target, then non-capture listeners run
//!   target → root.
//! - Each listener sees the target retargeted to its own tree: a listener on
//!   the body sees a click inside a shadow tree as a click on the host.
//!
//! Deferred tasks do not run during dispatch; call
//! [`TreeDom::run_macrotasks`] to advance the event loop.
//!
//! ## Example
//!
//! ```
//! use understory_click_outside::adapters::tree::{TreeDom, TreeEvent};
//! use understory_click_outside::{EventType, Listener, Platform};
//!
//! let dom = TreeDom::new();
//! let button = dom.create_element();
//! dom.append_child(dom.body_id(), button);
//!
//! let seen = std::rc::Rc::new(std::cell::Cell::new(None));
//! let listener = Listener::new({
//!     let seen = seen.clone();
//!     move |event: &TreeEvent| seen.set(event.target())
//! });
//! dom.add_listener(&dom.body_id(), EventType::Click, &listener, true).unwrap();
//!
//! dom.dispatch(EventType::Click, button);
//! assert_eq!(seen.get(), Some(button));
//! ```

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use hashbrown::{HashMap, HashSet};

use crate::error::ListenerError;
use crate::event::EventType;
use crate::platform::{Listener, ListenerId, Platform, Task};

/// Handle to a node in a [`TreeDom`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

/// Encapsulation mode of a shadow root.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShadowMode {
    /// Reachable through [`TreeDom::shadow_root`].
    Open,
    /// Hidden from [`TreeDom::shadow_root`].
    Closed,
}

/// Event payload delivered by a [`TreeDom`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TreeEvent {
    event_type: EventType,
    target: Option<NodeId>,
}

impl TreeEvent {
    /// An event of `event_type` aimed at `target`.
    #[must_use]
    pub fn new(event_type: EventType, target: NodeId) -> Self {
        Self {
            event_type,
            target: Some(target),
        }
    }

    /// An event without a node target.
    #[must_use]
    pub fn untargeted(event_type: EventType) -> Self {
        Self {
            event_type,
            target: None,
        }
    }

    /// The event type.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// The target as seen by the receiving listener.
    #[must_use]
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }
}

/// Whether a listener call log entry was an add or a remove.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ListenerOp {
    /// `add_listener`.
    Add,
    /// `remove_listener`.
    Remove,
}

/// One successful `add_listener` or `remove_listener` call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ListenerCall {
    /// Add or remove.
    pub op: ListenerOp,
    /// Node the call targeted.
    pub node: NodeId,
    /// Event type.
    pub event: EventType,
    /// Listener identity.
    pub listener: ListenerId,
    /// Capture flag.
    pub capture: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum NodeKind {
    Document,
    Element,
    ShadowRoot { host: NodeId, mode: ShadowMode },
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    shadow: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            shadow: None,
        }
    }
}

struct Registration {
    event: EventType,
    listener: Listener<TreeEvent>,
    capture: bool,
}

/// A headless document.
pub struct TreeDom {
    nodes: RefCell<Vec<NodeData>>,
    document: NodeId,
    body: NodeId,
    listeners: RefCell<HashMap<NodeId, Vec<Registration>>>,
    sealed: RefCell<HashSet<NodeId>>,
    calls: RefCell<Vec<ListenerCall>>,
    macrotasks: RefCell<VecDeque<Task>>,
}

impl TreeDom {
    /// Creates a document containing an empty body.
    #[must_use]
    pub fn new() -> Self {
        let document = NodeId(0);
        let body = NodeId(1);
        let mut doc_data = NodeData::new(NodeKind::Document);
        doc_data.children.push(body);
        let mut body_data = NodeData::new(NodeKind::Element);
        body_data.parent = Some(document);
        Self {
            nodes: RefCell::new(alloc::vec![doc_data, body_data]),
            document,
            body,
            listeners: RefCell::new(HashMap::new()),
            sealed: RefCell::new(HashSet::new()),
            calls: RefCell::new(Vec::new()),
            macrotasks: RefCell::new(VecDeque::new()),
        }
    }

    /// The document node.
    #[must_use]
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// The body element, whether or not it is still in the document.
    #[must_use]
    pub fn body_id(&self) -> NodeId {
        self.body
    }

    /// Creates a detached element.
    pub fn create_element(&self) -> NodeId {
        self.push(NodeData::new(NodeKind::Element))
    }

    /// Appends `child` to `parent`, moving it out of its current parent.
    ///
    /// # Panics
    ///
    /// Panics if either node does not exist, if `child` is the document or a
    /// shadow root, or if `child` is a shadow-including ancestor of `parent`.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        assert!(
            matches!(self.kind(child), NodeKind::Element),
            "only elements can be appended"
        );
        assert!(
            !self.is_shadow_including_inclusive_ancestor(child, parent),
            "appending {child:?} to {parent:?} would create a cycle"
        );
        self.remove(child);
        let mut nodes = self.nodes.borrow_mut();
        nodes[Self::index(child)].parent = Some(parent);
        nodes[Self::index(parent)].children.push(child);
    }

    /// Detaches `node` from its parent. No-op for roots.
    pub fn remove(&self, node: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        let parent = nodes[Self::index(node)].parent.take();
        if let Some(parent) = parent {
            nodes[Self::index(parent)].children.retain(|c| *c != node);
        }
    }

    /// Attaches a shadow root to `host` and returns it.
    ///
    /// # Panics
    ///
    /// Panics if `host` is not an element or already hosts a shadow root.
    pub fn attach_shadow(&self, host: NodeId, mode: ShadowMode) -> NodeId {
        assert!(
            matches!(self.kind(host), NodeKind::Element),
            "shadow roots attach to elements"
        );
        assert!(
            self.nodes.borrow()[Self::index(host)].shadow.is_none(),
            "{host:?} already hosts a shadow root"
        );
        let root = self.push(NodeData::new(NodeKind::ShadowRoot { host, mode }));
        self.nodes.borrow_mut()[Self::index(host)].shadow = Some(root);
        root
    }

    /// The open shadow root hosted by `host`.
    #[must_use]
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        let shadow = self.nodes.borrow().get(Self::index(host))?.shadow?;
        match self.kind(shadow) {
            NodeKind::ShadowRoot {
                mode: ShadowMode::Open,
                ..
            } => Some(shadow),
            _ => None,
        }
    }

    /// The parent of `node` within its tree.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(Self::index(node))?.parent
    }

    /// Makes `add_listener` on `node` fail with [`ListenerError::Rejected`].
    pub fn seal(&self, node: NodeId) {
        self.sealed.borrow_mut().insert(node);
    }

    /// Listeners for `event` registered on `node`, in registration order.
    #[must_use]
    pub fn listeners(&self, node: NodeId, event: EventType) -> Vec<Listener<TreeEvent>> {
        self.listeners
            .borrow()
            .get(&node)
            .map(|regs| {
                regs.iter()
                    .filter(|r| r.event == event)
                    .map(|r| r.listener.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of registrations on `node`.
    #[must_use]
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.listeners.borrow().get(&node).map_or(0, Vec::len)
    }

    /// Successful add/remove calls since creation or the last
    /// [`clear_calls`](Self::clear_calls).
    #[must_use]
    pub fn calls(&self) -> Vec<ListenerCall> {
        self.calls.borrow().clone()
    }

    /// Clears the call log.
    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Number of queued macrotasks.
    #[must_use]
    pub fn pending_macrotasks(&self) -> usize {
        self.macrotasks.borrow().len()
    }

    /// Runs queued macrotasks, including ones they queue, until the queue is
    /// empty. Returns how many ran.
    pub fn run_macrotasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let Some(task) = self.macrotasks.borrow_mut().pop_front() else {
                return ran;
            };
            task();
            ran += 1;
        }
    }

    /// Dispatches an event of `event_type` at `target` and returns it.
    ///
    /// Listeners outside the target's shadow trees receive retargeted copies.
    pub fn dispatch(&self, event_type: EventType, target: NodeId) -> TreeEvent {
        let path = self.event_path(target);
        for node in path.iter().rev() {
            self.invoke(*node, event_type, target, true);
        }
        for node in &path {
            self.invoke(*node, event_type, target, false);
        }
        TreeEvent::new(event_type, target)
    }

    fn invoke(&self, node: NodeId, event_type: EventType, target: NodeId, capture: bool) {
        // Snapshot so listeners may add or remove registrations while running.
        let listeners: Vec<_> = self
            .listeners
            .borrow()
            .get(&node)
            .map(|regs| {
                regs.iter()
                    .filter(|r| r.event == event_type && r.capture == capture)
                    .map(|r| r.listener.clone())
                    .collect()
            })
            .unwrap_or_default();
        if listeners.is_empty() {
            return;
        }
        let event = TreeEvent::new(event_type, self.retarget(target, node));
        for listener in listeners {
            listener.call(&event);
        }
    }

    /// Target → document, hopping from each shadow root to its host.
    fn event_path(&self, target: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(target);
        while let Some(node) = current {
            path.push(node);
            current = self.parent(node).or_else(|| self.host_of(node));
        }
        path
    }

    /// Retargets `target` against `listener_node`: climbs out of shadow trees
    /// that do not also contain `listener_node`.
    fn retarget(&self, mut target: NodeId, listener_node: NodeId) -> NodeId {
        loop {
            let root = self.tree_root(target);
            let Some(host) = self.host_of(root) else {
                return target;
            };
            if self.is_shadow_including_inclusive_ancestor(root, listener_node) {
                return target;
            }
            target = host;
        }
    }

    fn is_shadow_including_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n).or_else(|| self.host_of(n));
        }
        false
    }

    fn tree_root(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    fn host_of(&self, node: NodeId) -> Option<NodeId> {
        match self.nodes.borrow().get(Self::index(node))?.kind {
            NodeKind::ShadowRoot { host, .. } => Some(host),
            _ => None,
        }
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        self.nodes.borrow()[Self::index(node)].kind
    }

    fn exists(&self, node: NodeId) -> bool {
        Self::index(node) < self.nodes.borrow().len()
    }

    fn push(&self, data: NodeData) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(u32::try_from(nodes.len()).expect("node count exceeds u32::MAX"));
        nodes.push(data);
        id
    }

    fn index(node: NodeId) -> usize {
        node.0 as usize
    }

    fn log(
        &self,
        op: ListenerOp,
        node: NodeId,
        event: EventType,
        listener: ListenerId,
        capture: bool,
    ) {
        self.calls.borrow_mut().push(ListenerCall {
            op,
            node,
            event,
            listener,
            capture,
        });
    }
}

impl Default for TreeDom {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TreeDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeDom")
            .field("nodes", &self.nodes.borrow().len())
            .field("document", &self.document)
            .field("body", &self.body)
            .field(
                "listeners",
                &self.listeners.borrow().values().map(Vec::len).sum::<usize>(),
            )
            .field("macrotasks", &self.macrotasks.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Platform for TreeDom {
    type Node = NodeId;
    type Event = TreeEvent;

    fn body(&self) -> Option<NodeId> {
        (self.parent(self.body) == Some(self.document)).then_some(self.body)
    }

    fn root_node(&self, node: &NodeId) -> NodeId {
        self.tree_root(*node)
    }

    fn shadow_host(&self, node: &NodeId) -> Option<NodeId> {
        self.host_of(*node)
    }

    fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        let mut current = Some(*node);
        while let Some(n) = current {
            if n == *ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    fn event_target(&self, event: &TreeEvent) -> Option<NodeId> {
        event.target.filter(|t| self.exists(*t))
    }

    fn add_listener(
        &self,
        target: &NodeId,
        event: EventType,
        listener: &Listener<TreeEvent>,
        capture: bool,
    ) -> Result<(), ListenerError> {
        if !self.exists(*target) {
            return Err(ListenerError::MissingTarget);
        }
        if self.sealed.borrow().contains(target) {
            return Err(ListenerError::Rejected {
                event,
                reason: "node is sealed".into(),
            });
        }
        let mut listeners = self.listeners.borrow_mut();
        let regs = listeners.entry(*target).or_default();
        // Duplicate registrations are ignored, as in the DOM.
        if !regs
            .iter()
            .any(|r| r.event == event && r.capture == capture && r.listener == *listener)
        {
            regs.push(Registration {
                event,
                listener: listener.clone(),
                capture,
            });
        }
        drop(listeners);
        self.log(ListenerOp::Add, *target, event, listener.id(), capture);
        Ok(())
    }

    fn remove_listener(
        &self,
        target: &NodeId,
        event: EventType,
        listener: &Listener<TreeEvent>,
        capture: bool,
    ) -> Result<(), ListenerError> {
        if !self.exists(*target) {
            return Err(ListenerError::MissingTarget);
        }
        let mut listeners = self.listeners.borrow_mut();
        let regs = listeners.get_mut(target);
        let position = regs.as_ref().and_then(|regs| {
            regs.iter()
                .position(|r| r.event == event && r.capture == capture && r.listener == *listener)
        });
        let (Some(regs), Some(position)) = (regs, position) else {
            return Err(ListenerError::NotRegistered { event });
        };
        regs.remove(position);
        drop(listeners);
        self.log(ListenerOp::Remove, *target, event, listener.id(), capture);
        Ok(())
    }

    fn defer(&self, task: Task) {
        self.macrotasks.borrow_mut().push_back(task);
    }
}
