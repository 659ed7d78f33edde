// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Caller-supplied binding and detector configuration.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::event::InputMode;

type Handler<E> = Rc<dyn Fn(&E)>;
type Conditional<E> = Rc<dyn Fn(&E) -> bool>;
type Include<N> = Rc<dyn Fn() -> Vec<N>>;

/// What to call on an outside interaction, and when it matters.
///
/// - `handler`: invoked with the event on an outside interaction. A binding
///   without a handler is inert.
/// - `close_conditional`: the activity predicate. Without one the detector
///   never fires; toggleable components typically return "is open".
/// - `include`: extra elements that count as inside. Called lazily, only after
///   the activity predicate passed.
///
/// ```
/// use understory_click_outside::ClickOutsideBinding;
///
/// let binding = ClickOutsideBinding::<u32, u32>::new(|_event| {})
///     .with_close_conditional(|_event| true)
///     .with_include(|| vec![7, 8]);
/// assert!(binding.has_handler());
/// assert!(binding.is_active(&0));
/// assert_eq!(binding.included(), vec![7, 8]);
/// ```
pub struct ClickOutsideBinding<N, E> {
    handler: Option<Handler<E>>,
    close_conditional: Option<Conditional<E>>,
    include: Option<Include<N>>,
}

impl<N, E> ClickOutsideBinding<N, E> {
    /// Creates a binding that calls `handler` on outside interactions.
    pub fn new(handler: impl Fn(&E) + 'static) -> Self {
        Self {
            handler: Some(Rc::new(handler)),
            close_conditional: None,
            include: None,
        }
    }

    /// Creates a binding without a handler.
    #[must_use]
    pub fn inert() -> Self {
        Self {
            handler: None,
            close_conditional: None,
            include: None,
        }
    }

    /// Sets the activity predicate.
    #[must_use]
    pub fn with_close_conditional(mut self, conditional: impl Fn(&E) -> bool + 'static) -> Self {
        self.close_conditional = Some(Rc::new(conditional));
        self
    }

    /// Sets the provider of additional inside elements.
    #[must_use]
    pub fn with_include(mut self, include: impl Fn() -> Vec<N> + 'static) -> Self {
        self.include = Some(Rc::new(include));
        self
    }

    /// Returns `true` if a handler is set.
    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Evaluates the activity predicate. Fails closed when none is set.
    pub fn is_active(&self, event: &E) -> bool {
        self.close_conditional
            .as_ref()
            .is_some_and(|conditional| conditional(event))
    }

    /// Evaluates the include provider, or returns an empty list.
    pub fn included(&self) -> Vec<N> {
        self.include.as_ref().map(|include| include()).unwrap_or_default()
    }

    pub(crate) fn handler(&self) -> Option<Handler<E>> {
        self.handler.clone()
    }
}

impl<N, E> Default for ClickOutsideBinding<N, E> {
    fn default() -> Self {
        Self::inert()
    }
}

impl<N, E> Clone for ClickOutsideBinding<N, E> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            close_conditional: self.close_conditional.clone(),
            include: self.include.clone(),
        }
    }
}

impl<N, E> fmt::Debug for ClickOutsideBinding<N, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickOutsideBinding")
            .field("handler", &self.handler.is_some())
            .field("close_conditional", &self.close_conditional.is_some())
            .field("include", &self.include.is_some())
            .finish()
    }
}

/// Detector-wide settings, read once per attach.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClickOutsideConfig {
    /// Selects `click` or `touchstart` as the primary event.
    pub input_mode: InputMode,
}

impl ClickOutsideConfig {
    /// Configuration for touch-first hosts.
    #[must_use]
    pub const fn touch() -> Self {
        Self {
            input_mode: InputMode::Touch,
        }
    }
}
