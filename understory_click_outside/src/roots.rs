// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Root resolution: where the detector's listeners live.
//!
//! Events inside a shadow tree are retargeted to the shadow host by the time
//! they reach listeners on the document body, and a body listener never sees
//! which node inside the shadow tree was hit. For an element inside shadow
//! trees the detector therefore listens on the body and on every shadow root
//! enclosing the element. Exactly one of those listeners sees the real
//! target; the others see one of the enclosing hosts.

use smallvec::SmallVec;

use crate::platform::Platform;

/// A shadow root and the element hosting it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShadowScope<N> {
    /// The shadow root.
    pub root: N,
    /// Its host element.
    pub host: N,
}

/// The roots resolved for a watched element. Derived, never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootSet<N> {
    /// The document body, if present.
    pub body: Option<N>,
    /// Shadow roots enclosing the element, innermost first.
    pub shadows: SmallVec<[ShadowScope<N>; 1]>,
}

impl<N: Clone> RootSet<N> {
    /// Resolves the roots for `element`.
    pub fn resolve<P>(platform: &P, element: &N) -> Self
    where
        P: Platform<Node = N>,
    {
        Self {
            body: platform.body(),
            shadows: shadow_scopes(platform, element),
        }
    }

    /// The innermost shadow root enclosing the element, if any.
    #[must_use]
    pub fn innermost(&self) -> Option<&ShadowScope<N>> {
        self.shadows.first()
    }

    /// Listener targets: the body first, then the shadow roots, innermost
    /// first.
    pub fn targets(&self) -> SmallVec<[N; 2]> {
        self.body
            .iter()
            .cloned()
            .chain(self.shadows.iter().map(|scope| scope.root.clone()))
            .collect()
    }
}

/// Returns the shadow root directly enclosing `element`, with its host.
pub fn nearest_shadow_root<P>(platform: &P, element: &P::Node) -> Option<ShadowScope<P::Node>>
where
    P: Platform,
{
    let root = platform.root_node(element);
    let host = platform.shadow_host(&root)?;
    Some(ShadowScope { root, host })
}

/// Returns every shadow root enclosing `element`, innermost first, by
/// hopping from each shadow root to its host.
pub fn shadow_scopes<P>(platform: &P, element: &P::Node) -> SmallVec<[ShadowScope<P::Node>; 1]>
where
    P: Platform,
{
    let mut scopes = SmallVec::new();
    let mut node = element.clone();
    while let Some(scope) = nearest_shadow_root(platform, &node) {
        node = scope.host.clone();
        scopes.push(scope);
    }
    scopes
}
