// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The outside predicate.

use smallvec::SmallVec;
use tracing::trace;

use crate::binding::ClickOutsideBinding;
use crate::platform::Platform;
use crate::roots::shadow_scopes;

/// Returns `true` if `event` landed outside `element` and every element the
/// binding includes.
///
/// Returns `false` (not outside) when:
/// - the binding's activity predicate does not hold; include providers are not
///   evaluated in that case;
/// - the event has no node target;
/// - `element` lives in shadow trees and the target is the host of any of
///   them. A listener above a shadow boundary only sees that host, so the real
///   target may well be inside; the listener on the innermost shadow root
///   enclosing both sees it and decides.
///
/// Containment is inclusive: a target equal to `element` is inside.
pub fn is_outside<P>(
    platform: &P,
    element: &P::Node,
    binding: &ClickOutsideBinding<P::Node, P::Event>,
    event: &P::Event,
) -> bool
where
    P: Platform,
{
    if !binding.is_active(event) {
        trace!("activity predicate rejected event");
        return false;
    }

    let Some(target) = platform.event_target(event) else {
        trace!("event has no target");
        return false;
    };

    if let Some(scope) = shadow_scopes(platform, element)
        .into_iter()
        .find(|scope| scope.host == target)
    {
        trace!(host = ?scope.host, "event targets an enclosing shadow host");
        return false;
    }

    let mut elements: SmallVec<[P::Node; 4]> = binding.included().into_iter().collect();
    elements.push(element.clone());
    !elements
        .iter()
        .any(|candidate| platform.contains(candidate, &target))
}
