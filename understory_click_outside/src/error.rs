// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by [`Platform`](crate::Platform) listener operations.
//!
//! The detector itself never surfaces these to callers. A failed registration
//! or removal is logged and the remaining roots are still processed.

use alloc::string::String;

use crate::event::EventType;

/// Failure to add or remove a listener on a platform node.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ListenerError {
    /// The platform refused the operation.
    #[error("platform rejected `{event}` listener: {reason}")]
    Rejected {
        /// Event type of the listener.
        event: EventType,
        /// Platform-provided description.
        reason: String,
    },
    /// No listener with this identity, event type and phase is registered on
    /// the node.
    #[error("no matching `{event}` listener is registered on the node")]
    NotRegistered {
        /// Event type of the listener.
        event: EventType,
    },
    /// The node no longer exists.
    #[error("listener target no longer exists")]
    MissingTarget,
}
