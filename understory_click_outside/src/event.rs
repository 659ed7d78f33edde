// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event types observed by the detector and the input mode that selects them.

use core::fmt;

/// The platform event types the detector listens for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Pointer pressed; records where an interaction originated.
    MouseDown,
    /// Primary event in mouse input mode.
    Click,
    /// Primary event in touch input mode.
    TouchStart,
}

impl EventType {
    /// The platform event name, as passed to `addEventListener`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MouseDown => "mousedown",
            Self::Click => "click",
            Self::TouchStart => "touchstart",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kind of input the host expects, selecting the primary event type.
///
/// iOS does not deliver `click` to the document body reliably, so touch hosts
/// listen for `touchstart` instead.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum InputMode {
    /// Listen for `click`.
    #[default]
    Mouse,
    /// Listen for `touchstart`.
    Touch,
}

impl InputMode {
    /// The event type treated as the end of an interaction.
    #[must_use]
    pub const fn primary_event(self) -> EventType {
        match self {
            Self::Mouse => EventType::Click,
            Self::Touch => EventType::TouchStart,
        }
    }

    /// The event type treated as the origin of an interaction.
    ///
    /// This is `mousedown` in both modes.
    #[must_use]
    pub const fn pointer_down_event(self) -> EventType {
        EventType::MouseDown
    }
}
