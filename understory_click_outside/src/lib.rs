// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_click_outside --heading-base-level=0

//! Understory Click Outside: detect interactions outside an element, for
//! menus, dialogs and popovers that close when the user clicks elsewhere.
//!
//! ## Overview
//!
//! [`ClickOutside`] watches elements on a [`Platform`] and calls a handler
//! when an interaction both started and ended outside the element and any
//! elements it includes. It is a detector only: whether the element is open,
//! and what an outside click does, is up to the caller.
//!
//! An interaction counts as outside when:
//!
//! - the last pointer-down (`mousedown`) was outside, so a drag that starts
//!   inside and ends outside never fires;
//! - the primary event (`click`, or `touchstart` in [`InputMode::Touch`]) is
//!   outside;
//! - the binding's activity predicate holds, both when the event arrives and
//!   again when the deferred handler runs.
//!
//! Listeners are registered in the capture phase on the document body, and
//! additionally on every enclosing shadow root for elements inside shadow
//! trees. A click inside a shadow tree reaches listeners above it retargeted
//! to the shadow host, so events targeting any enclosing host are never
//! treated as outside.
//!
//! ## Bindings
//!
//! A [`ClickOutsideBinding`] carries the handler, the activity predicate
//! (`close_conditional`) and an optional provider of extra inside elements
//! (`include`). Without an activity predicate the detector never fires.
//!
//! ## Workflow
//!
//! 1) Implement [`Platform`] for your host, or use an adapter from
//!    [`adapters`].
//! 2) Call [`ClickOutside::attach`] when a toggleable element mounts and
//!    [`ClickOutside::detach`] when it unmounts.
//! 3) Handlers run on a later turn via [`Platform::defer`], after the event
//!    has finished propagating. See the [`detector`] docs for the one call
//!    that may still arrive after detach.
//!
//! ## Logging
//!
//! The crate logs through `tracing`: `debug` for attach and detach, `trace`
//! for per-event decisions, and `warn` when a platform rejects a listener.
//!
//! ## Features
//!
//! - `std` (default): forward `std` to `tracing` and `thiserror`.
//! - `tree_adapter` (default): the headless [`adapters::tree`] DOM.
//!
//! On `wasm32` targets, `adapters::web` drives the browser DOM via `web-sys`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod adapters;
pub mod detector;

mod binding;
mod error;
mod event;
mod outside;
mod platform;
mod roots;

pub use binding::{ClickOutsideBinding, ClickOutsideConfig};
pub use detector::ClickOutside;
pub use error::ListenerError;
pub use event::{EventType, InputMode};
pub use outside::is_outside;
pub use platform::{Listener, ListenerId, Platform, Task};
pub use roots::{RootSet, ShadowScope, nearest_shadow_root, shadow_scopes};
