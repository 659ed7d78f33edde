// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`Platform`](crate::Platform) implementations.
//!
//! - [`tree`] (`tree_adapter` feature): a headless in-memory DOM with shadow
//!   roots, capture/bubble dispatch and a macrotask queue.
//! - [`web`] (`wasm32` targets): the browser DOM via `web-sys`.

#[cfg(feature = "tree_adapter")]
pub mod tree;

#[cfg(target_arch = "wasm32")]
pub mod web;
